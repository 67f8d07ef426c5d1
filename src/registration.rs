//! Tournament sign-up rules for teams.
//!
//! A tournament takes at most one team per clan, and only teams whose
//! roster already fills the tournament's team size.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::membership::League;

/// A tournament as the registration rules see it.
#[derive(Debug, Clone)]
pub struct TournamentEntry {
    pub id: Uuid,
    pub name: String,
    pub team_player_count: u16,
    /// Teams already registered, in registration order.
    pub registered: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum RegistrationError {
    AlreadyRegistered,
    ClanAlreadyRegistered { clan_id: Uuid, team_id: Uuid },
    NotEnoughPlayers { required: u16, actual: usize },
    UnknownTeam { id: Uuid },
    UnknownTournament { id: Uuid },
    NotAuthorized { actor: Uuid },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::AlreadyRegistered => write!(f, "Team is already registered"),
            RegistrationError::ClanAlreadyRegistered { .. } => write!(
                f,
                "Another team from your clan is already registered for this tournament"
            ),
            RegistrationError::NotEnoughPlayers { required, actual } => write!(
                f,
                "Not enough players in team to join tournament ({actual}/{required})"
            ),
            RegistrationError::UnknownTeam { id } => write!(f, "Team {id} not found"),
            RegistrationError::UnknownTournament { id } => write!(f, "Tournament {id} not found"),
            RegistrationError::NotAuthorized { actor } => {
                write!(f, "Player {actor} does not lead this team")
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Only the team's leader signs it up or withdraws it.
pub fn authorize(league: &League, actor: Uuid, team: Uuid) -> Result<(), RegistrationError> {
    let node = league
        .team(team)
        .ok_or(RegistrationError::UnknownTeam { id: team })?;
    if node.leader == Some(actor) {
        Ok(())
    } else {
        Err(RegistrationError::NotAuthorized { actor })
    }
}

pub fn check_registration(
    league: &League,
    tournament: &TournamentEntry,
    team: Uuid,
) -> Result<(), RegistrationError> {
    let node = league
        .team(team)
        .ok_or(RegistrationError::UnknownTeam { id: team })?;

    if tournament.registered.contains(&team) {
        return Err(RegistrationError::AlreadyRegistered);
    }

    if let Some(clan) = node.clan {
        let rival = tournament
            .registered
            .iter()
            .find(|t| league.team(**t).and_then(|t| t.clan) == Some(clan));
        if let Some(&rival) = rival {
            return Err(RegistrationError::ClanAlreadyRegistered {
                clan_id: clan,
                team_id: rival,
            });
        }
    }

    let actual = node.members.len();
    if actual < usize::from(tournament.team_player_count) {
        return Err(RegistrationError::NotEnoughPlayers {
            required: tournament.team_player_count,
            actual,
        });
    }
    Ok(())
}
