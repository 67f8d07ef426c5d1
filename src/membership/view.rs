//! Read-only projections of the graph for the HTTP layer.

use serde::Serialize;
use uuid::Uuid;

use super::graph::League;
use super::types::Target;

#[derive(Debug, Clone, Serialize)]
pub struct PlayerRef {
    pub id: Uuid,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub name: String,
}

/// A team or clan with its people, members in join order.
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub target: Target,
    pub name: String,
    pub clan: Option<GroupRef>,
    pub clan_pending: Option<GroupRef>,
    pub leader: Option<PlayerRef>,
    pub members: Vec<PlayerRef>,
    pub pending: Vec<PlayerRef>,
}

/// Everything one player is part of or waiting on.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerMemberships {
    pub player: PlayerRef,
    pub clan: Option<GroupRef>,
    pub teams: Vec<GroupRef>,
    pub clan_requests: Vec<GroupRef>,
    pub team_requests: Vec<GroupRef>,
}

fn player_ref(league: &League, id: Uuid) -> PlayerRef {
    PlayerRef {
        id,
        nickname: league
            .player(id)
            .map(|p| p.nickname.clone())
            .unwrap_or_default(),
    }
}

fn clan_ref(league: &League, id: Uuid) -> GroupRef {
    GroupRef {
        id,
        name: league.clan_name(id),
    }
}

pub fn roster(league: &League, target: Target) -> Option<Roster> {
    let (name, clan, clan_pending) = match target {
        Target::Team(id) => {
            let t = league.team(id)?;
            (t.name.clone(), t.clan, t.clan_pending)
        }
        Target::Clan(id) => (league.clan(id)?.name.clone(), None, None),
    };

    Some(Roster {
        target,
        name,
        clan: clan.map(|c| clan_ref(league, c)),
        clan_pending: clan_pending.map(|c| clan_ref(league, c)),
        leader: league.leader(target).map(|l| player_ref(league, l)),
        members: league
            .members(target)
            .iter()
            .map(|m| player_ref(league, *m))
            .collect(),
        pending: league
            .pending(target)
            .iter()
            .map(|p| player_ref(league, *p))
            .collect(),
    })
}

pub fn player_memberships(league: &League, player: Uuid) -> Option<PlayerMemberships> {
    league.player(player)?;

    let group = |id: Uuid, name: &str| GroupRef {
        id,
        name: name.to_owned(),
    };

    Some(PlayerMemberships {
        player: player_ref(league, player),
        clan: league.player_clan(player).map(|c| clan_ref(league, c)),
        teams: league
            .teams_of(player)
            .into_iter()
            .map(|t| group(t.id, &t.name))
            .collect(),
        clan_requests: league
            .clan_requests_of(player)
            .into_iter()
            .map(|c| group(c.id, &c.name))
            .collect(),
        team_requests: league
            .team_requests_of(player)
            .into_iter()
            .map(|t| group(t.id, &t.name))
            .collect(),
    })
}
