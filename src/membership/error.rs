//! Refusals the engine hands back to its caller.
//!
//! These are expected outcomes of a well-formed request (the player asked
//! for something the current graph does not allow), not failures of the
//! service. Nothing in the graph has changed when one is returned.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::types::Target;

/// `(id, name)` of a team, used in error payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum MembershipError {
    /// The team belongs to a clan the player is not part of.
    NeedsClanMembership { clan_id: Uuid, clan_name: String },
    AlreadyMember { target: Target },
    NotAMember { target: Target },
    NotPending { target: Target },
    /// Leaving the clan would orphan these team memberships.
    HasDependentTeams { teams: Vec<TeamRef> },
    InOtherClan { clan_id: Uuid, clan_name: String },

    UnknownPlayer { id: Uuid },
    UnknownTeam { id: Uuid },
    UnknownClan { id: Uuid },

    NotAuthorized { actor: Uuid },
}

impl MembershipError {
    /// Matches the serialized `error` tag.
    pub fn tag(&self) -> &'static str {
        match self {
            MembershipError::NeedsClanMembership { .. } => "needs_clan_membership",
            MembershipError::AlreadyMember { .. } => "already_member",
            MembershipError::NotAMember { .. } => "not_a_member",
            MembershipError::NotPending { .. } => "not_pending",
            MembershipError::HasDependentTeams { .. } => "has_dependent_teams",
            MembershipError::InOtherClan { .. } => "in_other_clan",
            MembershipError::UnknownPlayer { .. } => "unknown_player",
            MembershipError::UnknownTeam { .. } => "unknown_team",
            MembershipError::UnknownClan { .. } => "unknown_clan",
            MembershipError::NotAuthorized { .. } => "not_authorized",
        }
    }
}

impl fmt::Display for MembershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipError::NeedsClanMembership { clan_name, .. } => {
                write!(f, "Join clan {clan_name} first")
            }
            MembershipError::AlreadyMember { target } => {
                write!(f, "Player is already a member of {target}")
            }
            MembershipError::NotAMember { target } => {
                write!(f, "Player is not a member of {target}")
            }
            MembershipError::NotPending { target } => {
                write!(f, "Player has no pending request to {target}")
            }
            MembershipError::HasDependentTeams { teams } => {
                let names: Vec<&str> = teams.iter().map(|t| t.name.as_str()).collect();
                write!(f, "Player is still on clan teams: {}", names.join(", "))
            }
            MembershipError::InOtherClan { clan_name, .. } => {
                write!(f, "Player already belongs to clan {clan_name}")
            }
            MembershipError::UnknownPlayer { id } => write!(f, "Player {id} not found"),
            MembershipError::UnknownTeam { id } => write!(f, "Team {id} not found"),
            MembershipError::UnknownClan { id } => write!(f, "Clan {id} not found"),
            MembershipError::NotAuthorized { actor } => {
                write!(f, "Player {actor} may not perform this action")
            }
        }
    }
}

impl std::error::Error for MembershipError {}

pub type MembershipResult<T> = Result<T, MembershipError>;
