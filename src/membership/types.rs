use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// A group a player can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    Team(Uuid),
    Clan(Uuid),
}

impl Target {
    pub fn id(self) -> Uuid {
        match self {
            Target::Team(id) | Target::Clan(id) => id,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Team(id) => write!(f, "team {id}"),
            Target::Clan(id) => write!(f, "clan {id}"),
        }
    }
}

/// Everything a caller can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    RequestJoin { player: Uuid, target: Target },
    ConfirmJoin { target: Target, player: Uuid },
    DeclineRequest { target: Target, player: Uuid },
    CancelRequest { player: Uuid, target: Target },
    Leave { player: Uuid, target: Target },
    /// Leave a clan together with its teams, whatever the clan leave policy.
    ForceLeave { player: Uuid, target: Target },
    Kick { player: Uuid, target: Target },
    /// Join the team's clan (if needed) and then the team itself.
    ForceJoinTeam { player: Uuid, team: Uuid },
    TransferLeadership { target: Target, player: Uuid },
}

impl Intent {
    /// The player whose membership the intent is about.
    pub fn player(&self) -> Uuid {
        match *self {
            Intent::RequestJoin { player, .. }
            | Intent::ConfirmJoin { player, .. }
            | Intent::DeclineRequest { player, .. }
            | Intent::CancelRequest { player, .. }
            | Intent::Leave { player, .. }
            | Intent::ForceLeave { player, .. }
            | Intent::Kick { player, .. }
            | Intent::ForceJoinTeam { player, .. }
            | Intent::TransferLeadership { player, .. } => player,
        }
    }

    pub fn target(&self) -> Target {
        match *self {
            Intent::RequestJoin { target, .. }
            | Intent::ConfirmJoin { target, .. }
            | Intent::DeclineRequest { target, .. }
            | Intent::CancelRequest { target, .. }
            | Intent::Leave { target, .. }
            | Intent::ForceLeave { target, .. }
            | Intent::Kick { target, .. }
            | Intent::TransferLeadership { target, .. } => target,
            Intent::ForceJoinTeam { team, .. } => Target::Team(team),
        }
    }

    /// Stable label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::RequestJoin { .. } => "request_join",
            Intent::ConfirmJoin { .. } => "confirm_join",
            Intent::DeclineRequest { .. } => "decline_request",
            Intent::CancelRequest { .. } => "cancel_request",
            Intent::Leave { .. } => "leave",
            Intent::ForceLeave { .. } => "force_leave",
            Intent::Kick { .. } => "kick",
            Intent::ForceJoinTeam { .. } => "force_join_team",
            Intent::TransferLeadership { .. } => "transfer_leadership",
        }
    }
}

/// Where a player stands with respect to one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    NonMember,
    Pending,
    Member,
    Leader,
}

/// One edge mutation of the membership graph.
///
/// The engine records these in order; the persistence layer replays them
/// verbatim inside the surrounding transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    MemberAdded { target: Target, player: Uuid },
    MemberRemoved { target: Target, player: Uuid },
    LeaderChanged { target: Target, leader: Option<Uuid> },
    PendingAdded { target: Target, player: Uuid },
    PendingRemoved { target: Target, player: Uuid },
    ClanAffiliationCleared { team: Uuid },
}

/// Result of a successful intent.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Status of the intent's player towards the intent's target afterwards.
    pub status: MembershipStatus,
    pub changes: Vec<Change>,
}

impl Outcome {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// What happens when a player leaves a clan while still on some of its teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClanLeavePolicy {
    /// Drop the player from those teams, then from the clan.
    Cascade,
    /// Report the teams back and change nothing.
    Refuse,
}

impl FromStr for ClanLeavePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(ClanLeavePolicy::Cascade),
            "refuse" => Ok(ClanLeavePolicy::Refuse),
            other => Err(format!("unknown clan leave policy `{other}`")),
        }
    }
}

/// Tunables the engine consults; passed explicitly into every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub clan_leave: ClanLeavePolicy,
    /// Pull the first eligible pending requester in when the last member leaves.
    pub promote_pending_on_empty: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            clan_leave: ClanLeavePolicy::Cascade,
            promote_pending_on_empty: true,
        }
    }
}
