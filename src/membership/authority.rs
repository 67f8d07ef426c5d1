//! Who may ask for what.
//!
//! Self-service intents must come from the player they concern; intents that
//! act on somebody else's request or membership need the target's leader.

use uuid::Uuid;

use super::error::{MembershipError, MembershipResult};
use super::graph::League;
use super::types::Intent;

pub fn authorize(league: &League, actor: Uuid, intent: &Intent) -> MembershipResult<()> {
    league.require_target(intent.target())?;

    let allowed = match intent {
        Intent::RequestJoin { player, .. }
        | Intent::CancelRequest { player, .. }
        | Intent::Leave { player, .. }
        | Intent::ForceLeave { player, .. }
        | Intent::ForceJoinTeam { player, .. } => *player == actor,

        Intent::ConfirmJoin { target, .. }
        | Intent::DeclineRequest { target, .. }
        | Intent::Kick { target, .. }
        | Intent::TransferLeadership { target, .. } => league.leader(*target) == Some(actor),
    };

    if allowed {
        Ok(())
    } else {
        log::warn!("{actor} not allowed to {} on {}", intent.name(), intent.target());
        Err(MembershipError::NotAuthorized { actor })
    }
}
