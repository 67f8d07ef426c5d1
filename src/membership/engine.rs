//! State transitions over the membership graph.
//!
//! [`apply`] is the single entry point. It runs the intent against a scratch
//! copy of the graph and only swaps it in on success, so a refused intent
//! leaves the caller's graph untouched.

use uuid::Uuid;

use super::error::{MembershipError, MembershipResult};
use super::graph::League;
use super::types::{ClanLeavePolicy, Intent, Outcome, Policy, Target};

/// Run one intent. Authorization is the caller's concern.
pub fn apply(league: &mut League, intent: &Intent, policy: &Policy) -> MembershipResult<Outcome> {
    let mut scratch = league.clone();

    let res = match *intent {
        Intent::RequestJoin { player, target } => request_join(&mut scratch, player, target),
        Intent::ConfirmJoin { target, player } => confirm_join(&mut scratch, target, player),
        Intent::DeclineRequest { target, player } => decline(&mut scratch, target, player),
        Intent::CancelRequest { player, target } => cancel(&mut scratch, player, target),
        Intent::Leave { player, target } => {
            depart(&mut scratch, player, target, Departure::Leave, policy)
        }
        Intent::Kick { player, target } => {
            depart(&mut scratch, player, target, Departure::Kick, policy)
        }
        Intent::ForceLeave { player, target } => {
            depart(&mut scratch, player, target, Departure::ForceLeave, policy)
        }
        Intent::ForceJoinTeam { player, team } => force_join_team(&mut scratch, player, team),
        Intent::TransferLeadership { target, player } => transfer(&mut scratch, target, player),
    };

    if let Err(e) = res {
        log::debug!("{} refused for {}: {e}", intent.name(), intent.player());
        return Err(e);
    }

    let changes = scratch.take_journal();
    debug_assert_eq!(scratch.check_invariants(), Ok(()));
    *league = scratch;

    log::debug!(
        "{} applied for {} on {} ({} changes)",
        intent.name(),
        intent.player(),
        intent.target(),
        changes.len()
    );
    Ok(Outcome {
        status: league.status(intent.player(), intent.target()),
        changes,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Departure {
    Leave,
    /// Leave that always takes the player off the clan's teams.
    ForceLeave,
    Kick,
}

fn request_join(l: &mut League, player: Uuid, target: Target) -> MembershipResult<()> {
    l.require_player(player)?;
    l.require_target(target)?;

    if l.is_member(target, player) {
        return Err(MembershipError::AlreadyMember { target });
    }
    if l.is_pending(target, player) {
        // A target that emptied under the request is settled by asking again.
        if l.leader(target).is_none() && eligible(l, target, player) {
            log::info!("{player} takes over leaderless {target} from the queue");
            l.remove_pending(target, player);
            admit(l, target, player);
        }
        return Ok(());
    }

    match target {
        Target::Clan(_) => {
            if let Some(other) = l.player_clan(player) {
                return Err(MembershipError::InOtherClan {
                    clan_id: other,
                    clan_name: l.clan_name(other),
                });
            }
        }
        Target::Team(team) => {
            let team_clan = l.require_team(team)?.clan;
            if let Some(clan) = team_clan {
                if l.player_clan(player) != Some(clan) {
                    if l.is_pending(Target::Clan(clan), player) {
                        // Parked until the clan lets the player in.
                        l.add_pending(target, player);
                        return Ok(());
                    }
                    return Err(MembershipError::NeedsClanMembership {
                        clan_id: clan,
                        clan_name: l.clan_name(clan),
                    });
                }
            }
        }
    }

    if l.leader(target).is_some() {
        l.add_pending(target, player);
    } else {
        log::info!("{player} founds leaderless {target}");
        admit(l, target, player);
    }
    Ok(())
}

fn confirm_join(l: &mut League, target: Target, player: Uuid) -> MembershipResult<()> {
    l.require_player(player)?;
    l.require_target(target)?;

    if l.is_member(target, player) {
        return Err(MembershipError::AlreadyMember { target });
    }
    if !l.is_pending(target, player) {
        return Err(MembershipError::NotPending { target });
    }
    match target {
        Target::Team(team) => {
            let team_clan = l.require_team(team)?.clan;
            if let Some(clan) = team_clan {
                if l.player_clan(player) != Some(clan) {
                    return Err(MembershipError::NeedsClanMembership {
                        clan_id: clan,
                        clan_name: l.clan_name(clan),
                    });
                }
            }
        }
        Target::Clan(_) => {
            if let Some(other) = l.player_clan(player) {
                return Err(MembershipError::InOtherClan {
                    clan_id: other,
                    clan_name: l.clan_name(other),
                });
            }
        }
    }

    l.remove_pending(target, player);
    admit(l, target, player);
    Ok(())
}

fn decline(l: &mut League, target: Target, player: Uuid) -> MembershipResult<()> {
    l.require_player(player)?;
    l.require_target(target)?;

    if !l.remove_pending(target, player) {
        return Err(MembershipError::NotPending { target });
    }
    if let Target::Clan(clan) = target {
        drop_team_requests_in_clan(l, player, clan);
    }
    Ok(())
}

/// Withdrawing a request that does not exist changes nothing.
fn cancel(l: &mut League, player: Uuid, target: Target) -> MembershipResult<()> {
    l.require_player(player)?;
    l.require_target(target)?;

    if l.remove_pending(target, player) {
        if let Target::Clan(clan) = target {
            drop_team_requests_in_clan(l, player, clan);
        }
    }
    Ok(())
}

fn depart(
    l: &mut League,
    player: Uuid,
    target: Target,
    how: Departure,
    policy: &Policy,
) -> MembershipResult<()> {
    l.require_player(player)?;
    l.require_target(target)?;

    if !l.is_member(target, player) {
        return Err(MembershipError::NotAMember { target });
    }

    if let Target::Clan(clan) = target {
        let dependent = l.clan_teams_of(clan, player);
        if how == Departure::Leave
            && policy.clan_leave == ClanLeavePolicy::Refuse
            && !dependent.is_empty()
        {
            return Err(MembershipError::HasDependentTeams { teams: dependent });
        }
        for team in dependent {
            vacate(l, Target::Team(team.id), player, policy);
        }
        if how == Departure::Kick {
            drop_team_requests_in_clan(l, player, clan);
        }
    }

    vacate(l, target, player, policy);
    Ok(())
}

fn force_join_team(l: &mut League, player: Uuid, team: Uuid) -> MembershipResult<()> {
    l.require_player(player)?;
    let clan = l.require_team(team)?.clan;
    let target = Target::Team(team);

    if l.is_member(target, player) {
        return Err(MembershipError::AlreadyMember { target });
    }

    if let Some(clan) = clan {
        if l.player_clan(player) != Some(clan) {
            request_join(l, player, Target::Clan(clan))?;
        }
    }

    // Entering the clan may already have settled a parked team request.
    if l.is_member(target, player) {
        return Ok(());
    }
    request_join(l, player, target)
}

fn transfer(l: &mut League, target: Target, player: Uuid) -> MembershipResult<()> {
    l.require_player(player)?;
    l.require_target(target)?;

    if !l.is_member(target, player) {
        return Err(MembershipError::NotAMember { target });
    }
    log::info!("leadership of {target} handed to {player}");
    l.set_leader(target, Some(player));
    Ok(())
}

/// Make `player` a member, and leader if the target has none.
fn admit(l: &mut League, target: Target, player: Uuid) {
    l.add_member(target, player);
    if l.leader(target).is_none() {
        l.set_leader(target, Some(player));
    }

    match target {
        Target::Team(team) => {
            let stale = l
                .team(team)
                .and_then(|t| t.clan_pending)
                .is_some_and(|wanted| l.player_clan(player) != Some(wanted));
            if stale {
                l.clear_clan_pending(team);
            }
        }
        Target::Clan(clan) => enter_clan(l, clan, player),
    }
}

/// Housekeeping once a player has become a member of `clan`.
fn enter_clan(l: &mut League, clan: Uuid, player: Uuid) {
    let other_clans: Vec<Uuid> = l
        .clan_requests_of(player)
        .iter()
        .map(|c| c.id)
        .filter(|c| *c != clan)
        .collect();
    for c in other_clans {
        l.remove_pending(Target::Clan(c), player);
    }

    let foreign_teams: Vec<Uuid> = l
        .team_requests_of(player)
        .iter()
        .filter(|t| t.clan.is_some_and(|c| c != clan))
        .map(|t| t.id)
        .collect();
    for t in foreign_teams {
        l.remove_pending(Target::Team(t), player);
    }

    // Requests parked while the clan request was open.
    let parked: Vec<Uuid> = l
        .team_requests_of(player)
        .iter()
        .filter(|t| t.clan == Some(clan) && t.leader.is_none())
        .map(|t| t.id)
        .collect();
    for t in parked {
        l.remove_pending(Target::Team(t), player);
        log::info!("{player} founds leaderless team {t} on entering clan {clan}");
        admit(l, Target::Team(t), player);
    }
}

/// Remove a member and, if it was the leader, run succession.
fn vacate(l: &mut League, target: Target, player: Uuid, policy: &Policy) {
    let was_leader = l.leader(target) == Some(player);
    if was_leader {
        l.set_leader(target, None);
    }
    l.remove_member(target, player);
    if was_leader {
        succeed(l, target, policy);
    }
}

fn succeed(l: &mut League, target: Target, policy: &Policy) {
    let first = l.members(target).first().copied();
    if let Some(next) = first {
        log::info!("{next} succeeds as leader of {target}");
        l.set_leader(target, Some(next));
        return;
    }
    if !policy.promote_pending_on_empty {
        log::info!("{target} is now empty and leaderless");
        return;
    }

    let candidate = l
        .pending(target)
        .iter()
        .copied()
        .find(|p| eligible(l, target, *p));
    match candidate {
        Some(p) => {
            log::info!("pending requester {p} promoted to lead empty {target}");
            l.remove_pending(target, p);
            admit(l, target, p);
        }
        None => log::info!("{target} is now empty and leaderless"),
    }
}

/// Whether a pending requester could be admitted without breaking the clan rules.
fn eligible(l: &League, target: Target, player: Uuid) -> bool {
    match target {
        Target::Team(team) => match l.team(team).and_then(|t| t.clan) {
            Some(clan) => l.player_clan(player) == Some(clan),
            None => true,
        },
        Target::Clan(_) => l.player_clan(player).is_none(),
    }
}

fn drop_team_requests_in_clan(l: &mut League, player: Uuid, clan: Uuid) {
    let teams: Vec<Uuid> = l
        .team_requests_of(player)
        .iter()
        .filter(|t| t.clan == Some(clan))
        .map(|t| t.id)
        .collect();
    for t in teams {
        l.remove_pending(Target::Team(t), player);
    }
}
