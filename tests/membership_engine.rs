//! Join / confirm / cancel / leave / kick behaviour of the membership engine.

mod common;

use common::Fixture;
use league_server::membership::{
    apply, authorize, Change, ClanLeavePolicy, Intent, League, MembershipError, MembershipStatus,
    Policy, Target,
};
use uuid::Uuid;

#[test]
fn joining_leaderless_team_makes_player_leader() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let t = f.team("Rookies", None);

    let out = f.request(p, t).unwrap();

    assert_eq!(out.status, MembershipStatus::Leader);
    assert_eq!(f.leader(t), Some(p));
    assert_eq!(f.members(t), vec![p]);
    assert!(f.pending(t).is_empty());
}

#[test]
fn joining_led_clan_only_queues_request() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let c = f.clan("Wolves");
    f.seat(l, c);

    let out = f.request(p, c).unwrap();

    assert_eq!(out.status, MembershipStatus::Pending);
    assert_eq!(f.members(c), vec![l]);
    assert_eq!(f.leader(c), Some(l));
    assert_eq!(f.pending(c), vec![p]);
    assert_eq!(f.league.player_clan(p), None);
}

#[test]
fn sole_leader_leaving_team_empties_it() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let t = f.team("Solo", None);
    f.seat(l, t);

    let out = f.run(Intent::Leave { player: l, target: t }).unwrap();

    assert_eq!(out.status, MembershipStatus::NonMember);
    assert_eq!(f.leader(t), None);
    assert!(f.members(t).is_empty());
}

#[test]
fn team_under_clan_requires_clan_membership() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let c = f.clan("Ravens");
    let t = f.team("Ravens A", Some(c));

    let err = f.request(p, t).unwrap_err();

    assert_eq!(
        err,
        MembershipError::NeedsClanMembership {
            clan_id: c.id(),
            clan_name: "Ravens".into(),
        }
    );
    assert!(f.pending(t).is_empty());
}

#[test]
fn clan_leader_leaving_hands_over_to_remaining_member() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let m = f.player("member");
    let c = f.clan("Owls");
    f.seat(l, c);
    f.seat(m, c);

    f.run(Intent::Leave { player: l, target: c }).unwrap();

    assert_eq!(f.leader(c), Some(m));
    assert_eq!(f.members(c), vec![m]);
    assert_eq!(f.league.player_clan(l), None);
}

#[test]
fn team_request_is_parked_while_clan_request_is_open() {
    let mut f = Fixture::new();
    let l = f.player("clan leader");
    let captain = f.player("captain");
    let p = f.player("p");
    let c = f.clan("Hawks");
    let t = f.team("Hawks A", Some(c));
    f.seat(l, c);
    f.seat(captain, c);
    f.seat(captain, t);

    f.request(p, c).unwrap();
    let out = f.request(p, t).unwrap();

    assert_eq!(out.status, MembershipStatus::Pending);
    assert_eq!(f.pending(t), vec![p]);

    // Still cannot be let into the team before the clan accepts.
    let err = f
        .run(Intent::ConfirmJoin { target: t, player: p })
        .unwrap_err();
    assert!(matches!(err, MembershipError::NeedsClanMembership { .. }));

    f.run(Intent::ConfirmJoin { target: c, player: p }).unwrap();
    f.run(Intent::ConfirmJoin { target: t, player: p }).unwrap();
    assert_eq!(f.members(t), vec![captain, p]);
}

#[test]
fn parked_request_to_empty_team_settles_when_clan_accepts() {
    let mut f = Fixture::new();
    let l = f.player("clan leader");
    let p = f.player("p");
    let c = f.clan("Foxes");
    let t = f.team("Foxes B", Some(c));
    f.seat(l, c);

    f.request(p, c).unwrap();
    f.request(p, t).unwrap();
    assert_eq!(f.pending(t), vec![p]);

    let out = f.run(Intent::ConfirmJoin { target: c, player: p }).unwrap();

    assert_eq!(f.leader(t), Some(p));
    assert!(f.pending(t).is_empty());
    assert!(out.changes.contains(&Change::MemberAdded { target: t, player: p }));
}

#[test]
fn leaving_clan_cascades_to_its_teams_only() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let q = f.player("q");
    let c = f.clan("Bears");
    let t1 = f.team("Bears 1", Some(c));
    let t2 = f.team("Bears 2", Some(c));
    let free = f.team("Pickup", None);
    f.seat(p, c);
    f.seat(q, c);
    f.seat(p, t1);
    f.seat(q, t1);
    f.seat(p, t2);
    f.seat(p, free);

    f.run(Intent::Leave { player: p, target: c }).unwrap();

    assert!(!f.league.is_member(t1, p));
    assert!(!f.league.is_member(t2, p));
    assert!(f.league.is_member(free, p));
    assert_eq!(f.leader(t1), Some(q));
    assert_eq!(f.leader(t2), None);
    assert_eq!(f.league.player_clan(p), None);
    assert_eq!(f.leader(c), Some(q));
}

#[test]
fn refuse_policy_reports_blocking_teams_and_changes_nothing() {
    let mut f = Fixture::with_policy(Policy {
        clan_leave: ClanLeavePolicy::Refuse,
        ..Policy::default()
    });
    let p = f.player("p");
    let c = f.clan("Lynx");
    let t = f.team("Lynx Prime", Some(c));
    f.seat(p, c);
    f.seat(p, t);

    let err = f.run(Intent::Leave { player: p, target: c }).unwrap_err();

    match err {
        MembershipError::HasDependentTeams { teams } => {
            assert_eq!(teams.len(), 1);
            assert_eq!(teams[0].id, t.id());
            assert_eq!(teams[0].name, "Lynx Prime");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(f.league.player_clan(p), Some(c.id()));
    assert_eq!(f.leader(t), Some(p));

    // Kicks are never refused.
    f.run(Intent::Kick { player: p, target: c }).unwrap();
    assert!(f.members(t).is_empty());
}

#[test]
fn force_leave_cascades_after_refusal() {
    let mut f = Fixture::with_policy(Policy {
        clan_leave: ClanLeavePolicy::Refuse,
        ..Policy::default()
    });
    let p = f.player("p");
    let q = f.player("q");
    let c = f.clan("Otters");
    let t1 = f.team("Otters 1", Some(c));
    let t2 = f.team("Otters 2", Some(c));
    f.seat(p, c);
    f.seat(q, c);
    f.seat(p, t1);
    f.seat(q, t1);
    f.seat(p, t2);

    let err = f.run(Intent::Leave { player: p, target: c }).unwrap_err();
    assert!(matches!(err, MembershipError::HasDependentTeams { .. }));

    assert_eq!(
        authorize(&f.league, p, &Intent::ForceLeave { player: p, target: c }),
        Ok(())
    );
    let out = f
        .run(Intent::ForceLeave { player: p, target: c })
        .unwrap();

    assert_eq!(out.status, MembershipStatus::NonMember);
    assert_eq!(f.league.player_clan(p), None);
    assert!(!f.league.is_member(t1, p));
    assert!(!f.league.is_member(t2, p));
    assert_eq!(f.leader(t1), Some(q));
    assert_eq!(f.leader(c), Some(q));
}

#[test]
fn force_leave_of_a_team_is_a_plain_leave() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let t = f.team("Drifters", None);
    f.seat(p, t);

    let out = f.run(Intent::ForceLeave { player: p, target: t }).unwrap();

    assert_eq!(out.status, MembershipStatus::NonMember);
    assert_eq!(f.leader(t), None);
}

#[test]
fn badly_seeded_leader_is_repaired_on_load() {
    let mut league = League::new();
    let a = Uuid::new_v4();
    let ghost = Uuid::new_v4();
    let t = Uuid::new_v4();
    let empty = Uuid::new_v4();
    league.insert_player(a, "a");
    league.insert_player(ghost, "ghost");
    league.insert_team(t, "Seeded", None);
    league.insert_team(empty, "Hollow", None);
    league.restore_member(Target::Team(t), a);
    league.restore_pending(Target::Team(t), a);
    league.restore_leader(Target::Team(t), Some(ghost));
    league.restore_leader(Target::Team(empty), Some(ghost));

    assert_eq!(league.leader(Target::Team(t)), Some(a));
    assert!(league.pending(Target::Team(t)).is_empty());
    assert_eq!(league.leader(Target::Team(empty)), None);
    assert_eq!(league.check_invariants(), Ok(()));

    // Unrelated intents keep working on the loaded graph.
    let p = Uuid::new_v4();
    league.insert_player(p, "p");
    let out = apply(
        &mut league,
        &Intent::RequestJoin {
            player: p,
            target: Target::Team(empty),
        },
        &Policy::default(),
    )
    .unwrap();
    assert_eq!(out.status, MembershipStatus::Leader);
}

#[test]
fn clan_kick_purges_requests_to_clan_teams() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let c = f.clan("Sharks");
    let t = f.team("Sharks A", Some(c));
    let free = f.team("Open", None);
    f.seat(l, c);
    f.seat(l, t);
    f.seat(l, free);
    f.seat(p, c);
    f.request(p, t).unwrap();
    f.request(p, free).unwrap();

    f.run(Intent::Kick { player: p, target: c }).unwrap();

    assert!(f.pending(t).is_empty());
    assert_eq!(f.pending(free), vec![p]);
    assert_eq!(f.league.player_clan(p), None);
}

#[test]
fn leaving_clan_keeps_requests_to_its_teams() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let c = f.clan("Eels");
    let t = f.team("Eels A", Some(c));
    f.seat(l, c);
    f.seat(l, t);
    f.seat(p, c);
    f.request(p, t).unwrap();

    f.run(Intent::Leave { player: p, target: c }).unwrap();

    assert_eq!(f.pending(t), vec![p]);
}

#[test]
fn cancelling_missing_request_is_a_noop() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let t = f.team("Nobody", None);

    let out = f.run(Intent::CancelRequest { player: p, target: t }).unwrap();

    assert!(out.is_noop());
    assert_eq!(out.status, MembershipStatus::NonMember);
}

#[test]
fn cancelling_clan_request_drops_parked_team_requests() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let c = f.clan("Moths");
    let t = f.team("Moths A", Some(c));
    f.seat(l, c);
    f.seat(l, t);
    f.request(p, c).unwrap();
    f.request(p, t).unwrap();

    let out = f.run(Intent::CancelRequest { player: p, target: c }).unwrap();

    assert!(f.pending(c).is_empty());
    assert!(f.pending(t).is_empty());
    assert_eq!(out.changes.len(), 2);
}

#[test]
fn founding_a_clan_clears_conflicting_requests() {
    let mut f = Fixture::new();
    let l = f.player("other leader");
    let p = f.player("p");
    let other = f.clan("Other");
    let other_team = f.team("Other A", Some(other));
    let free = f.team("Free", None);
    let mine = f.clan("Mine");
    f.seat(l, other);
    f.seat(l, other_team);
    f.seat(l, free);
    f.request(p, other).unwrap();
    f.request(p, other_team).unwrap();
    f.request(p, free).unwrap();

    let out = f.request(p, mine).unwrap();

    assert_eq!(out.status, MembershipStatus::Leader);
    assert!(f.pending(other).is_empty());
    assert!(f.pending(other_team).is_empty());
    assert_eq!(f.pending(free), vec![p]);
}

#[test]
fn joining_team_drops_affiliation_request_to_foreign_clan() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let wanted = f.clan("Wanted");
    let t = f.team("Drifters", None);
    f.league.restore_clan_pending(t.id(), Some(wanted.id()));

    let out = f.request(p, t).unwrap();

    assert!(out
        .changes
        .contains(&Change::ClanAffiliationCleared { team: t.id() }));
    assert_eq!(f.league.team(t.id()).unwrap().clan_pending, None);
}

#[test]
fn affiliation_request_survives_member_from_that_clan() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let wanted = f.clan("Wanted");
    let t = f.team("Drifters", None);
    f.seat(p, wanted);
    f.league.restore_clan_pending(t.id(), Some(wanted.id()));

    f.request(p, t).unwrap();

    assert_eq!(
        f.league.team(t.id()).unwrap().clan_pending,
        Some(wanted.id())
    );
}

#[test]
fn precondition_errors() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let c = f.clan("Crows");
    let other = f.clan("Jays");
    let t = f.team("Crows A", None);
    f.seat(l, c);
    f.seat(l, t);
    f.seat(p, other);

    assert_eq!(
        f.request(l, t).unwrap_err(),
        MembershipError::AlreadyMember { target: t }
    );
    assert_eq!(
        f.run(Intent::Leave { player: p, target: t }).unwrap_err(),
        MembershipError::NotAMember { target: t }
    );
    assert_eq!(
        f.run(Intent::ConfirmJoin { target: t, player: p })
            .unwrap_err(),
        MembershipError::NotPending { target: t }
    );
    assert_eq!(
        f.run(Intent::DeclineRequest { target: t, player: p })
            .unwrap_err(),
        MembershipError::NotPending { target: t }
    );
    assert!(matches!(
        f.request(p, c).unwrap_err(),
        MembershipError::InOtherClan { clan_name, .. } if clan_name == "Jays"
    ));
}

#[test]
fn repeated_request_is_idempotent() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let t = f.team("Repeat", None);
    f.seat(l, t);

    f.request(p, t).unwrap();
    let again = f.request(p, t).unwrap();

    assert!(again.is_noop());
    assert_eq!(f.pending(t), vec![p]);
}

#[test]
fn decline_removes_request_without_membership() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let t = f.team("Picky", None);
    f.seat(l, t);
    f.request(p, t).unwrap();

    let out = f.run(Intent::DeclineRequest { target: t, player: p }).unwrap();

    assert_eq!(out.status, MembershipStatus::NonMember);
    assert!(f.pending(t).is_empty());
    assert_eq!(f.members(t), vec![l]);
}

#[test]
fn unknown_ids_are_reported() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let ghost = uuid::Uuid::new_v4();

    assert_eq!(
        f.request(p, Target::Team(ghost)).unwrap_err(),
        MembershipError::UnknownTeam { id: ghost }
    );
    let c = f.clan("Real");
    assert_eq!(
        f.request(ghost, c).unwrap_err(),
        MembershipError::UnknownPlayer { id: ghost }
    );
}

#[test]
fn force_join_enters_empty_clan_and_team() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let c = f.clan("Empty");
    let t = f.team("Empty A", Some(c));

    let out = f
        .run(Intent::ForceJoinTeam { player: p, team: t.id() })
        .unwrap();

    assert_eq!(out.status, MembershipStatus::Leader);
    assert_eq!(f.leader(c), Some(p));
    assert_eq!(f.leader(t), Some(p));
}

#[test]
fn force_join_into_led_clan_leaves_both_requests_pending() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let c = f.clan("Busy");
    let t = f.team("Busy A", Some(c));
    f.seat(l, c);
    f.seat(l, t);

    let out = f
        .run(Intent::ForceJoinTeam { player: p, team: t.id() })
        .unwrap();

    assert_eq!(out.status, MembershipStatus::Pending);
    assert_eq!(f.pending(c), vec![p]);
    assert_eq!(f.pending(t), vec![p]);
}

#[test]
fn force_join_from_another_clan_is_refused_untouched() {
    let mut f = Fixture::new();
    let p = f.player("p");
    let mine = f.clan("Mine");
    let theirs = f.clan("Theirs");
    let t = f.team("Theirs A", Some(theirs));
    f.seat(p, mine);

    let err = f
        .run(Intent::ForceJoinTeam { player: p, team: t.id() })
        .unwrap_err();

    assert!(matches!(err, MembershipError::InOtherClan { .. }));
    assert!(f.pending(theirs).is_empty());
    assert!(f.members(theirs).is_empty());
}

#[test]
fn leadership_transfer_needs_a_member() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let m = f.player("member");
    let outsider = f.player("outsider");
    let t = f.team("Relay", None);
    f.seat(l, t);
    f.seat(m, t);

    f.run(Intent::TransferLeadership { target: t, player: m })
        .unwrap();
    assert_eq!(f.leader(t), Some(m));

    assert_eq!(
        f.run(Intent::TransferLeadership {
            target: t,
            player: outsider
        })
        .unwrap_err(),
        MembershipError::NotAMember { target: t }
    );
}

#[test]
fn authorization_gate() {
    let mut f = Fixture::new();
    let l = f.player("leader");
    let p = f.player("p");
    let t = f.team("Gate", None);
    f.seat(l, t);
    f.request(p, t).unwrap();

    let confirm = Intent::ConfirmJoin { target: t, player: p };
    assert_eq!(
        authorize(&f.league, p, &confirm),
        Err(MembershipError::NotAuthorized { actor: p })
    );
    assert_eq!(authorize(&f.league, l, &confirm), Ok(()));

    let leave = Intent::Leave { player: p, target: t };
    assert_eq!(authorize(&f.league, p, &leave), Ok(()));
    assert_eq!(
        authorize(&f.league, l, &leave),
        Err(MembershipError::NotAuthorized { actor: l })
    );
}
