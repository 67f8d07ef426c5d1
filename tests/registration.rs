mod common;

use common::Fixture;
use league_server::registration::{authorize, check_registration, RegistrationError, TournamentEntry};
use uuid::Uuid;

fn cup(team_player_count: u16) -> TournamentEntry {
    TournamentEntry {
        id: Uuid::new_v4(),
        name: "Spring Cup".into(),
        team_player_count,
        registered: Vec::new(),
    }
}

/// A clan with one full team of `size` players; returns (leader, clan team ids).
fn clan_with_teams(f: &mut Fixture, teams: usize, size: usize) -> (Uuid, Vec<Uuid>) {
    let c = f.clan("Ravens");
    let roster: Vec<Uuid> = (0..size).map(|i| f.player(&format!("r{i}"))).collect();
    for p in &roster {
        f.seat(*p, c);
    }
    let mut ids = Vec::new();
    for i in 0..teams {
        let t = f.team(&format!("Ravens {i}"), Some(c));
        for p in &roster {
            f.seat(*p, t);
        }
        ids.push(t.id());
    }
    (roster[0], ids)
}

#[test]
fn full_team_registers() {
    let mut f = Fixture::new();
    let (_, teams) = clan_with_teams(&mut f, 1, 5);
    assert_eq!(check_registration(&f.league, &cup(5), teams[0]), Ok(()));
}

#[test]
fn short_team_is_refused_with_counts() {
    let mut f = Fixture::new();
    let (_, teams) = clan_with_teams(&mut f, 1, 3);
    assert_eq!(
        check_registration(&f.league, &cup(5), teams[0]),
        Err(RegistrationError::NotEnoughPlayers {
            required: 5,
            actual: 3
        })
    );
}

#[test]
fn second_team_of_a_clan_is_refused() {
    let mut f = Fixture::new();
    let (_, teams) = clan_with_teams(&mut f, 2, 2);
    let mut t = cup(2);
    t.registered.push(teams[0]);

    assert_eq!(
        check_registration(&f.league, &t, teams[0]),
        Err(RegistrationError::AlreadyRegistered)
    );
    match check_registration(&f.league, &t, teams[1]) {
        Err(RegistrationError::ClanAlreadyRegistered { team_id, .. }) => {
            assert_eq!(team_id, teams[0])
        }
        other => panic!("unexpected verdict: {other:?}"),
    }
}

#[test]
fn clanless_teams_do_not_block_each_other() {
    let mut f = Fixture::new();
    let a = f.team("Drifters", None);
    let b = f.team("Nomads", None);
    let p = f.player("p");
    let q = f.player("q");
    f.seat(p, a);
    f.seat(q, b);

    let mut t = cup(1);
    t.registered.push(a.id());
    assert_eq!(check_registration(&f.league, &t, b.id()), Ok(()));
}

#[test]
fn unknown_team_is_reported() {
    let f = Fixture::new();
    let ghost = Uuid::new_v4();
    assert_eq!(
        check_registration(&f.league, &cup(1), ghost),
        Err(RegistrationError::UnknownTeam { id: ghost })
    );
}

#[test]
fn only_the_leader_signs_up() {
    let mut f = Fixture::new();
    let (leader, teams) = clan_with_teams(&mut f, 1, 2);
    let member = f.league.members(league_server::membership::Target::Team(teams[0]))[1];

    assert_eq!(authorize(&f.league, leader, teams[0]), Ok(()));
    assert_eq!(
        authorize(&f.league, member, teams[0]),
        Err(RegistrationError::NotAuthorized { actor: member })
    );
}
