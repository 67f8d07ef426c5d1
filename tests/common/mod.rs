//! Shared fixture for engine tests: a league built through the engine itself.
#![allow(dead_code)]

use league_server::membership::{
    apply, Intent, League, MembershipResult, Outcome, Policy, Target,
};
use uuid::Uuid;

pub struct Fixture {
    pub league: League,
    pub policy: Policy,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_policy(Policy::default())
    }

    pub fn with_policy(policy: Policy) -> Self {
        Fixture {
            league: League::new(),
            policy,
        }
    }

    pub fn player(&mut self, nickname: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.league.insert_player(id, nickname);
        id
    }

    pub fn clan(&mut self, name: &str) -> Target {
        let id = Uuid::new_v4();
        self.league.insert_clan(id, name);
        Target::Clan(id)
    }

    pub fn team(&mut self, name: &str, clan: Option<Target>) -> Target {
        let id = Uuid::new_v4();
        self.league.insert_team(id, name, clan.map(Target::id));
        Target::Team(id)
    }

    /// Run an intent and check the graph invariants afterwards, whatever the verdict.
    pub fn run(&mut self, intent: Intent) -> MembershipResult<Outcome> {
        let res = apply(&mut self.league, &intent, &self.policy);
        if let Err(msg) = self.league.check_invariants() {
            panic!("invariant broken after {intent:?}: {msg}");
        }
        res
    }

    pub fn request(&mut self, player: Uuid, target: Target) -> MembershipResult<Outcome> {
        self.run(Intent::RequestJoin { player, target })
    }

    /// Make `player` a member: bootstrap if leaderless, else request + confirm.
    pub fn seat(&mut self, player: Uuid, target: Target) {
        self.request(player, target).expect("request join");
        if !self.league.is_member(target, player) {
            self.run(Intent::ConfirmJoin { target, player })
                .expect("confirm join");
        }
    }

    pub fn leader(&self, target: Target) -> Option<Uuid> {
        self.league.leader(target)
    }

    pub fn members(&self, target: Target) -> Vec<Uuid> {
        self.league.members(target).to_vec()
    }

    pub fn pending(&self, target: Target) -> Vec<Uuid> {
        self.league.pending(target).to_vec()
    }
}
