//! In-memory membership graph.
//!
//! `League` holds players, teams and clans together with the membership,
//! leadership and pending-request edges between them. Member and pending
//! lists keep insertion order, which is what leadership succession walks.
//!
//! Mutating primitives are crate-private and append to a change journal;
//! the engine drains that journal into an [`Outcome`](super::Outcome).
//! The `insert_*` / `restore_*` loaders do not journal: they rebuild a
//! graph that already exists in storage.

use std::collections::BTreeMap;
use uuid::Uuid;

use super::error::{MembershipError, MembershipResult, TeamRef};
use super::types::{Change, MembershipStatus, Target};

#[derive(Debug, Clone)]
pub struct PlayerNode {
    pub id: Uuid,
    pub nickname: String,
    pub clan: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct TeamNode {
    pub id: Uuid,
    pub name: String,
    pub clan: Option<Uuid>,
    /// Clan this team has asked to be affiliated with.
    pub clan_pending: Option<Uuid>,
    pub leader: Option<Uuid>,
    pub members: Vec<Uuid>,
    pub pending: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ClanNode {
    pub id: Uuid,
    pub name: String,
    pub leader: Option<Uuid>,
    pub members: Vec<Uuid>,
    pub pending: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct League {
    players: BTreeMap<Uuid, PlayerNode>,
    teams: BTreeMap<Uuid, TeamNode>,
    clans: BTreeMap<Uuid, ClanNode>,
    journal: Vec<Change>,
}

impl League {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------- loading ----------

    pub fn insert_player(&mut self, id: Uuid, nickname: impl Into<String>) {
        self.players.insert(
            id,
            PlayerNode {
                id,
                nickname: nickname.into(),
                clan: None,
            },
        );
    }

    pub fn insert_clan(&mut self, id: Uuid, name: impl Into<String>) {
        self.clans.insert(
            id,
            ClanNode {
                id,
                name: name.into(),
                leader: None,
                members: Vec::new(),
                pending: Vec::new(),
            },
        );
    }

    pub fn insert_team(&mut self, id: Uuid, name: impl Into<String>, clan: Option<Uuid>) {
        self.teams.insert(
            id,
            TeamNode {
                id,
                name: name.into(),
                clan,
                clan_pending: None,
                leader: None,
                members: Vec::new(),
                pending: Vec::new(),
            },
        );
    }

    /// Re-attach a stored member edge. Rows referring to unknown ids are skipped.
    pub fn restore_member(&mut self, target: Target, player: Uuid) {
        if !self.players.contains_key(&player) {
            return;
        }
        match target {
            Target::Team(id) => {
                if let Some(t) = self.teams.get_mut(&id) {
                    t.members.push(player);
                }
            }
            Target::Clan(id) => {
                if let Some(c) = self.clans.get_mut(&id) {
                    c.members.push(player);
                    if let Some(p) = self.players.get_mut(&player) {
                        p.clan = Some(id);
                    }
                }
            }
        }
    }

    pub fn restore_pending(&mut self, target: Target, player: Uuid) {
        if !self.players.contains_key(&player) || self.is_member(target, player) {
            return;
        }
        if let Some(list) = self.pending_mut(target) {
            list.push(player);
        }
    }

    /// Re-attach a stored leader, after the member edges.
    ///
    /// A stored leader that is not a member, or a missing leader on a
    /// non-empty roster, is replaced by the first member.
    pub fn restore_leader(&mut self, target: Target, leader: Option<Uuid>) {
        let (stored, members) = match target {
            Target::Team(id) => match self.teams.get_mut(&id) {
                Some(t) => (&mut t.leader, &t.members),
                None => return,
            },
            Target::Clan(id) => match self.clans.get_mut(&id) {
                Some(c) => (&mut c.leader, &c.members),
                None => return,
            },
        };

        let fixed = match leader {
            Some(l) if members.contains(&l) => Some(l),
            _ => members.first().copied(),
        };
        if fixed != leader {
            log::warn!("{target}: stored leader {leader:?} is inconsistent, using {fixed:?}");
        }
        *stored = fixed;
    }

    pub fn restore_clan_pending(&mut self, team: Uuid, clan: Option<Uuid>) {
        if let Some(t) = self.teams.get_mut(&team) {
            t.clan_pending = clan;
        }
    }

    // ---------- queries ----------

    pub fn player(&self, id: Uuid) -> Option<&PlayerNode> {
        self.players.get(&id)
    }

    pub fn team(&self, id: Uuid) -> Option<&TeamNode> {
        self.teams.get(&id)
    }

    pub fn clan(&self, id: Uuid) -> Option<&ClanNode> {
        self.clans.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerNode> {
        self.players.values()
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamNode> {
        self.teams.values()
    }

    pub fn clans(&self) -> impl Iterator<Item = &ClanNode> {
        self.clans.values()
    }

    pub fn require_player(&self, id: Uuid) -> MembershipResult<&PlayerNode> {
        self.players
            .get(&id)
            .ok_or(MembershipError::UnknownPlayer { id })
    }

    pub fn require_team(&self, id: Uuid) -> MembershipResult<&TeamNode> {
        self.teams.get(&id).ok_or(MembershipError::UnknownTeam { id })
    }

    pub fn require_clan(&self, id: Uuid) -> MembershipResult<&ClanNode> {
        self.clans.get(&id).ok_or(MembershipError::UnknownClan { id })
    }

    pub fn require_target(&self, target: Target) -> MembershipResult<()> {
        match target {
            Target::Team(id) => self.require_team(id).map(|_| ()),
            Target::Clan(id) => self.require_clan(id).map(|_| ()),
        }
    }

    /// Clan the player currently belongs to.
    pub fn player_clan(&self, player: Uuid) -> Option<Uuid> {
        self.players.get(&player).and_then(|p| p.clan)
    }

    pub fn leader(&self, target: Target) -> Option<Uuid> {
        match target {
            Target::Team(id) => self.teams.get(&id).and_then(|t| t.leader),
            Target::Clan(id) => self.clans.get(&id).and_then(|c| c.leader),
        }
    }

    pub fn members(&self, target: Target) -> &[Uuid] {
        match target {
            Target::Team(id) => self.teams.get(&id).map(|t| t.members.as_slice()).unwrap_or(&[]),
            Target::Clan(id) => self.clans.get(&id).map(|c| c.members.as_slice()).unwrap_or(&[]),
        }
    }

    pub fn pending(&self, target: Target) -> &[Uuid] {
        match target {
            Target::Team(id) => self.teams.get(&id).map(|t| t.pending.as_slice()).unwrap_or(&[]),
            Target::Clan(id) => self.clans.get(&id).map(|c| c.pending.as_slice()).unwrap_or(&[]),
        }
    }

    pub fn is_member(&self, target: Target, player: Uuid) -> bool {
        self.members(target).contains(&player)
    }

    pub fn is_pending(&self, target: Target, player: Uuid) -> bool {
        self.pending(target).contains(&player)
    }

    pub fn status(&self, player: Uuid, target: Target) -> MembershipStatus {
        if self.leader(target) == Some(player) {
            MembershipStatus::Leader
        } else if self.is_member(target, player) {
            MembershipStatus::Member
        } else if self.is_pending(target, player) {
            MembershipStatus::Pending
        } else {
            MembershipStatus::NonMember
        }
    }

    pub fn clan_name(&self, clan: Uuid) -> String {
        self.clans
            .get(&clan)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    /// Teams of `clan` that `player` is a member of.
    pub fn clan_teams_of(&self, clan: Uuid, player: Uuid) -> Vec<TeamRef> {
        self.teams
            .values()
            .filter(|t| t.clan == Some(clan) && t.members.contains(&player))
            .map(|t| TeamRef {
                id: t.id,
                name: t.name.clone(),
            })
            .collect()
    }

    /// Teams the player is waiting to join, in id order.
    pub fn team_requests_of(&self, player: Uuid) -> Vec<&TeamNode> {
        self.teams
            .values()
            .filter(|t| t.pending.contains(&player))
            .collect()
    }

    pub fn clan_requests_of(&self, player: Uuid) -> Vec<&ClanNode> {
        self.clans
            .values()
            .filter(|c| c.pending.contains(&player))
            .collect()
    }

    pub fn teams_of(&self, player: Uuid) -> Vec<&TeamNode> {
        self.teams
            .values()
            .filter(|t| t.members.contains(&player))
            .collect()
    }

    // ---------- journaled primitives ----------

    pub(crate) fn add_member(&mut self, target: Target, player: Uuid) {
        match target {
            Target::Team(id) => {
                let team = self.teams.get_mut(&id).expect("team checked by caller");
                assert!(!team.members.contains(&player), "duplicate team member");
                team.members.push(player);
            }
            Target::Clan(id) => {
                let node = self.players.get_mut(&player).expect("player checked by caller");
                assert!(node.clan.is_none(), "player already in a clan");
                node.clan = Some(id);
                let clan = self.clans.get_mut(&id).expect("clan checked by caller");
                clan.members.push(player);
            }
        }
        self.journal.push(Change::MemberAdded { target, player });
    }

    /// Drops the member edge only; the caller handles leadership.
    pub(crate) fn remove_member(&mut self, target: Target, player: Uuid) {
        match target {
            Target::Team(id) => {
                if let Some(team) = self.teams.get_mut(&id) {
                    team.members.retain(|m| *m != player);
                }
            }
            Target::Clan(id) => {
                if let Some(clan) = self.clans.get_mut(&id) {
                    clan.members.retain(|m| *m != player);
                }
                if let Some(node) = self.players.get_mut(&player) {
                    node.clan = None;
                }
            }
        }
        self.journal.push(Change::MemberRemoved { target, player });
    }

    pub(crate) fn set_leader(&mut self, target: Target, leader: Option<Uuid>) {
        if let Some(l) = leader {
            assert!(self.is_member(target, l), "leader must be a member of {target}");
        }
        if self.leader(target) == leader {
            return;
        }
        match target {
            Target::Team(id) => {
                if let Some(team) = self.teams.get_mut(&id) {
                    team.leader = leader;
                }
            }
            Target::Clan(id) => {
                if let Some(clan) = self.clans.get_mut(&id) {
                    clan.leader = leader;
                }
            }
        }
        self.journal.push(Change::LeaderChanged { target, leader });
    }

    pub(crate) fn add_pending(&mut self, target: Target, player: Uuid) {
        if let Some(list) = self.pending_mut(target) {
            if !list.contains(&player) {
                list.push(player);
                self.journal.push(Change::PendingAdded { target, player });
            }
        }
    }

    /// Returns whether a request was actually removed.
    pub(crate) fn remove_pending(&mut self, target: Target, player: Uuid) -> bool {
        let removed = match self.pending_mut(target) {
            Some(list) => {
                let before = list.len();
                list.retain(|p| *p != player);
                list.len() != before
            }
            None => false,
        };
        if removed {
            self.journal.push(Change::PendingRemoved { target, player });
        }
        removed
    }

    pub(crate) fn clear_clan_pending(&mut self, team: Uuid) {
        if let Some(t) = self.teams.get_mut(&team) {
            if t.clan_pending.take().is_some() {
                self.journal.push(Change::ClanAffiliationCleared { team });
            }
        }
    }

    pub(crate) fn take_journal(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.journal)
    }

    fn pending_mut(&mut self, target: Target) -> Option<&mut Vec<Uuid>> {
        match target {
            Target::Team(id) => self.teams.get_mut(&id).map(|t| &mut t.pending),
            Target::Clan(id) => self.clans.get_mut(&id).map(|c| &mut c.pending),
        }
    }

    // ---------- consistency ----------

    /// Checks the structural invariants of the graph, describing the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let groups = self
            .teams
            .values()
            .map(|t| (Target::Team(t.id), t.leader, &t.members, &t.pending))
            .chain(
                self.clans
                    .values()
                    .map(|c| (Target::Clan(c.id), c.leader, &c.members, &c.pending)),
            );

        for (target, leader, members, pending) in groups {
            match leader {
                None if !members.is_empty() => {
                    return Err(format!("{target} has members but no leader"))
                }
                Some(_) if members.is_empty() => {
                    return Err(format!("{target} has a leader but no members"))
                }
                Some(l) if !members.contains(&l) => {
                    return Err(format!("leader {l} of {target} is not a member"))
                }
                _ => {}
            }
            if let Some(p) = pending.iter().find(|p| members.contains(*p)) {
                return Err(format!("player {p} is both pending and member of {target}"));
            }
        }

        for player in self.players.values() {
            let listed: Vec<Uuid> = self
                .clans
                .values()
                .filter(|c| c.members.contains(&player.id))
                .map(|c| c.id)
                .collect();
            let expected: Vec<Uuid> = player.clan.into_iter().collect();
            if listed != expected {
                return Err(format!(
                    "player {} clan {:?} disagrees with clan rosters {:?}",
                    player.id, player.clan, listed
                ));
            }
        }

        for team in self.teams.values() {
            if let Some(clan) = team.clan {
                if let Some(m) = team
                    .members
                    .iter()
                    .find(|m| self.player_clan(**m) != Some(clan))
                {
                    return Err(format!("member {m} of team {} is outside its clan", team.id));
                }
            }
        }
        Ok(())
    }
}
