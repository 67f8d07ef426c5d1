use anyhow::{Context, Result};
use sqlx::{postgres::PgArguments, query::Query, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::db::models::{ClanRow, EdgeRow, PlayerRow, TeamRow};
use crate::membership::{self, Change, Intent, League, MembershipError, Outcome, Policy, Target};

/// Read the whole membership graph through `conn`.
///
/// Member and pending edges are loaded oldest first so the in-memory lists
/// keep join order.
pub async fn load_league(conn: &mut PgConnection) -> Result<League> {
    let mut league = League::new();

    let players = sqlx::query_as::<_, PlayerRow>("SELECT id, nickname FROM players")
        .fetch_all(&mut *conn)
        .await
        .context("loading players")?;
    for p in players {
        league.insert_player(p.id, p.nickname);
    }

    let clans = sqlx::query_as::<_, ClanRow>("SELECT id, name, leader_id FROM clans")
        .fetch_all(&mut *conn)
        .await
        .context("loading clans")?;
    let teams = sqlx::query_as::<_, TeamRow>(
        "SELECT id, name, clan_id, clan_pending_id, leader_id FROM teams",
    )
    .fetch_all(&mut *conn)
    .await
    .context("loading teams")?;

    for c in &clans {
        league.insert_clan(c.id, c.name.clone());
    }
    for t in &teams {
        league.insert_team(t.id, t.name.clone(), t.clan_id);
        league.restore_clan_pending(t.id, t.clan_pending_id);
    }

    for e in edges(conn, EDGES_CLAN_MEMBERS).await? {
        league.restore_member(Target::Clan(e.group_id), e.player_id);
    }
    for e in edges(conn, EDGES_TEAM_MEMBERS).await? {
        league.restore_member(Target::Team(e.group_id), e.player_id);
    }
    for e in edges(conn, EDGES_CLAN_PENDINGS).await? {
        league.restore_pending(Target::Clan(e.group_id), e.player_id);
    }
    for e in edges(conn, EDGES_TEAM_PENDINGS).await? {
        league.restore_pending(Target::Team(e.group_id), e.player_id);
    }

    for c in clans {
        league.restore_leader(Target::Clan(c.id), c.leader_id);
    }
    for t in teams {
        league.restore_leader(Target::Team(t.id), t.leader_id);
    }

    Ok(league)
}

const EDGES_CLAN_MEMBERS: &str = r#"SELECT clan_id AS group_id, player_id
                                      FROM clan_members
                                     ORDER BY joined_at, player_id"#;
const EDGES_TEAM_MEMBERS: &str = r#"SELECT team_id AS group_id, player_id
                                      FROM team_members
                                     ORDER BY joined_at, player_id"#;
const EDGES_CLAN_PENDINGS: &str = r#"SELECT clan_id AS group_id, player_id
                                       FROM clan_pendings
                                      ORDER BY requested_at, player_id"#;
const EDGES_TEAM_PENDINGS: &str = r#"SELECT team_id AS group_id, player_id
                                       FROM team_pendings
                                      ORDER BY requested_at, player_id"#;

async fn edges(conn: &mut PgConnection, sql: &'static str) -> Result<Vec<EdgeRow>> {
    sqlx::query_as::<_, EdgeRow>(sql)
        .fetch_all(&mut *conn)
        .await
        .context("loading membership edges")
}

/// Replay an engine journal. `clock_timestamp()` keeps rows written within
/// one transaction in journal order.
pub async fn apply_changes(conn: &mut PgConnection, changes: &[Change]) -> Result<()> {
    for change in changes {
        let q: Query<'_, Postgres, PgArguments> = match *change {
            Change::MemberAdded { target: Target::Team(id), player } => sqlx::query(
                "INSERT INTO team_members (team_id, player_id, joined_at)
                 VALUES ($1, $2, clock_timestamp())
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(player),
            Change::MemberAdded { target: Target::Clan(id), player } => sqlx::query(
                "INSERT INTO clan_members (clan_id, player_id, joined_at)
                 VALUES ($1, $2, clock_timestamp())",
            )
            .bind(id)
            .bind(player),
            Change::MemberRemoved { target: Target::Team(id), player } => {
                sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND player_id = $2")
                    .bind(id)
                    .bind(player)
            }
            Change::MemberRemoved { target: Target::Clan(id), player } => {
                sqlx::query("DELETE FROM clan_members WHERE clan_id = $1 AND player_id = $2")
                    .bind(id)
                    .bind(player)
            }
            Change::LeaderChanged { target: Target::Team(id), leader } => {
                sqlx::query("UPDATE teams SET leader_id = $2 WHERE id = $1")
                    .bind(id)
                    .bind(leader)
            }
            Change::LeaderChanged { target: Target::Clan(id), leader } => {
                sqlx::query("UPDATE clans SET leader_id = $2 WHERE id = $1")
                    .bind(id)
                    .bind(leader)
            }
            Change::PendingAdded { target: Target::Team(id), player } => sqlx::query(
                "INSERT INTO team_pendings (team_id, player_id, requested_at)
                 VALUES ($1, $2, clock_timestamp())
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(player),
            Change::PendingAdded { target: Target::Clan(id), player } => sqlx::query(
                "INSERT INTO clan_pendings (clan_id, player_id, requested_at)
                 VALUES ($1, $2, clock_timestamp())
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(player),
            Change::PendingRemoved { target: Target::Team(id), player } => {
                sqlx::query("DELETE FROM team_pendings WHERE team_id = $1 AND player_id = $2")
                    .bind(id)
                    .bind(player)
            }
            Change::PendingRemoved { target: Target::Clan(id), player } => {
                sqlx::query("DELETE FROM clan_pendings WHERE clan_id = $1 AND player_id = $2")
                    .bind(id)
                    .bind(player)
            }
            Change::ClanAffiliationCleared { team } => {
                sqlx::query("UPDATE teams SET clan_pending_id = NULL WHERE id = $1").bind(team)
            }
        };
        q.execute(&mut *conn)
            .await
            .with_context(|| format!("applying {change:?}"))?;
    }
    Ok(())
}

/// Authorize and run one intent in a serializable transaction.
///
/// The outer `Result` carries storage failures; the inner one the engine's
/// verdict. A refused intent rolls back without writing anything.
pub async fn execute(
    db: &PgPool,
    actor: Uuid,
    intent: &Intent,
    policy: &Policy,
) -> Result<Result<Outcome, MembershipError>> {
    let mut tx = db.begin().await.context("opening membership transaction")?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await
        .context("raising isolation level")?;

    let mut league = load_league(&mut *tx).await?;

    let verdict = membership::authorize(&league, actor, intent)
        .and_then(|_| membership::apply(&mut league, intent, policy));

    match verdict {
        Ok(outcome) => {
            apply_changes(&mut *tx, &outcome.changes).await?;
            tx.commit().await.context("committing membership change")?;
            Ok(Ok(outcome))
        }
        Err(e) => {
            tx.rollback().await.ok();
            Ok(Err(e))
        }
    }
}

/// Consistent read of the graph for roster views.
pub async fn snapshot(db: &PgPool) -> Result<League> {
    let mut conn = db.acquire().await.context("acquiring connection")?;
    load_league(&mut *conn).await
}
