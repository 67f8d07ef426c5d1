use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::{membership_repo, models::TournamentRow};
use crate::registration::{self, RegistrationError, TournamentEntry};

/// Tournament row plus its current registrations, oldest first.
pub async fn load_tournament(
    conn: &mut PgConnection,
    tournament: Uuid,
) -> Result<Option<TournamentEntry>> {
    let row = sqlx::query_as::<_, TournamentRow>(
        "SELECT id, name, team_player_count FROM tournaments WHERE id = $1",
    )
    .bind(tournament)
    .fetch_optional(&mut *conn)
    .await
    .context("fetching tournament")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let registered = sqlx::query_scalar::<_, Uuid>(
        "SELECT team_id FROM registered_teams
          WHERE tournament_id = $1
          ORDER BY registered_at",
    )
    .bind(tournament)
    .fetch_all(&mut *conn)
    .await
    .context("fetching registered teams")?;

    Ok(Some(TournamentEntry {
        id: row.id,
        name: row.name,
        team_player_count: u16::try_from(row.team_player_count).unwrap_or(0),
        registered,
    }))
}

/// Sign a team up for a tournament (leader-only, transactional).
pub async fn register(
    db: &PgPool,
    actor: Uuid,
    team: Uuid,
    tournament: Uuid,
) -> Result<Result<(), RegistrationError>> {
    let mut tx = db.begin().await.context("opening registration transaction")?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await
        .context("raising isolation level")?;

    let league = membership_repo::load_league(&mut *tx).await?;
    let Some(entry) = load_tournament(&mut *tx, tournament).await? else {
        tx.rollback().await.ok();
        return Ok(Err(RegistrationError::UnknownTournament { id: tournament }));
    };

    let verdict = registration::authorize(&league, actor, team)
        .and_then(|_| registration::check_registration(&league, &entry, team));
    if let Err(e) = verdict {
        tx.rollback().await.ok();
        return Ok(Err(e));
    }

    sqlx::query(
        "INSERT INTO registered_teams (tournament_id, team_id, registered_at)
         VALUES ($1, $2, clock_timestamp())",
    )
    .bind(tournament)
    .bind(team)
    .execute(&mut *tx)
    .await
    .context("registering team")?;

    tx.commit().await.context("committing registration")?;
    log::info!("team {team} registered for {}", entry.name);
    Ok(Ok(()))
}

/// Withdraw a team; withdrawing an unregistered team is a no-op.
pub async fn withdraw(
    db: &PgPool,
    actor: Uuid,
    team: Uuid,
    tournament: Uuid,
) -> Result<Result<(), RegistrationError>> {
    let mut tx = db.begin().await.context("opening withdrawal transaction")?;

    let league = membership_repo::load_league(&mut *tx).await?;
    if let Err(e) = registration::authorize(&league, actor, team) {
        tx.rollback().await.ok();
        return Ok(Err(e));
    }

    let rows = sqlx::query(
        "DELETE FROM registered_teams WHERE tournament_id = $1 AND team_id = $2",
    )
    .bind(tournament)
    .bind(team)
    .execute(&mut *tx)
    .await
    .context("withdrawing team")?
    .rows_affected();

    tx.commit().await.context("committing withdrawal")?;
    if rows > 0 {
        log::info!("team {team} withdrew from tournament {tournament}");
    }
    Ok(Ok(()))
}
