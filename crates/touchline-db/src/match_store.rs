//! Scoreboard snapshots of matches.

use sqlx::PgPool;
use touchline_types::{Match, MatchId};
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `matches` table.
pub struct MatchStore<'a> {
    pool: &'a PgPool,
}

impl<'a> MatchStore<'a> {
    /// A store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write the current scoreboard of a match, replacing the previous one.
    pub async fn save_scoreboard(&self, game: &Match) -> Result<(), DbError> {
        let counters = serde_json::to_value(game.counters)?;
        sqlx::query(
            r"INSERT INTO matches
              (id, home_club_id, away_club_id, status, current_minute, home_score, away_score, home_momentum, away_momentum, counters, started_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
              ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                current_minute = EXCLUDED.current_minute,
                home_score = EXCLUDED.home_score,
                away_score = EXCLUDED.away_score,
                home_momentum = EXCLUDED.home_momentum,
                away_momentum = EXCLUDED.away_momentum,
                counters = EXCLUDED.counters,
                started_at = COALESCE(matches.started_at, EXCLUDED.started_at),
                updated_at = now()",
        )
        .bind(game.id.into_inner())
        .bind(game.home_club.into_inner())
        .bind(game.away_club.into_inner())
        .bind(game.status.as_str())
        .bind(to_db_int(game.current_minute))
        .bind(to_db_int(game.home_score))
        .bind(to_db_int(game.away_score))
        .bind(game.home_momentum)
        .bind(game.away_momentum)
        .bind(&counters)
        .bind(game.realtime.started_at)
        .execute(self.pool)
        .await?;

        tracing::debug!(
            match_id = %game.id,
            minute = game.current_minute,
            status = game.status.as_str(),
            "Saved scoreboard"
        );
        Ok(())
    }

    /// The stored scoreboard of a match, if any.
    pub async fn get(&self, match_id: MatchId) -> Result<Option<ScoreboardRow>, DbError> {
        let row = sqlx::query_as::<_, ScoreboardRow>(
            r"SELECT id, status, current_minute, home_score, away_score, counters, updated_at
              FROM matches WHERE id = $1",
        )
        .bind(match_id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}

fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// A row from the `matches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoreboardRow {
    /// Match id.
    pub id: Uuid,
    /// Status name.
    pub status: String,
    /// Minute being played.
    pub current_minute: i32,
    /// Home goals.
    pub home_score: i32,
    /// Away goals.
    pub away_score: i32,
    /// Serialized action counters.
    pub counters: serde_json::Value,
    /// Last write.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
