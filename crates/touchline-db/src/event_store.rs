//! Append-only archive of match events.

use sqlx::PgPool;
use touchline_types::{MatchEvent, MatchId, PlayerId};
use uuid::Uuid;

use crate::error::DbError;

/// Default batch size for event inserts.
const DEFAULT_BATCH_SIZE: usize = 200;

/// Operations on the `match_events` table.
pub struct MatchEventStore<'a> {
    pool: &'a PgPool,
    batch_size: usize,
}

impl<'a> MatchEventStore<'a> {
    /// A store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size for inserts.
    #[must_use]
    pub const fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Batch-insert events.
    ///
    /// Each chunk is one `UNNEST` insert inside its own transaction. Rows
    /// already present (same event id) are left untouched, so replaying a
    /// minute is harmless.
    pub async fn batch_insert(&self, events: &[MatchEvent]) -> Result<u64, DbError> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut inserted: u64 = 0;
        for chunk in events.chunks(self.batch_size.max(1)) {
            let mut tx = self.pool.begin().await?;

            let len = chunk.len();
            let mut ids = Vec::with_capacity(len);
            let mut match_ids = Vec::with_capacity(len);
            let mut minutes = Vec::with_capacity(len);
            let mut event_types = Vec::with_capacity(len);
            let mut sides = Vec::with_capacity(len);
            let mut players: Vec<Option<Uuid>> = Vec::with_capacity(len);
            let mut related: Vec<Option<Uuid>> = Vec::with_capacity(len);
            let mut descriptions = Vec::with_capacity(len);
            let mut annotations: Vec<Option<String>> = Vec::with_capacity(len);
            let mut timestamps = Vec::with_capacity(len);

            for event in chunk {
                ids.push(event.id.into_inner());
                match_ids.push(event.match_id.into_inner());
                minutes.push(i32::try_from(event.minute).unwrap_or(i32::MAX));
                event_types.push(event.event_type.as_str().to_owned());
                sides.push(event.side.as_str().to_owned());
                players.push(event.player_id.map(PlayerId::into_inner));
                related.push(event.related_player_id.map(PlayerId::into_inner));
                descriptions.push(event.description.clone());
                annotations.push(event.annotation.clone());
                timestamps.push(event.created_at);
            }

            let result = sqlx::query(
                r"INSERT INTO match_events (id, match_id, minute, event_type, side, player_id, related_player_id, description, annotation, created_at)
                  SELECT * FROM UNNEST($1::UUID[], $2::UUID[], $3::INTEGER[], $4::TEXT[], $5::TEXT[], $6::UUID[], $7::UUID[], $8::TEXT[], $9::TEXT[], $10::TIMESTAMPTZ[])
                  ON CONFLICT (id) DO NOTHING",
            )
            .bind(&ids)
            .bind(&match_ids)
            .bind(&minutes)
            .bind(&event_types)
            .bind(&sides)
            .bind(&players)
            .bind(&related)
            .bind(&descriptions)
            .bind(&annotations)
            .bind(&timestamps)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            inserted = inserted.saturating_add(result.rows_affected());
        }

        tracing::debug!(count = events.len(), inserted, "Archived match events (batch UNNEST)");
        Ok(inserted)
    }

    /// Events of one minute, in creation order.
    pub async fn events_in_minute(&self, match_id: MatchId, minute: u32) -> Result<Vec<MatchEventRow>, DbError> {
        let rows = sqlx::query_as::<_, MatchEventRow>(
            r"SELECT id, match_id, minute, event_type, side, player_id, related_player_id, description, annotation, created_at
              FROM match_events
              WHERE match_id = $1 AND minute = $2
              ORDER BY created_at, id",
        )
        .bind(match_id.into_inner())
        .bind(i32::try_from(minute).unwrap_or(i32::MAX))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Number of archived events for a match.
    pub async fn count_for_match(&self, match_id: MatchId) -> Result<i64, DbError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM match_events WHERE match_id = $1")
            .bind(match_id.into_inner())
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }
}

/// A row from the `match_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchEventRow {
    /// Event id.
    pub id: Uuid,
    /// Owning match.
    pub match_id: Uuid,
    /// Game minute.
    pub minute: i32,
    /// Event type name.
    pub event_type: String,
    /// Credited side name.
    pub side: String,
    /// Primary player.
    pub player_id: Option<Uuid>,
    /// Secondary player.
    pub related_player_id: Option<Uuid>,
    /// Free-text description.
    pub description: String,
    /// Trait annotation.
    pub annotation: Option<String>,
    /// Creation time.
    pub created_at: chrono::DateTime<chrono::Utc>,
}
