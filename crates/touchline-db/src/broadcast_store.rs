//! Durable copy of the broadcast ledger.
//!
//! Items are keyed by their idempotency key (`match:minute:index`). An
//! upsert refreshes a row only while it is still pending, so a rebuilt
//! minute can never resurrect an item that viewers already saw.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use touchline_types::{BroadcastItem, BroadcastKey, BroadcastPayload, BroadcastStatus, MatchId};
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `broadcast_items` table.
pub struct BroadcastStore<'a> {
    pool: &'a PgPool,
}

impl<'a> BroadcastStore<'a> {
    /// A store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert items, refreshing rows that are still pending.
    ///
    /// Returns the number of rows inserted or refreshed; sent rows are
    /// skipped and not counted.
    pub async fn upsert(&self, items: &[BroadcastItem]) -> Result<u64, DbError> {
        if items.is_empty() {
            return Ok(0);
        }

        let len = items.len();
        let mut keys = Vec::with_capacity(len);
        let mut match_ids = Vec::with_capacity(len);
        let mut minutes = Vec::with_capacity(len);
        let mut indexes = Vec::with_capacity(len);
        let mut kinds = Vec::with_capacity(len);
        let mut scheduled = Vec::with_capacity(len);
        let mut payloads = Vec::with_capacity(len);
        let mut statuses = Vec::with_capacity(len);
        let mut sent: Vec<Option<DateTime<Utc>>> = Vec::with_capacity(len);

        for item in items {
            keys.push(item.key.to_string());
            match_ids.push(item.key.match_id.into_inner());
            minutes.push(i32::try_from(item.key.minute).unwrap_or(i32::MAX));
            indexes.push(i32::try_from(item.key.index).unwrap_or(i32::MAX));
            kinds.push(item.payload.kind.as_str().to_owned());
            scheduled.push(item.scheduled_at);
            payloads.push(serde_json::to_value(&item.payload)?);
            statuses.push(item.status.as_str().to_owned());
            sent.push(item.sent_at);
        }

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r"INSERT INTO broadcast_items (idempotency_key, match_id, minute, item_index, kind, scheduled_at, payload, status, sent_at)
              SELECT * FROM UNNEST($1::TEXT[], $2::UUID[], $3::INTEGER[], $4::INTEGER[], $5::TEXT[], $6::TIMESTAMPTZ[], $7::JSONB[], $8::TEXT[], $9::TIMESTAMPTZ[])
              ON CONFLICT (idempotency_key) DO UPDATE SET
                kind = EXCLUDED.kind,
                scheduled_at = EXCLUDED.scheduled_at,
                payload = EXCLUDED.payload
              WHERE broadcast_items.status = 'pending'",
        )
        .bind(&keys)
        .bind(&match_ids)
        .bind(&minutes)
        .bind(&indexes)
        .bind(&kinds)
        .bind(&scheduled)
        .bind(&payloads)
        .bind(&statuses)
        .bind(&sent)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(count = len, written = result.rows_affected(), "Upserted broadcast items");
        Ok(result.rows_affected())
    }

    /// Mark items sent. Rows already sent keep their first `sent_at`.
    pub async fn mark_sent(&self, keys: &[BroadcastKey], at: DateTime<Utc>) -> Result<u64, DbError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
        let result = sqlx::query(
            r"UPDATE broadcast_items
              SET status = 'sent', sent_at = $2
              WHERE idempotency_key = ANY($1) AND status = 'pending'",
        )
        .bind(&keys)
        .bind(at)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Pending items of a match due at `now`, oldest first, at most `limit`.
    pub async fn due_pending(
        &self,
        match_id: MatchId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<BroadcastItem>, DbError> {
        let rows = sqlx::query_as::<_, BroadcastRow>(
            r"SELECT idempotency_key, match_id, minute, item_index, scheduled_at, payload, status, sent_at
              FROM broadcast_items
              WHERE match_id = $1 AND status = 'pending' AND scheduled_at <= $2
              ORDER BY scheduled_at, minute, item_index
              LIMIT $3",
        )
        .bind(match_id.into_inner())
        .bind(now)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(BroadcastRow::into_item).collect()
    }

    /// Number of pending items left in one minute.
    pub async fn pending_in_minute(&self, match_id: MatchId, minute: u32) -> Result<i64, DbError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM broadcast_items WHERE match_id = $1 AND minute = $2 AND status = 'pending'",
        )
        .bind(match_id.into_inner())
        .bind(i32::try_from(minute).unwrap_or(i32::MAX))
        .fetch_one(self.pool)
        .await?;
        Ok(count.0)
    }
}

/// A row from the `broadcast_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BroadcastRow {
    /// `match:minute:index`.
    pub idempotency_key: String,
    /// Owning match.
    pub match_id: Uuid,
    /// Game minute.
    pub minute: i32,
    /// Position in the minute.
    pub item_index: i32,
    /// When the item becomes due.
    pub scheduled_at: DateTime<Utc>,
    /// Serialized [`BroadcastPayload`].
    pub payload: serde_json::Value,
    /// `pending` or `sent`.
    pub status: String,
    /// When the item was published.
    pub sent_at: Option<DateTime<Utc>>,
}

impl BroadcastRow {
    /// Decode the row back into a ledger item.
    pub fn into_item(self) -> Result<BroadcastItem, DbError> {
        let payload: BroadcastPayload = serde_json::from_value(self.payload)?;
        let key = BroadcastKey::new(
            MatchId::from(self.match_id),
            u32::try_from(self.minute).unwrap_or_default(),
            u32::try_from(self.item_index).unwrap_or_default(),
        );
        let status = if self.status == BroadcastStatus::Sent.as_str() {
            BroadcastStatus::Sent
        } else {
            BroadcastStatus::Pending
        };
        Ok(BroadcastItem {
            key,
            scheduled_at: self.scheduled_at,
            payload,
            status,
            sent_at: self.sent_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use touchline_types::BroadcastKind;

    use super::*;

    fn row(status: &str) -> BroadcastRow {
        let payload = BroadcastPayload {
            text: "Through ball".to_owned(),
            kind: BroadcastKind::MicroPass,
            minute: 12,
            club_id: None,
            player_ids: Vec::new(),
            score: None,
            possession: None,
        };
        BroadcastRow {
            idempotency_key: "ignored".to_owned(),
            match_id: Uuid::now_v7(),
            minute: 12,
            item_index: 3,
            scheduled_at: Utc::now(),
            payload: serde_json::to_value(payload).unwrap(),
            status: status.to_owned(),
            sent_at: None,
        }
    }

    #[test]
    fn rows_decode_into_ledger_items() {
        let item = row("pending").into_item().unwrap();
        assert_eq!(item.key.minute, 12);
        assert_eq!(item.key.index, 3);
        assert_eq!(item.status, BroadcastStatus::Pending);
        assert_eq!(item.payload.text, "Through ball");
    }

    #[test]
    fn sent_status_survives_decoding() {
        let item = row("sent").into_item().unwrap();
        assert_eq!(item.status, BroadcastStatus::Sent);
    }

    #[test]
    fn broken_payload_is_a_serialization_error() {
        let mut bad = row("pending");
        bad.payload = serde_json::json!({ "text": 4 });
        assert!(matches!(bad.into_item(), Err(DbError::Serialization(_))));
    }
}
