//! Idempotent storage of broadcast items.
//!
//! The [`BroadcastLedger`] is the hot copy of one match's broadcast
//! schedule, keyed by [`BroadcastKey`]. Persisting is an upsert: unknown
//! keys are inserted, pending items are refreshed, sent items are never
//! touched. Items only move from pending to sent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use touchline_types::{BroadcastItem, BroadcastKey, BroadcastStatus};

/// What a [`BroadcastLedger::persist`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// New keys stored.
    pub inserted: usize,
    /// Pending items whose payload or schedule was replaced.
    pub refreshed: usize,
    /// Items left alone because they were already sent.
    pub skipped: usize,
}

impl PersistReport {
    /// Items handled in total.
    pub const fn total(&self) -> usize {
        self.inserted
            .saturating_add(self.refreshed)
            .saturating_add(self.skipped)
    }
}

/// Broadcast items of one match.
#[derive(Debug, Clone, Default)]
pub struct BroadcastLedger {
    items: BTreeMap<BroadcastKey, BroadcastItem>,
}

impl BroadcastLedger {
    /// An empty ledger.
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// Upsert items by key.
    pub fn persist(&mut self, items: impl IntoIterator<Item = BroadcastItem>) -> PersistReport {
        let mut report = PersistReport::default();
        for item in items {
            match self.items.get_mut(&item.key) {
                None => {
                    self.items.insert(item.key, item);
                    report.inserted = report.inserted.saturating_add(1);
                }
                Some(existing) if existing.is_pending() => {
                    existing.payload = item.payload;
                    existing.scheduled_at = item.scheduled_at;
                    report.refreshed = report.refreshed.saturating_add(1);
                }
                Some(_) => report.skipped = report.skipped.saturating_add(1),
            }
        }
        report
    }

    /// Keys of pending items due at `now`, ordered by `(scheduled_at, index)`,
    /// at most `limit` of them.
    pub fn pending_due(&self, now: DateTime<Utc>, limit: usize) -> Vec<BroadcastKey> {
        let mut due: Vec<&BroadcastItem> = self
            .items
            .values()
            .filter(|item| item.is_pending() && item.scheduled_at <= now)
            .collect();
        due.sort_by_key(|item| (item.scheduled_at, item.key.minute, item.key.index));
        due.into_iter().take(limit).map(|item| item.key).collect()
    }

    /// Mark an item sent. Returns `false` for unknown or already-sent keys.
    pub fn mark_sent(&mut self, key: &BroadcastKey, at: DateTime<Utc>) -> bool {
        match self.items.get_mut(key) {
            Some(item) if item.is_pending() => {
                item.status = BroadcastStatus::Sent;
                item.sent_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// The item stored under `key`.
    pub fn get(&self, key: &BroadcastKey) -> Option<&BroadcastItem> {
        self.items.get(key)
    }

    /// Whether any item exists for `minute`.
    pub fn has_minute(&self, minute: u32) -> bool {
        self.items.values().any(|item| item.key.minute == minute)
    }

    /// Items of `minute` that still wait for dispatch.
    pub fn pending_in_minute(&self, minute: u32) -> usize {
        self.items
            .values()
            .filter(|item| item.key.minute == minute && item.is_pending())
            .count()
    }

    /// Items still waiting for dispatch across all minutes.
    pub fn pending_count(&self) -> usize {
        self.items.values().filter(|item| item.is_pending()).count()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the ledger holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in key order.
    pub fn iter(&self) -> impl Iterator<Item = &BroadcastItem> + '_ {
        self.items.values()
    }
}
