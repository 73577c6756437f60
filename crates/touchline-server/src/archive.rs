//! Realtime callback that mirrors every match into `PostgreSQL`.
//!
//! [`ArchiveCallback`] runs inside the per-match critical section, so it
//! only queues [`ArchiveRecord`]s on a bounded channel. The writer task
//! spawned by [`spawn_archive_writer`] drains the channel into the stores
//! of `touchline-db`. When the queue is full a record is dropped with a
//! warning; the in-memory session stays authoritative.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use touchline_core::RealtimeCallback;
use touchline_db::{BroadcastStore, DbError, MatchEventStore, MatchStore, PostgresPool};
use touchline_types::{BroadcastItem, BroadcastKey, Match, MatchEvent};
use tracing::{debug, info, warn};

/// One unit of work for the archive writer.
#[derive(Debug, Clone)]
pub enum ArchiveRecord {
    /// New events and (possibly) broadcast items of a minute.
    Minute {
        /// Events to append.
        events: Vec<MatchEvent>,
        /// Items to upsert.
        items: Vec<BroadcastItem>,
    },
    /// Items published to viewers.
    Sent {
        /// Keys marked sent.
        keys: Vec<BroadcastKey>,
        /// Publish time.
        at: DateTime<Utc>,
    },
    /// Latest scoreboard of a match.
    Scoreboard(Box<Match>),
}

/// Queues archive records from the realtime loop.
#[derive(Debug, Clone)]
pub struct ArchiveCallback {
    sender: mpsc::Sender<ArchiveRecord>,
}

impl ArchiveCallback {
    /// A callback feeding `sender`.
    pub const fn new(sender: mpsc::Sender<ArchiveRecord>) -> Self {
        Self { sender }
    }

    fn queue(&self, game: &Match, record: ArchiveRecord) {
        if let Err(e) = self.sender.try_send(record) {
            warn!(match_id = %game.id, minute = game.current_minute, error = %e, "archive record dropped");
        }
    }
}

impl RealtimeCallback for ArchiveCallback {
    fn on_minute_built(&mut self, game: &Match, events: &[MatchEvent], items: &[BroadcastItem]) {
        self.queue(
            game,
            ArchiveRecord::Minute {
                events: events.to_vec(),
                items: items.to_vec(),
            },
        );
    }

    fn on_dispatched(&mut self, game: &Match, keys: &[BroadcastKey]) {
        self.queue(
            game,
            ArchiveRecord::Sent {
                keys: keys.to_vec(),
                at: Utc::now(),
            },
        );
    }

    fn on_minute_advanced(&mut self, game: &Match, events: &[MatchEvent]) {
        if !events.is_empty() {
            self.queue(
                game,
                ArchiveRecord::Minute {
                    events: events.to_vec(),
                    items: Vec::new(),
                },
            );
        }
        self.queue(game, ArchiveRecord::Scoreboard(Box::new(game.clone())));
    }
}

/// Start the writer task and return the sender the callbacks share.
pub fn spawn_archive_writer(pool: PostgresPool, buffer: usize) -> (mpsc::Sender<ArchiveRecord>, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::channel(buffer.max(1));
    let handle = tokio::spawn(async move {
        while let Some(record) = receiver.recv().await {
            if let Err(e) = write_record(&pool, &record).await {
                warn!(error = %e, "archive write failed");
            }
        }
        info!("archive writer stopped");
    });
    (sender, handle)
}

async fn write_record(pool: &PostgresPool, record: &ArchiveRecord) -> Result<(), DbError> {
    match record {
        ArchiveRecord::Minute { events, items } => {
            let archived = MatchEventStore::new(pool.pool()).batch_insert(events).await?;
            let upserted = BroadcastStore::new(pool.pool()).upsert(items).await?;
            debug!(archived, upserted, "archived minute");
        }
        ArchiveRecord::Sent { keys, at } => {
            BroadcastStore::new(pool.pool()).mark_sent(keys, *at).await?;
        }
        ArchiveRecord::Scoreboard(game) => {
            MatchStore::new(pool.pool()).save_scoreboard(game).await?;
        }
    }
    Ok(())
}
