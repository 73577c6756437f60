//! `PostgreSQL` archive for Touchline.
//!
//! The realtime loop keeps every live match in memory. This crate is the
//! cold copy written behind it: the full match-event log, the broadcast
//! ledger and a scoreboard row per match.
//!
//! ```text
//! Realtime tick
//!     |
//!     +-- minute built ------> MatchEventStore  (append-only events)
//!     |                  \---> BroadcastStore   (idempotent upsert)
//!     +-- items dispatched --> BroadcastStore   (mark sent)
//!     +-- minute advanced ---> MatchStore       (scoreboard)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration and migrations
//! - [`event_store`] -- Batch event insertion and querying
//! - [`broadcast_store`] -- Broadcast item upsert, dispatch marks, due queries
//! - [`match_store`] -- Scoreboard snapshots
//! - [`error`] -- Shared error type

pub mod broadcast_store;
pub mod error;
pub mod event_store;
pub mod match_store;
pub mod postgres;

pub use broadcast_store::{BroadcastRow, BroadcastStore};
pub use error::DbError;
pub use event_store::{MatchEventRow, MatchEventStore};
pub use match_store::{MatchStore, ScoreboardRow};
pub use postgres::{PostgresConfig, PostgresPool};
