//! Realtime broadcast pipeline for Touchline.
//!
//! Turns the engine's per-minute simulation into a paced stream of viewer
//! messages. Each live match is a [`MatchSession`]; its loop builds one
//! minute's timeline of broadcast items, stores them idempotently in the
//! [`BroadcastLedger`], publishes them as they fall due and advances the
//! match once the minute's wall-clock window has passed.
//!
//! # Modules
//!
//! - [`clock`] -- [`MatchClock`], the wall-clock window of a game minute.
//! - [`config`] -- [`TouchlineConfig`] loaded from YAML.
//! - [`dispatcher`] -- Publishing due items in bounded batches.
//! - [`ledger`] -- [`BroadcastLedger`], idempotent storage of broadcast items.
//! - [`publisher`] -- The [`Publisher`] seam and in-process publishers.
//! - [`realtime`] -- [`tick_match`], [`run_realtime_loop`] and the registry.
//! - [`session`] -- [`MatchSession`], the hot state of one match.
//! - [`timeline`] -- Minute simulation and broadcast scheduling.
//!
//! [`MatchClock`]: clock::MatchClock
//! [`TouchlineConfig`]: config::TouchlineConfig
//! [`BroadcastLedger`]: ledger::BroadcastLedger
//! [`Publisher`]: publisher::Publisher
//! [`tick_match`]: realtime::tick_match
//! [`run_realtime_loop`]: realtime::run_realtime_loop
//! [`MatchSession`]: session::MatchSession

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod ledger;
pub mod publisher;
pub mod realtime;
pub mod session;
pub mod timeline;

pub use clock::{ClockError, MatchClock};
pub use config::{ConfigError, TouchlineConfig};
pub use dispatcher::{dispatch_batch, dispatch_ready, messages_for};
pub use ledger::{BroadcastLedger, PersistReport};
pub use publisher::{ChannelPublisher, LogPublisher, PublishError, Publisher};
pub use realtime::{
    LoopSummary, MatchRegistry, MatchServices, NoOpCallback, RealtimeCallback, RealtimeError,
    SharedSession, TickReport, run_realtime_loop, tick_match,
};
pub use session::MatchSession;
pub use timeline::{
    TimelineError, build_minute_timeline, ensure_minute_events, persist_broadcast_items,
};
