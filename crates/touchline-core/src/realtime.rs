//! The per-match realtime loop.
//!
//! Each live match is a [`MatchSession`] behind its own lock in the
//! [`MatchRegistry`]. One task per match runs [`run_realtime_loop`], which
//! sleeps between ticks and does all of its work inside [`tick_match`]
//! while holding that lock:
//!
//! 1. **Build**: when the current minute has no timeline yet, simulate it
//!    and persist its broadcast items (guarded by `minute_building`).
//! 2. **Dispatch**: publish a bounded batch of due items.
//! 3. **Advance**: once the minute's window has passed and nothing of it is
//!    pending, apply per-minute bookkeeping and move to the next minute
//!    (guarded by `waiting_for_next_minute`).
//!
//! Both guard flags are set and cleared inside the same critical section.
//! A failed tick ends that match's loop only; other matches keep running.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use touchline_engine::morale::drift_toward_base;
use touchline_engine::{
    ActionConfig, ActionContext, AttributeModel, NarrativeObserver, NeutralTraits,
    PreparationError, ProbabilityModel, Roster, SilentNarrator, TraitEngine,
};
use touchline_types::{
    BroadcastItem, BroadcastKey, Lineup, Match, MatchEvent, MatchEventType, MatchId, MatchStatus,
    OutboundMessage, PlayerId, ScoreUpdate, TeamSide, Zone,
};
use tracing::{debug, error, info, warn};

use crate::clock::{ClockError, MatchClock};
use crate::config::{RealtimeConfig, TimelineConfig, TouchlineConfig};
use crate::dispatcher::dispatch_batch;
use crate::ledger::PersistReport;
use crate::session::MatchSession;
use crate::timeline::{
    TimelineError, build_minute_timeline, ensure_minute_events, persist_broadcast_items,
};

/// Errors that can occur in the realtime layer.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Building a minute failed; the match stalls.
    #[error("timeline error: {source}")]
    Timeline {
        /// The underlying timeline error.
        #[from]
        source: TimelineError,
    },

    /// The clock could not be built.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The match could not be prepared for kick-off.
    #[error("preparation error: {source}")]
    Preparation {
        /// The underlying preparation error.
        #[from]
        source: PreparationError,
    },
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A session behind its per-match lock.
pub type SharedSession = Arc<Mutex<MatchSession>>;

/// Live sessions keyed by match id.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    sessions: RwLock<BTreeMap<MatchId, SharedSession>>,
}

impl MatchRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, replacing any earlier one for the same match.
    pub fn insert(&self, session: MatchSession) -> SharedSession {
        let id = session.match_id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().insert(id, Arc::clone(&shared));
        shared
    }

    /// Build a session for a scheduled match, kick it off and register it.
    pub fn open(
        &self,
        game: Match,
        roster: Roster,
        config: &RealtimeConfig,
    ) -> Result<SharedSession, RealtimeError> {
        let clock = MatchClock::new(config.seconds_per_game_minute)?;
        let mut session = MatchSession::new(game, roster, clock);
        if session.game.status == MatchStatus::Scheduled {
            session.kick_off()?;
        }
        Ok(self.insert(session))
    }

    /// The session of a match.
    pub fn get(&self, id: &MatchId) -> Option<SharedSession> {
        self.sessions.read().get(id).cloned()
    }

    /// Drop a match from the registry.
    pub fn remove(&self, id: &MatchId) -> Option<SharedSession> {
        self.sessions.write().remove(id)
    }

    /// Ids of all registered matches.
    pub fn ids(&self) -> Vec<MatchId> {
        self.sessions.read().keys().copied().collect()
    }

    /// Number of registered matches.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no match is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Services and callbacks
// ---------------------------------------------------------------------------

/// Everything a tick needs besides the session itself.
#[derive(Clone)]
pub struct MatchServices {
    /// Loop pacing.
    pub realtime: RealtimeConfig,
    /// Timeline shaping.
    pub timeline: TimelineConfig,
    /// Optional-action chances.
    pub engine: ActionConfig,
    /// Success chances.
    pub odds: Arc<dyn ProbabilityModel>,
    /// Personality hook.
    pub traits: Arc<dyn TraitEngine>,
    /// Narrative hook.
    pub narrator: Arc<dyn NarrativeObserver>,
    /// Viewer transport.
    pub publisher: Arc<dyn crate::publisher::Publisher>,
}

impl MatchServices {
    /// Services from configuration with the attribute-driven model, neutral
    /// traits and a silent narrator.
    pub fn new(config: &TouchlineConfig, publisher: Arc<dyn crate::publisher::Publisher>) -> Self {
        Self {
            realtime: config.realtime.clone(),
            timeline: config.timeline.clone(),
            engine: config.engine.clone(),
            odds: Arc::new(AttributeModel),
            traits: Arc::new(NeutralTraits),
            narrator: Arc::new(SilentNarrator),
            publisher,
        }
    }

    /// Replace the probability model.
    #[must_use]
    pub fn with_odds(mut self, odds: Arc<dyn ProbabilityModel>) -> Self {
        self.odds = odds;
        self
    }

    /// Replace the trait engine.
    #[must_use]
    pub fn with_traits(mut self, traits: Arc<dyn TraitEngine>) -> Self {
        self.traits = traits;
        self
    }

    /// Replace the narrative observer.
    #[must_use]
    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeObserver>) -> Self {
        self.narrator = narrator;
        self
    }

    /// The engine collaborators borrowed for one action.
    pub fn action_context(&self) -> ActionContext<'_> {
        ActionContext {
            config: &self.engine,
            odds: self.odds.as_ref(),
            traits: self.traits.as_ref(),
        }
    }
}

/// Hooks invoked from inside the critical section of a tick.
///
/// Implementations must not block; the server forwards to background
/// writers over bounded channels.
pub trait RealtimeCallback: Send {
    /// A minute was simulated and its items persisted.
    fn on_minute_built(&mut self, game: &Match, events: &[MatchEvent], items: &[BroadcastItem]);

    /// Items were published and marked sent.
    fn on_dispatched(&mut self, game: &Match, keys: &[BroadcastKey]);

    /// The match moved to its next minute or finished.
    fn on_minute_advanced(&mut self, game: &Match, events: &[MatchEvent]);
}

/// A callback that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl RealtimeCallback for NoOpCallback {
    fn on_minute_built(&mut self, _game: &Match, _events: &[MatchEvent], _items: &[BroadcastItem]) {}

    fn on_dispatched(&mut self, _game: &Match, _keys: &[BroadcastKey]) {}

    fn on_minute_advanced(&mut self, _game: &Match, _events: &[MatchEvent]) {}
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// The match ticked.
    pub match_id: MatchId,
    /// Score after the tick.
    pub score: ScoreUpdate,
    /// Minute after the tick.
    pub minute: u32,
    /// Status after the tick.
    pub status: MatchStatus,
    /// Persist result when the minute was built this tick.
    pub built: Option<PersistReport>,
    /// Items published this tick.
    pub dispatched: usize,
    /// Whether the minute advanced (or the match finished) this tick.
    pub advanced: bool,
}

impl TickReport {
    const fn idle(game: &Match) -> Self {
        Self {
            match_id: game.id,
            score: ScoreUpdate {
                home: game.home_score,
                away: game.away_score,
            },
            minute: game.current_minute,
            status: game.status,
            built: None,
            dispatched: 0,
            advanced: false,
        }
    }
}

/// Condition lost per game minute for a given stamina rating.
pub fn minute_fatigue(stamina: u32) -> f64 {
    f64::from(20_u32.saturating_sub(stamina)).mul_add(0.03, 0.25)
}

/// Run one build / dispatch / advance step for a match.
///
/// Matches that are not in progress are left alone.
pub fn tick_match(
    session: &mut MatchSession,
    services: &MatchServices,
    now: DateTime<Utc>,
    callback: &mut dyn RealtimeCallback,
) -> Result<TickReport, RealtimeError> {
    if session.game.status != MatchStatus::InProgress {
        return Ok(TickReport::idle(&session.game));
    }

    let anchor = session.clock.ensure_started(now);
    session.game.realtime.minute_started_at = Some(anchor);
    if session.game.realtime.started_at.is_none() {
        session.game.realtime.started_at = Some(anchor);
    }
    let minute = session.game.current_minute;
    let mut built = None;

    let already_broadcast = session
        .game
        .realtime
        .last_broadcast_minute
        .is_some_and(|last| last >= minute);
    if !session.ledger.has_minute(minute) && !already_broadcast && !session.game.realtime.minute_building {
        session.game.realtime.minute_building = true;
        let first_new = session.events.len();
        let result = build_minute(session, services, anchor);
        session.game.realtime.minute_building = false;
        let (report, items) = result?;
        let events = session.events.get(first_new..).unwrap_or_default();
        callback.on_minute_built(&session.game, events, &items);
        built = Some(report);
    }

    let sent = dispatch_batch(
        session,
        services.publisher.as_ref(),
        now,
        services.realtime.dispatch_batch_size,
    );
    if !sent.is_empty() {
        callback.on_dispatched(&session.game, &sent);
    }

    let mut advanced = false;
    if session.clock.is_minute_over(now)
        && session.ledger.has_minute(minute)
        && session.ledger.pending_in_minute(minute) == 0
        && !session.game.realtime.waiting_for_next_minute
    {
        session.game.realtime.waiting_for_next_minute = true;
        let first_new = session.events.len();
        advance_minute(session, services, now);
        session.game.realtime.waiting_for_next_minute = false;
        let events = session.events.get(first_new..).unwrap_or_default();
        callback.on_minute_advanced(&session.game, events);
        advanced = true;
    }

    Ok(TickReport {
        built,
        dispatched: sent.len(),
        advanced,
        ..TickReport::idle(&session.game)
    })
}

fn build_minute(
    session: &mut MatchSession,
    services: &MatchServices,
    anchor: DateTime<Utc>,
) -> Result<(PersistReport, Vec<BroadcastItem>), RealtimeError> {
    let ctx = services.action_context();
    ensure_minute_events(
        session,
        &ctx,
        services.narrator.as_ref(),
        services.timeline.max_actions_per_minute,
    )?;
    let items = build_minute_timeline(session, &services.timeline, anchor, session.clock.window_seconds());
    let report = persist_broadcast_items(&mut session.ledger, items.clone());
    debug!(
        match_id = %session.game.id,
        minute = session.game.current_minute,
        items = items.len(),
        inserted = report.inserted,
        "minute timeline built"
    );
    Ok((report, items))
}

/// Close the current minute: tire and settle the players, log the whistles
/// and either start the next minute or finish the match.
fn advance_minute(session: &mut MatchSession, services: &MatchServices, now: DateTime<Utc>) {
    let minute = session.game.current_minute;
    let fielded: Vec<PlayerId> = [TeamSide::Home, TeamSide::Away]
        .into_iter()
        .filter_map(|side| session.game.lineup(side))
        .flat_map(Lineup::player_ids)
        .collect();
    for id in fielded {
        if let Ok(player) = session.roster.get_mut(id) {
            player.condition = (player.condition - minute_fatigue(player.attributes.stamina)).max(0.0);
            drift_toward_base(player);
        }
    }
    session.game.realtime.last_broadcast_minute = Some(minute);

    let config = &services.realtime;
    let score = format!("{}-{}", session.game.home_score, session.game.away_score);
    if minute >= config.match_length {
        let whistle = MatchEvent::new(
            session.game.id,
            minute,
            MatchEventType::Info,
            TeamSide::Home,
            format!("Full-time: {score}"),
        );
        session.events.push(whistle);
        session.game.status = MatchStatus::Finished;
        session.game.ball_holder = None;
        info!(
            match_id = %session.game.id,
            home_score = session.game.home_score,
            away_score = session.game.away_score,
            "match finished"
        );
    } else {
        if minute == config.half_time_minute {
            let whistle = MatchEvent::new(
                session.game.id,
                minute,
                MatchEventType::Info,
                TeamSide::Home,
                format!("Half-time: {score}"),
            );
            session.events.push(whistle);
            // The away side kicks off the second half.
            if let Some(keeper) = session.game.lineup(TeamSide::Away).and_then(Lineup::goalkeeper) {
                session.game.ball_holder = Some(keeper);
                session.game.current_zone = Some(Zone::GK);
                session.game.possession = Some(TeamSide::Away);
            }
        }
        session.game.current_minute = minute.saturating_add(1);
        session.game.actions_this_minute = 0;
        session.clock.advance_minute_anchor(now);
        session.game.realtime.minute_started_at = session.clock.anchor();
        info!(
            match_id = %session.game.id,
            minute = session.game.current_minute,
            score = %score,
            "minute advanced"
        );
    }

    let update = OutboundMessage::MatchUpdate {
        match_id: session.game.id,
        minute: session.game.current_minute,
        status: session.game.status,
        score: ScoreUpdate {
            home: session.game.home_score,
            away: session.game.away_score,
        },
    };
    if services.publisher.is_available() {
        if let Err(err) = services.publisher.publish(&update) {
            warn!(match_id = %session.game.id, error = %err, "match update not published");
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// How a match loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// The match.
    pub match_id: MatchId,
    /// Status when the loop stopped.
    pub status: MatchStatus,
    /// Last minute reached.
    pub minute: u32,
    /// Final score.
    pub score: ScoreUpdate,
    /// Ticks that ran under the lock.
    pub ticks: u64,
    /// Ticks skipped because the lock was busy.
    pub contended: u64,
}

enum Step {
    Ticked(TickReport),
    Contended,
    Failed(MatchId, RealtimeError),
}

/// Drive one match until it leaves play.
///
/// The sleep between ticks is the only suspension point, and the session
/// lock is only ever taken with a timeout. Lock contention is logged and
/// retried on the next tick. A tick error is logged and returned, which
/// stalls the match without touching any other.
pub async fn run_realtime_loop(
    session: SharedSession,
    services: MatchServices,
    callback: &mut dyn RealtimeCallback,
) -> Result<LoopSummary, RealtimeError> {
    let lock_timeout = Duration::from_millis(services.realtime.lock_timeout_ms);
    let interval = Duration::from_millis(services.realtime.tick_interval_ms);
    let mut match_id: Option<MatchId> = None;
    let mut ticks: u64 = 0;
    let mut contended: u64 = 0;

    debug!(tick_interval_ms = services.realtime.tick_interval_ms, "realtime loop starting");

    loop {
        let step = session.try_lock_for(lock_timeout).map_or(Step::Contended, |mut guard| {
            let id = guard.match_id();
            match tick_match(&mut guard, &services, Utc::now(), callback) {
                Ok(report) => Step::Ticked(report),
                Err(err) => Step::Failed(id, err),
            }
        });

        match step {
            Step::Ticked(report) => {
                if match_id.is_none() {
                    info!(match_id = %report.match_id, minute = report.minute, "realtime loop running");
                }
                match_id = Some(report.match_id);
                ticks = ticks.saturating_add(1);
                if !report.status.is_live() {
                    let summary = LoopSummary {
                        match_id: report.match_id,
                        status: report.status,
                        minute: report.minute,
                        score: report.score,
                        ticks,
                        contended,
                    };
                    info!(match_id = %summary.match_id, ticks, contended, status = summary.status.as_str(), "realtime loop finished");
                    return Ok(summary);
                }
            }
            Step::Contended => {
                contended = contended.saturating_add(1);
                warn!(match_id = ?match_id, "match lock busy, retrying next tick");
            }
            Step::Failed(id, err) => {
                error!(match_id = %id, error = %err, "tick failed, match stalls");
                return Err(err);
            }
        }

        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(interval).await;
        }
    }
}
