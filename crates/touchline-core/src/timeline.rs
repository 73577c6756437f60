//! Minute timelines.
//!
//! Building a minute happens in two steps. [`ensure_minute_events`] runs the
//! action state machine until the passage of play stops (or the action cap
//! is hit) and records every event. [`build_minute_timeline`] then turns
//! those events into paced broadcast items: one item per event, short
//! filler passes between uninvolved teammates, and a closing remark, each
//! scheduled inside the minute's window.
//!
//! The timeline RNG is derived from the match seed and the minute, so
//! rebuilding a minute from the same state yields the same items under the
//! same keys.

use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use touchline_engine::{ActionContext, EngineError, NarrativeObserver, simulate_one_action};
use touchline_types::{
    BroadcastItem, BroadcastKey, BroadcastKind, BroadcastPayload, MatchEvent, MatchEventType,
    PlayerId, PossessionUpdate, ScoreUpdate, TeamSide, Zone,
};
use tracing::debug;

use crate::config::TimelineConfig;
use crate::ledger::{BroadcastLedger, PersistReport};
use crate::session::MatchSession;

/// Errors that can occur while building a minute.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// The engine hit corrupt match state.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Simulate the current minute unless it already has events.
///
/// Each event is annotated by the trait engine and shown to the narrative
/// observer before it is stored. Returns the number of events recorded.
pub fn ensure_minute_events(
    session: &mut MatchSession,
    ctx: &ActionContext<'_>,
    narrator: &dyn NarrativeObserver,
    max_actions: u32,
) -> Result<usize, TimelineError> {
    let minute = session.game.current_minute;
    if session.has_events_in_minute(minute) {
        return Ok(0);
    }

    let mut recorded: usize = 0;
    for _ in 0..max_actions.max(1) {
        let outcome = simulate_one_action(&mut session.game, &mut session.roster, ctx, &mut session.rng)?;
        for mut event in outcome.chain.into_events() {
            event.annotation = ctx.traits.annotate(&event);
            let player = event.player_id.and_then(|id| session.roster.get(id).ok());
            let related = event.related_player_id.and_then(|id| session.roster.get(id).ok());
            narrator.observe(&session.game, minute, event.event_type, player, related);
            session.events.push(event);
            recorded = recorded.saturating_add(1);
        }
        if !outcome.continues {
            break;
        }
    }

    debug!(
        match_id = %session.game.id,
        minute,
        events = recorded,
        actions = session.game.actions_this_minute,
        "minute simulated"
    );
    Ok(recorded)
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// The broadcast category of an event.
pub const fn broadcast_kind(event_type: MatchEventType) -> BroadcastKind {
    match event_type {
        MatchEventType::Goal => BroadcastKind::Goal,
        MatchEventType::Shot => BroadcastKind::ShotAttempt,
        MatchEventType::ShotMiss => BroadcastKind::ShotMiss,
        MatchEventType::Pass | MatchEventType::Dribble => BroadcastKind::MicroPass,
        MatchEventType::Interception => BroadcastKind::Interception,
        MatchEventType::Counterattack => BroadcastKind::LostChance,
        MatchEventType::Foul => BroadcastKind::Foul,
        MatchEventType::Substitution | MatchEventType::Info => BroadcastKind::Remark,
    }
}

/// Seed of the timeline stream for one minute.
pub const fn timeline_seed(match_seed: u64, minute: u32) -> u64 {
    (match_seed ^ 0x7469_6d65_6c69_6e65).wrapping_add((minute as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

#[derive(Debug)]
struct Draft {
    payload: BroadcastPayload,
    filler: bool,
}

/// Build the current minute's broadcast items.
///
/// Items are keyed `(match, minute, index)` with indices in schedule order.
/// `window_start` is the minute's clock anchor and `window_secs` its length.
pub fn build_minute_timeline(
    session: &MatchSession,
    config: &TimelineConfig,
    window_start: DateTime<Utc>,
    window_secs: f64,
) -> Vec<BroadcastItem> {
    let game = &session.game;
    let minute = game.current_minute;
    let mut rng = ChaCha8Rng::seed_from_u64(timeline_seed(game.seed, minute));

    let events: Vec<&MatchEvent> = session.events_in_minute(minute).collect();
    let mut drafts = event_drafts(session, &events);

    // Fillers come from the side in possession, among players the events
    // did not mention.
    let side = game.possession.unwrap_or(TeamSide::Home);
    let involved: Vec<PlayerId> = events
        .iter()
        .flat_map(|e| e.player_id.into_iter().chain(e.related_player_id))
        .collect();
    let pool = filler_pool(session, side, &involved);

    let (lo, hi) = (config.filler_min.min(config.filler_max), config.filler_min.max(config.filler_max));
    let fillers = rng.random_range(lo..=hi);
    for _ in 0..fillers {
        insert_filler(&mut rng, session, side, &pool, &mut drafts);
    }

    // The closing remark takes one slot of the budget.
    let budget = config.max_items_per_minute.saturating_sub(1);
    while drafts.len() > budget {
        let Some(last_filler) = drafts.iter().rposition(|d| d.filler) else {
            break;
        };
        drafts.remove(last_filler);
    }
    let floor = config.min_items_per_minute.saturating_sub(1);
    while drafts.len() < floor.min(budget) {
        if !insert_filler(&mut rng, session, side, &pool, &mut drafts) {
            break;
        }
    }

    drafts.push(Draft {
        payload: closing_remark(&mut rng, session),
        filler: false,
    });

    let offsets = schedule_offsets(&mut rng, drafts.len(), window_secs, config);
    drafts
        .into_iter()
        .zip(offsets)
        .enumerate()
        .map(|(index, (draft, offset))| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            let at = window_start
                .checked_add_signed(offset_delta(offset))
                .unwrap_or(window_start);
            BroadcastItem::pending(BroadcastKey::new(game.id, minute, index), at, draft.payload)
        })
        .collect()
}

/// Upsert a minute's items into the ledger.
pub fn persist_broadcast_items(ledger: &mut BroadcastLedger, items: Vec<BroadcastItem>) -> PersistReport {
    let report = ledger.persist(items);
    debug!(
        inserted = report.inserted,
        refreshed = report.refreshed,
        skipped = report.skipped,
        "broadcast items persisted"
    );
    report
}

/// One draft per event, with the running score on goals and the new owner
/// on turnovers.
fn event_drafts(session: &MatchSession, events: &[&MatchEvent]) -> Vec<Draft> {
    let game = &session.game;
    let goals_by = |side: TeamSide| {
        let count = events
            .iter()
            .filter(|e| e.event_type == MatchEventType::Goal && e.side == side)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    };
    let mut home = game.home_score.saturating_sub(goals_by(TeamSide::Home));
    let mut away = game.away_score.saturating_sub(goals_by(TeamSide::Away));

    events
        .iter()
        .map(|event| {
            let kind = broadcast_kind(event.event_type);
            let score = (kind == BroadcastKind::Goal).then(|| {
                match event.side {
                    TeamSide::Home => home = home.saturating_add(1),
                    TeamSide::Away => away = away.saturating_add(1),
                }
                ScoreUpdate { home, away }
            });
            let possession = match event.event_type {
                MatchEventType::Interception => Some(PossessionUpdate {
                    side: event.side,
                    club_id: game.club(event.side),
                    zone: None,
                }),
                MatchEventType::Goal | MatchEventType::ShotMiss => {
                    let side = event.side.opponent();
                    Some(PossessionUpdate {
                        side,
                        club_id: game.club(side),
                        zone: Some(Zone::GK.to_string()),
                    })
                }
                _ => None,
            };
            let text = match &event.annotation {
                Some(note) => format!("{} ({note})", event.description),
                None => event.description.clone(),
            };
            Draft {
                payload: BroadcastPayload {
                    text,
                    kind,
                    minute: event.minute,
                    club_id: Some(game.club(event.side)),
                    player_ids: event.player_id.into_iter().chain(event.related_player_id).collect(),
                    score,
                    possession,
                },
                filler: false,
            }
        })
        .collect()
}

/// Outfield lineup players of `side`, preferring those not involved.
fn filler_pool(session: &MatchSession, side: TeamSide, involved: &[PlayerId]) -> Vec<PlayerId> {
    let outfield: Vec<PlayerId> = session
        .game
        .lineup(side)
        .map(|lineup| {
            lineup
                .slots
                .iter()
                .filter(|slot| !slot.position.is_goalkeeper())
                .map(|slot| slot.player_id)
                .collect()
        })
        .unwrap_or_default();
    let fresh: Vec<PlayerId> = outfield.iter().copied().filter(|id| !involved.contains(id)).collect();
    if fresh.len() >= 2 { fresh } else { outfield }
}

/// Add one filler pass at a random position; `false` when the pool is too
/// small.
fn insert_filler<R: Rng + ?Sized>(
    rng: &mut R,
    session: &MatchSession,
    side: TeamSide,
    pool: &[PlayerId],
    drafts: &mut Vec<Draft>,
) -> bool {
    let count = pool.len();
    if count < 2 {
        return false;
    }
    let first = rng.random_range(0..count);
    let mut second = rng.random_range(0..count.saturating_sub(1));
    if second >= first {
        second = second.saturating_add(1);
    }
    let (Some(&a), Some(&b)) = (pool.get(first), pool.get(second)) else {
        return false;
    };
    let name = |id: PlayerId| {
        session
            .roster
            .get(id)
            .map_or_else(|_| String::from("a teammate"), |p| p.name.clone())
    };
    let text = filler_line(rng.random_range(0..FILLER_LINES), &name(a), &name(b));
    let at = rng.random_range(0..=drafts.len());
    drafts.insert(
        at,
        Draft {
            payload: BroadcastPayload {
                text,
                kind: BroadcastKind::MicroPass,
                minute: session.game.current_minute,
                club_id: Some(session.game.club(side)),
                player_ids: vec![a, b],
                score: None,
                possession: None,
            },
            filler: true,
        },
    );
    true
}

const FILLER_LINES: usize = 5;

fn filler_line(variant: usize, a: &str, b: &str) -> String {
    match variant {
        0 => format!("{a} plays it short to {b}"),
        1 => format!("{a} and {b} exchange passes"),
        2 => format!("{a} rolls it square to {b}"),
        3 => format!("{a} lays it off for {b}"),
        _ => format!("{b} takes a short ball from {a}"),
    }
}

fn closing_remark<R: Rng + ?Sized>(rng: &mut R, session: &MatchSession) -> BroadcastPayload {
    let game = &session.game;
    let (home, away, minute) = (game.home_score, game.away_score, game.current_minute);
    let text = match rng.random_range(0..4_u8) {
        0 => format!("{minute} minutes gone, {home}-{away}."),
        1 => format!("The clock ticks past {minute} minutes with the score at {home}-{away}."),
        2 => format!("{home}-{away} after {minute} minutes."),
        _ => format!("Into minute {minute}, still {home}-{away}."),
    };
    BroadcastPayload {
        text,
        kind: BroadcastKind::Remark,
        minute,
        club_id: None,
        player_ids: Vec::new(),
        score: Some(ScoreUpdate { home, away }),
        possession: None,
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Offsets in seconds from the window start for `count` items.
///
/// A random start offset, then pauses that shrink towards the end of the
/// minute, compressed to fit, jittered, clamped inside the window and made
/// non-decreasing.
#[allow(clippy::cast_precision_loss)]
fn schedule_offsets<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    window_secs: f64,
    config: &TimelineConfig,
) -> Vec<f64> {
    let usable = (window_secs - config.end_margin_secs.max(0.0)).max(0.0);
    let start = rng.random::<f64>() * config.start_offset_share.clamp(0.0, 1.0) * usable;
    let (pause_lo, pause_hi) = (
        config.pause_min_secs.min(config.pause_max_secs).max(0.0),
        config.pause_max_secs.max(config.pause_min_secs).max(0.0),
    );
    let late = config.late_pause_factor.clamp(0.0, 1.0);

    let mut offsets = Vec::with_capacity(count);
    let mut cursor = start;
    for i in 0..count {
        if i > 0 {
            let progress = i as f64 / count as f64;
            let pause = rng.random_range(pause_lo..=pause_hi) * late.mul_add(-progress, 1.0);
            cursor += pause;
        }
        offsets.push(cursor);
    }

    let span = cursor - start;
    if cursor > usable && span > 0.0 {
        let scale = (usable - start) / span;
        for offset in &mut offsets {
            *offset = (*offset - start).mul_add(scale, start);
        }
    }

    let jitter = config.jitter_secs.max(0.0);
    let mut previous = 0.0_f64;
    for offset in &mut offsets {
        let shaken = *offset + rng.random_range(-jitter..=jitter);
        *offset = shaken.clamp(0.0, usable).max(previous);
        previous = *offset;
    }
    offsets
}

#[allow(clippy::cast_possible_truncation)]
fn offset_delta(seconds: f64) -> TimeDelta {
    TimeDelta::milliseconds((seconds * 1000.0).round() as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use touchline_engine::{ActionConfig, FixedOdds, NeutralTraits, SilentNarrator};

    use super::*;
    use crate::session::fixtures::live_session;

    fn anchor() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// A live session whose first minute is five passes and a goal.
    fn scripted_minute() -> MatchSession {
        let mut session = live_session(17);
        let config = ActionConfig::baseline();
        let odds = FixedOdds::always_succeed();
        let ctx = ActionContext { config: &config, odds: &odds, traits: &NeutralTraits };
        ensure_minute_events(&mut session, &ctx, &SilentNarrator, 8).unwrap();
        session
    }

    #[test]
    fn events_are_simulated_once_per_minute() {
        let mut session = live_session(3);
        let config = ActionConfig::default();
        let odds = touchline_engine::AttributeModel;
        let ctx = ActionContext { config: &config, odds: &odds, traits: &NeutralTraits };
        let first = ensure_minute_events(&mut session, &ctx, &SilentNarrator, 6).unwrap();
        assert!(first > 0);
        assert!(session.game.actions_this_minute <= 6);
        let again = ensure_minute_events(&mut session, &ctx, &SilentNarrator, 6).unwrap();
        assert_eq!(again, 0);
        assert_eq!(session.events.len(), first);
    }

    #[test]
    fn passage_stops_at_the_goal() {
        let session = scripted_minute();
        let types: Vec<MatchEventType> = session.events.iter().map(|e| e.event_type).collect();
        assert_eq!(types.len(), 7);
        assert_eq!(types.last(), Some(&MatchEventType::Goal));
        assert_eq!(session.game.home_score, 1);
    }

    #[test]
    fn timeline_keeps_events_and_ends_with_a_remark() {
        let session = scripted_minute();
        let config = TimelineConfig::default();
        let items = build_minute_timeline(&session, &config, anchor(), 60.0);

        assert!(items.len() >= config.min_items_per_minute);
        assert!(items.len() <= config.max_items_per_minute);
        assert_eq!(items.last().map(|i| i.payload.kind), Some(BroadcastKind::Remark));
        let goal = items.iter().find(|i| i.payload.kind == BroadcastKind::Goal).unwrap();
        assert_eq!(goal.payload.score, Some(ScoreUpdate { home: 1, away: 0 }));
        assert_eq!(goal.payload.possession.as_ref().map(|p| p.side), Some(TeamSide::Away));
        let passes = items
            .iter()
            .filter(|i| i.payload.kind == BroadcastKind::MicroPass && i.payload.club_id.is_some())
            .count();
        assert!(passes >= 5);
    }

    #[test]
    fn items_are_scheduled_inside_the_window_in_index_order() {
        let session = scripted_minute();
        let config = TimelineConfig::default();
        let start = anchor();
        let items = build_minute_timeline(&session, &config, start, 60.0);
        let end = start + TimeDelta::seconds(60);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.key.index as usize, i);
            assert!(item.scheduled_at >= start && item.scheduled_at <= end);
        }
        assert!(items.windows(2).all(|w| w[0].scheduled_at <= w[1].scheduled_at));
    }

    #[test]
    fn trimming_drops_fillers_but_never_events() {
        let session = scripted_minute();
        let config = TimelineConfig {
            max_items_per_minute: 3,
            min_items_per_minute: 1,
            filler_min: 3,
            filler_max: 3,
            ..TimelineConfig::default()
        };
        let items = build_minute_timeline(&session, &config, anchor(), 60.0);
        // Seven events and the remark survive; all fillers are gone.
        assert_eq!(items.len(), 8);
        let texts: Vec<&str> = session.events.iter().map(|e| e.description.as_str()).collect();
        let from_events = items.iter().filter(|i| texts.contains(&i.payload.text.as_str())).count();
        assert_eq!(from_events, 7);
    }

    #[test]
    fn sparse_minutes_are_padded() {
        let mut session = live_session(5);
        let id = session.match_id();
        session.events.push(MatchEvent::new(id, 1, MatchEventType::Info, TeamSide::Home, "quiet start"));
        let config = TimelineConfig {
            min_items_per_minute: 6,
            filler_min: 0,
            filler_max: 0,
            ..TimelineConfig::default()
        };
        let items = build_minute_timeline(&session, &config, anchor(), 60.0);
        assert_eq!(items.len(), 6);
    }

    #[test]
    fn rebuilding_a_minute_does_not_add_rows() {
        let session = scripted_minute();
        let config = TimelineConfig::default();
        let mut ledger = BroadcastLedger::new();
        let first = persist_broadcast_items(&mut ledger, build_minute_timeline(&session, &config, anchor(), 60.0));
        let stored = ledger.len();
        assert_eq!(first.inserted, stored);
        let second = persist_broadcast_items(&mut ledger, build_minute_timeline(&session, &config, anchor(), 60.0));
        assert_eq!(second.inserted, 0);
        assert_eq!(ledger.len(), stored);
    }

    #[test]
    fn short_windows_still_fit() {
        let session = scripted_minute();
        let config = TimelineConfig::default();
        let start = anchor();
        let items = build_minute_timeline(&session, &config, start, 2.0);
        let last = items.last().unwrap();
        assert!(last.scheduled_at <= start + TimeDelta::seconds(2));
    }

    #[test]
    fn kinds_cover_every_event_type() {
        assert_eq!(broadcast_kind(MatchEventType::Shot), BroadcastKind::ShotAttempt);
        assert_eq!(broadcast_kind(MatchEventType::Counterattack), BroadcastKind::LostChance);
        assert_eq!(broadcast_kind(MatchEventType::Info), BroadcastKind::Remark);
    }
}
