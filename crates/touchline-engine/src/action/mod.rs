//! The action state machine.
//!
//! [`simulate_one_action`] executes exactly one possession action for a
//! match in play: it decides what the ball holder attempts, rolls the
//! outcome through the [`ProbabilityModel`], mutates counters, zone, ball
//! holder, momentum and morale, and returns an [`ActionOutcome`] carrying a
//! primary event and up to three chained follow-ups (for example
//! interception, counterattack, shot, goal).
//!
//! # Modules
//!
//! - [`pass`] -- Ground and lofted passes, interceptions, counterattacks
//! - [`shot`] -- Close and long-range shots
//! - [`dribble`] -- Take-ons and the fouls they draw
//!
//! All zones are held from the possessing side's point of view. Whenever the
//! ball changes hands the zone is mirrored with
//! [`mirrored_zone`](touchline_types::mirrored_zone).

pub mod dribble;
pub mod pass;
pub mod shot;

use rand::Rng;
use touchline_types::{
    ActionKind, Match, MatchEvent, MatchEventType, MatchStatus, PlayerAttributes, PlayerId, Row,
    TeamSide, Zone,
};
use tracing::debug;

use crate::config::ActionConfig;
use crate::dice::{roll, weighted_pick};
use crate::error::EngineError;
use crate::momentum::shift_momentum;
use crate::morale::{MoraleEvent, apply_event};
use crate::personality::{Situation, TraitEngine, is_valid_for_row};
use crate::probability::ProbabilityModel;
use crate::roster::Roster;
use crate::zones::{ZoneQuery, zone_conditions};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A primary event plus up to [`EventChain::MAX_FOLLOW_UPS`] follow-ups, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChain {
    primary: MatchEvent,
    follow_ups: Vec<MatchEvent>,
}

impl EventChain {
    /// Largest number of chained follow-ups.
    pub const MAX_FOLLOW_UPS: usize = 3;

    /// Build a chain from events in order; the first is the primary.
    pub fn from_events(events: Vec<MatchEvent>) -> Result<Self, EngineError> {
        let len = events.len();
        let max = Self::MAX_FOLLOW_UPS.saturating_add(1);
        let mut iter = events.into_iter();
        match iter.next() {
            Some(primary) if len <= max => Ok(Self {
                primary,
                follow_ups: iter.collect(),
            }),
            _ => Err(EngineError::ChainLength { len, max }),
        }
    }

    /// The primary event.
    pub const fn primary(&self) -> &MatchEvent {
        &self.primary
    }

    /// The chained follow-ups, in order.
    pub fn follow_ups(&self) -> &[MatchEvent] {
        &self.follow_ups
    }

    /// All events, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &MatchEvent> + '_ {
        std::iter::once(&self.primary).chain(self.follow_ups.iter())
    }

    /// Number of events including the primary.
    pub fn len(&self) -> usize {
        self.follow_ups.len().saturating_add(1)
    }

    /// Always false; a chain holds at least its primary event.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether any event in the chain has the given type.
    pub fn contains(&self, event_type: MatchEventType) -> bool {
        self.iter().any(|e| e.event_type == event_type)
    }

    /// Consume the chain into its events, primary first.
    pub fn into_events(self) -> Vec<MatchEvent> {
        let mut events = Vec::with_capacity(self.len());
        events.push(self.primary);
        events.extend(self.follow_ups);
        events
    }
}

/// What one call of the state machine did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// The kind of action performed.
    pub action: ActionKind,
    /// Whether play carries on within the same minute.
    pub continues: bool,
    /// The events produced.
    pub chain: EventChain,
}

impl ActionOutcome {
    fn new(action: ActionKind, continues: bool, events: Vec<MatchEvent>) -> Result<Self, EngineError> {
        Ok(Self {
            action,
            continues,
            chain: EventChain::from_events(events)?,
        })
    }
}

/// Collaborators injected into every action.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    /// Optional-action chances.
    pub config: &'a ActionConfig,
    /// Success chances.
    pub odds: &'a dyn ProbabilityModel,
    /// Personality nudges.
    pub traits: &'a dyn TraitEngine,
}

/// Who has the ball and where, from the possessing side's point of view.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Turn {
    pub(crate) side: TeamSide,
    pub(crate) holder: PlayerId,
    pub(crate) zone: Zone,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Execute one possession action.
///
/// On the first call of a match the ball is placed with the home
/// goalkeeper. A missing recipient is a terminal outcome, not an error;
/// errors are reserved for corrupt match state.
pub fn simulate_one_action<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
) -> Result<ActionOutcome, EngineError> {
    if m.status != MatchStatus::InProgress {
        return Err(EngineError::NotInProgress { status: m.status });
    }

    let turn = resolve_turn(m, roster)?;
    m.actions_this_minute = m.actions_this_minute.saturating_add(1);

    let action = {
        let holder = roster.get(turn.holder)?;
        let situation = Situation {
            zone: turn.zone,
            minute: m.current_minute,
            side: turn.side,
            goal_difference: m.goal_difference(turn.side),
        };
        choose_action(holder, &situation, ctx, rng)
    };

    let outcome = match action {
        ActionKind::LongPass => pass::attempt(m, roster, ctx, rng, turn, true),
        ActionKind::Dribble => dribble::attempt(m, roster, ctx, rng, turn),
        ActionKind::Shot => shot::attempt(m, roster, ctx, rng, turn, false),
        ActionKind::LongShot => shot::attempt(m, roster, ctx, rng, turn, true),
        ActionKind::Pass | ActionKind::Counterattack | ActionKind::Foul | ActionKind::NoRecipient => {
            pass::attempt(m, roster, ctx, rng, turn, false)
        }
    }?;

    debug!(
        match_id = %m.id,
        minute = m.current_minute,
        action = ?outcome.action,
        continues = outcome.continues,
        events = outcome.chain.len(),
        "action simulated"
    );
    Ok(outcome)
}

/// Place the ball for kick-off if needed and resolve the side in possession.
fn resolve_turn(m: &mut Match, roster: &Roster) -> Result<Turn, EngineError> {
    let holder = match m.ball_holder {
        Some(holder) => holder,
        None => {
            let keeper = goalkeeper(m, TeamSide::Home)?;
            m.ball_holder = Some(keeper);
            m.current_zone = Some(Zone::GK);
            m.possession = Some(TeamSide::Home);
            keeper
        }
    };
    let club = roster.get(holder)?.club_id;
    let side = m
        .side_of_club(club)
        .or(m.possession)
        .ok_or(EngineError::UnresolvedPossession)?;
    let zone = m.current_zone.unwrap_or(Zone::GK);
    m.current_zone = Some(zone);
    m.possession = Some(side);
    Ok(Turn { side, holder, zone })
}

fn optional<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &ActionContext<'_>,
    holder: &touchline_types::Player,
    kind: ActionKind,
    chance: f64,
) -> bool {
    roll(rng, chance + ctx.traits.modifier(holder, kind).risk)
}

/// The forward-progression policy, unless the trait engine proposes a valid action.
fn choose_action<R: Rng + ?Sized>(
    holder: &touchline_types::Player,
    situation: &Situation,
    ctx: &ActionContext<'_>,
    rng: &mut R,
) -> ActionKind {
    let row = situation.zone.row();
    if let Some(kind) = ctx.traits.choose_action_type(holder, situation)
        && is_valid_for_row(kind, row)
    {
        return kind;
    }
    let config = ctx.config;
    match row {
        Row::Gk | Row::Def | Row::Dm => {
            if optional(rng, ctx, holder, ActionKind::LongPass, config.through_ball_chance) {
                ActionKind::LongPass
            } else {
                ActionKind::Pass
            }
        }
        Row::Mid => {
            if optional(rng, ctx, holder, ActionKind::Dribble, config.dribble_chance) {
                ActionKind::Dribble
            } else if optional(rng, ctx, holder, ActionKind::LongPass, config.through_ball_chance) {
                ActionKind::LongPass
            } else {
                ActionKind::Pass
            }
        }
        Row::Am => {
            if optional(rng, ctx, holder, ActionKind::LongShot, config.long_shot_chance) {
                ActionKind::LongShot
            } else if optional(rng, ctx, holder, ActionKind::Dribble, config.dribble_chance) {
                ActionKind::Dribble
            } else {
                ActionKind::Pass
            }
        }
        Row::Fwd => ActionKind::Shot,
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// The goalkeeper of one side.
pub(crate) fn goalkeeper(m: &Match, side: TeamSide) -> Result<PlayerId, EngineError> {
    m.lineup(side)
        .ok_or(EngineError::MissingLineup { side })?
        .goalkeeper()
        .ok_or(EngineError::MissingGoalkeeper { side })
}

/// Lineup players of `side` eligible for `query`, with a selection weight.
fn weighted_candidates(
    m: &Match,
    roster: &Roster,
    side: TeamSide,
    query: ZoneQuery,
    exclude: Option<PlayerId>,
    weight: fn(&PlayerAttributes) -> u32,
) -> Result<Vec<(PlayerId, u32)>, EngineError> {
    let lineup = m.lineup(side).ok_or(EngineError::MissingLineup { side })?;
    let admits = zone_conditions(query);
    let mut out = Vec::new();
    for slot in &lineup.slots {
        if Some(slot.player_id) == exclude || !admits(slot.position) {
            continue;
        }
        let player = roster.get(slot.player_id)?;
        out.push((slot.player_id, weight(&player.attributes).max(1)));
    }
    Ok(out)
}

/// A teammate in `zone`, weighted by positioning; `None` when nobody fits.
pub(crate) fn pick_recipient<R: Rng + ?Sized>(
    m: &Match,
    roster: &Roster,
    side: TeamSide,
    zone: Zone,
    exclude: Option<PlayerId>,
    rng: &mut R,
) -> Result<Option<PlayerId>, EngineError> {
    let candidates = weighted_candidates(m, roster, side, ZoneQuery::At(zone), exclude, |a| a.positioning)?;
    Ok(weighted_pick(rng, &candidates))
}

/// A defender of `side` for `zone` (their point of view), falling back to
/// any outfield player.
pub(crate) fn pick_defender<R: Rng + ?Sized>(
    m: &Match,
    roster: &Roster,
    side: TeamSide,
    zone: Zone,
    rng: &mut R,
    weight: fn(&PlayerAttributes) -> u32,
) -> Result<PlayerId, EngineError> {
    let mut candidates = weighted_candidates(m, roster, side, ZoneQuery::At(zone), None, weight)?;
    if candidates.is_empty() {
        let keeper = goalkeeper(m, side).ok();
        candidates = weighted_candidates(m, roster, side, ZoneQuery::Any, keeper, weight)?;
    }
    weighted_pick(rng, &candidates).ok_or(EngineError::EmptyLineup { side })
}

/// Display name for commentary; unknown players are "someone".
pub(crate) fn name(roster: &Roster, player: PlayerId) -> String {
    roster
        .get(player)
        .map_or_else(|_| String::from("someone"), |p| p.name.clone())
}

/// A new event row for the match's current minute.
pub(crate) fn event(
    m: &Match,
    event_type: MatchEventType,
    side: TeamSide,
    description: String,
) -> MatchEvent {
    MatchEvent::new(m.id, m.current_minute, event_type, side, description)
}

/// Hand the ball to `player` of `side` in `zone` (their point of view).
pub(crate) fn turn_over(m: &mut Match, side: TeamSide, player: PlayerId, zone: Zone) {
    m.ball_holder = Some(player);
    m.current_zone = Some(zone);
    m.possession = Some(side);
    m.counters.possessions = m.counters.possessions.saturating_add(1);
    shift_momentum(m, side);
}

/// Record a foul by `fouler` on `victim`, with a possible injury.
///
/// `row` is the fouler's row from their own side's point of view.
#[allow(clippy::too_many_arguments)]
pub(crate) fn commit_foul<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    fouler_side: TeamSide,
    fouler: PlayerId,
    victim: PlayerId,
    row: Row,
) -> Result<Vec<MatchEvent>, EngineError> {
    m.counters.fouls = m.counters.fouls.saturating_add(1);
    apply_event(m, roster, fouler, fouler_side, MoraleEvent::FoulCommitted, row)?;
    let fouler_name = name(roster, fouler);
    let victim_name = name(roster, victim);
    let mut events = vec![
        event(
            m,
            MatchEventType::Foul,
            fouler_side,
            format!("{fouler_name} brings down {victim_name}"),
        )
        .with_player(fouler)
        .with_related(victim),
    ];
    if roll(rng, ctx.config.injury_chance) {
        m.counters.injuries = m.counters.injuries.saturating_add(1);
        events.push(
            event(
                m,
                MatchEventType::Info,
                fouler_side.opponent(),
                format!("{victim_name} is down injured after the challenge"),
            )
            .with_player(victim)
            .with_related(fouler),
        );
    }
    Ok(events)
}

/// Nobody to pass to: the ball goes to the opponent.
pub(crate) fn no_recipient<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &Roster,
    rng: &mut R,
    turn: Turn,
) -> Result<ActionOutcome, EngineError> {
    let defending = turn.side.opponent();
    let zone = touchline_types::mirrored_zone(turn.zone, true);
    let (taker, taker_zone) = match pick_recipient(m, roster, defending, zone, None, rng)? {
        Some(player) => (player, zone),
        None => (goalkeeper(m, defending)?, Zone::GK),
    };
    let description = format!(
        "{} has nobody to find in {}; {} collects the loose ball",
        name(roster, turn.holder),
        turn.zone,
        name(roster, taker)
    );
    let info = event(m, MatchEventType::Info, turn.side, description)
        .with_player(turn.holder)
        .with_related(taker);
    turn_over(m, defending, taker, taker_zone);
    ActionOutcome::new(ActionKind::NoRecipient, false, vec![info])
}
