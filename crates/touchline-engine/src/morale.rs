//! Player morale.
//!
//! A morale change is a base delta per event scaled by four multipliers:
//!
//! - time of match (0.8 early, rising to 1.5 after the 85th minute)
//! - scoreline (leaders swing less, trailing sides more)
//! - pitch third (attacking-third events weigh 1.25, defensive 0.9)
//! - a position table keyed by (position group, event)
//!
//! The product is rounded and clamped to [`MAX_DELTA`] before being applied.
//! Between events morale drifts one point per minute toward `base_morale`.

use touchline_types::{
    MORALE_MAX, MORALE_MIN, Match, Player, PlayerId, PositionGroup, Row, TeamSide,
};

use crate::error::EngineError;
use crate::probability::clamp_int;
use crate::roster::Roster;

/// Largest single morale swing.
pub const MAX_DELTA: i32 = 15;

/// Something that moves a player's morale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoraleEvent {
    /// Scored a goal.
    Goal,
    /// Conceded a goal.
    GoalConceded,
    /// Completed a pass.
    PassCompleted,
    /// Had a pass cut out.
    PassIntercepted,
    /// Cut out a pass or won a tackle.
    Interception,
    /// Missed a shot.
    ShotMissed,
    /// Kept a shot out.
    Save,
    /// Beat a defender.
    DribbleWon,
    /// Lost the ball on a dribble.
    DribbleLost,
    /// Gave away a foul.
    FoulCommitted,
}

impl MoraleEvent {
    /// Unscaled delta.
    pub const fn base_delta(self) -> i32 {
        match self {
            Self::Goal => 8,
            Self::GoalConceded => -6,
            Self::PassCompleted => 1,
            Self::PassIntercepted | Self::ShotMissed | Self::DribbleLost => -2,
            Self::Interception | Self::DribbleWon => 2,
            Self::Save => 3,
            Self::FoulCommitted => -1,
        }
    }
}

/// Situation a morale event happens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoraleContext {
    /// Game minute.
    pub minute: u32,
    /// Goal difference from the affected player's side.
    pub goal_difference: i64,
    /// Row of the event from the affected player's side.
    pub row: Row,
}

/// Stepped multiplier peaking late in the match.
pub const fn time_multiplier(minute: u32) -> f64 {
    match minute {
        0..=15 => 0.8,
        16..=30 => 0.9,
        31..=60 => 1.0,
        61..=75 => 1.1,
        76..=85 => 1.25,
        _ => 1.5,
    }
}

/// Dampens swings for leaders and amplifies them for trailing sides.
pub const fn score_multiplier(goal_difference: i64, gain: bool) -> f64 {
    match (goal_difference.signum(), gain) {
        (1, true) => 0.8,
        (1, false) => 0.9,
        (-1, true) => 1.3,
        (-1, false) => 1.2,
        _ => 1.0,
    }
}

/// Attacking-third events weigh more, defensive-third ones less.
pub const fn zone_multiplier(row: Row) -> f64 {
    if row.is_attacking_third() {
        1.25
    } else if row.is_defensive_third() {
        0.9
    } else {
        1.0
    }
}

/// Per-position weighting of an event.
pub const fn position_modifier(group: PositionGroup, event: MoraleEvent) -> f64 {
    match (group, event) {
        (PositionGroup::Forward, MoraleEvent::Goal) | (PositionGroup::Goalkeeper, MoraleEvent::Save) => 1.5,
        (PositionGroup::Goalkeeper, MoraleEvent::GoalConceded) => 2.0,
        (PositionGroup::Defender, MoraleEvent::GoalConceded | MoraleEvent::Interception) => 1.3,
        (PositionGroup::Midfielder, MoraleEvent::PassCompleted | MoraleEvent::Goal)
        | (PositionGroup::Forward, MoraleEvent::ShotMissed) => 1.2,
        _ => 1.0,
    }
}

/// The rounded, clamped morale delta for one event.
#[allow(clippy::cast_possible_truncation)]
pub fn morale_delta(event: MoraleEvent, group: PositionGroup, ctx: MoraleContext) -> i32 {
    let base = event.base_delta();
    let scaled = f64::from(base)
        * time_multiplier(ctx.minute)
        * score_multiplier(ctx.goal_difference, base > 0)
        * zone_multiplier(ctx.row)
        * position_modifier(group, event);
    scaled.round().clamp(f64::from(-MAX_DELTA), f64::from(MAX_DELTA)) as i32
}

/// Add a delta to a player's morale, keeping it in range.
pub fn apply_delta(player: &mut Player, delta: i32) {
    player.morale = clamp_int(player.morale.saturating_add(delta), MORALE_MIN, MORALE_MAX);
}

/// Move morale one point toward `base_morale`.
pub fn drift_toward_base(player: &mut Player) {
    let step = (player.base_morale.saturating_sub(player.morale)).signum();
    apply_delta(player, step);
}

/// Apply a morale event to a player in a live match.
///
/// `row` is expressed from the point of view of the player's own side; the
/// goal difference and position group are resolved from the match.
pub fn apply_event(
    m: &Match,
    roster: &mut Roster,
    player: PlayerId,
    side: TeamSide,
    event: MoraleEvent,
    row: Row,
) -> Result<i32, EngineError> {
    let group = m
        .lineup(side)
        .and_then(|lineup| lineup.position_of(player))
        .map(touchline_types::Position::group);
    let target = roster.get_mut(player)?;
    let group = group.unwrap_or_else(|| target.position.group());
    let delta = morale_delta(
        event,
        group,
        MoraleContext {
            minute: m.current_minute,
            goal_difference: m.goal_difference(side),
            row,
        },
    );
    apply_delta(target, delta);
    Ok(delta)
}
