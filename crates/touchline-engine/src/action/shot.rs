//! Shooting.
//!
//! Every shot ends the passage of play: a goal or a miss both return the
//! ball to the defending goalkeeper in `GK`.

use rand::Rng;
use touchline_types::{ActionKind, Match, MatchEvent, MatchEventType, Row, TeamSide, Zone};

use super::{ActionContext, ActionOutcome, Turn, event, goalkeeper, name};
use crate::dice::roll;
use crate::error::EngineError;
use crate::momentum::shift_momentum;
use crate::morale::{MoraleEvent, apply_event};
use crate::probability::{ShotAttempt, clamp};
use crate::roster::Roster;

/// Take a shot as the holder's action.
pub(crate) fn attempt<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    turn: Turn,
    long: bool,
) -> Result<ActionOutcome, EngineError> {
    let kind = if long {
        ActionKind::LongShot
    } else {
        ActionKind::Shot
    };
    let (events, _) = resolve(m, roster, ctx, rng, turn, long)?;
    ActionOutcome::new(kind, false, events)
}

/// Resolve a shot by `turn.holder`, returning its two events and whether it
/// went in.
pub(crate) fn resolve<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    turn: Turn,
    long: bool,
) -> Result<(Vec<MatchEvent>, bool), EngineError> {
    let defending = turn.side.opponent();
    let keeper = goalkeeper(m, defending)?;
    m.counters.shots = m.counters.shots.saturating_add(1);

    let chance = {
        let shooter = roster.get(turn.holder)?;
        let attempt = ShotAttempt {
            shooter,
            keeper: Some(roster.get(keeper)?),
            momentum: m.momentum(turn.side),
        };
        let kind = if long {
            ActionKind::LongShot
        } else {
            ActionKind::Shot
        };
        clamp(ctx.odds.shot(&attempt, long) * ctx.traits.modifier(shooter, kind).accuracy)
    };

    let shooter_name = name(roster, turn.holder);
    let keeper_name = name(roster, keeper);
    let range = if long { "from distance" } else { "from close range" };
    let shot = event(
        m,
        MatchEventType::Shot,
        turn.side,
        format!("{shooter_name} shoots {range}"),
    )
    .with_player(turn.holder)
    .with_related(keeper);

    let scored = roll(rng, chance);
    let outcome = if scored {
        // Morale reads the scoreline before the goal counts.
        apply_event(m, roster, turn.holder, turn.side, MoraleEvent::Goal, turn.zone.row())?;
        apply_event(m, roster, keeper, defending, MoraleEvent::GoalConceded, Row::Gk)?;
        m.add_goal(turn.side);
        shift_momentum(m, turn.side);
        let (home, away) = (m.score(TeamSide::Home), m.score(TeamSide::Away));
        event(
            m,
            MatchEventType::Goal,
            turn.side,
            format!("GOAL! {shooter_name} beats {keeper_name}. It is {home}-{away}"),
        )
        .with_player(turn.holder)
        .with_related(keeper)
    } else {
        apply_event(m, roster, turn.holder, turn.side, MoraleEvent::ShotMissed, turn.zone.row())?;
        apply_event(m, roster, keeper, defending, MoraleEvent::Save, Row::Gk)?;
        shift_momentum(m, defending);
        event(
            m,
            MatchEventType::ShotMiss,
            turn.side,
            format!("{shooter_name} cannot beat {keeper_name}"),
        )
        .with_player(turn.holder)
        .with_related(keeper)
    };

    m.ball_holder = Some(keeper);
    m.current_zone = Some(Zone::GK);
    m.possession = Some(defending);
    m.counters.possessions = m.counters.possessions.saturating_add(1);

    Ok((vec![shot, outcome], scored))
}
