//! Passing.
//!
//! A ground pass moves the ball one row forward, or sideways within the
//! forward row. A lofted pass skips a row. An intercepted pass hands the ball
//! to the defender and starts a counterattack, which may end in a shot when
//! the interception happens high enough up the pitch.

use rand::Rng;
use touchline_types::{
    ActionKind, Match, MatchEventType, PlayerAttributes, PlayerId, Row, Zone, make_zone,
    mirrored_zone, next_zone,
};

use super::{
    ActionContext, ActionOutcome, Turn, commit_foul, event, name, no_recipient, pick_defender,
    pick_recipient, shot, turn_over,
};
use crate::dice::roll;
use crate::error::EngineError;
use crate::momentum::shift_momentum;
use crate::morale::{MoraleEvent, apply_event};
use crate::probability::{PassAttempt, clamp};
use crate::roster::Roster;
use crate::zones::lateral_side;

/// Rows a lofted pass travels.
const LOFTED_SPAN: u8 = 2;

fn interceptor_weight(a: &PlayerAttributes) -> u32 {
    a.marking.saturating_add(a.positioning)
}

/// Where a pass from `zone` is aimed.
fn target_zone<R: Rng + ?Sized>(rng: &mut R, zone: Zone, lofted: bool) -> Zone {
    let row = zone.row();
    if lofted {
        make_zone(
            Row::from_index(row.index().saturating_add(LOFTED_SPAN)),
            zone.side(),
        )
    } else if row == Row::Fwd {
        make_zone(Row::Fwd, lateral_side(rng, zone.side()))
    } else {
        next_zone(zone)
    }
}

/// Attempt a pass from the current holder.
pub(crate) fn attempt<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    turn: Turn,
    lofted: bool,
) -> Result<ActionOutcome, EngineError> {
    let kind = if lofted {
        ActionKind::LongPass
    } else {
        ActionKind::Pass
    };
    let target = target_zone(rng, turn.zone, lofted);
    let Some(recipient) = pick_recipient(m, roster, turn.side, target, Some(turn.holder), rng)? else {
        return no_recipient(m, roster, rng, turn);
    };

    let defending = turn.side.opponent();
    let defender_zone = mirrored_zone(target, true);
    let interceptor = pick_defender(m, roster, defending, defender_zone, rng, interceptor_weight)?;

    let (chance, foul_chance) = {
        let passer = roster.get(turn.holder)?;
        let opponent = roster.get(interceptor)?;
        let pass = PassAttempt {
            passer,
            recipient: roster.get(recipient)?,
            opponent: Some(opponent),
            from: turn.zone.row(),
            to: target.row(),
            lofted,
            momentum: m.momentum(turn.side),
        };
        let accuracy = ctx.traits.modifier(passer, kind).accuracy;
        (clamp(ctx.odds.pass(&pass) * accuracy), ctx.odds.foul(opponent))
    };

    if roll(rng, chance) {
        completed(m, roster, ctx, rng, turn, kind, recipient, target, interceptor, foul_chance)
    } else {
        intercepted(m, roster, ctx, rng, turn, interceptor, defender_zone)
    }
}

#[allow(clippy::too_many_arguments)]
fn completed<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    turn: Turn,
    kind: ActionKind,
    recipient: PlayerId,
    target: Zone,
    marker: PlayerId,
    foul_chance: f64,
) -> Result<ActionOutcome, EngineError> {
    m.ball_holder = Some(recipient);
    m.current_zone = Some(target);
    m.counters.passes = m.counters.passes.saturating_add(1);
    m.counters.possessions = m.counters.possessions.saturating_add(1);
    shift_momentum(m, turn.side);
    apply_event(m, roster, turn.holder, turn.side, MoraleEvent::PassCompleted, turn.zone.row())?;

    let verb = if kind == ActionKind::LongPass {
        "sends a long ball to"
    } else {
        "finds"
    };
    let mut events = vec![
        event(
            m,
            MatchEventType::Pass,
            turn.side,
            format!(
                "{} {verb} {} in {target}",
                name(roster, turn.holder),
                name(roster, recipient)
            ),
        )
        .with_player(turn.holder)
        .with_related(recipient),
    ];

    if roll(rng, foul_chance) {
        let row = target.row().mirrored();
        events.extend(commit_foul(m, roster, ctx, rng, turn.side.opponent(), marker, recipient, row)?);
        return ActionOutcome::new(ActionKind::Foul, false, events);
    }
    ActionOutcome::new(kind, true, events)
}

fn intercepted<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    turn: Turn,
    interceptor: PlayerId,
    counter_zone: Zone,
) -> Result<ActionOutcome, EngineError> {
    let defending = turn.side.opponent();
    apply_event(m, roster, turn.holder, turn.side, MoraleEvent::PassIntercepted, turn.zone.row())?;
    apply_event(m, roster, interceptor, defending, MoraleEvent::Interception, counter_zone.row())?;
    turn_over(m, defending, interceptor, counter_zone);

    let interceptor_name = name(roster, interceptor);
    let mut events = vec![
        event(
            m,
            MatchEventType::Interception,
            defending,
            format!(
                "{interceptor_name} reads it and cuts out the pass from {}",
                name(roster, turn.holder)
            ),
        )
        .with_player(interceptor)
        .with_related(turn.holder),
        event(
            m,
            MatchEventType::Counterattack,
            defending,
            format!("{interceptor_name} breaks forward from {counter_zone}"),
        )
        .with_player(interceptor),
    ];

    if counter_zone.row().is_attacking_third() && roll(rng, ctx.config.counter_shot_chance) {
        let counter = Turn {
            side: defending,
            holder: interceptor,
            zone: counter_zone,
        };
        let long = counter_zone.row() != Row::Fwd;
        let (shot_events, _) = shot::resolve(m, roster, ctx, rng, counter, long)?;
        events.extend(shot_events);
        return ActionOutcome::new(ActionKind::Counterattack, false, events);
    }
    ActionOutcome::new(ActionKind::Counterattack, true, events)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use touchline_types::TeamSide;

    use super::*;
    use crate::action::simulate_one_action;
    use crate::config::ActionConfig;
    use crate::personality::NeutralTraits;
    use crate::preparation::{prepare_match, start_match};
    use crate::probability::FixedOdds;
    use crate::testing::fixture;

    fn started() -> (Match, Roster) {
        let (mut m, mut roster) = fixture();
        prepare_match(&mut m, &mut roster).unwrap();
        start_match(&mut m).unwrap();
        (m, roster)
    }

    #[test]
    fn lofted_pass_skips_a_row() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let from: Zone = "DEF-L".parse().unwrap();
        assert_eq!(target_zone(&mut rng, from, true), "MID-L".parse().unwrap());
        let high: Zone = "AM-R".parse().unwrap();
        assert_eq!(target_zone(&mut rng, high, true), "FWD-R".parse().unwrap());
    }

    #[test]
    fn forward_row_passes_go_sideways() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..20 {
            let to = target_zone(&mut rng, "FWD-C".parse().unwrap(), false);
            assert_eq!(to.row(), Row::Fwd);
            assert_ne!(to.side(), touchline_types::ZoneSide::C);
        }
    }

    #[test]
    fn completed_keeper_pass_advances_one_row() {
        let (mut m, mut roster) = started();
        let config = ActionConfig::baseline();
        let odds = FixedOdds::always_succeed();
        let ctx = ActionContext { config: &config, odds: &odds, traits: &NeutralTraits };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let swing = m.home_momentum - m.away_momentum;

        let outcome = simulate_one_action(&mut m, &mut roster, &ctx, &mut rng).unwrap();

        assert_eq!(outcome.action, ActionKind::Pass);
        assert!(outcome.continues);
        assert_eq!(m.current_zone.map(Zone::row), Some(Row::Def));
        assert_eq!(m.counters.passes, 1);
        assert_eq!(m.counters.possessions, 1);
        assert_eq!(m.home_momentum - m.away_momentum, swing + 2);
        assert_eq!(m.possession, Some(TeamSide::Home));
    }

    #[test]
    fn failed_pass_becomes_a_counterattack() {
        let (mut m, mut roster) = started();
        let config = ActionConfig::baseline();
        let odds = FixedOdds::always_fail();
        let ctx = ActionContext { config: &config, odds: &odds, traits: &NeutralTraits };
        let mut rng = ChaCha8Rng::seed_from_u64(12);

        let outcome = simulate_one_action(&mut m, &mut roster, &ctx, &mut rng).unwrap();

        assert_eq!(outcome.action, ActionKind::Counterattack);
        assert!(outcome.chain.contains(MatchEventType::Interception));
        assert!(outcome.chain.contains(MatchEventType::Counterattack));
        assert_eq!(m.possession, Some(TeamSide::Away));
        // Cut out in the home defence means the away side is in its attacking third.
        assert_eq!(m.current_zone.map(Zone::row), Some(Row::Am));
    }

    #[test]
    fn certain_foul_stops_play_after_the_pass() {
        let (mut m, mut roster) = started();
        let config = ActionConfig::baseline();
        let odds = FixedOdds {
            foul: Some(1.0),
            ..FixedOdds::always_succeed()
        };
        let ctx = ActionContext { config: &config, odds: &odds, traits: &NeutralTraits };
        let mut rng = ChaCha8Rng::seed_from_u64(13);

        let outcome = simulate_one_action(&mut m, &mut roster, &ctx, &mut rng).unwrap();

        assert_eq!(outcome.action, ActionKind::Foul);
        assert!(!outcome.continues);
        assert_eq!(m.counters.fouls, 1);
        assert_eq!(outcome.chain.follow_ups().first().map(|e| e.event_type), Some(MatchEventType::Foul));
    }
}
