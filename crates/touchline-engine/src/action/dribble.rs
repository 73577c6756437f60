//! Dribbling.

use rand::Rng;
use touchline_types::{ActionKind, Match, MatchEventType, PlayerAttributes, Row, Zone, mirrored_zone};

use super::{ActionContext, ActionOutcome, Turn, commit_foul, event, name, pick_defender, turn_over};
use crate::dice::roll;
use crate::error::EngineError;
use crate::morale::{MoraleEvent, apply_event};
use crate::probability::{DribbleAttempt, clamp};
use crate::roster::Roster;
use crate::zones::{forward_dribble_zone, random_adjacent_zone};

/// Where a beaten defender leaves the ball: one row on, or a sidestep
/// along the forward row when there is no row left to gain.
fn carry_zone<R: Rng + ?Sized>(rng: &mut R, from: Zone, diagonal_chance: f64) -> Zone {
    if from.row() == Row::Fwd {
        random_adjacent_zone(rng, from)
    } else {
        forward_dribble_zone(rng, from, diagonal_chance)
    }
}

fn tackler_weight(a: &PlayerAttributes) -> u32 {
    a.tackling.saturating_add(a.marking)
}

/// Take on the nearest defender.
///
/// A successful dribble carries the ball one row forward, or to a
/// neighbouring zone from the forward row. A failed one is
/// either a foul (play stops, the ball stays) or a clean tackle that turns
/// the ball over.
pub(crate) fn attempt<R: Rng + ?Sized>(
    m: &mut Match,
    roster: &mut Roster,
    ctx: &ActionContext<'_>,
    rng: &mut R,
    turn: Turn,
) -> Result<ActionOutcome, EngineError> {
    let defending = turn.side.opponent();
    let defender_zone = mirrored_zone(turn.zone, true);
    let defender = pick_defender(m, roster, defending, defender_zone, rng, tackler_weight)?;

    let (chance, foul_chance) = {
        let dribbler = roster.get(turn.holder)?;
        let opponent = roster.get(defender)?;
        let attempt = DribbleAttempt {
            dribbler,
            defender: Some(opponent),
            momentum: m.momentum(turn.side),
        };
        let accuracy = ctx.traits.modifier(dribbler, ActionKind::Dribble).accuracy;
        (clamp(ctx.odds.dribble(&attempt) * accuracy), ctx.odds.foul(opponent))
    };

    let dribbler_name = name(roster, turn.holder);
    let defender_name = name(roster, defender);

    if roll(rng, chance) {
        let to = carry_zone(rng, turn.zone, ctx.config.diagonal_dribble_chance);
        m.current_zone = Some(to);
        apply_event(m, roster, turn.holder, turn.side, MoraleEvent::DribbleWon, to.row())?;
        let beaten = event(
            m,
            MatchEventType::Dribble,
            turn.side,
            format!("{dribbler_name} skips past {defender_name} into {to}"),
        )
        .with_player(turn.holder)
        .with_related(defender);
        return ActionOutcome::new(ActionKind::Dribble, true, vec![beaten]);
    }

    if roll(rng, foul_chance) {
        let events = commit_foul(
            m,
            roster,
            ctx,
            rng,
            defending,
            defender,
            turn.holder,
            defender_zone.row(),
        )?;
        return ActionOutcome::new(ActionKind::Foul, false, events);
    }

    apply_event(m, roster, turn.holder, turn.side, MoraleEvent::DribbleLost, turn.zone.row())?;
    apply_event(m, roster, defender, defending, MoraleEvent::Interception, defender_zone.row())?;
    turn_over(m, defending, defender, defender_zone);
    let tackle = event(
        m,
        MatchEventType::Interception,
        defending,
        format!("{defender_name} stands up to {dribbler_name} and wins the ball"),
    )
    .with_player(defender)
    .with_related(turn.holder);
    ActionOutcome::new(ActionKind::Dribble, true, vec![tackle])
}
