//! Success probabilities for passes, shots, dribbles and fouls.
//!
//! Every chance is a pure function of player attributes, pitch rows and
//! team momentum, clamped to `[0, 1]`. The [`ProbabilityModel`] trait lets
//! callers pin any chance for replays and tests ([`FixedOdds`]); the
//! default [`AttributeModel`] evaluates the formulas below.
//!
//! # Formulas
//!
//! Attributes sit on a 1-20 scale; the weights below are the 0-100 weights
//! rescaled, so `x / 40` on this scale is `x / 200` on a 0-100 one.
//!
//! ```text
//! pass     = (base(from, to) - 0.08 * skipped
//!             + (passing + vision) / 40 + positioning / 40 [+ heading / 40]
//!             - (marking + tackling) / 80)
//!            * stamina / 20 * (0.5 + morale / 200) * (1 + momentum / 200)
//!            * (0.75 + condition / 400)
//! shot     = (0.05 + 0.5 * attack * (1 - 0.6 * keeper)) * morale * momentum
//! longshot = shot * 0.5 * (0.5 + 0.5 * long_range / 20)
//! dribble  = (0.5 + 0.45 * (dribbler - defender))
//!            * stamina * morale * momentum * condition
//! foul     = 0.04 * (1 + fatigue / 100) * (1.2 - tackling / 40)
//! ```

use touchline_types::{Player, PlayerAttributes, Row};

/// Top of the attribute scale.
const ATTRIBUTE_MAX: f64 = 20.0;

/// Penalty per row a lofted pass skips beyond the first.
const LOFTED_ROW_PENALTY: f64 = 0.08;

/// Divisor of a single-attribute pass bonus.
const PASS_BONUS_DIVISOR: f64 = 40.0;

/// Divisor of the two-attribute opponent penalty.
const PASS_PENALTY_DIVISOR: f64 = 80.0;

// ---------------------------------------------------------------------------
// Clamping and multipliers
// ---------------------------------------------------------------------------

/// Clamp a chance to `[0, 1]`; `NaN` becomes 0.
pub fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp an integer to `[min, max]`.
pub const fn clamp_int(value: i32, min: i32, max: i32) -> i32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// `stamina / 20`: the stamina attribute on a unit scale.
pub fn stamina_factor(player: &Player) -> f64 {
    norm(player.attributes.stamina)
}

/// `0.75 + condition / 400`, ranging over `[0.75, 1.0]`: how much a tiring
/// player loses on top of their stamina.
pub fn condition_factor(player: &Player) -> f64 {
    player.condition.clamp(0.0, 100.0).mul_add(1.0 / 400.0, 0.75)
}

/// `0.5 + morale / 200`, ranging over `[0.5, 1.0]`.
pub fn morale_factor(player: &Player) -> f64 {
    f64::from(player.morale.clamp(0, 100)).mul_add(1.0 / 200.0, 0.5)
}

/// `1 + momentum / 200`, ranging over `[0.5, 1.5]`.
pub fn momentum_factor(momentum: i32) -> f64 {
    f64::from(momentum.clamp(-100, 100)).mul_add(1.0 / 200.0, 1.0)
}

fn norm(value: u32) -> f64 {
    (f64::from(value) / ATTRIBUTE_MAX).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// Base pass chance for moving the ball between two rows.
///
/// Forward passes use the chance of the final step, so a pass skipping a
/// row is based on the step into its target row.
pub fn base_pass_chance(from: Row, to: Row) -> f64 {
    match to.index().cmp(&from.index()) {
        std::cmp::Ordering::Equal => 0.85,
        std::cmp::Ordering::Less => 0.88,
        std::cmp::Ordering::Greater => match to {
            Row::Gk | Row::Def => 0.90,
            Row::Dm => 0.80,
            Row::Mid => 0.75,
            Row::Am => 0.70,
            Row::Fwd => 0.65,
        },
    }
}

/// Inputs to a pass chance.
#[derive(Debug, Clone, Copy)]
pub struct PassAttempt<'a> {
    /// The player passing.
    pub passer: &'a Player,
    /// The intended recipient.
    pub recipient: &'a Player,
    /// The opponent trying to cut the pass out, if any.
    pub opponent: Option<&'a Player>,
    /// Row the pass starts in.
    pub from: Row,
    /// Row the pass is aimed at.
    pub to: Row,
    /// Whether the ball is lofted.
    pub lofted: bool,
    /// Momentum of the passing side.
    pub momentum: i32,
}

/// Pass success chance.
pub fn pass_success(attempt: &PassAttempt<'_>) -> f64 {
    let passer = &attempt.passer.attributes;
    let recipient = &attempt.recipient.attributes;

    let mut chance = base_pass_chance(attempt.from, attempt.to);
    if attempt.lofted {
        let span = attempt.to.index().saturating_sub(attempt.from.index());
        chance -= LOFTED_ROW_PENALTY * f64::from(span.saturating_sub(1));
    }

    chance += f64::from(passer.passing.saturating_add(passer.vision)) / PASS_BONUS_DIVISOR;
    chance += f64::from(recipient.positioning) / PASS_BONUS_DIVISOR;
    if attempt.lofted {
        chance += f64::from(recipient.heading) / PASS_BONUS_DIVISOR;
    }
    if let Some(opponent) = attempt.opponent {
        let a = &opponent.attributes;
        chance -= f64::from(a.marking.saturating_add(a.tackling)) / PASS_PENALTY_DIVISOR;
    }

    clamp(
        chance
            * stamina_factor(attempt.passer)
            * morale_factor(attempt.passer)
            * momentum_factor(attempt.momentum)
            * condition_factor(attempt.passer),
    )
}

// ---------------------------------------------------------------------------
// Shots
// ---------------------------------------------------------------------------

/// Inputs to a shot chance.
#[derive(Debug, Clone, Copy)]
pub struct ShotAttempt<'a> {
    /// The player shooting.
    pub shooter: &'a Player,
    /// The goalkeeper facing the shot, if any.
    pub keeper: Option<&'a Player>,
    /// Momentum of the shooting side.
    pub momentum: i32,
}

fn attack_rating(a: &PlayerAttributes) -> f64 {
    norm(a.finishing).mul_add(0.6, norm(a.accuracy) * 0.4)
}

fn keeper_rating(a: &PlayerAttributes) -> f64 {
    norm(a.reflexes).mul_add(0.4, norm(a.handling).mul_add(0.3, norm(a.positioning) * 0.3))
}

/// Close-range shot success chance.
pub fn shot_success(attempt: &ShotAttempt<'_>) -> f64 {
    clamp(close_shot_raw(attempt))
}

/// Long-range shot success chance; always below the close-range chance
/// for the same shooter and keeper.
pub fn long_shot_success(attempt: &ShotAttempt<'_>) -> f64 {
    let range = norm(attempt.shooter.attributes.long_range).mul_add(0.5, 0.5);
    clamp(close_shot_raw(attempt) * 0.5 * range)
}

fn close_shot_raw(attempt: &ShotAttempt<'_>) -> f64 {
    let attack = attack_rating(&attempt.shooter.attributes);
    let keeper = attempt.keeper.map_or(0.0, |k| keeper_rating(&k.attributes));
    let base = (0.5 * attack).mul_add(0.6_f64.mul_add(-keeper, 1.0), 0.05);
    base * morale_factor(attempt.shooter) * momentum_factor(attempt.momentum)
}

// ---------------------------------------------------------------------------
// Dribble and foul
// ---------------------------------------------------------------------------

/// Inputs to a dribble chance.
#[derive(Debug, Clone, Copy)]
pub struct DribbleAttempt<'a> {
    /// The player on the ball.
    pub dribbler: &'a Player,
    /// The defender being taken on, if any.
    pub defender: Option<&'a Player>,
    /// Momentum of the dribbling side.
    pub momentum: i32,
}

/// Dribble success chance.
pub fn dribble_success(attempt: &DribbleAttempt<'_>) -> f64 {
    let d = &attempt.dribbler.attributes;
    let dribbler = norm(d.dribbling).mul_add(0.45, norm(d.pace).mul_add(0.30, norm(d.flair) * 0.25));
    let defender = attempt.defender.map_or(0.0, |p| {
        let a = &p.attributes;
        norm(a.tackling).mul_add(0.45, norm(a.marking).mul_add(0.30, norm(a.strength) * 0.25))
    });
    let base = 0.45_f64.mul_add(dribbler - defender, 0.5);
    clamp(
        base * stamina_factor(attempt.dribbler)
            * morale_factor(attempt.dribbler)
            * momentum_factor(attempt.momentum)
            * condition_factor(attempt.dribbler),
    )
}

/// Chance that the defending player commits a foul, rising with fatigue.
pub fn foul_chance(defender: &Player) -> f64 {
    let fatigue = defender.fatigue() / 100.0;
    let discipline = 1.2 - f64::from(defender.attributes.tackling) / 40.0;
    clamp(0.04 * (1.0 + fatigue) * discipline)
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Source of success chances for the state machine.
pub trait ProbabilityModel: Send + Sync {
    /// Chance that a pass reaches its recipient.
    fn pass(&self, attempt: &PassAttempt<'_>) -> f64;

    /// Chance that a shot goes in; `long` selects the long-range formula.
    fn shot(&self, attempt: &ShotAttempt<'_>, long: bool) -> f64;

    /// Chance that a dribble beats the defender.
    fn dribble(&self, attempt: &DribbleAttempt<'_>) -> f64;

    /// Chance that the defender fouls after a pass or dribble.
    fn foul(&self, defender: &Player) -> f64;
}

/// The attribute-driven model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeModel;

impl ProbabilityModel for AttributeModel {
    fn pass(&self, attempt: &PassAttempt<'_>) -> f64 {
        pass_success(attempt)
    }

    fn shot(&self, attempt: &ShotAttempt<'_>, long: bool) -> f64 {
        if long {
            long_shot_success(attempt)
        } else {
            shot_success(attempt)
        }
    }

    fn dribble(&self, attempt: &DribbleAttempt<'_>) -> f64 {
        dribble_success(attempt)
    }

    fn foul(&self, defender: &Player) -> f64 {
        foul_chance(defender)
    }
}

/// A model with optionally pinned chances; unpinned ones use [`AttributeModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedOdds {
    /// Pinned pass chance.
    pub pass: Option<f64>,
    /// Pinned close-range shot chance.
    pub shot: Option<f64>,
    /// Pinned long-range shot chance.
    pub long_shot: Option<f64>,
    /// Pinned dribble chance.
    pub dribble: Option<f64>,
    /// Pinned foul chance.
    pub foul: Option<f64>,
}

impl FixedOdds {
    /// Everything succeeds and nobody fouls.
    pub const fn always_succeed() -> Self {
        Self {
            pass: Some(1.0),
            shot: Some(1.0),
            long_shot: Some(1.0),
            dribble: Some(1.0),
            foul: Some(0.0),
        }
    }

    /// Nothing succeeds and nobody fouls.
    pub const fn always_fail() -> Self {
        Self {
            pass: Some(0.0),
            shot: Some(0.0),
            long_shot: Some(0.0),
            dribble: Some(0.0),
            foul: Some(0.0),
        }
    }
}

impl ProbabilityModel for FixedOdds {
    fn pass(&self, attempt: &PassAttempt<'_>) -> f64 {
        self.pass.map_or_else(|| pass_success(attempt), clamp)
    }

    fn shot(&self, attempt: &ShotAttempt<'_>, long: bool) -> f64 {
        let pinned = if long { self.long_shot } else { self.shot };
        pinned.map_or_else(|| AttributeModel.shot(attempt, long), clamp)
    }

    fn dribble(&self, attempt: &DribbleAttempt<'_>) -> f64 {
        self.dribble.map_or_else(|| dribble_success(attempt), clamp)
    }

    fn foul(&self, defender: &Player) -> f64 {
        self.foul.map_or_else(|| foul_chance(defender), clamp)
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use touchline_types::{ClubId, Position};

    use super::*;

    fn player(value: u32, morale: i32, condition: f64) -> Player {
        let mut p = Player::new(
            ClubId::new(),
            "Test",
            Position::CentralMidfielder,
            PlayerAttributes::uniform(value),
        );
        p.morale = morale;
        p.condition = condition;
        p
    }

    fn in_unit(value: f64) -> bool {
        (0.0..=1.0).contains(&value)
    }

    #[test]
    fn clamp_handles_nan_and_bounds() {
        assert!(clamp(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp(3.0) - 1.0).abs() < f64::EPSILON);
        assert!(clamp(-1.0).abs() < f64::EPSILON);
        assert_eq!(clamp_int(120, -100, 100), 100);
        assert_eq!(clamp_int(-120, -100, 100), -100);
        assert_eq!(clamp_int(7, -100, 100), 7);
    }

    #[test]
    fn every_chance_stays_in_unit_interval() {
        for value in [1, 5, 10, 15, 20] {
            for morale in [0, 50, 100] {
                for condition in [0.0, 50.0, 100.0] {
                    for momentum in [-100, 0, 100] {
                        let a = player(value, morale, condition);
                        let b = player(21_u32.saturating_sub(value), 100 - morale, 100.0 - condition);
                        for (from, to) in [(Row::Gk, Row::Def), (Row::Dm, Row::Am), (Row::Fwd, Row::Mid)] {
                            for lofted in [false, true] {
                                let pass = pass_success(&PassAttempt {
                                    passer: &a,
                                    recipient: &a,
                                    opponent: Some(&b),
                                    from,
                                    to,
                                    lofted,
                                    momentum,
                                });
                                assert!(in_unit(pass));
                            }
                        }
                        let shot = ShotAttempt { shooter: &a, keeper: Some(&b), momentum };
                        assert!(in_unit(shot_success(&shot)));
                        assert!(in_unit(long_shot_success(&shot)));
                        let dribble = DribbleAttempt { dribbler: &a, defender: Some(&b), momentum };
                        assert!(in_unit(dribble_success(&dribble)));
                        assert!(in_unit(foul_chance(&b)));
                    }
                }
            }
        }
    }

    #[test]
    fn close_shot_beats_long_shot() {
        for value in [1, 8, 14, 20] {
            let shooter = player(value, 80, 100.0);
            let keeper = player(10, 50, 100.0);
            let attempt = ShotAttempt { shooter: &shooter, keeper: Some(&keeper), momentum: 0 };
            assert!(shot_success(&attempt) > long_shot_success(&attempt));
        }
    }

    #[test]
    fn base_chances_follow_the_row_table() {
        assert!((base_pass_chance(Row::Gk, Row::Def) - 0.90).abs() < 1e-9);
        assert!((base_pass_chance(Row::Am, Row::Fwd) - 0.65).abs() < 1e-9);
        assert!((base_pass_chance(Row::Mid, Row::Mid) - 0.85).abs() < 1e-9);
        assert!((base_pass_chance(Row::Am, Row::Dm) - 0.88).abs() < 1e-9);
        // A skipped row uses the final step.
        assert!((base_pass_chance(Row::Dm, Row::Am) - 0.70).abs() < 1e-9);
    }

    #[test]
    fn lofted_pass_to_a_poor_header_pays_for_distance() {
        let p = player(10, 100, 100.0);
        let mut target = player(10, 100, 100.0);
        target.attributes.heading = 1;
        let mut attempt = PassAttempt {
            passer: &p,
            recipient: &target,
            opponent: None,
            from: Row::Def,
            to: Row::Mid,
            lofted: false,
            momentum: 0,
        };
        let ground = pass_success(&attempt);
        attempt.lofted = true;
        let lofted = pass_success(&attempt);
        // heading bonus 0.025 minus one skipped row 0.08
        assert!(lofted < ground);
    }

    #[test]
    fn stamina_attribute_drives_the_pass_chance() {
        let mut fit = player(10, 50, 80.0);
        fit.attributes.stamina = 18;
        let mut unfit = player(10, 50, 80.0);
        unfit.attributes.stamina = 4;
        let recipient = player(10, 50, 100.0);
        let pass = |passer: &Player| {
            pass_success(&PassAttempt {
                passer,
                recipient: &recipient,
                opponent: None,
                from: Row::Mid,
                to: Row::Am,
                lofted: false,
                momentum: 0,
            })
        };
        assert!(pass(&fit) > pass(&unfit));
        assert!((stamina_factor(&fit) - 0.9).abs() < 1e-9);
        assert!((stamina_factor(&unfit) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn condition_tires_on_top_of_stamina() {
        let fresh = player(10, 50, 100.0);
        let tired = player(10, 50, 20.0);
        assert!((condition_factor(&fresh) - 1.0).abs() < 1e-9);
        assert!((condition_factor(&tired) - 0.8).abs() < 1e-9);
        let dribble = |dribbler: &Player| {
            dribble_success(&DribbleAttempt { dribbler, defender: None, momentum: 0 })
        };
        assert!(dribble(&fresh) > dribble(&tired));
    }

    #[test]
    fn passer_bonus_spans_the_full_scale() {
        let mut star = player(1, 100, 100.0);
        star.attributes.passing = 20;
        star.attributes.vision = 20;
        let novice = player(1, 100, 100.0);
        let recipient = player(1, 100, 100.0);
        let raw = |passer: &Player| {
            // stamina 20 removes the stamina scaling for the comparison
            let mut p = passer.clone();
            p.attributes.stamina = 20;
            pass_success(&PassAttempt {
                passer: &p,
                recipient: &recipient,
                opponent: None,
                from: Row::Am,
                to: Row::Fwd,
                lofted: false,
                momentum: 0,
            })
        };
        // 0.65 + 0.05 + 0.025 for the novice, clamped to 1 for the star.
        assert!((raw(&novice) - 0.725).abs() < 1e-9);
        assert!((raw(&star) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tired_defenders_foul_more() {
        let fresh = player(10, 50, 100.0);
        let tired = player(10, 50, 20.0);
        assert!(foul_chance(&tired) > foul_chance(&fresh));
    }

    #[test]
    fn fixed_odds_pin_and_fall_back() {
        let a = player(10, 50, 100.0);
        let odds = FixedOdds { pass: Some(1.0), ..FixedOdds::default() };
        let attempt = PassAttempt {
            passer: &a,
            recipient: &a,
            opponent: None,
            from: Row::Gk,
            to: Row::Def,
            lofted: false,
            momentum: 0,
        };
        assert!((odds.pass(&attempt) - 1.0).abs() < f64::EPSILON);
        assert!((odds.foul(&a) - foul_chance(&a)).abs() < f64::EPSILON);
        assert!(FixedOdds::always_fail().shot(&ShotAttempt { shooter: &a, keeper: None, momentum: 0 }, true).abs() < f64::EPSILON);
    }
}
