//! Tunable chances for the action policy.
//!
//! The defaults reproduce the forward-progression policy with a sprinkle of
//! optional actions. [`ActionConfig::baseline`] turns every optional action
//! off, which leaves pass-forward-then-shoot as the only behaviour. The
//! `engine` section of `touchline-config.yaml` deserializes into this struct.

use serde::Deserialize;

/// Chances steering which action the state machine attempts.
///
/// Every field is a probability in `[0, 1]`; values outside are clamped at
/// use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionConfig {
    /// Chance that a back-line or midfield holder plays a lofted ball two rows ahead (default: 0.10).
    #[serde(default = "default_through_ball_chance")]
    pub through_ball_chance: f64,

    /// Chance that a MID or AM holder takes a defender on (default: 0.20).
    #[serde(default = "default_dribble_chance")]
    pub dribble_chance: f64,

    /// Chance that an AM holder shoots from distance (default: 0.15).
    #[serde(default = "default_long_shot_chance")]
    pub long_shot_chance: f64,

    /// Chance that a counterattack starting in the AM/FWD row shoots at once (default: 0.35).
    #[serde(default = "default_counter_shot_chance")]
    pub counter_shot_chance: f64,

    /// Chance that a foul injures the fouled player (default: 0.05).
    #[serde(default = "default_injury_chance")]
    pub injury_chance: f64,

    /// Chance that a successful dribble drifts diagonally (default: 0.30).
    #[serde(default = "default_diagonal_dribble_chance")]
    pub diagonal_dribble_chance: f64,
}

impl ActionConfig {
    /// Forward progression only: no through balls, dribbles, long shots,
    /// counter shots, injuries or diagonal drift.
    pub const fn baseline() -> Self {
        Self {
            through_ball_chance: 0.0,
            dribble_chance: 0.0,
            long_shot_chance: 0.0,
            counter_shot_chance: 0.0,
            injury_chance: 0.0,
            diagonal_dribble_chance: 0.0,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            through_ball_chance: default_through_ball_chance(),
            dribble_chance: default_dribble_chance(),
            long_shot_chance: default_long_shot_chance(),
            counter_shot_chance: default_counter_shot_chance(),
            injury_chance: default_injury_chance(),
            diagonal_dribble_chance: default_diagonal_dribble_chance(),
        }
    }
}

const fn default_through_ball_chance() -> f64 {
    0.10
}

const fn default_dribble_chance() -> f64 {
    0.20
}

const fn default_long_shot_chance() -> f64 {
    0.15
}

const fn default_counter_shot_chance() -> f64 {
    0.35
}

const fn default_injury_chance() -> f64 {
    0.05
}

const fn default_diagonal_dribble_chance() -> f64 {
    0.30
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: ActionConfig = serde_yml::from_str("dribble_chance: 0.5\n").unwrap();
        assert!((config.dribble_chance - 0.5).abs() < f64::EPSILON);
        assert!((config.long_shot_chance - default_long_shot_chance()).abs() < f64::EPSILON);
    }

    #[test]
    fn baseline_disables_optional_actions() {
        let config = ActionConfig::baseline();
        assert!(config.through_ball_chance.abs() < f64::EPSILON);
        assert!(config.counter_shot_chance.abs() < f64::EPSILON);
    }
}
