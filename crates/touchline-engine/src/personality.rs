//! Trait engine seam.
//!
//! A trait engine lets player personalities nudge the state machine: it may
//! propose which action to attempt, scale success chances and attach a short
//! annotation to logged events. The engine must behave identically with the
//! [`NeutralTraits`] default plugged in, which proposes nothing and scales
//! nothing.

use touchline_types::{ActionKind, MatchEvent, Player, Row, TeamSide, Zone};

/// What the holder sees when choosing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Situation {
    /// Ball position from the holder's side.
    pub zone: Zone,
    /// Game minute.
    pub minute: u32,
    /// Side in possession.
    pub side: TeamSide,
    /// Goal difference from the holder's side.
    pub goal_difference: i64,
}

/// Personality nudges for one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitModifier {
    /// Multiplier on the success chance (1.0 is neutral).
    pub accuracy: f64,
    /// Added to the odds of optional risky actions (0.0 is neutral).
    pub risk: f64,
    /// Preference weight for the action, consumed by the trait engine itself.
    pub preference: f64,
}

impl TraitModifier {
    /// The modifier that changes nothing.
    pub const NEUTRAL: Self = Self {
        accuracy: 1.0,
        risk: 0.0,
        preference: 0.0,
    };
}

impl Default for TraitModifier {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A personality-driven collaborator of the state machine.
pub trait TraitEngine: Send + Sync {
    /// Propose an action; `None` leaves the choice to the default policy.
    ///
    /// Proposals not valid for the holder's row are ignored.
    fn choose_action_type(&self, player: &Player, situation: &Situation) -> Option<ActionKind>;

    /// Nudges for the given player and action.
    fn modifier(&self, player: &Player, action: ActionKind) -> TraitModifier;

    /// An optional annotation for a logged event.
    fn annotate(&self, event: &MatchEvent) -> Option<String>;
}

/// The no-op trait engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralTraits;

impl TraitEngine for NeutralTraits {
    fn choose_action_type(&self, _player: &Player, _situation: &Situation) -> Option<ActionKind> {
        None
    }

    fn modifier(&self, _player: &Player, _action: ActionKind) -> TraitModifier {
        TraitModifier::NEUTRAL
    }

    fn annotate(&self, _event: &MatchEvent) -> Option<String> {
        None
    }
}

/// Actions a holder in `row` may attempt.
pub const fn valid_actions(row: Row) -> &'static [ActionKind] {
    match row {
        Row::Gk => &[ActionKind::Pass, ActionKind::LongPass],
        Row::Def | Row::Dm | Row::Mid => &[ActionKind::Pass, ActionKind::LongPass, ActionKind::Dribble],
        Row::Am => &[ActionKind::Pass, ActionKind::Dribble, ActionKind::LongShot],
        Row::Fwd => &[ActionKind::Shot, ActionKind::Pass, ActionKind::Dribble],
    }
}

/// Whether `action` may be attempted from `row`.
pub fn is_valid_for_row(action: ActionKind, row: Row) -> bool {
    valid_actions(row).contains(&action)
}
