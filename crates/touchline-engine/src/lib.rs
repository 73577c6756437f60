//! Match simulation engine for Touchline.
//!
//! This crate owns everything that happens on the pitch: who can stand in
//! which zone, how likely a pass or shot is to come off, how morale and
//! momentum move, how a match is prepared, and the action state machine
//! that plays one possession action at a time. It holds no clock and does
//! no I/O; the realtime layer in `touchline-core` drives it.
//!
//! # Modules
//!
//! - [`action`] -- The action state machine and [`simulate_one_action`].
//! - [`config`] -- [`ActionConfig`] chances for optional actions.
//! - [`dice`] -- Seeded rolls and weighted picks.
//! - [`error`] -- [`EngineError`] and [`PreparationError`].
//! - [`momentum`] -- Momentum swings and the pre-match seed.
//! - [`morale`] -- Morale deltas, multipliers and drift.
//! - [`narrative`] -- [`NarrativeObserver`] hook and [`SilentNarrator`].
//! - [`personality`] -- [`TraitEngine`] hook and [`NeutralTraits`].
//! - [`preparation`] -- Lineup validation, strength ratings, kick-off.
//! - [`probability`] -- Success chances and the [`ProbabilityModel`] seam.
//! - [`roster`] -- Player storage keyed by id.
//! - [`zones`] -- Zone occupancy and random zone movement.
//!
//! [`simulate_one_action`]: action::simulate_one_action
//! [`ActionConfig`]: config::ActionConfig
//! [`EngineError`]: error::EngineError
//! [`PreparationError`]: error::PreparationError
//! [`NarrativeObserver`]: narrative::NarrativeObserver
//! [`SilentNarrator`]: narrative::SilentNarrator
//! [`TraitEngine`]: personality::TraitEngine
//! [`NeutralTraits`]: personality::NeutralTraits
//! [`ProbabilityModel`]: probability::ProbabilityModel

pub mod action;
pub mod config;
pub mod dice;
pub mod error;
pub mod momentum;
pub mod morale;
pub mod narrative;
pub mod personality;
pub mod preparation;
pub mod probability;
pub mod roster;
pub mod zones;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{ActionContext, ActionOutcome, EventChain, simulate_one_action};
pub use config::ActionConfig;
pub use error::{EngineError, PreparationError};
pub use narrative::{NarrativeObserver, SilentNarrator};
pub use personality::{NeutralTraits, Situation, TraitEngine, TraitModifier};
pub use preparation::{auto_select_lineup, prepare_match, start_match, validate_lineup};
pub use probability::{AttributeModel, FixedOdds, ProbabilityModel};
pub use roster::Roster;
