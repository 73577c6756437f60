//! Error types for the touchline-engine crate.
//!
//! Validation failures and missing recipients are not errors: the first are
//! returned as reason lists, the second as terminal action outcomes. The
//! variants here are invariant violations that abort a single action.

use touchline_types::{MatchStatus, PlayerId, TeamSide};

/// Errors raised by the action state machine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A player referenced by the match is missing from the roster.
    #[error("player {player} is not in the roster")]
    UnknownPlayer {
        /// The missing player.
        player: PlayerId,
    },

    /// A side has no lineup at all.
    #[error("{side:?} side has no lineup")]
    MissingLineup {
        /// The side without a lineup.
        side: TeamSide,
    },

    /// A lineup has no player fielded as goalkeeper.
    #[error("{side:?} lineup has no goalkeeper")]
    MissingGoalkeeper {
        /// The side without a goalkeeper.
        side: TeamSide,
    },

    /// The opposing lineup has no outfield player to defend with.
    #[error("{side:?} lineup has no outfield players")]
    EmptyLineup {
        /// The side with nobody to field.
        side: TeamSide,
    },

    /// The holder's side could not be resolved and no possession tie-break is set.
    #[error("cannot resolve the side in possession")]
    UnresolvedPossession,

    /// An action produced no events, or more than a chain can hold.
    #[error("event chain holds {len} events, expected 1 to {max}")]
    ChainLength {
        /// Events produced.
        len: usize,
        /// Capacity of a chain.
        max: usize,
    },

    /// An action was requested for a match that is not being played.
    #[error("match is {status:?}, not in progress")]
    NotInProgress {
        /// The current status.
        status: MatchStatus,
    },
}

/// Errors raised while preparing or starting a match.
#[derive(Debug, thiserror::Error)]
pub enum PreparationError {
    /// At least one lineup failed validation; reasons are also recorded on the match.
    #[error("lineup validation failed: {}", .reasons.join("; "))]
    InvalidLineup {
        /// Human-readable reasons, prefixed with the side.
        reasons: Vec<String>,
    },

    /// A start was requested before a successful preparation.
    #[error("match has not been prepared")]
    NotPrepared,

    /// A start was requested for a match that is not scheduled.
    #[error("match is {status:?}, expected scheduled")]
    NotScheduled {
        /// The current status.
        status: MatchStatus,
    },
}
