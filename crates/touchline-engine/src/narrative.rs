//! Narrative observer seam.
//!
//! Observers are told about every stored event after the fact (rivalries,
//! storylines, statistics). They never feed anything back into the match.

use touchline_types::{Match, MatchEventType, Player};

/// A passive listener on match events.
pub trait NarrativeObserver: Send + Sync {
    /// Called once per stored event.
    fn observe(
        &self,
        m: &Match,
        minute: u32,
        event_type: MatchEventType,
        player: Option<&Player>,
        related: Option<&Player>,
    );
}

/// The observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNarrator;

impl NarrativeObserver for SilentNarrator {
    fn observe(
        &self,
        _m: &Match,
        _minute: u32,
        _event_type: MatchEventType,
        _player: Option<&Player>,
        _related: Option<&Player>,
    ) {
    }
}
