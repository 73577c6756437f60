//! Shared type definitions for the Touchline match simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the Touchline workspace. Viewer-facing types flow downstream to
//! `TypeScript` via `ts-rs` for the live match feed.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for matches, clubs, players, events
//! - [`enums`] -- Status, position, event and broadcast enumerations
//! - [`zone`] -- The 6x3 pitch zone grid and its pure helpers
//! - [`structs`] -- The match aggregate, players, lineups and event rows
//! - [`broadcast`] -- Broadcast items and outbound viewer messages

pub mod broadcast;
pub mod enums;
pub mod ids;
pub mod structs;
pub mod zone;

// Re-export all public types at crate root for convenience.
pub use broadcast::{
    BroadcastItem, BroadcastKey, BroadcastPayload, OutboundMessage, PossessionUpdate, ScoreUpdate,
};
pub use enums::{
    ActionKind, BroadcastKind, BroadcastStatus, MatchEventType, MatchStatus, MessageKind, Position,
    PositionGroup, TeamSide,
};
pub use ids::{ClubId, EventId, MatchId, PlayerId};
pub use structs::{
    FULL_CONDITION, Lineup, LineupSlot, MOMENTUM_MAX, MOMENTUM_MIN, MORALE_MAX, MORALE_MIN, Match,
    MatchCounters, MatchEvent, MatchPreparation, Player, PlayerAttributes, RealtimeState,
    TeamStrength,
};
pub use zone::{
    Row, Zone, ZoneError, ZoneSide, make_zone, mirror_side, mirrored_zone, next_zone, zone_prefix,
    zone_side,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for viewer-facing types.

    #[test]
    fn export_bindings() {
        // Calling export_all writes the bindings to `bindings/` relative to
        // the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::MatchId::export_all();
        let _ = crate::ids::ClubId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::EventId::export_all();

        // Enums
        let _ = crate::enums::MatchStatus::export_all();
        let _ = crate::enums::TeamSide::export_all();
        let _ = crate::enums::Position::export_all();
        let _ = crate::enums::PositionGroup::export_all();
        let _ = crate::enums::MatchEventType::export_all();
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::enums::BroadcastKind::export_all();
        let _ = crate::enums::BroadcastStatus::export_all();
        let _ = crate::enums::MessageKind::export_all();

        // Structs
        let _ = crate::structs::Match::export_all();
        let _ = crate::structs::MatchEvent::export_all();
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::Lineup::export_all();
        let _ = crate::structs::MatchPreparation::export_all();

        // Broadcast
        let _ = crate::broadcast::BroadcastItem::export_all();
        let _ = crate::broadcast::OutboundMessage::export_all();
    }
}
