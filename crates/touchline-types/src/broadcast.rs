//! Broadcast items and outbound viewer messages.
//!
//! A [`BroadcastItem`] is one paced micro-message scheduled inside a minute
//! window. Its [`BroadcastKey`] is deterministic so rebuilding a minute
//! never produces duplicates. [`OutboundMessage`] is the JSON envelope
//! delivered to viewers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BroadcastKind, BroadcastStatus, MatchStatus, MessageKind, TeamSide};
use crate::ids::{ClubId, MatchId, PlayerId};

/// Idempotency key of a broadcast item: `(match, minute, index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BroadcastKey {
    /// The match the item belongs to.
    pub match_id: MatchId,
    /// Game minute.
    pub minute: u32,
    /// Position within the minute's timeline.
    pub index: u32,
}

impl BroadcastKey {
    /// Build a key.
    pub const fn new(match_id: MatchId, minute: u32, index: u32) -> Self {
        Self {
            match_id,
            minute,
            index,
        }
    }
}

impl fmt::Display for BroadcastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.match_id, self.minute, self.index)
    }
}

/// Score snapshot attached to goal items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoreUpdate {
    /// Home goals.
    pub home: u32,
    /// Away goals.
    pub away: u32,
}

/// Possession snapshot attached to items where the ball changed hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PossessionUpdate {
    /// Side now in possession.
    pub side: TeamSide,
    /// Club now in possession.
    pub club_id: ClubId,
    /// Zone name from the new owner's point of view, when known.
    pub zone: Option<String>,
}

/// Viewer-facing content of a broadcast item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BroadcastPayload {
    /// Commentary text.
    pub text: String,
    /// Category.
    pub kind: BroadcastKind,
    /// Game minute.
    pub minute: u32,
    /// Club the line is about, if any.
    pub club_id: Option<ClubId>,
    /// Players mentioned.
    pub player_ids: Vec<PlayerId>,
    /// Nested score update, published alongside the line.
    pub score: Option<ScoreUpdate>,
    /// Nested possession update, published alongside the line.
    pub possession: Option<PossessionUpdate>,
}

/// A scheduled commentary item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BroadcastItem {
    /// Idempotency key.
    pub key: BroadcastKey,
    /// When the item becomes due.
    pub scheduled_at: DateTime<Utc>,
    /// Content.
    pub payload: BroadcastPayload,
    /// Dispatch state.
    pub status: BroadcastStatus,
    /// When the item was published.
    pub sent_at: Option<DateTime<Utc>>,
}

impl BroadcastItem {
    /// A fresh pending item.
    pub const fn pending(key: BroadcastKey, scheduled_at: DateTime<Utc>, payload: BroadcastPayload) -> Self {
        Self {
            key,
            scheduled_at,
            payload,
            status: BroadcastStatus::Pending,
            sent_at: None,
        }
    }

    /// Whether the item still waits for dispatch.
    pub fn is_pending(&self) -> bool {
        self.status == BroadcastStatus::Pending
    }
}

/// Envelope published to viewers, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum OutboundMessage {
    /// Minute tick.
    MatchUpdate {
        /// The match.
        match_id: MatchId,
        /// Minute now being played.
        minute: u32,
        /// Status after the update.
        status: MatchStatus,
        /// Current score.
        score: ScoreUpdate,
    },
    /// One line of commentary.
    CommentaryLine {
        /// The match.
        match_id: MatchId,
        /// Idempotency key of the source item, rendered as a string.
        key: String,
        /// Commentary content.
        payload: BroadcastPayload,
    },
    /// Score changed.
    ScoreUpdate {
        /// The match.
        match_id: MatchId,
        /// Game minute.
        minute: u32,
        /// New score.
        score: ScoreUpdate,
    },
    /// Ball changed hands.
    PossessionUpdate {
        /// The match.
        match_id: MatchId,
        /// Game minute.
        minute: u32,
        /// New possession.
        possession: PossessionUpdate,
    },
}

impl OutboundMessage {
    /// The kind tag of this message.
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::MatchUpdate { .. } => MessageKind::MatchUpdate,
            Self::CommentaryLine { .. } => MessageKind::CommentaryLine,
            Self::ScoreUpdate { .. } => MessageKind::ScoreUpdate,
            Self::PossessionUpdate { .. } => MessageKind::PossessionUpdate,
        }
    }

    /// The match the message is about.
    pub const fn match_id(&self) -> MatchId {
        match self {
            Self::MatchUpdate { match_id, .. }
            | Self::CommentaryLine { match_id, .. }
            | Self::ScoreUpdate { match_id, .. }
            | Self::PossessionUpdate { match_id, .. } => *match_id,
        }
    }
}
