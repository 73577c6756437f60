//! Enumeration types for the Touchline match engine.
//!
//! Lifecycle states, player positions, event kinds and the broadcast
//! vocabulary shared by the engine, the realtime pipeline and the archive.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Match lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MatchStatus {
    /// Created but not yet kicked off.
    Scheduled,
    /// The realtime loop is advancing the match.
    InProgress,
    /// Temporarily halted; the loop keeps polling but nothing is built.
    Paused,
    /// The match-length limit was reached.
    Finished,
}

impl MatchStatus {
    /// Stable lowercase name, as stored in the archive.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }

    /// Whether a realtime loop should keep running for this status.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::InProgress | Self::Paused)
    }
}

/// Which end of the fixture a club plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TeamSide {
    /// The home club.
    Home,
    /// The visiting club.
    Away,
}

impl TeamSide {
    /// The other side.
    pub const fn opponent(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Broad positional group used for lineup rules and weight tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PositionGroup {
    /// Goalkeepers.
    Goalkeeper,
    /// Centre backs, full backs and wing backs.
    Defender,
    /// Defensive, central, wide and attacking midfielders.
    Midfielder,
    /// Strikers and wingers.
    Forward,
}

/// Nominal position of a player in a lineup slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Position {
    /// Goalkeeper.
    Goalkeeper,
    /// Centre back.
    CentreBack,
    /// Left full back.
    LeftBack,
    /// Right full back.
    RightBack,
    /// Left wing back.
    LeftWingBack,
    /// Right wing back.
    RightWingBack,
    /// Defensive midfielder.
    DefensiveMidfielder,
    /// Central midfielder.
    CentralMidfielder,
    /// Left midfielder.
    LeftMidfielder,
    /// Right midfielder.
    RightMidfielder,
    /// Attacking midfielder.
    AttackingMidfielder,
    /// Left winger.
    LeftWinger,
    /// Right winger.
    RightWinger,
    /// Striker.
    Striker,
}

impl Position {
    /// Every position, goalkeeper first.
    pub const ALL: [Self; 14] = [
        Self::Goalkeeper,
        Self::CentreBack,
        Self::LeftBack,
        Self::RightBack,
        Self::LeftWingBack,
        Self::RightWingBack,
        Self::DefensiveMidfielder,
        Self::CentralMidfielder,
        Self::LeftMidfielder,
        Self::RightMidfielder,
        Self::AttackingMidfielder,
        Self::LeftWinger,
        Self::RightWinger,
        Self::Striker,
    ];

    /// Human-readable label, e.g. `"Defensive Midfielder"`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Goalkeeper => "Goalkeeper",
            Self::CentreBack => "Centre Back",
            Self::LeftBack => "Left Back",
            Self::RightBack => "Right Back",
            Self::LeftWingBack => "Left Wing Back",
            Self::RightWingBack => "Right Wing Back",
            Self::DefensiveMidfielder => "Defensive Midfielder",
            Self::CentralMidfielder => "Central Midfielder",
            Self::LeftMidfielder => "Left Midfielder",
            Self::RightMidfielder => "Right Midfielder",
            Self::AttackingMidfielder => "Attacking Midfielder",
            Self::LeftWinger => "Left Winger",
            Self::RightWinger => "Right Winger",
            Self::Striker => "Striker",
        }
    }

    /// The positional group this position counts toward.
    pub const fn group(self) -> PositionGroup {
        match self {
            Self::Goalkeeper => PositionGroup::Goalkeeper,
            Self::CentreBack
            | Self::LeftBack
            | Self::RightBack
            | Self::LeftWingBack
            | Self::RightWingBack => PositionGroup::Defender,
            Self::DefensiveMidfielder
            | Self::CentralMidfielder
            | Self::LeftMidfielder
            | Self::RightMidfielder
            | Self::AttackingMidfielder => PositionGroup::Midfielder,
            Self::LeftWinger | Self::RightWinger | Self::Striker => PositionGroup::Forward,
        }
    }

    /// Whether this is the goalkeeper position.
    pub const fn is_goalkeeper(self) -> bool {
        matches!(self, Self::Goalkeeper)
    }
}

// ---------------------------------------------------------------------------
// Events and actions
// ---------------------------------------------------------------------------

/// Type of a logged [`MatchEvent`](crate::structs::MatchEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MatchEventType {
    /// A goal was scored.
    Goal,
    /// A completed pass.
    Pass,
    /// A successful dribble past a defender.
    Dribble,
    /// A shot was taken (always followed by a goal or a miss).
    Shot,
    /// A shot that did not go in.
    ShotMiss,
    /// A pass was cut out by the opponent.
    Interception,
    /// The intercepting side breaks forward.
    Counterattack,
    /// A foul was committed.
    Foul,
    /// A player was replaced.
    Substitution,
    /// Informational row (kick-off, half time, injuries, turnovers).
    Info,
}

impl MatchEventType {
    /// Stable lowercase name, as stored in the archive.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Pass => "pass",
            Self::Dribble => "dribble",
            Self::Shot => "shot",
            Self::ShotMiss => "shot_miss",
            Self::Interception => "interception",
            Self::Counterattack => "counterattack",
            Self::Foul => "foul",
            Self::Substitution => "substitution",
            Self::Info => "info",
        }
    }
}

/// The kind of action one call of the state machine performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Ground pass one row forward (or sideways / backward).
    Pass,
    /// Lofted through ball skipping a row.
    LongPass,
    /// Take on a defender.
    Dribble,
    /// Shot from the forward row.
    Shot,
    /// Shot from distance.
    LongShot,
    /// The ball was intercepted and the opponent broke forward.
    Counterattack,
    /// A foul ended the action.
    Foul,
    /// Nobody was available to receive the ball.
    NoRecipient,
}

impl ActionKind {
    /// Whether this kind is a shot of either range.
    pub const fn is_shot(self) -> bool {
        matches!(self, Self::Shot | Self::LongShot)
    }
}

// ---------------------------------------------------------------------------
// Broadcast vocabulary
// ---------------------------------------------------------------------------

/// Viewer-facing category of a broadcast item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BroadcastKind {
    /// A goal.
    Goal,
    /// A shot being struck.
    ShotAttempt,
    /// A shot going wide or being saved.
    ShotMiss,
    /// A short pass, real or filler.
    MicroPass,
    /// A pass being cut out.
    Interception,
    /// A move breaking down (counterattack or turnover).
    LostChance,
    /// A foul.
    Foul,
    /// Colour commentary, including the closing remark of each minute.
    Remark,
}

impl BroadcastKind {
    /// Stable lowercase name, as stored in the archive.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::ShotAttempt => "shot_attempt",
            Self::ShotMiss => "shot_miss",
            Self::MicroPass => "micro_pass",
            Self::Interception => "interception",
            Self::LostChance => "lost_chance",
            Self::Foul => "foul",
            Self::Remark => "remark",
        }
    }
}

/// Dispatch state of a broadcast item. Items never move from `Sent` back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BroadcastStatus {
    /// Waiting for its scheduled time.
    Pending,
    /// Published to viewers.
    Sent,
}

impl BroadcastStatus {
    /// Stable lowercase name, as stored in the archive.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
        }
    }
}

/// Kind tag of an outbound viewer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MessageKind {
    /// Minute tick with score and status.
    MatchUpdate,
    /// One line of paced commentary.
    CommentaryLine,
    /// The scoreline changed.
    ScoreUpdate,
    /// The ball changed hands.
    PossessionUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wingers_count_as_forwards() {
        assert_eq!(Position::LeftWinger.group(), PositionGroup::Forward);
        assert_eq!(Position::AttackingMidfielder.group(), PositionGroup::Midfielder);
        assert_eq!(Position::RightWingBack.group(), PositionGroup::Defender);
    }

    #[test]
    fn only_goalkeeper_is_goalkeeper() {
        let keepers = Position::ALL.iter().filter(|p| p.is_goalkeeper()).count();
        assert_eq!(keepers, 1);
    }

    #[test]
    fn status_names_match_serde() {
        for status in [
            MatchStatus::Scheduled,
            MatchStatus::InProgress,
            MatchStatus::Paused,
            MatchStatus::Finished,
        ] {
            let json = serde_json::to_string(&status).ok();
            assert_eq!(json, Some(format!("\"{}\"", status.as_str())));
        }
    }

    #[test]
    fn broadcast_kind_names_match_serde() {
        for kind in [BroadcastKind::ShotAttempt, BroadcastKind::MicroPass, BroadcastKind::LostChance] {
            let json = serde_json::to_string(&kind).ok();
            assert_eq!(json, Some(format!("\"{}\"", kind.as_str())));
        }
    }

    #[test]
    fn opponent_is_symmetric() {
        assert_eq!(TeamSide::Home.opponent(), TeamSide::Away);
        assert_eq!(TeamSide::Away.opponent().opponent(), TeamSide::Away);
    }
}
