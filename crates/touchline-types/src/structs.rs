//! Core entity structs for the Touchline match engine.
//!
//! Covers the [`Match`] aggregate, [`Player`] snapshots with their
//! attributes, [`Lineup`]s, strength figures produced by preparation and the
//! immutable [`MatchEvent`] log row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{MatchEventType, MatchStatus, Position, TeamSide};
use crate::ids::{ClubId, EventId, MatchId, PlayerId};
use crate::zone::Zone;

/// Lower bound of team momentum.
pub const MOMENTUM_MIN: i32 = -100;
/// Upper bound of team momentum.
pub const MOMENTUM_MAX: i32 = 100;
/// Lower bound of player morale.
pub const MORALE_MIN: i32 = 0;
/// Upper bound of player morale.
pub const MORALE_MAX: i32 = 100;
/// Condition of a fully rested player.
pub const FULL_CONDITION: f64 = 100.0;

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Playing attributes on a 1-20 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerAttributes {
    /// Short and long passing technique.
    pub passing: u32,
    /// Ability to spot a pass.
    pub vision: u32,
    /// Finding space, in and out of possession.
    pub positioning: u32,
    /// Heading technique.
    pub heading: u32,
    /// Staying tight to an opponent.
    pub marking: u32,
    /// Winning the ball in a challenge.
    pub tackling: u32,
    /// Resistance to fatigue.
    pub stamina: u32,
    /// Close control at speed.
    pub dribbling: u32,
    /// Top speed.
    pub pace: u32,
    /// Unpredictability on the ball.
    pub flair: u32,
    /// Composure in front of goal.
    pub finishing: u32,
    /// Shooting from distance.
    pub long_range: u32,
    /// Shot placement.
    pub accuracy: u32,
    /// Goalkeeper reaction saves.
    pub reflexes: u32,
    /// Goalkeeper catching and parrying.
    pub handling: u32,
    /// Commanding the air.
    pub aerial: u32,
    /// Physical strength in duels.
    pub strength: u32,
}

impl PlayerAttributes {
    /// Every attribute set to the same value.
    pub const fn uniform(value: u32) -> Self {
        Self {
            passing: value,
            vision: value,
            positioning: value,
            heading: value,
            marking: value,
            tackling: value,
            stamina: value,
            dribbling: value,
            pace: value,
            flair: value,
            finishing: value,
            long_range: value,
            accuracy: value,
            reflexes: value,
            handling: value,
            aerial: value,
            strength: value,
        }
    }
}

impl Default for PlayerAttributes {
    fn default() -> Self {
        Self::uniform(10)
    }
}

/// A player snapshot as read (and mutated) by the match engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique identifier.
    pub id: PlayerId,
    /// The club the player is registered with.
    pub club_id: ClubId,
    /// Display name used in commentary.
    pub name: String,
    /// Natural position.
    pub position: Position,
    /// Playing attributes.
    pub attributes: PlayerAttributes,
    /// Current morale (0-100).
    pub morale: i32,
    /// Resting morale the player drifts back toward.
    pub base_morale: i32,
    /// Transient match condition (0-100); fatigue is `100 - condition`.
    #[serde(default = "default_condition")]
    pub condition: f64,
}

const fn default_condition() -> f64 {
    FULL_CONDITION
}

impl Player {
    /// Create a fully rested player with morale at its base.
    pub fn new(club_id: ClubId, name: impl Into<String>, position: Position, attributes: PlayerAttributes) -> Self {
        Self {
            id: PlayerId::new(),
            club_id,
            name: name.into(),
            position,
            attributes,
            morale: 50,
            base_morale: 50,
            condition: FULL_CONDITION,
        }
    }

    /// Fatigue as a 0-100 figure.
    pub fn fatigue(&self) -> f64 {
        (FULL_CONDITION - self.condition).clamp(0.0, FULL_CONDITION)
    }
}

// ---------------------------------------------------------------------------
// Lineups
// ---------------------------------------------------------------------------

/// One of the eleven slots of a lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LineupSlot {
    /// The player filling the slot.
    pub player_id: PlayerId,
    /// The nominal position the player is fielded in.
    pub position: Position,
}

/// An ordered starting eleven plus a tactic label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Lineup {
    /// Slots in formation order, goalkeeper first by convention.
    pub slots: Vec<LineupSlot>,
    /// Free-form tactic label, e.g. `"4-4-2"`.
    pub tactic: String,
}

impl Lineup {
    /// The first player fielded as goalkeeper.
    pub fn goalkeeper(&self) -> Option<PlayerId> {
        self.slots
            .iter()
            .find(|slot| slot.position.is_goalkeeper())
            .map(|slot| slot.player_id)
    }

    /// Whether the player is in this lineup.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.slots.iter().any(|slot| slot.player_id == player)
    }

    /// The nominal position of a player in this lineup.
    pub fn position_of(&self, player: PlayerId) -> Option<Position> {
        self.slots
            .iter()
            .find(|slot| slot.player_id == player)
            .map(|slot| slot.position)
    }

    /// All player ids in slot order.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.slots.iter().map(|slot| slot.player_id)
    }
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Strength figures for one side, each on a 0-100 scale (home bonus applied).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamStrength {
    /// Average strength of forwards.
    pub attack: f64,
    /// Average strength of defenders.
    pub defense: f64,
    /// Average strength of midfielders.
    pub midfield: f64,
    /// Strength of the goalkeeper.
    pub goalkeeper: f64,
    /// Average strength across the eleven.
    pub overall: f64,
}

/// Result of a successful match preparation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchPreparation {
    /// Home side figures.
    pub home: TeamStrength,
    /// Away side figures.
    pub away: TeamStrength,
}

// ---------------------------------------------------------------------------
// Match aggregate
// ---------------------------------------------------------------------------

/// Per-match action counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchCounters {
    /// Shots attempted by either side.
    pub shots: u32,
    /// Passes completed by either side.
    pub passes: u32,
    /// Possession changes and completed possessions.
    pub possessions: u32,
    /// Fouls committed.
    pub fouls: u32,
    /// Injuries suffered.
    pub injuries: u32,
}

/// Realtime bookkeeping carried on the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RealtimeState {
    /// When the realtime loop first kicked this match off.
    pub started_at: Option<DateTime<Utc>>,
    /// Start of the current minute window.
    pub minute_started_at: Option<DateTime<Utc>>,
    /// Last minute whose timeline was fully dispatched.
    pub last_broadcast_minute: Option<u32>,
    /// Set while a worker builds the current minute's timeline.
    pub minute_building: bool,
    /// Set while a worker advances to the next minute.
    pub waiting_for_next_minute: bool,
}

/// The match aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Match {
    /// Unique identifier.
    pub id: MatchId,
    /// Seed of the per-match random streams.
    pub seed: u64,
    /// The home club.
    pub home_club: ClubId,
    /// The visiting club.
    pub away_club: ClubId,
    /// Goals scored by the home club.
    pub home_score: u32,
    /// Goals scored by the visiting club.
    pub away_score: u32,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// The game minute being played (0 before kick-off).
    pub current_minute: u32,
    /// Where the ball is, from the possessing side's point of view.
    #[ts(as = "Option<String>")]
    pub current_zone: Option<Zone>,
    /// Who has the ball.
    pub ball_holder: Option<PlayerId>,
    /// Side with the run of play; tie-break when the holder cannot be resolved.
    pub possession: Option<TeamSide>,
    /// Home momentum (-100 to 100).
    pub home_momentum: i32,
    /// Away momentum (-100 to 100).
    pub away_momentum: i32,
    /// Action counters.
    pub counters: MatchCounters,
    /// Actions simulated in the current minute.
    pub actions_this_minute: u32,
    /// Home starting eleven.
    pub home_lineup: Option<Lineup>,
    /// Away starting eleven.
    pub away_lineup: Option<Lineup>,
    /// Strength figures from the last successful preparation.
    pub preparation: Option<MatchPreparation>,
    /// Reasons recorded by the last failed preparation.
    pub preparation_errors: Vec<String>,
    /// Realtime loop bookkeeping.
    pub realtime: RealtimeState,
}

impl Match {
    /// Create a scheduled match between two clubs.
    pub fn new(home_club: ClubId, away_club: ClubId, seed: u64) -> Self {
        Self {
            id: MatchId::new(),
            seed,
            home_club,
            away_club,
            home_score: 0,
            away_score: 0,
            status: MatchStatus::Scheduled,
            current_minute: 0,
            current_zone: None,
            ball_holder: None,
            possession: None,
            home_momentum: 0,
            away_momentum: 0,
            counters: MatchCounters::default(),
            actions_this_minute: 0,
            home_lineup: None,
            away_lineup: None,
            preparation: None,
            preparation_errors: Vec::new(),
            realtime: RealtimeState::default(),
        }
    }

    /// The club playing on the given side.
    pub const fn club(&self, side: TeamSide) -> ClubId {
        match side {
            TeamSide::Home => self.home_club,
            TeamSide::Away => self.away_club,
        }
    }

    /// Which side a club plays on, if it is in this fixture.
    pub fn side_of_club(&self, club: ClubId) -> Option<TeamSide> {
        if club == self.home_club {
            Some(TeamSide::Home)
        } else if club == self.away_club {
            Some(TeamSide::Away)
        } else {
            None
        }
    }

    /// The lineup of one side.
    pub const fn lineup(&self, side: TeamSide) -> Option<&Lineup> {
        match side {
            TeamSide::Home => self.home_lineup.as_ref(),
            TeamSide::Away => self.away_lineup.as_ref(),
        }
    }

    /// Replace the lineup of one side.
    pub fn set_lineup(&mut self, side: TeamSide, lineup: Lineup) {
        match side {
            TeamSide::Home => self.home_lineup = Some(lineup),
            TeamSide::Away => self.away_lineup = Some(lineup),
        }
    }

    /// Which side fields the player, if either does.
    pub fn side_of_player(&self, player: PlayerId) -> Option<TeamSide> {
        [TeamSide::Home, TeamSide::Away]
            .into_iter()
            .find(|side| self.lineup(*side).is_some_and(|lineup| lineup.contains(player)))
    }

    /// Momentum of one side.
    pub const fn momentum(&self, side: TeamSide) -> i32 {
        match side {
            TeamSide::Home => self.home_momentum,
            TeamSide::Away => self.away_momentum,
        }
    }

    /// Set the momentum of one side, clamped to its range.
    pub fn set_momentum(&mut self, side: TeamSide, value: i32) {
        let value = value.clamp(MOMENTUM_MIN, MOMENTUM_MAX);
        match side {
            TeamSide::Home => self.home_momentum = value,
            TeamSide::Away => self.away_momentum = value,
        }
    }

    /// Goals scored by one side.
    pub const fn score(&self, side: TeamSide) -> u32 {
        match side {
            TeamSide::Home => self.home_score,
            TeamSide::Away => self.away_score,
        }
    }

    /// Credit a goal to one side.
    pub const fn add_goal(&mut self, side: TeamSide) {
        match side {
            TeamSide::Home => self.home_score = self.home_score.saturating_add(1),
            TeamSide::Away => self.away_score = self.away_score.saturating_add(1),
        }
    }

    /// Goal difference from the point of view of `side`.
    pub fn goal_difference(&self, side: TeamSide) -> i64 {
        i64::from(self.score(side)).saturating_sub(i64::from(self.score(side.opponent())))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Immutable log row produced by the engine and minute bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchEvent {
    /// Unique identifier.
    pub id: EventId,
    /// The match this event belongs to.
    pub match_id: MatchId,
    /// Game minute the event happened in.
    pub minute: u32,
    /// What happened.
    pub event_type: MatchEventType,
    /// Side credited with the event.
    pub side: TeamSide,
    /// Primary player.
    pub player_id: Option<PlayerId>,
    /// Secondary player (recipient, defender, goalkeeper).
    pub related_player_id: Option<PlayerId>,
    /// Free-text description.
    pub description: String,
    /// Optional annotation supplied by a trait engine; never generated here.
    pub annotation: Option<String>,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
}

impl MatchEvent {
    /// Create an event row stamped with the current time.
    pub fn new(
        match_id: MatchId,
        minute: u32,
        event_type: MatchEventType,
        side: TeamSide,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: EventId::new(),
            match_id,
            minute,
            event_type,
            side,
            player_id: None,
            related_player_id: None,
            description: description.into(),
            annotation: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the primary player.
    #[must_use]
    pub const fn with_player(mut self, player: PlayerId) -> Self {
        self.player_id = Some(player);
        self
    }

    /// Attach the related player.
    #[must_use]
    pub const fn with_related(mut self, player: PlayerId) -> Self {
        self.related_player_id = Some(player);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineup(ids: &[PlayerId]) -> Lineup {
        let mut slots = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let position = if i == 0 {
                Position::Goalkeeper
            } else {
                Position::CentralMidfielder
            };
            slots.push(LineupSlot {
                player_id: *id,
                position,
            });
        }
        Lineup {
            slots,
            tactic: String::from("test"),
        }
    }

    #[test]
    fn momentum_is_clamped() {
        let mut m = Match::new(ClubId::new(), ClubId::new(), 7);
        m.set_momentum(TeamSide::Home, 250);
        m.set_momentum(TeamSide::Away, -250);
        assert_eq!(m.home_momentum, MOMENTUM_MAX);
        assert_eq!(m.away_momentum, MOMENTUM_MIN);
    }

    #[test]
    fn sides_resolve_from_lineups() {
        let mut m = Match::new(ClubId::new(), ClubId::new(), 1);
        let home = [PlayerId::new(), PlayerId::new()];
        let away = [PlayerId::new()];
        m.set_lineup(TeamSide::Home, lineup(&home));
        m.set_lineup(TeamSide::Away, lineup(&away));
        assert_eq!(m.side_of_player(home[1]), Some(TeamSide::Home));
        assert_eq!(m.side_of_player(away[0]), Some(TeamSide::Away));
        assert_eq!(m.side_of_player(PlayerId::new()), None);
        assert_eq!(m.lineup(TeamSide::Home).and_then(Lineup::goalkeeper), Some(home[0]));
    }

    #[test]
    fn goals_update_difference() {
        let mut m = Match::new(ClubId::new(), ClubId::new(), 1);
        m.add_goal(TeamSide::Away);
        m.add_goal(TeamSide::Away);
        m.add_goal(TeamSide::Home);
        assert_eq!(m.goal_difference(TeamSide::Away), 1);
        assert_eq!(m.goal_difference(TeamSide::Home), -1);
    }

    #[test]
    fn fatigue_mirrors_condition() {
        let mut p = Player::new(ClubId::new(), "A. Test", Position::Striker, PlayerAttributes::default());
        assert!((p.fatigue() - 0.0).abs() < f64::EPSILON);
        p.condition = 80.0;
        assert!((p.fatigue() - 20.0).abs() < f64::EPSILON);
    }
}
