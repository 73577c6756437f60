//! Hot state of one live match.
//!
//! A [`MatchSession`] owns everything the realtime loop mutates for a
//! match: the match aggregate, the players, the event log, the broadcast
//! ledger, the clock and the action RNG. Sessions are independent of each
//! other; the registry in [`crate::realtime`] wraps each one in its own
//! lock.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use touchline_engine::{PreparationError, Roster, prepare_match, start_match};
use touchline_types::{Match, MatchEvent, MatchId, MatchPreparation};
use tracing::info;

use crate::clock::MatchClock;
use crate::ledger::BroadcastLedger;

/// One match and its realtime state.
#[derive(Debug, Clone)]
pub struct MatchSession {
    /// The match aggregate.
    pub game: Match,
    /// Players of both clubs.
    pub roster: Roster,
    /// Every event recorded so far, in order.
    pub events: Vec<MatchEvent>,
    /// Broadcast items of every minute built so far.
    pub ledger: BroadcastLedger,
    /// Window of the current minute.
    pub clock: MatchClock,
    /// Stream feeding the action state machine.
    pub rng: ChaCha8Rng,
}

impl MatchSession {
    /// Wrap a match; the clock anchor is restored from the match's realtime
    /// fields and the action RNG is seeded from the match seed.
    pub fn new(game: Match, roster: Roster, mut clock: MatchClock) -> Self {
        clock.restore(game.realtime.minute_started_at);
        let rng = ChaCha8Rng::seed_from_u64(game.seed);
        Self {
            game,
            roster,
            events: Vec::new(),
            ledger: BroadcastLedger::new(),
            clock,
            rng,
        }
    }

    /// Id of the match.
    pub const fn match_id(&self) -> MatchId {
        self.game.id
    }

    /// Prepare the lineups and put the match in play.
    ///
    /// A failed preparation leaves the match scheduled with its reasons
    /// recorded on it.
    pub fn kick_off(&mut self) -> Result<MatchPreparation, PreparationError> {
        let preparation = prepare_match(&mut self.game, &mut self.roster)?;
        start_match(&mut self.game)?;
        info!(
            match_id = %self.game.id,
            home = %self.game.home_club,
            away = %self.game.away_club,
            "match started"
        );
        Ok(preparation)
    }

    /// Events recorded for `minute`.
    pub fn events_in_minute(&self, minute: u32) -> impl Iterator<Item = &MatchEvent> + '_ {
        self.events.iter().filter(move |event| event.minute == minute)
    }

    /// Whether any event exists for `minute`.
    pub fn has_events_in_minute(&self, minute: u32) -> bool {
        self.events_in_minute(minute).next().is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    //! Sessions built from two generated squads.

    use touchline_types::{ClubId, Player, PlayerAttributes, Position};

    use super::*;

    /// Eleven 4-4-2 players for `club`.
    pub fn squad(club: ClubId) -> Vec<Player> {
        let positions = [
            Position::Goalkeeper,
            Position::LeftBack,
            Position::CentreBack,
            Position::CentreBack,
            Position::RightBack,
            Position::LeftMidfielder,
            Position::CentralMidfielder,
            Position::CentralMidfielder,
            Position::RightMidfielder,
            Position::Striker,
            Position::Striker,
        ];
        positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                Player::new(club, format!("Player {i}"), *position, PlayerAttributes::uniform(13))
            })
            .collect()
    }

    /// A scheduled, unprepared session with a 60-second minute.
    pub fn session(seed: u64) -> MatchSession {
        let home = ClubId::new();
        let away = ClubId::new();
        let roster: Roster = squad(home).into_iter().chain(squad(away)).collect();
        let game = Match::new(home, away, seed);
        MatchSession::new(game, roster, MatchClock::new(60).unwrap())
    }

    /// A session already in play at minute 1.
    pub fn live_session(seed: u64) -> MatchSession {
        let mut session = session(seed);
        session.kick_off().unwrap();
        session
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use touchline_types::{MatchEventType, MatchStatus, TeamSide};

    use super::fixtures::{live_session, session};
    use super::*;

    #[test]
    fn kick_off_puts_the_match_in_play() {
        let mut s = session(1);
        s.kick_off().unwrap();
        assert_eq!(s.game.status, MatchStatus::InProgress);
        assert_eq!(s.game.current_minute, 1);
        assert!(s.game.home_lineup.is_some());
    }

    #[test]
    fn empty_roster_cannot_kick_off() {
        let mut s = session(1);
        s.roster = Roster::new();
        assert!(s.kick_off().is_err());
        assert_eq!(s.game.status, MatchStatus::Scheduled);
        assert!(!s.game.preparation_errors.is_empty());
    }

    #[test]
    fn new_session_restores_the_clock() {
        let mut s = session(1);
        let anchor = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        s.game.realtime.minute_started_at = Some(anchor);
        let rebuilt = MatchSession::new(s.game.clone(), s.roster.clone(), MatchClock::new(60).unwrap());
        assert_eq!(rebuilt.clock.anchor(), Some(anchor));
        assert!(rebuilt.clock.is_minute_over(Utc::now()));
    }

    #[test]
    fn events_are_filtered_by_minute() {
        let mut s = live_session(2);
        let id = s.match_id();
        s.events.push(MatchEvent::new(id, 1, MatchEventType::Info, TeamSide::Home, "kick-off"));
        s.events.push(MatchEvent::new(id, 2, MatchEventType::Info, TeamSide::Home, "later"));
        assert_eq!(s.events_in_minute(1).count(), 1);
        assert!(s.has_events_in_minute(2));
        assert!(!s.has_events_in_minute(3));
    }
}
