//! The player snapshots a match reads and mutates.

use std::collections::BTreeMap;

use touchline_types::{ClubId, Player, PlayerId};

use crate::error::EngineError;

/// Players of both clubs keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    players: BTreeMap<PlayerId, Player>,
}

impl Roster {
    /// An empty roster.
    pub const fn new() -> Self {
        Self {
            players: BTreeMap::new(),
        }
    }

    /// Add or replace a player.
    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Look up a player.
    pub fn get(&self, id: PlayerId) -> Result<&Player, EngineError> {
        self.players
            .get(&id)
            .ok_or(EngineError::UnknownPlayer { player: id })
    }

    /// Look up a player for mutation.
    pub fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player, EngineError> {
        self.players
            .get_mut(&id)
            .ok_or(EngineError::UnknownPlayer { player: id })
    }

    /// Whether the player is known.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Players registered with a club, in id order.
    pub fn club_players(&self, club: ClubId) -> impl Iterator<Item = &Player> + '_ {
        self.players.values().filter(move |p| p.club_id == club)
    }

    /// All players, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players.values()
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl FromIterator<Player> for Roster {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        let mut roster = Self::new();
        for player in iter {
            roster.insert(player);
        }
        roster
    }
}
