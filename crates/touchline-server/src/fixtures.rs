//! Matchday loading.
//!
//! A matchday file is JSON with the clubs taking part (each with a squad)
//! and the fixtures between them:
//!
//! ```json
//! {
//!   "clubs": [
//!     { "name": "Harbour Town", "squad": [
//!       { "name": "Ade Okafor", "position": "goalkeeper", "rating": 13 }
//!     ] }
//!   ],
//!   "fixtures": [ { "home": "Harbour Town", "away": "Millbrook Rovers", "seed": 7 } ]
//! }
//! ```
//!
//! Squad entries give either a uniform `rating` or a full `attributes`
//! block. Every player gets a fresh id each time the file is loaded.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use touchline_engine::Roster;
use touchline_types::{ClubId, Match, Player, PlayerAttributes, Position};

/// Errors that can occur when loading a matchday.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// Failed to read the matchday file.
    #[error("failed to read matchday file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse the matchday JSON.
    #[error("failed to parse matchday JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A fixture names a club missing from `clubs`.
    #[error("fixture {index} names unknown club {name:?}")]
    UnknownClub {
        /// Position of the fixture in the file.
        index: usize,
        /// The unknown club name.
        name: String,
    },

    /// A fixture pits a club against itself.
    #[error("fixture {index} has {name:?} playing itself")]
    SelfFixture {
        /// Position of the fixture in the file.
        index: usize,
        /// The club name.
        name: String,
    },
}

/// A matchday as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct Matchday {
    /// Clubs taking part.
    pub clubs: Vec<ClubEntry>,
    /// Fixtures to play.
    pub fixtures: Vec<FixtureEntry>,
}

/// One club and its squad.
#[derive(Debug, Clone, Deserialize)]
pub struct ClubEntry {
    /// Display name; fixtures refer to clubs by it.
    pub name: String,
    /// Registered players.
    pub squad: Vec<PlayerEntry>,
}

/// One registered player.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerEntry {
    /// Display name.
    pub name: String,
    /// Natural position.
    pub position: Position,
    /// Uniform attribute rating used when `attributes` is absent.
    #[serde(default = "default_rating")]
    pub rating: u32,
    /// Full attribute block.
    #[serde(default)]
    pub attributes: Option<PlayerAttributes>,
    /// Resting morale.
    #[serde(default = "default_morale")]
    pub morale: i32,
}

/// One fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    /// Home club name.
    pub home: String,
    /// Away club name.
    pub away: String,
    /// Seed of the match's random streams; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// A scheduled match with the players of both clubs.
#[derive(Debug, Clone)]
pub struct ScheduledMatch {
    /// The match, still scheduled.
    pub game: Match,
    /// Players of both clubs.
    pub roster: Roster,
    /// `"Home v Away"`, for logs.
    pub label: String,
}

impl Matchday {
    /// Load a matchday from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a matchday from a JSON string.
    pub fn parse(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build one scheduled match per fixture.
    ///
    /// Each club gets one id for the whole matchday; squads are copied
    /// into every roster the club appears in.
    pub fn schedule(&self) -> Result<Vec<ScheduledMatch>, FixtureError> {
        let clubs: BTreeMap<&str, (ClubId, &ClubEntry)> = self
            .clubs
            .iter()
            .map(|club| (club.name.as_str(), (ClubId::new(), club)))
            .collect();

        self.fixtures
            .iter()
            .enumerate()
            .map(|(index, fixture)| {
                if fixture.home == fixture.away {
                    return Err(FixtureError::SelfFixture {
                        index,
                        name: fixture.home.clone(),
                    });
                }
                let lookup = |name: &str| {
                    clubs.get(name).copied().ok_or_else(|| FixtureError::UnknownClub {
                        index,
                        name: name.to_owned(),
                    })
                };
                let (home_id, home) = lookup(&fixture.home)?;
                let (away_id, away) = lookup(&fixture.away)?;
                let roster: Roster = squad(home_id, home).chain(squad(away_id, away)).collect();
                let seed = fixture.seed.unwrap_or_else(rand::random);
                Ok(ScheduledMatch {
                    game: Match::new(home_id, away_id, seed),
                    roster,
                    label: format!("{} v {}", home.name, away.name),
                })
            })
            .collect()
    }
}

fn squad(club_id: ClubId, club: &ClubEntry) -> impl Iterator<Item = Player> + '_ {
    club.squad.iter().map(move |entry| {
        let attributes = entry
            .attributes
            .unwrap_or_else(|| PlayerAttributes::uniform(entry.rating));
        let mut player = Player::new(club_id, entry.name.clone(), entry.position, attributes);
        player.morale = entry.morale;
        player.base_morale = entry.morale;
        player
    })
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_rating() -> u32 {
    12
}

const fn default_morale() -> i32 {
    50
}
