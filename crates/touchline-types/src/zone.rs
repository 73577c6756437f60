//! The pitch zone grid.
//!
//! The pitch is cut into six rows from the attacking team's own goal
//! (`GK`) to the opponent's box (`FWD`), and three sides (`L`, `C`, `R`).
//! The goalkeeper row has a single zone named `GK`; every other zone is
//! named `<ROW>-<SIDE>`, e.g. `DM-L` or `FWD-C`.
//!
//! Zones are always expressed from the point of view of the team in
//! possession. When the ball changes hands the zone is mirrored (see
//! [`mirrored_zone`]) so the new owner sees it from their own end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing zone names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    /// The row prefix or side suffix is not part of the grid.
    #[error("unknown zone: {name}")]
    Unknown {
        /// The offending zone name.
        name: String,
    },
}

/// A pitch row, in attacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Row {
    /// The team's own goalkeeper zone.
    Gk,
    /// Defensive line.
    Def,
    /// Defensive midfield.
    Dm,
    /// Central midfield.
    Mid,
    /// Attacking midfield.
    Am,
    /// Forward line, in front of the opponent's goal.
    Fwd,
}

impl Row {
    /// All rows in attacking order.
    pub const ALL: [Self; 6] = [Self::Gk, Self::Def, Self::Dm, Self::Mid, Self::Am, Self::Fwd];

    /// Zero-based distance from the team's own goal.
    pub const fn index(self) -> u8 {
        match self {
            Self::Gk => 0,
            Self::Def => 1,
            Self::Dm => 2,
            Self::Mid => 3,
            Self::Am => 4,
            Self::Fwd => 5,
        }
    }

    /// Inverse of [`Row::index`]; out-of-range indices saturate at `Fwd`.
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Gk,
            1 => Self::Def,
            2 => Self::Dm,
            3 => Self::Mid,
            4 => Self::Am,
            _ => Self::Fwd,
        }
    }

    /// The textual prefix used in zone names.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Gk => "GK",
            Self::Def => "DEF",
            Self::Dm => "DM",
            Self::Mid => "MID",
            Self::Am => "AM",
            Self::Fwd => "FWD",
        }
    }

    /// The next row toward the opponent's goal. `Fwd` is terminal.
    pub const fn next(self) -> Self {
        match self {
            Self::Gk => Self::Def,
            Self::Def => Self::Dm,
            Self::Dm => Self::Mid,
            Self::Mid => Self::Am,
            Self::Am | Self::Fwd => Self::Fwd,
        }
    }

    /// The same physical row seen from the other team's end.
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Gk => Self::Fwd,
            Self::Def => Self::Am,
            Self::Dm => Self::Mid,
            Self::Mid => Self::Dm,
            Self::Am => Self::Def,
            Self::Fwd => Self::Gk,
        }
    }

    /// Whether the row lies in the attacking third (`AM` or `FWD`).
    pub const fn is_attacking_third(self) -> bool {
        matches!(self, Self::Am | Self::Fwd)
    }

    /// Whether the row lies in the defensive third (`GK` or `DEF`).
    pub const fn is_defensive_third(self) -> bool {
        matches!(self, Self::Gk | Self::Def)
    }

    fn parse(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|row| row.prefix() == prefix)
    }
}

/// The lateral side of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneSide {
    /// Left channel.
    L,
    /// Central channel.
    C,
    /// Right channel.
    R,
}

impl ZoneSide {
    /// All sides, left to right.
    pub const ALL: [Self; 3] = [Self::L, Self::C, Self::R];

    /// The side seen from the other end of the pitch.
    pub const fn mirror(self) -> Self {
        match self {
            Self::L => Self::R,
            Self::C => Self::C,
            Self::R => Self::L,
        }
    }

    /// The single-letter suffix used in zone names.
    pub const fn letter(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::C => "C",
            Self::R => "R",
        }
    }

    /// Neighbouring sides (one step left or right).
    pub const fn neighbours(self) -> &'static [Self] {
        match self {
            Self::L => &[Self::C],
            Self::C => &[Self::L, Self::R],
            Self::R => &[Self::C],
        }
    }

    fn parse(letter: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|side| side.letter() == letter)
    }
}

/// One cell of the pitch grid.
///
/// The goalkeeper zone always carries side `C`; [`Zone::new`] enforces this
/// so two `GK` values always compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Zone {
    row: Row,
    side: ZoneSide,
}

impl Zone {
    /// The goalkeeper zone.
    pub const GK: Self = Self {
        row: Row::Gk,
        side: ZoneSide::C,
    };

    /// Build a zone, collapsing any side to `C` in the goalkeeper row.
    pub const fn new(row: Row, side: ZoneSide) -> Self {
        match row {
            Row::Gk => Self::GK,
            _ => Self { row, side },
        }
    }

    /// The row of this zone.
    pub const fn row(self) -> Row {
        self.row
    }

    /// The side of this zone (`C` for the goalkeeper zone).
    pub const fn side(self) -> ZoneSide {
        self.side
    }

    /// Every zone of the grid (16 in total).
    pub fn all() -> Vec<Self> {
        let mut zones = vec![Self::GK];
        for row in Row::ALL.into_iter().skip(1) {
            for side in ZoneSide::ALL {
                zones.push(Self::new(row, side));
            }
        }
        zones
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Row::Gk => f.write_str("GK"),
            row => write!(f, "{}-{}", row.prefix(), self.side.letter()),
        }
    }
}

impl FromStr for Zone {
    type Err = ZoneError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(make_zone(zone_prefix(name)?, zone_side(name)?))
    }
}

impl TryFrom<String> for Zone {
    type Error = ZoneError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.to_string()
    }
}

/// Parse the row prefix of a zone name.
///
/// # Errors
///
/// Returns [`ZoneError::Unknown`] if the prefix is not a grid row.
pub fn zone_prefix(name: &str) -> Result<Row, ZoneError> {
    let prefix = name.split_once('-').map_or(name, |(prefix, _)| prefix);
    Row::parse(prefix).ok_or_else(|| ZoneError::Unknown {
        name: name.to_owned(),
    })
}

/// Parse the side suffix of a zone name, defaulting to `C` when absent.
///
/// # Errors
///
/// Returns [`ZoneError::Unknown`] if a suffix is present but not a side.
pub fn zone_side(name: &str) -> Result<ZoneSide, ZoneError> {
    match name.split_once('-') {
        None => Ok(ZoneSide::C),
        Some((_, suffix)) => ZoneSide::parse(suffix).ok_or_else(|| ZoneError::Unknown {
            name: name.to_owned(),
        }),
    }
}

/// Swap left and right; centre is unchanged.
pub const fn mirror_side(side: ZoneSide) -> ZoneSide {
    side.mirror()
}

/// Build a zone from its parts (the goalkeeper row collapses to `GK`).
pub const fn make_zone(row: Row, side: ZoneSide) -> Zone {
    Zone::new(row, side)
}

/// Advance one row toward the opponent's goal, keeping the side.
///
/// Idempotent at the forward row. From `GK` the ball goes to `DEF-C`.
pub const fn next_zone(zone: Zone) -> Zone {
    Zone::new(zone.row.next(), zone.side)
}

/// The zone at the opposite end of the pitch, as seen by the other team.
///
/// When `flip_side` is set the lateral side is mirrored as well, which is
/// what a change of possession does (the opponent attacks the other way).
pub const fn mirrored_zone(zone: Zone, flip_side: bool) -> Zone {
    let side = if flip_side { zone.side.mirror() } else { zone.side };
    Zone::new(zone.row.mirrored(), side)
}
