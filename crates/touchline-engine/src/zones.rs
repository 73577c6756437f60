//! Zone occupancy rules and random zone movement.
//!
//! The grid itself lives in [`touchline_types::zone`]; this module decides
//! who may stand in a zone and where a dribble carries the ball.

use rand::Rng;
use touchline_types::{Position, Row, Zone, ZoneSide, make_zone};

use crate::dice::{pick, roll};

/// A query over zone occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneQuery {
    /// Any position is admitted.
    Any,
    /// Only positions that play in this zone.
    At(Zone),
}

/// Whether a player fielded at `position` can occupy the queried zone.
///
/// Occupancy is decided by row; the lateral side does not restrict who can
/// receive the ball.
pub const fn zone_admits(query: ZoneQuery, position: Position) -> bool {
    let zone = match query {
        ZoneQuery::Any => return true,
        ZoneQuery::At(zone) => zone,
    };
    match zone.row() {
        Row::Gk => matches!(position, Position::Goalkeeper),
        Row::Def => matches!(
            position,
            Position::CentreBack
                | Position::LeftBack
                | Position::RightBack
                | Position::LeftWingBack
                | Position::RightWingBack
        ),
        Row::Dm => matches!(
            position,
            Position::DefensiveMidfielder | Position::CentralMidfielder
        ),
        Row::Mid => matches!(
            position,
            Position::CentralMidfielder
                | Position::LeftMidfielder
                | Position::RightMidfielder
                | Position::DefensiveMidfielder
                | Position::AttackingMidfielder
        ),
        // Strikers never drop into the attacking-midfield row.
        Row::Am => matches!(
            position,
            Position::AttackingMidfielder
                | Position::LeftMidfielder
                | Position::RightMidfielder
                | Position::LeftWinger
                | Position::RightWinger
        ),
        Row::Fwd => matches!(
            position,
            Position::Striker | Position::LeftWinger | Position::RightWinger
        ),
    }
}

/// The occupancy predicate for a query, for use with iterator filters.
pub fn zone_conditions(query: ZoneQuery) -> impl Fn(Position) -> bool {
    move |position| zone_admits(query, position)
}

/// Zones sharing a row or column with `zone`, one step away.
pub fn neighbours(zone: Zone) -> Vec<Zone> {
    let mut out = Vec::new();
    if zone.row() != Row::Gk {
        for side in zone.side().neighbours() {
            out.push(make_zone(zone.row(), *side));
        }
    }
    let index = zone.row().index();
    if index > 0 {
        out.push(make_zone(Row::from_index(index.saturating_sub(1)), zone.side()));
    }
    if zone.row() != Row::Fwd {
        out.push(make_zone(zone.row().next(), zone.side()));
    }
    out
}

/// A random neighbouring zone in the same row or column.
///
/// Falls back to `zone` itself when it has no neighbours.
pub fn random_adjacent_zone<R: Rng + ?Sized>(rng: &mut R, zone: Zone) -> Zone {
    pick(rng, &neighbours(zone)).unwrap_or(zone)
}

/// The zone a successful dribble carries the ball into.
///
/// One row forward (staying in the forward row once there); with
/// `diagonal_chance` the ball also drifts to a neighbouring side.
pub fn forward_dribble_zone<R: Rng + ?Sized>(rng: &mut R, zone: Zone, diagonal_chance: f64) -> Zone {
    let row = zone.row().next();
    let side = if roll(rng, diagonal_chance) {
        pick(rng, zone.side().neighbours()).unwrap_or(zone.side())
    } else {
        zone.side()
    };
    make_zone(row, side)
}

/// A random side for a lateral pass within the same row.
pub fn lateral_side<R: Rng + ?Sized>(rng: &mut R, side: ZoneSide) -> ZoneSide {
    pick(rng, side.neighbours()).unwrap_or(side)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn zone(name: &str) -> Zone {
        name.parse().unwrap()
    }

    #[test]
    fn dm_admits_defensive_and_central_midfielders() {
        let dm = ZoneQuery::At(zone("DM-C"));
        assert!(zone_admits(dm, Position::DefensiveMidfielder));
        assert!(zone_admits(dm, Position::CentralMidfielder));
        assert!(!zone_admits(dm, Position::Striker));
    }

    #[test]
    fn am_excludes_strikers() {
        let am = ZoneQuery::At(zone("AM-L"));
        assert!(!zone_admits(am, Position::Striker));
        assert!(zone_admits(am, Position::LeftWinger));
    }

    #[test]
    fn any_admits_everyone() {
        let any = zone_conditions(ZoneQuery::Any);
        assert!(Position::ALL.iter().all(|p| any(*p)));
    }

    #[test]
    fn goalkeeper_zone_admits_only_keepers() {
        let gk = zone_conditions(ZoneQuery::At(Zone::GK));
        let admitted: Vec<_> = Position::ALL.iter().filter(|p| gk(**p)).collect();
        assert_eq!(admitted, vec![&Position::Goalkeeper]);
    }

    #[test]
    fn adjacent_zones_are_one_step_away() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..100 {
            let from = zone("MID-L");
            let to = random_adjacent_zone(&mut rng, from);
            let row_step = from.row().index().abs_diff(to.row().index());
            let same_side = from.side() == to.side();
            assert!((row_step == 1 && same_side) || (row_step == 0 && !same_side));
        }
    }

    #[test]
    fn dribble_moves_one_row_forward() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let to = forward_dribble_zone(&mut rng, zone("DM-C"), 0.0);
        assert_eq!(to, zone("MID-C"));
        for _ in 0..50 {
            let to = forward_dribble_zone(&mut rng, zone("AM-L"), 1.0);
            assert_eq!(to, zone("FWD-C"));
        }
        let stay = forward_dribble_zone(&mut rng, zone("FWD-R"), 0.0);
        assert_eq!(stay, zone("FWD-R"));
    }
}
