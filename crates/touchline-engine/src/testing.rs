//! Squad and fixture builders shared by the unit tests.

use touchline_types::{ClubId, Match, Player, PlayerAttributes, Position};

use crate::roster::Roster;

/// Eleven players in their natural 4-4-2 positions plus two substitutes.
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
    let mut players: Vec<Player> = positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            Player::new(club, format!("Player {i}"), *position, PlayerAttributes::uniform(12))
        })
        .collect();
    players.push(Player::new(club, "Reserve Keeper", Position::Goalkeeper, PlayerAttributes::uniform(8)));
    players.push(Player::new(club, "Reserve Midfielder", Position::CentralMidfielder, PlayerAttributes::uniform(8)));
    players
}

/// A scheduled match between two identical squads.
pub fn fixture() -> (Match, Roster) {
    let home = ClubId::new();
    let away = ClubId::new();
    let roster: Roster = squad(home).into_iter().chain(squad(away)).collect();
    (Match::new(home, away, 42), roster)
}
