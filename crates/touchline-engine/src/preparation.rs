//! Lineup validation, auto-selection and strength figures.
//!
//! Preparation turns two squads into a playable fixture: each side needs a
//! valid starting eleven (auto-selected as a 4-4-2 when missing), every
//! fielded player starts fully rested, and per-side strength figures seed
//! the opening momentum. A failed preparation records its reasons on the
//! match and leaves it scheduled.

use std::collections::BTreeSet;

use touchline_types::{
    ClubId, FULL_CONDITION, Lineup, LineupSlot, Match, MatchPreparation, MatchStatus, Player,
    PlayerAttributes, Position, PositionGroup, TeamSide, TeamStrength,
};
use tracing::{info, warn};

use crate::error::PreparationError;
use crate::momentum::seed_momentum;
use crate::roster::Roster;

/// Players in a starting eleven.
pub const LINEUP_SIZE: usize = 11;

/// Multiplier applied to the home side's figures.
pub const HOME_BONUS: f64 = 1.10;

/// Slot positions of the default 4-4-2, in lineup order.
pub const DEFAULT_FORMATION: [Position; LINEUP_SIZE] = [
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

/// Tactic label of the default formation.
pub const DEFAULT_TACTIC: &str = "4-4-2";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn group_count(lineup: &Lineup, group: PositionGroup) -> usize {
    lineup
        .slots
        .iter()
        .filter(|slot| slot.position.group() == group)
        .count()
}

fn composition_reasons(lineup: &Lineup) -> Vec<String> {
    let mut reasons = Vec::new();
    if lineup.slots.len() != LINEUP_SIZE {
        reasons.push(format!(
            "expected {LINEUP_SIZE} players, found {}",
            lineup.slots.len()
        ));
    }
    let rules = [
        (PositionGroup::Goalkeeper, "goalkeepers", 1, 1),
        (PositionGroup::Defender, "defenders", 3, 5),
        (PositionGroup::Midfielder, "midfielders", 2, 5),
        (PositionGroup::Forward, "forwards", 1, 4),
    ];
    for (group, label, min, max) in rules {
        let count = group_count(lineup, group);
        if !(min..=max).contains(&count) {
            if min == max {
                reasons.push(format!("expected exactly {min} {label}, found {count}"));
            } else {
                reasons.push(format!("expected {min}-{max} {label}, found {count}"));
            }
        }
    }
    reasons
}

/// Check a lineup's composition and membership.
///
/// Returns every reason the lineup is unusable, not just the first.
pub fn validate_lineup(lineup: &Lineup, club: ClubId, roster: &Roster) -> Result<(), Vec<String>> {
    let mut reasons = composition_reasons(lineup);
    let mut seen = BTreeSet::new();
    for slot in &lineup.slots {
        if !seen.insert(slot.player_id) {
            reasons.push(format!("player {} is listed more than once", slot.player_id));
        }
        match roster.get(slot.player_id) {
            Err(_) => reasons.push(format!("player {} is not registered", slot.player_id)),
            Ok(player) if player.club_id != club => {
                reasons.push(format!("{} does not play for this club", player.name));
            }
            Ok(_) => {}
        }
    }
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}

// ---------------------------------------------------------------------------
// Strength
// ---------------------------------------------------------------------------

fn weighted(attributes: &PlayerAttributes, group: PositionGroup) -> f64 {
    let a = attributes;
    let table: [(u32, f64); 5] = match group {
        PositionGroup::Goalkeeper => [
            (a.reflexes, 0.30),
            (a.handling, 0.25),
            (a.positioning, 0.20),
            (a.aerial, 0.15),
            (a.passing, 0.10),
        ],
        PositionGroup::Defender => [
            (a.marking, 0.25),
            (a.tackling, 0.25),
            (a.positioning, 0.20),
            (a.heading, 0.15),
            (a.strength, 0.15),
        ],
        PositionGroup::Midfielder => [
            (a.passing, 0.30),
            (a.vision, 0.25),
            (a.stamina, 0.15),
            (a.dribbling, 0.15),
            (a.tackling, 0.15),
        ],
        PositionGroup::Forward => [
            (a.finishing, 0.35),
            (a.pace, 0.20),
            (a.dribbling, 0.15),
            (a.heading, 0.15),
            (a.flair, 0.15),
        ],
    };
    table
        .iter()
        .map(|(value, weight)| f64::from(*value) * weight)
        .sum()
}

/// A player's strength for a positional group, on a 0-100 scale.
pub fn calculate_player_strength(player: &Player, group: PositionGroup) -> f64 {
    (weighted(&player.attributes, group) * 5.0).clamp(0.0, 100.0)
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = values.len() as f64;
    values.iter().sum::<f64>() / len
}

fn slot_strengths(lineup: &Lineup, roster: &Roster, group: Option<PositionGroup>) -> Option<Vec<f64>> {
    lineup
        .slots
        .iter()
        .filter(|slot| group.is_none_or(|g| slot.position.group() == g))
        .map(|slot| {
            roster
                .get(slot.player_id)
                .ok()
                .map(|p| calculate_player_strength(p, slot.position.group()))
        })
        .collect()
}

const fn home_factor(home: bool) -> f64 {
    if home { HOME_BONUS } else { 1.0 }
}

/// Average strength across a lineup, with the home bonus.
///
/// Returns 0 when the composition is invalid or a player is unknown; the
/// caller must treat 0 as "not playable".
pub fn calculate_team_strength(lineup: &Lineup, roster: &Roster, home: bool) -> f64 {
    if !composition_reasons(lineup).is_empty() {
        return 0.0;
    }
    slot_strengths(lineup, roster, None).map_or(0.0, |values| average(&values) * home_factor(home))
}

/// Attack, defense, midfield and goalkeeper figures for one side.
pub fn side_strength(lineup: &Lineup, roster: &Roster, home: bool) -> TeamStrength {
    let factor = home_factor(home);
    let by_group = |group| {
        slot_strengths(lineup, roster, Some(group)).map_or(0.0, |values| average(&values) * factor)
    };
    TeamStrength {
        attack: by_group(PositionGroup::Forward),
        defense: by_group(PositionGroup::Defender),
        midfield: by_group(PositionGroup::Midfielder),
        goalkeeper: by_group(PositionGroup::Goalkeeper),
        overall: calculate_team_strength(lineup, roster, home),
    }
}

// ---------------------------------------------------------------------------
// Auto-selection
// ---------------------------------------------------------------------------

/// Fill the default 4-4-2 from a club's registered players.
///
/// Each slot takes the strongest unused player with the exact position,
/// then the same group, then any outfield player (any player at all for the
/// goalkeeper slot). A squad too small to fill every slot yields a short
/// lineup, which validation then rejects.
pub fn auto_select_lineup(club: ClubId, roster: &Roster) -> Lineup {
    let squad: Vec<&Player> = roster.club_players(club).collect();
    let mut used = BTreeSet::new();
    let mut slots = Vec::with_capacity(LINEUP_SIZE);

    for position in DEFAULT_FORMATION {
        let group = position.group();
        let tiers: [&dyn Fn(&Player) -> bool; 3] = [
            &|p: &Player| p.position == position,
            &|p: &Player| p.position.group() == group,
            &|p: &Player| position.is_goalkeeper() || !p.position.is_goalkeeper(),
        ];
        let chosen = tiers.iter().find_map(|tier| {
            let mut best: Option<(&Player, f64)> = None;
            for player in squad.iter().copied().filter(|p| !used.contains(&p.id) && tier(*p)) {
                let strength = calculate_player_strength(player, group);
                if best.is_none_or(|(_, top)| strength > top) {
                    best = Some((player, strength));
                }
            }
            best.map(|(player, _)| player.id)
        });
        if let Some(player_id) = chosen {
            used.insert(player_id);
            slots.push(LineupSlot { player_id, position });
        }
    }

    Lineup {
        slots,
        tactic: String::from(DEFAULT_TACTIC),
    }
}

// ---------------------------------------------------------------------------
// Preparation and kick-off
// ---------------------------------------------------------------------------

/// Validate both sides and compute the fixture's strength figures.
///
/// Missing lineups are auto-selected. On success the lineups and figures
/// are stored on the match, every fielded player's condition is reset to
/// full and opening momentum is seeded. On failure the reasons (prefixed
/// with the side) are recorded on the match, which stays scheduled, and
/// figures from any earlier preparation are dropped so it cannot start.
pub fn prepare_match(m: &mut Match, roster: &mut Roster) -> Result<MatchPreparation, PreparationError> {
    let mut reasons = Vec::new();
    let mut lineups = Vec::with_capacity(2);

    for side in [TeamSide::Home, TeamSide::Away] {
        let club = m.club(side);
        let lineup = m
            .lineup(side)
            .cloned()
            .unwrap_or_else(|| auto_select_lineup(club, roster));
        if let Err(side_reasons) = validate_lineup(&lineup, club, roster) {
            reasons.extend(side_reasons.into_iter().map(|r| format!("{}: {r}", side.as_str())));
        }
        lineups.push((side, lineup));
    }

    if !reasons.is_empty() {
        warn!(match_id = %m.id, reasons = reasons.len(), "match preparation failed");
        m.preparation_errors.clone_from(&reasons);
        m.preparation = None;
        return Err(PreparationError::InvalidLineup { reasons });
    }

    for (side, lineup) in lineups {
        for player_id in lineup.player_ids() {
            if let Ok(player) = roster.get_mut(player_id) {
                player.condition = FULL_CONDITION;
            }
        }
        m.set_lineup(side, lineup);
    }

    let mut preparation = MatchPreparation::default();
    if let Some(lineup) = m.lineup(TeamSide::Home) {
        preparation.home = side_strength(lineup, roster, true);
    }
    if let Some(lineup) = m.lineup(TeamSide::Away) {
        preparation.away = side_strength(lineup, roster, false);
    }

    m.preparation = Some(preparation);
    m.preparation_errors.clear();
    seed_momentum(m, &preparation);

    info!(
        match_id = %m.id,
        home_overall = preparation.home.overall,
        away_overall = preparation.away.overall,
        home_momentum = m.home_momentum,
        "match prepared"
    );
    Ok(preparation)
}

/// Move a prepared, scheduled match into play at minute 1.
///
/// The ball is left unset; the first action places it with the home
/// goalkeeper.
pub fn start_match(m: &mut Match) -> Result<(), PreparationError> {
    if m.status != MatchStatus::Scheduled {
        return Err(PreparationError::NotScheduled { status: m.status });
    }
    if m.preparation.is_none() {
        return Err(PreparationError::NotPrepared);
    }
    m.status = MatchStatus::InProgress;
    m.current_minute = 1;
    m.current_zone = None;
    m.ball_holder = None;
    m.possession = None;
    m.actions_this_minute = 0;
    info!(match_id = %m.id, "match started");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{fixture, squad};

    #[test]
    fn auto_selected_lineup_is_valid() {
        let club = ClubId::new();
        let roster: Roster = squad(club).into_iter().collect();
        let lineup = auto_select_lineup(club, &roster);
        assert_eq!(lineup.slots.len(), LINEUP_SIZE);
        assert_eq!(lineup.tactic, DEFAULT_TACTIC);
        assert!(validate_lineup(&lineup, club, &roster).is_ok());
    }

    #[test]
    fn auto_select_prefers_exact_position_then_strength() {
        let club = ClubId::new();
        let mut players = squad(club);
        let star = Player::new(club, "Star Keeper", Position::Goalkeeper, PlayerAttributes::uniform(19));
        let star_id = star.id;
        players.push(star);
        let roster: Roster = players.into_iter().collect();
        let lineup = auto_select_lineup(club, &roster);
        assert_eq!(lineup.goalkeeper(), Some(star_id));
    }

    #[test]
    fn short_squad_fails_validation() {
        let club = ClubId::new();
        let roster: Roster = squad(club).into_iter().take(8).collect();
        let lineup = auto_select_lineup(club, &roster);
        let reasons = validate_lineup(&lineup, club, &roster).unwrap_err();
        assert!(reasons.iter().any(|r| r.contains("expected 11 players")));
    }

    #[test]
    fn composition_rules_are_reported() {
        let club = ClubId::new();
        let roster: Roster = squad(club).into_iter().collect();
        let mut lineup = auto_select_lineup(club, &roster);
        for slot in &mut lineup.slots {
            if slot.position == Position::Striker {
                slot.position = Position::CentreBack;
            }
        }
        let reasons = validate_lineup(&lineup, club, &roster).unwrap_err();
        assert!(reasons.iter().any(|r| r.contains("defenders")));
        assert!(reasons.iter().any(|r| r.contains("forwards")));
        assert!(calculate_team_strength(&lineup, &roster, true).abs() < f64::EPSILON);
    }

    #[test]
    fn foreign_and_duplicate_players_are_rejected() {
        let club = ClubId::new();
        let other = ClubId::new();
        let mut players = squad(club);
        let outsider = squad(other).remove(0);
        let outsider_id = outsider.id;
        players.push(outsider);
        let roster: Roster = players.into_iter().collect();
        let mut lineup = auto_select_lineup(club, &roster);
        if let Some(slot) = lineup.slots.get_mut(0) {
            slot.player_id = outsider_id;
        }
        let dup = lineup.slots.get(1).map(|s| s.player_id).unwrap();
        if let Some(slot) = lineup.slots.get_mut(2) {
            slot.player_id = dup;
        }
        let reasons = validate_lineup(&lineup, club, &roster).unwrap_err();
        assert!(reasons.iter().any(|r| r.contains("does not play for this club")));
        assert!(reasons.iter().any(|r| r.contains("more than once")));
    }

    #[test]
    fn home_side_gets_the_bonus() {
        let club = ClubId::new();
        let roster: Roster = squad(club).into_iter().collect();
        let lineup = auto_select_lineup(club, &roster);
        let home = calculate_team_strength(&lineup, &roster, true);
        let away = calculate_team_strength(&lineup, &roster, false);
        assert!(away > 0.0);
        assert!((home - away * HOME_BONUS).abs() < 1e-9);
    }

    #[test]
    fn player_strength_uses_group_weights() {
        let mut keeper = Player::new(ClubId::new(), "K", Position::Goalkeeper, PlayerAttributes::uniform(1));
        keeper.attributes.reflexes = 20;
        keeper.attributes.handling = 20;
        let as_keeper = calculate_player_strength(&keeper, PositionGroup::Goalkeeper);
        let as_forward = calculate_player_strength(&keeper, PositionGroup::Forward);
        assert!(as_keeper > as_forward);
        assert!((calculate_player_strength(&keeper, PositionGroup::Defender) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn prepare_then_start() {
        let (mut m, mut roster) = fixture();
        for p in roster.iter().map(|p| p.id).collect::<Vec<_>>() {
            roster.get_mut(p).unwrap().condition = 40.0;
        }
        let prep = prepare_match(&mut m, &mut roster).unwrap();
        assert!(prep.home.overall > prep.away.overall);
        assert!(m.preparation_errors.is_empty());
        let home = m.home_lineup.clone().unwrap();
        for id in home.player_ids() {
            assert!((roster.get(id).unwrap().condition - FULL_CONDITION).abs() < f64::EPSILON);
        }
        assert!(m.home_momentum.abs() <= crate::momentum::SEED_MOMENTUM_CAP);

        start_match(&mut m).unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
        assert_eq!(m.current_minute, 1);
        assert!(m.ball_holder.is_none());
        assert!(matches!(
            start_match(&mut m),
            Err(PreparationError::NotScheduled { .. })
        ));
    }

    #[test]
    fn failed_preparation_keeps_match_scheduled() {
        let home = ClubId::new();
        let away = ClubId::new();
        let mut roster: Roster = squad(home).into_iter().collect();
        for p in squad(away).into_iter().take(5) {
            roster.insert(p);
        }
        let mut m = Match::new(home, away, 3);
        let err = prepare_match(&mut m, &mut roster).unwrap_err();
        assert!(matches!(err, PreparationError::InvalidLineup { .. }));
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert!(m.preparation_errors.iter().all(|r| r.starts_with("away:")));
        assert!(!m.preparation_errors.is_empty());
        assert!(matches!(start_match(&mut m), Err(PreparationError::NotPrepared)));
    }

    #[test]
    fn failed_re_preparation_blocks_kick_off() {
        let (mut m, mut roster) = fixture();
        prepare_match(&mut m, &mut roster).unwrap();
        assert!(m.preparation.is_some());

        m.away_lineup.as_mut().unwrap().slots.truncate(5);
        let err = prepare_match(&mut m, &mut roster).unwrap_err();
        assert!(matches!(err, PreparationError::InvalidLineup { .. }));
        assert!(m.preparation.is_none());
        assert!(m.preparation_errors.iter().all(|r| r.starts_with("away:")));
        assert!(matches!(start_match(&mut m), Err(PreparationError::NotPrepared)));
        assert_eq!(m.status, MatchStatus::Scheduled);
    }
}
