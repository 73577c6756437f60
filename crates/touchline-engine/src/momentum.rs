//! Team momentum.
//!
//! Momentum is a per-side integer in `[-100, 100]`. Every possession swing
//! nudges the gaining side up one point and the losing side down one.

use touchline_types::{Match, MatchPreparation, TeamSide};

/// Largest initial momentum a preparation can seed.
pub const SEED_MOMENTUM_CAP: i32 = 10;

/// Record a possession swing in favour of `gaining`.
pub fn shift_momentum(m: &mut Match, gaining: TeamSide) {
    let up = m.momentum(gaining).saturating_add(1);
    let down = m.momentum(gaining.opponent()).saturating_sub(1);
    m.set_momentum(gaining, up);
    m.set_momentum(gaining.opponent(), down);
}

/// Seed opening momentum from the midfield strength gap.
///
/// The stronger midfield starts with a positive figure, the weaker one with
/// its negation; both are capped at [`SEED_MOMENTUM_CAP`].
pub fn seed_momentum(m: &mut Match, preparation: &MatchPreparation) {
    let gap = (preparation.home.midfield - preparation.away.midfield).round();
    #[allow(clippy::cast_possible_truncation)]
    let gap = gap.clamp(f64::from(-SEED_MOMENTUM_CAP), f64::from(SEED_MOMENTUM_CAP)) as i32;
    m.set_momentum(TeamSide::Home, gap);
    m.set_momentum(TeamSide::Away, gap.saturating_neg());
}
