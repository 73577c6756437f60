//! Random draws used by the state machine.
//!
//! All randomness flows through an injected [`Rng`], so seeding the RNG
//! fixes every roll and pick.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::probability::clamp;

/// Succeed with probability `chance` (clamped to `[0, 1]`).
///
/// A chance of 1 always succeeds and a chance of 0 never does.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.random::<f64>() < clamp(chance)
}

/// Pick one item with probability proportional to its weight.
///
/// Returns `None` for an empty slice. When every weight is zero the first
/// item is returned.
pub fn weighted_pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[(T, u32)]) -> Option<T> {
    let first = items.first().map(|(item, _)| *item)?;
    let Ok(dist) = WeightedIndex::new(items.iter().map(|(_, weight)| *weight)) else {
        return Some(first);
    };
    items.get(dist.sample(rng)).map(|(item, _)| *item)
}

/// Pick uniformly from a slice.
pub fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len())).copied()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn certain_and_impossible_rolls() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            assert!(roll(&mut rng, 1.0));
            assert!(!roll(&mut rng, 0.0));
            assert!(!roll(&mut rng, -3.0));
        }
    }

    #[test]
    fn zero_weights_fall_back_to_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(weighted_pick(&mut rng, &[('a', 0), ('b', 0)]), Some('a'));
        assert_eq!(weighted_pick::<char, _>(&mut rng, &[]), None);
    }

    #[test]
    fn weighted_pick_respects_zero_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(weighted_pick(&mut rng, &[('a', 0), ('b', 5)]), Some('b'));
        }
    }

    #[test]
    fn pick_stays_in_slice() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(pick::<u8, _>(&mut rng, &[]), None);
        for _ in 0..50 {
            assert!(matches!(pick(&mut rng, &[1, 2, 3]), Some(1..=3)));
        }
    }
}
