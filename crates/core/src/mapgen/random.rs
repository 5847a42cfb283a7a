//! Roll helpers layered over an injected random source.

use rand_chacha::rand_core::Rng;

pub(crate) trait RollExt {
    /// Uniform index in `0..upper`. `upper` must be non-zero.
    fn below(&mut self, upper: usize) -> usize;

    fn range_inclusive(&mut self, min_value: usize, max_value: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f32;

    /// Uniform float in `[-1, 1)`.
    fn signed_unit(&mut self) -> f32;

    fn chance(&mut self, probability: f32) -> bool;

    /// Picks an index proportionally to `weights`; `None` when every weight is zero.
    fn weighted_index(&mut self, weights: &[u32]) -> Option<usize>;
}

impl<R: Rng + ?Sized> RollExt for R {
    fn below(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0);
        (self.next_u64() % upper as u64) as usize
    }

    fn range_inclusive(&mut self, min_value: usize, max_value: usize) -> usize {
        debug_assert!(min_value <= max_value);
        min_value + self.below(max_value - min_value + 1)
    }

    fn unit(&mut self) -> f32 {
        // 24 high bits fit exactly in an f32 mantissa.
        (self.next_u64() >> 40) as f32 / (1_u64 << 24) as f32
    }

    fn signed_unit(&mut self) -> f32 {
        self.unit() * 2.0 - 1.0
    }

    fn chance(&mut self, probability: f32) -> bool {
        self.unit() < probability
    }

    fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&weight| u64::from(weight)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.next_u64() % total;
        for (index, &weight) in weights.iter().enumerate() {
            let weight = u64::from(weight);
            if roll < weight {
                return Some(index);
            }
            roll -= weight;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    #[test]
    fn range_inclusive_stays_inside_requested_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(12_345);
        for _ in 0..200 {
            let value = rng.range_inclusive(7, 13);
            assert!((7..=13).contains(&value));
        }
    }

    #[test]
    fn unit_rolls_stay_in_half_open_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..500 {
            let value = rng.unit();
            assert!((0.0..1.0).contains(&value));
            let signed = rng.signed_unit();
            assert!((-1.0..1.0).contains(&signed));
        }
    }

    #[test]
    fn weighted_index_never_picks_zero_weight_entries() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        for _ in 0..300 {
            let picked = rng.weighted_index(&[0, 5, 0, 1]).expect("non-zero total weight");
            assert!(picked == 1 || picked == 3);
        }
        assert_eq!(rng.weighted_index(&[0, 0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }
}
