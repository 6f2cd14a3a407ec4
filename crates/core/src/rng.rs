//! Deterministic per-cell random draws
//!
//! Every stochastic decision in a step derives its generator from the
//! tuple `(seed, step, x, y)`, so parallel synchronous updates produce
//! bit-identical runs regardless of thread scheduling.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Collapse the draw-site tuple into a 64-bit seed
#[inline]
pub fn hash_seed(seed: u64, step: u64, x: usize, y: usize) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(seed);
    hasher.write_u64(step);
    hasher.write_usize(x);
    hasher.write_usize(y);
    hasher.finish()
}

/// Generator for all draws made at cell `(x, y)` during `step`
#[inline]
pub fn cell_rng(seed: u64, step: u64, x: usize, y: usize) -> SmallRng {
    SmallRng::seed_from_u64(hash_seed(seed, step, x, y))
}

/// Generator for whole-grid decisions during `step` (visitation order)
#[inline]
pub fn step_rng(seed: u64, step: u64) -> SmallRng {
    SmallRng::seed_from_u64(hash_seed(seed, step, usize::MAX, usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_tuple_same_draws() {
        let mut a = cell_rng(42, 7, 3, 9);
        let mut b = cell_rng(42, 7, 3, 9);
        for _ in 0..16 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn test_neighboring_cells_decorrelated() {
        let a: f64 = cell_rng(42, 7, 3, 9).random();
        let b: f64 = cell_rng(42, 7, 4, 9).random();
        let c: f64 = cell_rng(42, 8, 3, 9).random();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_seed_changes_stream() {
        assert_ne!(hash_seed(1, 0, 0, 0), hash_seed(2, 0, 0, 0));
        assert_ne!(hash_seed(1, 0, 0, 0), hash_seed(1, 1, 0, 0));
    }
}
