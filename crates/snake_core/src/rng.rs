//! Seeded random source for spawn placement.
//!
//! Every random choice in a session (food cell, food category, hazard
//! cells) is drawn from this generator, which lives inside the session
//! state. Same seed, same inputs, same game.

use serde::{Deserialize, Serialize};

/// SplitMix64 generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRng {
    state: u64,
}

impl SessionRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(bound)) as u32
    }

    /// Uniform value in `[min, max)`. Returns `min` for an empty range.
    pub fn next_range(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_below(max - min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SessionRng::new(42);
        let mut b = SessionRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SessionRng::new(1);
        let mut b = SessionRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = SessionRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_range(3, 9);
            assert!((3..9).contains(&v));
        }
        assert_eq!(rng.next_range(5, 5), 5);
        assert_eq!(rng.next_below(0), 0);
    }

    #[test]
    fn test_low_bits_are_mixed() {
        let mut rng = SessionRng::new(0);
        let odd = (0..1000).filter(|_| rng.next_below(2) == 1).count();
        assert!((350..650).contains(&odd), "odd count {odd}");
    }
}
