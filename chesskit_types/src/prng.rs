/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// A xorshift64* pseudo-random number generator.
///
/// Deterministic for a given seed, so Zobrist keys and magic numbers are identical on every run.
/// The `const` constructors and step function allow it to be used while building `const` tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    /// Default seed used for Zobrist keys.
    pub const DEFAULT_SEED: u64 = 1070372;

    /// Creates a new generator. A seed of `0` would only ever produce `0`, so it is replaced by [`XorShiftRng::DEFAULT_SEED`].
    #[inline(always)]
    pub const fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            Self::DEFAULT_SEED
        } else {
            seed
        };
        Self { state }
    }

    /// Advances the generator, returning the next value and the advanced generator.
    ///
    /// # Example
    /// ```
    /// # use chesskit_types::XorShiftRng;
    /// const FIRST: u64 = XorShiftRng::new(42).step().0;
    /// let mut rng = XorShiftRng::new(42);
    /// assert_eq!(rng.next_u64(), FIRST);
    /// ```
    #[inline(always)]
    pub const fn step(self) -> (u64, Self) {
        let mut s = self.state;
        s ^= s >> 12;
        s ^= s << 25;
        s ^= s >> 27;
        (s.wrapping_mul(2685821657736338717), Self { state: s })
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let (value, next) = self.step();
        *self = next;
        value
    }

    /// A value with roughly one eighth of its bits set, for magic number candidates.
    #[inline(always)]
    pub fn sparse_u64(&mut self) -> u64 {
        self.next_u64() & self.next_u64() & self.next_u64()
    }
}

impl Default for XorShiftRng {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = XorShiftRng::new(728);
        let mut b = XorShiftRng::new(728);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_sparse_values_are_sparse() {
        let mut rng = XorShiftRng::default();
        let total: u32 = (0..1000).map(|_| rng.sparse_u64().count_ones()).sum();
        // Expected mean is 8 bits per value.
        assert!(total < 16 * 1000);
    }

    #[test]
    fn test_zero_seed_is_replaced() {
        let mut rng = XorShiftRng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }
}
