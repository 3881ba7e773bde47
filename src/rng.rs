// Raffle Draw Engine - Seeded randomness
use rand::Rng;

use crate::constants::{MAX_SEED, MULBERRY32_INCREMENT, U32_RANGE};

/// A source of uniformly distributed values in [0, 1).
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Mulberry32 generator.
///
/// The whole state is one `u32`, so the same seed and the same number of calls
/// always produce the same sequence. `consumed` counts produced values, which
/// is what a stored session records to resume the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandom {
    seed: u32,
    state: u32,
    consumed: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            state: seed,
            consumed: 0,
        }
    }

    /// Rebuild a generator positioned `consumed` values into the stream of `seed`.
    pub fn resume(seed: u32, consumed: u32) -> Self {
        let mut rng = Self::new(seed);
        rng.skip(consumed);
        rng
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of values produced since the seed
    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// Advance the stream by `n` values, discarding them.
    pub fn skip(&mut self, n: u32) {
        for _ in 0..n {
            self.next_u32();
        }
    }

    /// Rewind to the start of the seed's stream.
    pub fn reset(&mut self) {
        self.state = self.seed;
        self.consumed = 0;
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY32_INCREMENT);
        self.consumed = self.consumed.wrapping_add(1);

        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / U32_RANGE
    }
}

/// Mint a non-cryptographic 31-bit seed for a new session.
pub fn fresh_seed() -> u32 {
    rand::thread_rng().gen_range(0..MAX_SEED)
}

/// Parse a string-encoded session seed.
pub fn parse_seed(seed: &str) -> Option<u32> {
    seed.trim().parse::<u32>().ok()
}
