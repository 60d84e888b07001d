// packages/privacy-mapper/src/random/mod.rs
//! Bounded random draws for field fuzzing
//!
//! Every non-deterministic decision the rewrite engine makes goes through a
//! [`RandomSource`]. Production uses [`CryptoRandom`]; tests inject
//! [`SeededRandom`] so fuzzed output is reproducible.

use crate::utils::errors::{MapperError, Result};
use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};

/// Source of uniformly distributed bounded integers
pub trait RandomSource: Send + Sync {
    /// Draw a value in `[0, n)`. A bound of zero yields zero.
    fn draw_bounded(&self, n: u64) -> Result<u64>;
}

/// Draws from the operating system's secure entropy source
#[derive(Debug, Default, Clone, Copy)]
pub struct CryptoRandom;

impl CryptoRandom {
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for CryptoRandom {
    fn draw_bounded(&self, n: u64) -> Result<u64> {
        if n == 0 {
            return Ok(0);
        }

        // Reject the tail above the largest multiple of n to stay unbiased.
        let limit = u64::MAX - (u64::MAX % n);
        loop {
            let mut buf = [0u8; 8];
            OsRng
                .try_fill_bytes(&mut buf)
                .map_err(|e| MapperError::RandomSourceFailure(e.to_string()))?;

            let value = u64::from_le_bytes(buf);
            if value < limit {
                return Ok(value % n);
            }
        }
    }
}

/// Deterministic generator for tests and replays
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn draw_bounded(&self, n: u64) -> Result<u64> {
        if n == 0 {
            return Ok(0);
        }

        Ok(self.rng.lock().gen_range(0..n))
    }
}

/// Build the configured source: seeded when a seed is given, secure otherwise
pub fn from_seed(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(CryptoRandom::new()),
    }
}
