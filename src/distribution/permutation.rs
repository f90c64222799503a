//! Uniform random permutation of offsets
//!
//! Uses the xoshiro256++ PRNG with a Fisher-Yates shuffle. Each shuffle gets a
//! fresh generator seeded from the high-resolution clock, so trials are
//! independent of each other and of previous runs.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seed derived from the current time in nanoseconds
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Shuffle `offsets` in place with a clock-seeded generator
pub fn shuffle_time_seeded(offsets: &mut [u64]) {
    shuffle_with_seed(offsets, clock_seed());
}

/// Shuffle `offsets` in place with an explicit seed
pub fn shuffle_with_seed(offsets: &mut [u64], seed: u64) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    offsets.shuffle(&mut rng);
}
