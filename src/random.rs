//! Randomness source threaded through the simulation.
//!
//! Nothing in the core touches a thread-local generator; the loop owns one
//! `StdRng` and lends it to every shuffle and every agent decision.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type RandomSource = StdRng;

/// Seeded when `seed` is given, otherwise drawn from OS entropy.
pub fn source(seed: Option<u64>) -> RandomSource {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// True with probability `percent / 100`.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, percent: u32) -> bool {
    rng.gen_range(0..100) < percent
}

/// Uniform integer in `[0, 100)`.
pub fn percentile<R: Rng + ?Sized>(rng: &mut R) -> usize {
    rng.gen_range(0..100)
}
