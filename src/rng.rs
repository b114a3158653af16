//! Injectable randomness for measurement jitter.
//!
//! Each concern draws from its own named stream derived from one master
//! seed, so a seeded analysis replays exactly.

use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const SYNTHESIS_STREAM: &str = "synthesis";
pub const COLLAPSE_STREAM: &str = "collapse";

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            master: ChaCha8Rng::from_entropy(),
            streams: HashMap::new(),
        }
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::new)
    }

    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed_bytes = [0u8; 8];
            self.master.fill_bytes(&mut seed_bytes);
            ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed_bytes))
        });
        StreamRng { inner: entry }
    }
}

pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for StreamRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Bounded uniform perturbations. Zero-width ranges are allowed and
/// return the lower bound.
pub trait Jitter {
    /// Uniform draw from `[-bound, +bound)`.
    fn jitter(&mut self, bound: f64) -> f64;
    /// Uniform draw from `[min, max)`.
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

impl<R: Rng + ?Sized> Jitter for R {
    fn jitter(&mut self, bound: f64) -> f64 {
        self.uniform(-bound, bound)
    }

    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.gen::<f64>() * (max - min) + min
    }
}
