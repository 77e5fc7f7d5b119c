//! Uniform draws for the traffic split.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)`.
pub trait UniformSampler: Send + Sync {
    fn sample(&self) -> f64;
}

/// Reproducible sampler over a seeded `StdRng`.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl UniformSampler for SeededSampler {
    fn sample(&self) -> f64 {
        // A panic mid-draw cannot leave the generator in a bad state.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen::<f64>()
    }
}

/// Draws from the OS-seeded thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropySampler;

impl EntropySampler {
    pub fn new() -> Self {
        Self
    }
}

impl UniformSampler for EntropySampler {
    fn sample(&self) -> f64 {
        thread_rng().gen::<f64>()
    }
}
