//! Uniform random sample sources
//!
//! Every probabilistic decision in the simulation draws a single uniform
//! value in `[0, 1)` through [`RandomSource`]. Seeded sources make whole runs
//! reproducible; scripted sources make individual decisions deterministic.

use crate::error::{Result, SimulationError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Source of uniform samples in `[0, 1)`
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send {
    /// Draw the next sample
    fn sample(&mut self) -> f64;
}

/// Draw a sample and reject anything outside `[0, 1)`
pub fn checked_sample(source: &mut dyn RandomSource) -> Result<f64> {
    let value = source.sample();
    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SimulationError::InvalidSample { value }.into())
    }
}

/// Thread-local, non-reproducible randomness
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl ThreadRandom {
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRandom {
    fn sample(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible randomness from a seed
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream for the `index`-th consumer of a base seed
    pub fn derived(seed: u64, index: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index);
        Self { rng }
    }
}

impl RandomSource for SeededRandom {
    fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of samples
///
/// Once the script runs out every draw yields NaN, which `checked_sample`
/// reports as an invalid sample.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Number of samples left in the script
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn sample(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(f64::NAN)
    }
}

/// Build the boxed source used by one consumer of a simulation
pub fn source_for(seed: Option<u64>, index: u64) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::derived(seed, index)),
        None => Box::new(ThreadRandom::new()),
    }
}
