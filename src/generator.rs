//! Seeded random instance generation.
//!
//! Produces Taillard-style instances: every job visits every machine exactly
//! once, in a random order, with durations drawn uniformly from a range.
//! The same seed always yields the same instance.
//!
//! # Reference
//! Taillard (1993), "Benchmarks for basic scheduling problems"

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ProblemError;
use crate::models::{JobShopProblem, ProblemData};

/// Random job-shop instance generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceGenerator {
    /// Number of jobs.
    pub num_jobs: usize,
    /// Number of machines, each visited once per job.
    pub num_machines: usize,
    /// Smallest duration (inclusive).
    pub min_duration: i64,
    /// Largest duration (inclusive).
    pub max_duration: i64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self {
            num_jobs: 5,
            num_machines: 5,
            min_duration: 1,
            max_duration: 99,
            seed: 42,
        }
    }
}

impl InstanceGenerator {
    /// Creates a generator for `num_jobs` x `num_machines` instances.
    pub fn new(num_jobs: usize, num_machines: usize) -> Self {
        Self {
            num_jobs,
            num_machines,
            ..Self::default()
        }
    }

    /// Sets the inclusive duration range. `max` is raised to `min` if lower.
    pub fn with_durations(mut self, min: i64, max: i64) -> Self {
        self.min_duration = min;
        self.max_duration = max.max(min);
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Raw job lists, without validation.
    pub fn generate_data(&self) -> ProblemData {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut routing: Vec<i64> = (0..self.num_machines as i64).collect();
        let jobs = (0..self.num_jobs)
            .map(|_| {
                routing.shuffle(&mut rng);
                routing
                    .iter()
                    .map(|&m| (m, rng.random_range(self.min_duration..=self.max_duration)))
                    .collect()
            })
            .collect();
        ProblemData::new(jobs)
    }

    /// Builds a validated problem.
    ///
    /// # Errors
    /// `InvalidProblem` when the parameters cannot produce a valid instance
    /// (no machines with at least one job, or non-positive durations).
    pub fn generate(&self) -> Result<JobShopProblem, ProblemError> {
        JobShopProblem::try_from(self.generate_data())
    }
}
