//! Monte Carlo simulation of random-hash bucket allocation

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::bucket_count;
use crate::stats::RunningStats;
use crate::{Error, Result};

/// Partition overheads `m/ℓ` swept by default.
pub const DEFAULT_FACTORS: [f64; 16] = [
    1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0,
];

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Items retrieved per batch `n`
    pub num_items: usize,
    /// Independent trials per factor `T`
    pub num_trials: usize,
    /// Root seed
    pub seed: u64,
    /// Partition overheads to sweep
    pub factors: Vec<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_items: 100,
            num_trials: 100,
            seed: 0x5EED,
            factors: DEFAULT_FACTORS.to_vec(),
        }
    }
}

impl SimulationConfig {
    /// Set the number of items per batch.
    #[must_use]
    pub const fn num_items(mut self, n: usize) -> Self {
        self.num_items = n;
        self
    }

    /// Set the number of trials per factor.
    #[must_use]
    pub const fn num_trials(mut self, trials: usize) -> Self {
        self.num_trials = trials;
        self
    }

    /// Set the root seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the factors to sweep.
    #[must_use]
    pub fn factors(mut self, factors: Vec<f64>) -> Self {
        self.factors = factors;
        self
    }
}

/// Estimated success of one partition overhead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEstimate {
    /// Partition overhead `m/ℓ`
    pub factor: f64,
    /// Buckets `k = ⌊factor·n⌋`
    pub num_buckets: usize,
    /// Mean success over trials
    pub mean: f64,
    /// Population standard deviation of trial successes
    pub std_dev: f64,
    /// `1.96·std_dev/√T`
    pub half_width: f64,
    /// Trials run
    pub trials: usize,
}

impl SuccessEstimate {
    fn from_stats(factor: f64, num_buckets: usize, stats: &RunningStats) -> Self {
        Self {
            factor,
            num_buckets,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            half_width: stats.half_width95(),
            trials: stats.count(),
        }
    }
}

/// Hash `num_items` unit items into `num_buckets` buckets and count the
/// buckets left empty.
///
/// The occupancy array lives only for the duration of the call.
///
/// # Panics
///
/// Panics if `num_buckets == 0`.
pub fn count_empty_buckets<R: Rng + ?Sized>(
    num_items: usize,
    num_buckets: usize,
    rng: &mut R,
) -> usize {
    let mut occupancy = vec![0u32; num_buckets];
    for _ in 0..num_items {
        occupancy[rng.gen_range(0..num_buckets)] += 1;
    }
    occupancy.iter().filter(|&&count| count == 0).count()
}

/// Success metric of one trial.
///
/// Without overhead (`factor == 1`) it is the fraction of items that found
/// a bucket of their own, `1 - empty/n`. With overhead it is the ratio of
/// spare buckets to empty buckets, `(k - n)/empty`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn trial_success(factor: f64, num_items: usize, num_buckets: usize, num_empty: usize) -> f64 {
    let n = num_items as f64;
    let k = num_buckets as f64;
    let empty = num_empty as f64;
    if factor == 1.0 {
        1.0 - empty / n
    } else {
        (k - n) / empty
    }
}

/// SplitMix64 finalizer.
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of trial `trial` in stream `stream`.
///
/// Counter-based, so every trial's generator is fixed by its coordinates
/// alone and trials can run in any order or on any thread.
#[must_use]
pub const fn trial_seed(seed: u64, stream: u64, trial: u64) -> u64 {
    mix64(mix64(seed ^ mix64(stream)).wrapping_add(trial.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

/// Seeded simulator of batch retrieval success.
#[derive(Debug, Clone)]
pub struct BucketSimulation {
    config: SimulationConfig,
}

impl BucketSimulation {
    /// Create a simulator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `num_items` or `num_trials` is zero
    /// or a configured factor is below 1.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if config.num_items == 0 {
            return Err(Error::InvalidInput("num_items must be positive".to_string()));
        }
        if config.num_trials == 0 {
            return Err(Error::InvalidInput("num_trials must be positive".to_string()));
        }
        for &factor in &config.factors {
            bucket_count(factor, config.num_items)?;
        }
        Ok(Self { config })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Success of every trial at `factor`, in trial order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for `factor < 1` or non-finite.
    pub fn trial_successes(&self, factor: f64) -> Result<Vec<f64>> {
        let num_items = self.config.num_items;
        let num_buckets = bucket_count(factor, num_items)?;
        let stream = factor.to_bits();
        let seed = self.config.seed;

        let run = |trial: usize| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(trial_seed(seed, stream, trial as u64));
            let empty = count_empty_buckets(num_items, num_buckets, &mut rng);
            trial_success(factor, num_items, num_buckets, empty)
        };

        #[cfg(feature = "parallel")]
        let successes: Vec<f64> = (0..self.config.num_trials).into_par_iter().map(run).collect();

        #[cfg(not(feature = "parallel"))]
        let successes: Vec<f64> = (0..self.config.num_trials).map(run).collect();

        Ok(successes)
    }

    /// Mean success and 95% half-width at `factor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for `factor < 1` or non-finite.
    pub fn estimate(&self, factor: f64) -> Result<SuccessEstimate> {
        let num_buckets = bucket_count(factor, self.config.num_items)?;
        let stats: RunningStats = self.trial_successes(factor)?.into_iter().collect();
        tracing::debug!(
            factor,
            num_buckets,
            mean = stats.mean(),
            "simulated partition overhead"
        );
        Ok(SuccessEstimate::from_stats(factor, num_buckets, &stats))
    }

    /// Estimate every configured factor, in order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid factor.
    pub fn sweep(&self) -> Result<Vec<SuccessEstimate>> {
        self.config
            .factors
            .iter()
            .map(|&factor| self.estimate(factor))
            .collect()
    }
}
