//! Running Stats - mergeable mean/variance accumulator

use serde::{Deserialize, Serialize};

use super::confidence95;

/// Online mean/variance accumulator (Welford).
///
/// `merge` combines two accumulators with Chan's parallel update, so a
/// reduction tree over any split of the data yields the same moments as a
/// sequential pass, up to floating-point rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Add one observation.
    ///
    /// ```text
    /// δ  = x - μₙ₋₁
    /// μₙ = μₙ₋₁ + δ/n
    /// M2ₙ = M2ₙ₋₁ + δ·(x - μₙ)
    /// ```
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Combine with another accumulator.
    #[allow(clippy::cast_precision_loss)]
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let total = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / total;
        self.m2 += other.m2 + delta * delta * n_a * n_b / total;
        self.count += other.count;
    }

    /// Number of observations.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Sample mean (0 when empty).
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (divides by n).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Unbiased sample variance (divides by n - 1).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Population standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.population_variance().sqrt()
    }

    /// 95% confidence half-width of the mean, `1.96·σ/√n`.
    #[must_use]
    pub fn half_width95(&self) -> f64 {
        confidence95(self.std_dev(), self.count)
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}
