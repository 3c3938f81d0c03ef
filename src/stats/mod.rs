//! Order statistics and confidence bounds
//!
//! ## Nearest-rank percentile against a pre-filter denominator
//!
//! Distance logs contain zero and negative sentinels that are dropped before
//! ranking. The rank is still computed against the number of readings seen
//! *before* filtering:
//!
//! ```text
//! rank = q · raw_count
//! p_q  = sorted[max(⌊rank⌋, 1) - 1]   if len(sorted) > rank
//! p_q  = 0                            otherwise
//! ```
//!
//! A log with many degenerate readings therefore reports `0`, the
//! "statistically unreliable" sentinel, instead of a tail value drawn from
//! too few real samples.

mod running;

pub use running::RunningStats;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// z-score of a two-sided 95% normal interval
pub const Z_95: f64 = 1.96;

/// Quantile used for the summary table
pub const DEFAULT_PERCENTILE: f64 = 0.95;

/// Nearest-rank percentile of filtered samples.
///
/// # Arguments
///
/// * `samples` - Strictly positive readings, in any order
/// * `raw_count` - Number of readings before filtering
/// * `q` - Quantile in (0, 1)
///
/// # Returns
///
/// The sample at rank `⌊q·raw_count⌋` (1-based), or `0.0` when there are not
/// more than `q·raw_count` samples available.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `q` is not strictly inside (0, 1).
///
/// # Example
///
/// ```rust
/// use pann_stats::stats::percentile;
///
/// // 20 readings, all positive: rank ⌊0.95·20⌋ = 19
/// let samples: Vec<f64> = (1..=20).map(f64::from).collect();
/// assert_eq!(percentile(&samples, 20, 0.95)?, 19.0);
///
/// // Same samples, but 40 readings were seen before filtering
/// assert_eq!(percentile(&samples, 40, 0.95)?, 0.0);
/// # Ok::<(), pann_stats::Error>(())
/// ```
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(samples: &[f64], raw_count: usize, q: f64) -> Result<f64> {
    if !(q > 0.0 && q < 1.0) {
        return Err(Error::InvalidInput(format!(
            "percentile q must lie in (0, 1), got {q}"
        )));
    }

    let rank = q * raw_count as f64;
    if samples.len() as f64 <= rank {
        return Ok(0.0);
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Ranks below 1 resolve to the smallest sample
    let index = (rank.floor() as usize).max(1) - 1;
    Ok(sorted[index])
}

/// 95% confidence half-width of a mean: `1.96·σ/√n`.
///
/// `n == 0` yields a non-finite value.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence95(std_dev: f64, n: usize) -> f64 {
    Z_95 * std_dev / (n as f64).sqrt()
}

/// Arithmetic mean, or `None` when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation (ddof = 0), or `None` when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Mean with its 95% confidence half-width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanInterval {
    /// Sample mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// `1.96·σ/√n`
    pub half_width: f64,
    /// Number of observations
    pub count: usize,
}

impl MeanInterval {
    /// Lower bound of the interval.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.mean - self.half_width
    }

    /// Upper bound of the interval.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.mean + self.half_width
    }
}

impl From<RunningStats> for MeanInterval {
    fn from(stats: RunningStats) -> Self {
        Self {
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            half_width: stats.half_width95(),
            count: stats.count(),
        }
    }
}

/// Summarize a series as mean ± 95% half-width.
///
/// # Errors
///
/// Returns [`Error::InsufficientSamples`] for an empty series.
pub fn summarize(values: &[f64]) -> Result<MeanInterval> {
    let (Some(mean), Some(std_dev)) = (mean(values), std_dev(values)) else {
        return Err(Error::InsufficientSamples { needed: 1, got: 0 });
    };
    Ok(MeanInterval {
        mean,
        std_dev,
        half_width: confidence95(std_dev, values.len()),
        count: values.len(),
    })
}
