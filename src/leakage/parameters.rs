//! Per-dataset leakage parameters

use serde::{Deserialize, Serialize};

use super::{leakage_ratio, probing_radius, table_radii};
use crate::stats::RunningStats;
use crate::{Error, Result};

/// Gaussian fit of a distance sample, with its observed range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianFit {
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev: f64,
    /// Smallest observed distance
    pub min: f64,
    /// Largest observed distance
    pub max: f64,
    /// Number of distances fitted
    pub count: usize,
}

impl GaussianFit {
    /// Fit distances, e.g. the pooled sample of a [`crate::record::TrialRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientSamples`] for fewer than two distances.
    pub fn from_samples(distances: &[f64]) -> Result<Self> {
        if distances.len() < 2 {
            return Err(Error::InsufficientSamples {
                needed: 2,
                got: distances.len(),
            });
        }
        let stats: RunningStats = distances.iter().copied().collect();
        let (min, max) = distances
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });
        Ok(Self {
            mean: stats.mean(),
            std_dev: stats.sample_variance().sqrt(),
            min,
            max,
            count: stats.count(),
        })
    }
}

/// Inputs of the leakage model for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageParameters {
    /// Dataset name
    pub name: String,
    /// Number of points `n`
    pub dataset_size: f64,
    /// Dimension of the raw vectors
    pub ambient_dimension: f64,
    /// Estimated intrinsic dimension
    pub intrinsic_dimension: f64,
    /// Mean nearest-neighbor distance `μ`
    pub distance_mean: f64,
    /// Standard deviation of nearest-neighbor distances `σ`
    pub distance_std_dev: f64,
    /// Smallest observed distance `Dmin`
    pub min_distance: f64,
    /// Largest observed distance `Dmax`
    pub max_distance: f64,
    /// Number of hash tables `m`
    pub num_tables: usize,
    /// Average number of empty probes observed per query `l`
    pub empty_probe_count: f64,
}

impl LeakageParameters {
    /// Assemble parameters from a nearest-neighbor fit.
    ///
    /// `Dmin` is taken from the fit; `Dmax` is the farthest distance seen,
    /// which a nearest-neighbor sample does not contain.
    #[must_use]
    pub fn from_fit(
        name: impl Into<String>,
        dataset_size: f64,
        ambient_dimension: f64,
        nearest: &GaussianFit,
        max_distance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            dataset_size,
            ambient_dimension,
            intrinsic_dimension: ambient_dimension,
            distance_mean: nearest.mean,
            distance_std_dev: nearest.std_dev,
            min_distance: nearest.min,
            max_distance,
            num_tables: 1,
            empty_probe_count: 1.0,
        }
    }

    /// Set the number of tables.
    #[must_use]
    pub const fn with_num_tables(mut self, num_tables: usize) -> Self {
        self.num_tables = num_tables;
        self
    }

    /// Set the intrinsic dimension.
    #[must_use]
    pub const fn with_intrinsic_dimension(mut self, dimension: f64) -> Self {
        self.intrinsic_dimension = dimension;
        self
    }

    /// Set the observed empty-probe count.
    #[must_use]
    pub const fn with_empty_probe_count(mut self, count: f64) -> Self {
        self.empty_probe_count = count;
        self
    }

    /// Largest probing radius `Rmax`.
    ///
    /// # Errors
    ///
    /// Returns error when `num_tables == 0`.
    pub fn rmax(&self) -> Result<f64> {
        probing_radius(self.distance_mean, self.distance_std_dev, self.num_tables)
    }

    /// Radius of every table.
    ///
    /// # Errors
    ///
    /// Returns error when `num_tables == 0`.
    pub fn radii(&self) -> Result<Vec<f64>> {
        table_radii(self.distance_mean, self.distance_std_dev, self.num_tables)
    }

    /// Worst-case ratio: ambient dimension, every other table probed empty.
    ///
    /// # Errors
    ///
    /// Returns error when `num_tables == 0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn raw_ratio(&self) -> Result<f64> {
        let rmax = self.rmax()?;
        let l = (self.num_tables - 1) as f64;
        Ok(self.ratio(self.ambient_dimension, rmax, l))
    }

    /// Ratio under the intrinsic dimension and observed empty probes.
    ///
    /// # Errors
    ///
    /// Returns error when `num_tables == 0`.
    pub fn empirical_ratio(&self) -> Result<f64> {
        Ok(self.ratio(
            self.intrinsic_dimension,
            self.rmax()?,
            self.empty_probe_count,
        ))
    }

    fn ratio(&self, dimension: f64, rmax: f64, empty_probes: f64) -> f64 {
        leakage_ratio(
            dimension,
            rmax,
            self.max_distance,
            self.min_distance,
            self.dataset_size,
            empty_probes,
        )
    }

    /// Evaluate both ratios.
    ///
    /// # Errors
    ///
    /// Returns error when `num_tables == 0`.
    pub fn report(&self) -> Result<LeakageReport> {
        Ok(LeakageReport {
            dataset: self.name.clone(),
            num_tables: self.num_tables,
            rmax: self.rmax()?,
            raw_ratio: self.raw_ratio()?,
            empirical_ratio: self.empirical_ratio()?,
        })
    }
}

/// Leakage ratios of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageReport {
    /// Dataset name
    pub dataset: String,
    /// Number of hash tables
    pub num_tables: usize,
    /// Largest probing radius
    pub rmax: f64,
    /// Ratio with ambient dimension and `m - 1` empty probes
    pub raw_ratio: f64,
    /// Ratio with intrinsic dimension and observed empty probes
    pub empirical_ratio: f64,
}

/// Measured parameters of the benchmark datasets.
///
/// Distances are in the raw (not dimension-reduced) space: mean and stddev
/// of 10,000 brute-force nearest neighbors, and the extreme distances of the
/// same sample. Intrinsic dimensions follow Figure 3 of Amsaleg et al.,
/// "Estimating Local Intrinsic Dimensionality" (KDD 2015).
#[must_use]
pub fn reference_datasets(num_tables: usize) -> Vec<LeakageParameters> {
    // name, n, dimension, mean, stddev, dmin, dmax, intrinsic
    const DATASETS: [(&str, f64, f64, f64, f64, f64, f64, f64); 4] = [
        ("mnist", 60_000.0, 784.0, 1065.57, 307.9, 209.55, 4303.3, 10.0),
        ("sift", 1_000_000.0, 128.0, 150.46, 58.63, 7.48, 721.34, 15.0),
        ("deep1b", 10_000_000.0, 96.0, 0.5488, 0.1463, 0.01686, 1.74, 20.0),
        ("gist", 1_000_000.0, 960.0, 0.6415, 0.24064, 0.0170, 8.632, 25.0),
    ];
    // Average number of empty probes seen over 10,000 queries
    const EMPIRICAL_EMPTY_PROBES: f64 = 15.0;

    DATASETS
        .iter()
        .map(
            |&(name, n, dimension, mean, std_dev, dmin, dmax, intrinsic)| LeakageParameters {
                name: name.to_string(),
                dataset_size: n,
                ambient_dimension: dimension,
                intrinsic_dimension: intrinsic,
                distance_mean: mean,
                distance_std_dev: std_dev,
                min_distance: dmin,
                max_distance: dmax,
                num_tables,
                empty_probe_count: EMPIRICAL_EMPTY_PROBES,
            },
        )
        .collect()
}
