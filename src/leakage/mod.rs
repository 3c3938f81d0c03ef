//! Analytic leakage model for truncated-radius probing
//!
//! Nearest-neighbor distances of a dataset are modeled as `N(μ, σ²)`. The
//! `m` hash tables use radii at the midpoints of `m` equal-probability bins,
//! so every table serves `1/m` of the queries:
//!
//! ```text
//! r_i  = μ + Φ⁻¹((i + 0.5)/m)·σ        i = 0..m
//! Rmax = r_{m-1} = μ + Φ⁻¹((m - 0.5)/m)·σ
//! ```
//!
//! Leakage is counted in bits under a coordinate-independence assumption:
//!
//! ```text
//! ideal = d·log2(Dmax/Rmax) + log2(n)
//! extra = d·log2(Rmax/Dmin) + log2(l)
//! ratio = extra / ideal
//! ```
//!
//! Degenerate inputs (`Dmax == Rmax`, `Rmax == Dmin`, zero counts) produce
//! infinities or NaN, which are returned as-is for the caller to report.

mod parameters;

pub use parameters::{reference_datasets, GaussianFit, LeakageParameters, LeakageReport};

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{Error, Result};

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| Error::InvalidInput(format!("standard normal: {e}")))
}

fn check_tables(num_tables: usize) -> Result<f64> {
    if num_tables == 0 {
        return Err(Error::InvalidInput(
            "number of tables must be at least 1".to_string(),
        ));
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(num_tables as f64)
}

/// Largest probing radius: the last of `num_tables` equal-mass bin midpoints.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `num_tables == 0`.
///
/// # Example
///
/// ```rust
/// use pann_stats::leakage::probing_radius;
///
/// // One table sits at the median
/// assert!((probing_radius(150.0, 58.0, 1)? - 150.0).abs() < 1e-9);
/// assert!(probing_radius(150.0, 58.0, 30)? > 150.0);
/// # Ok::<(), pann_stats::Error>(())
/// ```
pub fn probing_radius(mean: f64, stddev: f64, num_tables: usize) -> Result<f64> {
    let m = check_tables(num_tables)?;
    let quantile = standard_normal()?.inverse_cdf((m - 0.5) / m);
    Ok(mean + quantile * stddev)
}

/// Radius of every table, ascending.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `num_tables == 0`.
#[allow(clippy::cast_precision_loss)]
pub fn table_radii(mean: f64, stddev: f64, num_tables: usize) -> Result<Vec<f64>> {
    let m = check_tables(num_tables)?;
    let normal = standard_normal()?;
    Ok((0..num_tables)
        .map(|r| mean + normal.inverse_cdf((r as f64 + 0.5) / m) * stddev)
        .collect())
}

/// Bits an adversary learns without truncation.
#[must_use]
pub fn ideal_leakage_bits(dimension: f64, rmax: f64, dmax: f64, dataset_size: f64) -> f64 {
    dimension * (dmax / rmax).log2() + dataset_size.log2()
}

/// Bits attributable to probes beyond the primary table.
#[must_use]
pub fn extra_leakage_bits(dimension: f64, rmax: f64, dmin: f64, empty_probe_count: f64) -> f64 {
    dimension * (rmax / dmin).log2() + empty_probe_count.log2()
}

/// Ratio of extra to ideal leakage.
#[must_use]
pub fn leakage_ratio(
    dimension: f64,
    rmax: f64,
    dmax: f64,
    dmin: f64,
    dataset_size: f64,
    empty_probe_count: f64,
) -> f64 {
    extra_leakage_bits(dimension, rmax, dmin, empty_probe_count)
        / ideal_leakage_bits(dimension, rmax, dmax, dataset_size)
}
