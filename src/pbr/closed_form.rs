//! Closed-form batch-retrieval overheads

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Expected fraction of `items` retrieved when hashed into `buckets`.
///
/// ```text
/// pbr_success(x, m) = m·(1 - (1 - 1/m)^x) / x
/// ```
///
/// This is the expected number of occupied buckets per item, the
/// asymptotic analogue of the Monte Carlo estimate at `m == x`.
#[must_use]
pub fn pbr_success(items: f64, buckets: f64) -> f64 {
    buckets * (1.0 - (1.0 - 1.0 / buckets).powf(items)) / items
}

/// Expected number of empty buckets after hashing `items` into `buckets`.
#[must_use]
pub fn expected_empty_buckets(items: f64, buckets: f64) -> f64 {
    buckets * (1.0 - 1.0 / buckets).powf(items)
}

/// Closed-form counterpart of the simulated success metric.
///
/// Uses the same regime split and bucket count as the simulator, with the
/// empty-bucket count replaced by its expectation.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for `factor < 1`, a non-finite factor, or
/// `num_items == 0`.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn expected_success(factor: f64, num_items: usize) -> Result<f64> {
    let num_buckets = super::bucket_count(factor, num_items)?;
    let n = num_items as f64;
    let k = num_buckets as f64;
    let empty = expected_empty_buckets(n, k);
    if factor == 1.0 {
        Ok(1.0 - empty / n)
    } else {
        Ok((k - n) / empty)
    }
}

/// Batch retrieval schemes compared against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchScheme {
    /// One full retrieval per level
    Naive,
    /// Recursive batch code
    BatchCode,
    /// Systematic (probabilistic) batch code with 3-way replication
    SystematicCode,
    /// Private batch retrieval with `m = ℓ` buckets
    PbrEqual,
    /// Private batch retrieval with `m = 2ℓ` buckets
    PbrDouble,
}

impl BatchScheme {
    /// Every scheme, in plotting order.
    pub const ALL: [Self; 5] = [
        Self::Naive,
        Self::BatchCode,
        Self::SystematicCode,
        Self::PbrEqual,
        Self::PbrDouble,
    ];

    /// Short label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::BatchCode => "BC",
            Self::SystematicCode => "PBC",
            Self::PbrEqual => "PBR (m=l)",
            Self::PbrDouble => "PBR (m=2l)",
        }
    }

    /// Server processing relative to a single retrieval, for `ell` levels.
    #[must_use]
    pub fn processing_overhead(self, ell: f64) -> f64 {
        match self {
            Self::Naive => ell,
            Self::BatchCode => 1.5f64.powf(ell.log2()),
            Self::SystematicCode => 3.0,
            Self::PbrEqual => 1.0 / pbr_success(ell, ell),
            Self::PbrDouble => 1.0 / pbr_success(ell, 2.0 * ell),
        }
    }

    /// Communication relative to a single retrieval, for `ell` levels.
    ///
    /// Batch codes pay `3^log2 ℓ` answers over `ℓ` queries; the systematic
    /// code answers `1.5ℓ` buckets with 3 replicas each; PBR with `2ℓ`
    /// buckets doubles the answer size.
    #[must_use]
    pub fn communication_overhead(self, ell: f64) -> f64 {
        match self {
            Self::Naive => ell,
            Self::BatchCode => 3.0f64.powf(ell.log2()) / ell,
            Self::SystematicCode => 1.5 * 3.0,
            Self::PbrEqual => 1.0 / pbr_success(ell, ell),
            Self::PbrDouble => 2.0 / pbr_success(ell, 2.0 * ell),
        }
    }
}

/// Which cost a curve measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverheadKind {
    /// Server work
    Processing,
    /// Bytes exchanged
    Communication,
}

/// One scheme's overhead at a sequence of level counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadCurve {
    /// Scheme plotted
    pub scheme: BatchScheme,
    /// Cost measured
    pub kind: OverheadKind,
    /// `(ℓ, overhead)` points
    pub points: Vec<(f64, f64)>,
}

/// Evaluate a scheme over `levels`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if any level is below 1.
pub fn overhead_curve(
    scheme: BatchScheme,
    kind: OverheadKind,
    levels: &[f64],
) -> Result<OverheadCurve> {
    if let Some(bad) = levels.iter().find(|&&ell| !(ell >= 1.0)) {
        return Err(Error::InvalidInput(format!(
            "number of levels must be at least 1, got {bad}"
        )));
    }
    let points = levels
        .iter()
        .map(|&ell| {
            let overhead = match kind {
                OverheadKind::Processing => scheme.processing_overhead(ell),
                OverheadKind::Communication => scheme.communication_overhead(ell),
            };
            (ell, overhead)
        })
        .collect();
    Ok(OverheadCurve {
        scheme,
        kind,
        points,
    })
}

/// Default level counts `1..=19`.
#[must_use]
pub fn default_levels() -> Vec<f64> {
    (1..=19).map(f64::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbr_success_known_values() {
        // m = x = 2: 2·(1 - 0.25)/2 = 0.75
        assert!((pbr_success(2.0, 2.0) - 0.75).abs() < 1e-12);
        // single item always retrieved
        assert!((pbr_success(1.0, 1.0) - 1.0).abs() < 1e-12);
        // large x approaches 1 - 1/e
        let limit = 1.0 - (-1.0f64).exp();
        assert!((pbr_success(10_000.0, 10_000.0) - limit).abs() < 1e-4);
    }

    #[test]
    fn test_processing_overheads_at_one_level() {
        assert!((BatchScheme::Naive.processing_overhead(1.0) - 1.0).abs() < 1e-12);
        assert!((BatchScheme::BatchCode.processing_overhead(1.0) - 1.0).abs() < 1e-12);
        assert!((BatchScheme::SystematicCode.processing_overhead(1.0) - 3.0).abs() < 1e-12);
        assert!((BatchScheme::PbrEqual.processing_overhead(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_code_at_power_of_two() {
        // (3/2)^log2(8) = (3/2)^3
        assert!((BatchScheme::BatchCode.processing_overhead(8.0) - 3.375).abs() < 1e-12);
        // 3^3 / 8
        assert!((BatchScheme::BatchCode.communication_overhead(8.0) - 27.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_double_buckets_cost_less_work() {
        for ell in default_levels().into_iter().skip(1) {
            assert!(
                BatchScheme::PbrDouble.processing_overhead(ell)
                    < BatchScheme::PbrEqual.processing_overhead(ell)
            );
        }
    }

    #[test]
    fn test_overhead_curve() {
        let curve =
            overhead_curve(BatchScheme::Naive, OverheadKind::Processing, &default_levels()).unwrap();
        assert_eq!(curve.points.len(), 19);
        assert!(curve.points.iter().all(|(ell, y)| (ell - y).abs() < 1e-12));
        assert!(overhead_curve(BatchScheme::Naive, OverheadKind::Processing, &[0.5]).is_err());
    }

    #[test]
    fn test_expected_success_regimes() {
        // factor 1: 1 - (1 - 1/n)^n == pbr_success(n, n)
        let at_one = expected_success(1.0, 100).unwrap();
        assert!((at_one - pbr_success(100.0, 100.0)).abs() < 1e-12);
        // factor 2: (200 - 100) / (200·(1 - 1/200)^100)
        let at_two = expected_success(2.0, 100).unwrap();
        let empty = 200.0 * (1.0 - 1.0 / 200.0f64).powf(100.0);
        assert!((at_two - 100.0 / empty).abs() < 1e-12);
        assert!(expected_success(0.5, 100).is_err());
    }
}
