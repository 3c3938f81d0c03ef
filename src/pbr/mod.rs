//! Private batch retrieval (PBR) overhead models
//!
//! Retrieving `ℓ` items at once from `m` partitions works when every item's
//! bucket is distinct. With random hashing into `k = factor·n` buckets some
//! buckets stay empty and some collide:
//!
//! ```text
//! items:    ●  ●  ●  ●  ●
//!            \ |   \ | /
//! buckets:  [2][0][3][0][0][0]     k = 6, n = 5, empty = 4
//! ```
//!
//! Two paths estimate the achievable success:
//!
//! - [`BucketSimulation`]: seeded Monte Carlo over `T` trials with a 95%
//!   half-width
//! - [`pbr_success`] / [`expected_success`]: closed forms to cross-check the
//!   simulated mean as `T → ∞`
//!
//! [`BatchScheme`] gives the overheads of the alternatives compared in the
//! processing and communication figures.

mod closed_form;
mod simulator;

pub use closed_form::{
    default_levels, expected_empty_buckets, expected_success, overhead_curve, pbr_success,
    BatchScheme, OverheadCurve, OverheadKind,
};
pub use simulator::{
    count_empty_buckets, trial_seed, trial_success, BucketSimulation, SimulationConfig,
    SuccessEstimate, DEFAULT_FACTORS,
};

use crate::{Error, Result};

/// Buckets provisioned for `num_items` at `factor`: `⌊factor·n⌋`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn bucket_count(factor: f64, num_items: usize) -> Result<usize> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(Error::InvalidInput(format!(
            "partition overhead must be a finite value >= 1, got {factor}"
        )));
    }
    if num_items == 0 {
        return Err(Error::InvalidInput("num_items must be positive".to_string()));
    }
    Ok((factor * num_items as f64).floor() as usize)
}
