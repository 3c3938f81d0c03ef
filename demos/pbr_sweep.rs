//! PBR Sweep Example
//!
//! Simulates batch retrieval success over the default partition overheads
//! and prints it next to the closed form, then the overhead curves of every
//! batching scheme as JSON.
//!
//! Run with: cargo run --example pbr_sweep -- [trials] [seed]

use anyhow::Context;
use pann_stats::pbr::{
    default_levels, expected_success, overhead_curve, BatchScheme, BucketSimulation,
    OverheadKind, SimulationConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = SimulationConfig::default();
    if let Some(trials) = args.next() {
        config = config.num_trials(trials.parse().context("trials must be an integer")?);
    }
    if let Some(seed) = args.next() {
        config = config.seed(seed.parse().context("seed must be an integer")?);
    }

    // -------------------------------------------------------------------------
    // 1. Monte Carlo vs closed form
    // -------------------------------------------------------------------------
    println!("=== Success vs partition overhead (n = {}) ===\n", config.num_items);
    let sim = BucketSimulation::new(config)?;
    for estimate in sim.sweep()? {
        let expected = expected_success(estimate.factor, sim.config().num_items)?;
        println!(
            "m/l = {:<4} success = {:.4} ± {:.4}   closed form {:.4}",
            estimate.factor, estimate.mean, estimate.half_width, expected
        );
    }

    // -------------------------------------------------------------------------
    // 2. Overhead curves
    // -------------------------------------------------------------------------
    let levels = default_levels();
    let mut curves = Vec::new();
    for kind in [OverheadKind::Processing, OverheadKind::Communication] {
        for scheme in BatchScheme::ALL {
            curves.push(overhead_curve(scheme, kind, &levels)?);
        }
    }
    println!("\n{}", serde_json::to_string_pretty(&curves)?);

    Ok(())
}
