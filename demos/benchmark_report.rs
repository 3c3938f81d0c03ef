//! Benchmark Report Example
//!
//! Aggregates a tree of experiment logs into the summary table and reduces
//! any JSON result files found alongside them.
//!
//! Run with: cargo run --example benchmark_report -- <experiments-root>
//!
//! Set `RUST_LOG=pann_stats=debug` to trace each directory.

use anyhow::Context;
use pann_stats::aggregate::ResultAggregator;
use pann_stats::results::{
    accuracy_by_config, default_query_count, load_results_dir, RuntimeSummary,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let root = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    // -------------------------------------------------------------------------
    // 1. Text logs -> summary table
    // -------------------------------------------------------------------------
    let aggregator = ResultAggregator::default();
    let report = aggregator
        .aggregate_dir(&root)
        .with_context(|| format!("aggregating {root}"))?;
    aggregator.write_table(std::io::stdout().lock(), &report)?;

    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    eprintln!(
        "{} rows, {} directories omitted",
        report.rows.len(),
        report.omitted()
    );

    // -------------------------------------------------------------------------
    // 2. JSON results -> accuracy and runtime
    // -------------------------------------------------------------------------
    let set = load_results_dir(&root).with_context(|| format!("loading results in {root}"))?;
    if set.results.is_empty() {
        return Ok(());
    }

    println!("\nAccuracy by configuration:");
    for point in accuracy_by_config(&set.results, default_query_count) {
        println!(
            "   {} probes={} tables={}: {:.4} ± {:.4} ({} runs)",
            point.dataset, point.probes, point.tables, point.mean, point.std_dev, point.runs
        );
    }

    println!("\nRuntime:");
    for result in &set.results {
        match RuntimeSummary::from_result(result) {
            Ok(summary) => println!(
                "   {} tables={}: client {:.1} ± {:.1} ms, server {:.1} ± {:.1} ms, {:.0} bytes",
                summary.dataset,
                summary.tables,
                summary.client_latency_ms.mean,
                summary.client_latency_ms.half_width,
                summary.server_ms.mean,
                summary.server_ms.half_width,
                summary.bandwidth_total_bytes.mean,
            ),
            Err(e) => tracing::debug!(dataset = %result.dataset, "no runtime series: {e}"),
        }
    }

    Ok(())
}
