//! Leakage Report Example
//!
//! Prints the raw and empirical leakage ratios of the benchmark datasets
//! for a range of table counts.
//!
//! Run with: cargo run --example leakage_report

use pann_stats::leakage::reference_datasets;
use tracing_subscriber::EnvFilter;

const TABLE_COUNTS: [usize; 5] = [1, 10, 30, 50, 100];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Leakage Ratio ===\n");
    println!("{:<8} {:>6} {:>12} {:>10} {:>10}", "dataset", "tables", "Rmax", "raw", "empirical");

    for num_tables in TABLE_COUNTS {
        for params in reference_datasets(num_tables) {
            let report = params.report()?;
            println!(
                "{:<8} {:>6} {:>12.4} {:>10.4} {:>10.4}",
                report.dataset, report.num_tables, report.rmax, report.raw_ratio, report.empirical_ratio
            );
        }
    }

    Ok(())
}
