//! # pann-stats: Benchmark Statistics for Private ANN Search
//!
//! pann-stats turns the raw output of a private approximate-nearest-neighbor
//! search engine into the numbers reported about it: per-configuration
//! accuracy and distance percentiles, latency and bandwidth with confidence
//! bounds, analytic information-leakage ratios, and the simulated success of
//! private batch retrieval.
//!
//! ## Modules
//!
//! ```text
//! record ──> stats ──> aggregate        text logs  → summary table
//!            stats ──> results          JSON runs  → latency / bandwidth / accuracy
//! leakage                               Gaussian radius bound → leakage ratio
//! pbr                                   Monte Carlo + closed-form batch overheads
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use pann_stats::record::TrialRecord;
//! use pann_stats::leakage::{leakage_ratio, probing_radius};
//! use pann_stats::pbr::{BucketSimulation, SimulationConfig};
//!
//! // Parse one experiment log
//! let log = "{Dataset:mnist Tables:10}\nHits: 9700\n[1.2 3.4 0.0 5.6]\n";
//! let record = TrialRecord::parse_log(log)?.record;
//! assert_eq!(record.raw_count(), 4);
//!
//! // Leakage of 30 tables on a toy dataset
//! let rmax = probing_radius(150.0, 58.6, 30)?;
//! let ratio = leakage_ratio(128.0, rmax, 721.3, 7.5, 1e6, 29.0);
//! assert!(ratio > 0.0);
//!
//! // Seeded batch-retrieval simulation
//! let sim = BucketSimulation::new(SimulationConfig::default().factors(vec![1.0, 2.0]))?;
//! let estimates = sim.sweep()?;
//! assert_eq!(estimates.len(), 2);
//! # Ok::<(), pann_stats::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod error;
pub mod leakage;
pub mod pbr;
pub mod record;
pub mod results;
pub mod stats;

pub use error::{Error, Result};
