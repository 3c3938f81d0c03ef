//! Experiment log parsing
//!
//! The external search engine appends one block per run to a free-text
//! `results.txt`:
//!
//! ```text
//! 2021-06-01 10:00:00.5 +0000 UTC
//! {Dataset:../datasets/mnist Samples:10000 Tables:10 Probes:0 ...}
//! Hits: 9700
//! Misses:300
//! 887.7: 51234
//! [1.02 1.13 0 1.4 ...]
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! text ──lines──> LogLine ──> Fragment ──merge──> TrialRecord
//! ```
//!
//! Only `{...}`, `Hits:` and `[...]` lines contribute; everything else is
//! classified as [`LogLine::Unrecognized`] and ignored.

mod line;
mod trial_record;

pub use line::{ConfigMap, DistanceSample, LogLine};
pub use trial_record::{ConfigMismatch, Fragment, ParsedLog, TrialRecord};
