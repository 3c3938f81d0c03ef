//! Aggregated JSON benchmark results
//!
//! The search engine also writes one `results<unix-time>.json` object per
//! run, and the server benchmark writes objects with latency and bandwidth
//! series. Both shapes decode into [`ExperimentResult`]:
//!
//! ```json
//! {"Dataset": "mnist", "Tables": 10, "Probes": 5, "Hits": 9712,
//!  "query_client_ms": [812.0, 799.5], "dpf_server_ms": [301.2, 298.7],
//!  "masking_server_us": [950.0, 940.0],
//!  "query_up_bandwidth_bytes": [2048, 2048],
//!  "query_down_bandwidth_bytes": [65536, 65536]}
//! ```
//!
//! Latency and bandwidth series are reduced with the same
//! [`crate::stats`] functions used for text logs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::{list_subdirectories, Diagnostic};
use crate::stats::{summarize, MeanInterval, RunningStats};
use crate::{Error, Result};

const MICROS_PER_MILLI: f64 = 1000.0;

/// One benchmark result object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Dataset name
    #[serde(rename = "Dataset", alias = "dataset_name")]
    pub dataset: String,
    /// Number of hash tables
    #[serde(rename = "Tables", alias = "num_tables")]
    pub tables: u64,
    /// Number of probes
    #[serde(rename = "Probes", alias = "num_probes")]
    pub probes: u64,
    /// Queries answered within the approximation factor
    #[serde(rename = "Hits", default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<u64>,
    /// Number of test queries
    #[serde(rename = "Samples", default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
    /// Train or test mode
    #[serde(rename = "Mode", default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Wall-clock time of the run
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// End-to-end client latency per query (ms)
    #[serde(default)]
    pub query_client_ms: Vec<f64>,
    /// DPF evaluation time on the server per query (ms)
    #[serde(default)]
    pub dpf_server_ms: Vec<f64>,
    /// Masking time on the server per query (µs)
    #[serde(default)]
    pub masking_server_us: Vec<f64>,
    /// Upload bytes per query
    #[serde(default)]
    pub query_up_bandwidth_bytes: Vec<f64>,
    /// Download bytes per query
    #[serde(default)]
    pub query_down_bandwidth_bytes: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ExperimentResult>),
    One(Box<ExperimentResult>),
}

/// Decode a JSON array of results, or a single result object.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text is neither shape.
pub fn parse_results(json: &str) -> Result<Vec<ExperimentResult>> {
    match serde_json::from_str(json)? {
        OneOrMany::Many(results) => Ok(results),
        OneOrMany::One(result) => Ok(vec![*result]),
    }
}

/// Results collected from a directory tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Decoded results, in directory then file-name order
    pub results: Vec<ExperimentResult>,
    /// Unreadable or undecodable files
    pub diagnostics: Vec<Diagnostic>,
}

/// Read every `results*.json` found in the subdirectories of `root`.
///
/// # Errors
///
/// Returns error only if `root` cannot be listed.
pub fn load_results_dir<P: AsRef<Path>>(root: P) -> Result<ResultSet> {
    let mut set = ResultSet::default();
    for directory in list_subdirectories(root.as_ref())? {
        let files = match result_files(&directory) {
            Ok(files) => files,
            Err(e) => {
                let diagnostic = Diagnostic::Skipped {
                    directory,
                    reason: e.to_string(),
                };
                tracing::warn!("{diagnostic}");
                set.diagnostics.push(diagnostic);
                continue;
            }
        };
        for file in files {
            match fs::read_to_string(&file)
                .map_err(Error::from)
                .and_then(|text| parse_results(&text))
            {
                Ok(results) => set.results.extend(results),
                Err(e) => {
                    let diagnostic = Diagnostic::ParseFailed {
                        directory: directory.clone(),
                        reason: format!("{}: {e}", file.display()),
                    };
                    tracing::warn!("{diagnostic}");
                    set.diagnostics.push(diagnostic);
                }
            }
        }
    }
    Ok(set)
}

fn result_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let is_result = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("results") && name.ends_with(".json"));
        if is_result && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Latency and bandwidth of one result, each as mean ± 95% half-width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSummary {
    /// Dataset name
    pub dataset: String,
    /// Number of hash tables
    pub tables: u64,
    /// Number of probes
    pub probes: u64,
    /// Upload + download bytes
    pub bandwidth_total_bytes: MeanInterval,
    /// Upload bytes
    pub bandwidth_up_bytes: MeanInterval,
    /// Download bytes
    pub bandwidth_down_bytes: MeanInterval,
    /// Client end-to-end latency (ms)
    pub client_latency_ms: MeanInterval,
    /// DPF + masking server time (ms)
    pub server_ms: MeanInterval,
}

impl RuntimeSummary {
    /// Summarize the series of one result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientSamples`] if a series is empty and
    /// [`Error::InvalidInput`] if paired series differ in length.
    pub fn from_result(result: &ExperimentResult) -> Result<Self> {
        let total = pairwise(
            &result.query_up_bandwidth_bytes,
            &result.query_down_bandwidth_bytes,
            "bandwidth",
            |up, down| up + down,
        )?;
        let server = pairwise(
            &result.dpf_server_ms,
            &result.masking_server_us,
            "server time",
            |dpf, masking| dpf + masking / MICROS_PER_MILLI,
        )?;

        Ok(Self {
            dataset: result.dataset.clone(),
            tables: result.tables,
            probes: result.probes,
            bandwidth_total_bytes: summarize(&total)?,
            bandwidth_up_bytes: summarize(&result.query_up_bandwidth_bytes)?,
            bandwidth_down_bytes: summarize(&result.query_down_bandwidth_bytes)?,
            client_latency_ms: summarize(&result.query_client_ms)?,
            server_ms: summarize(&server)?,
        })
    }
}

fn pairwise(a: &[f64], b: &[f64], what: &str, op: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
    if a.len() != b.len() {
        return Err(Error::InvalidInput(format!(
            "{what} series differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b).map(|(x, y)| op(*x, *y)).collect())
}

/// Number of test queries per run used to turn hits into accuracy.
#[must_use]
pub fn default_query_count(dataset: &str) -> f64 {
    if dataset == "gist" {
        1_000.0
    } else {
        10_000.0
    }
}

/// Accuracy of one (dataset, probes, tables) cell across repeated runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyPoint {
    /// Dataset name
    pub dataset: String,
    /// Number of probes
    pub probes: u64,
    /// Number of hash tables
    pub tables: u64,
    /// Mean of `hits / queries`
    pub mean: f64,
    /// Population standard deviation of `hits / queries`
    pub std_dev: f64,
    /// Number of runs pooled
    pub runs: usize,
}

/// Group results by (dataset, probes, tables) and average their accuracy.
///
/// Results without a hit count are ignored. Output is sorted by dataset,
/// then probes, then tables.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy_by_config<F>(results: &[ExperimentResult], queries: F) -> Vec<AccuracyPoint>
where
    F: Fn(&str) -> f64,
{
    let mut groups: FxHashMap<(&str, u64, u64), RunningStats> = FxHashMap::default();
    for result in results {
        let Some(hits) = result.hits else { continue };
        groups
            .entry((result.dataset.as_str(), result.probes, result.tables))
            .or_default()
            .push(hits as f64 / queries(&result.dataset));
    }

    let mut points: Vec<AccuracyPoint> = groups
        .into_iter()
        .map(|((dataset, probes, tables), stats)| AccuracyPoint {
            dataset: dataset.to_string(),
            probes,
            tables,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            runs: stats.count(),
        })
        .collect();
    points.sort_by(|a, b| {
        (a.dataset.as_str(), a.probes, a.tables).cmp(&(b.dataset.as_str(), b.probes, b.tables))
    });
    points
}
