//! Per-configuration benchmark aggregation
//!
//! ## Layout
//!
//! ```text
//! root/
//! ├── mnist-t10-p0/results.txt   ──> SummaryRow
//! ├── sift-t10-p0/results.txt    ──> SummaryRow
//! └── broken/                    ──> Diagnostic::Skipped
//! ```
//!
//! Each subdirectory is processed in isolation: its log is read in full,
//! parsed, reduced to one [`SummaryRow`] and dropped before the next one is
//! touched. A failure in one subdirectory becomes a [`Diagnostic`] and never
//! aborts the batch.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pann_stats::aggregate::{AggregatorConfig, ResultAggregator};
//!
//! let aggregator = ResultAggregator::new(AggregatorConfig::default().delimiter("\t"));
//! let report = aggregator.aggregate_dir("experiments/")?;
//! aggregator.write_table(std::io::stdout().lock(), &report)?;
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok::<(), pann_stats::Error>(())
//! ```

mod summary;

pub use summary::{
    ConfigurationKey, SummaryRow, SummaryTable, CONFIG_COLUMNS, DEFAULT_DELIMITER,
    PERCENTILE_COLUMN, TRIAL_COLUMNS,
};

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::record::TrialRecord;
use crate::stats::DEFAULT_PERCENTILE;
use crate::{Error, Result};

/// Log file name written by the search engine in every configuration directory.
pub const DEFAULT_LOG_FILE: &str = "results.txt";

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// File name of the log inside each subdirectory
    pub log_file_name: String,
    /// Field delimiter of the summary table
    pub delimiter: String,
    /// Quantile reported in the percentile column
    pub percentile: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            log_file_name: DEFAULT_LOG_FILE.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            percentile: DEFAULT_PERCENTILE,
        }
    }
}

impl AggregatorConfig {
    /// Set the log file name.
    #[must_use]
    pub fn log_file_name(mut self, name: impl Into<String>) -> Self {
        self.log_file_name = name.into();
        self
    }

    /// Set the table delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the reported quantile.
    #[must_use]
    pub const fn percentile(mut self, q: f64) -> Self {
        self.percentile = q;
        self
    }
}

/// Non-fatal finding recorded while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Log absent or unreadable; no row emitted
    Skipped {
        /// Subdirectory that was skipped
        directory: PathBuf,
        /// Why it was skipped
        reason: String,
    },
    /// Log present but unusable; no row emitted
    ParseFailed {
        /// Subdirectory whose log failed
        directory: PathBuf,
        /// Parse error
        reason: String,
    },
    /// A later configuration block disagreed with the first; row still emitted
    InconsistentConfig {
        /// Subdirectory of the log
        directory: PathBuf,
        /// Line of the conflicting block
        line: usize,
        /// Conflicting fields
        fields: Vec<String>,
    },
}

impl Diagnostic {
    /// Directory the finding refers to.
    #[must_use]
    pub fn directory(&self) -> &Path {
        match self {
            Self::Skipped { directory, .. }
            | Self::ParseFailed { directory, .. }
            | Self::InconsistentConfig { directory, .. } => directory,
        }
    }

    /// Whether the directory produced no row.
    #[must_use]
    pub const fn is_row_omitted(&self) -> bool {
        !matches!(self, Self::InconsistentConfig { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { directory, reason } => {
                write!(f, "Ignoring {}: {reason}", directory.display())
            }
            Self::ParseFailed { directory, reason } => {
                write!(f, "Failed to parse {}: {reason}", directory.display())
            }
            Self::InconsistentConfig {
                directory,
                line,
                fields,
            } => write!(
                f,
                "Inconsistent configuration within one log in {} (line {line}, fields {})",
                directory.display(),
                fields.join(", ")
            ),
        }
    }
}

/// Rows and diagnostics of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    /// One row per processed subdirectory, in directory order
    pub rows: Vec<SummaryRow>,
    /// Findings, in directory order
    pub diagnostics: Vec<Diagnostic>,
}

impl AggregationReport {
    /// Number of subdirectories that produced no row.
    #[must_use]
    pub fn omitted(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_row_omitted()).count()
    }

    /// Render the table with the given delimiter.
    #[must_use]
    pub fn to_table_string(&self, delimiter: &str) -> String {
        SummaryTable::new(delimiter).render(&self.rows)
    }
}

/// Outcome of one isolated subdirectory.
#[derive(Debug, Default)]
struct DirectoryOutcome {
    row: Option<SummaryRow>,
    diagnostics: Vec<Diagnostic>,
}

/// Drives parsing and order statistics over a tree of experiment logs.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    config: AggregatorConfig,
}

impl ResultAggregator {
    /// Create an aggregator.
    #[must_use]
    pub const fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate every subdirectory of `root`.
    ///
    /// Subdirectories are visited in file-name order. Plain files directly
    /// under `root` are ignored.
    ///
    /// # Errors
    ///
    /// Returns error only if `root` itself cannot be listed or the configured
    /// percentile is invalid. Per-directory failures land in
    /// [`AggregationReport::diagnostics`].
    pub fn aggregate_dir<P: AsRef<Path>>(&self, root: P) -> Result<AggregationReport> {
        let q = self.config.percentile;
        if !(q > 0.0 && q < 1.0) {
            return Err(Error::InvalidInput(format!(
                "percentile q must lie in (0, 1), got {q}"
            )));
        }

        let directories = list_subdirectories(root.as_ref())?;
        tracing::debug!(
            root = %root.as_ref().display(),
            count = directories.len(),
            "aggregating experiment directories"
        );

        #[cfg(feature = "parallel")]
        let outcomes: Vec<DirectoryOutcome> = directories
            .par_iter()
            .map(|dir| self.process_directory(dir))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<DirectoryOutcome> = directories
            .iter()
            .map(|dir| self.process_directory(dir))
            .collect();

        let mut report = AggregationReport::default();
        for outcome in outcomes {
            report.rows.extend(outcome.row);
            report.diagnostics.extend(outcome.diagnostics);
        }
        Ok(report)
    }

    /// Reduce the text of one log to a row.
    ///
    /// `directory` is only used to label diagnostics.
    ///
    /// # Errors
    ///
    /// Returns the parse or missing-field error that prevents a row.
    pub fn summarize_log(
        &self,
        directory: &Path,
        text: &str,
    ) -> Result<(SummaryRow, Vec<Diagnostic>)> {
        let parsed = TrialRecord::parse_log(text)?;
        let row = SummaryRow::from_record(&parsed.record, self.config.percentile)?;
        let diagnostics = parsed
            .mismatches
            .into_iter()
            .map(|mismatch| Diagnostic::InconsistentConfig {
                directory: directory.to_path_buf(),
                line: mismatch.position,
                fields: mismatch.fields,
            })
            .collect();
        Ok((row, diagnostics))
    }

    /// Write the summary table for a report.
    ///
    /// # Errors
    ///
    /// Returns error if the writer fails.
    pub fn write_table<W: Write>(&self, writer: W, report: &AggregationReport) -> Result<()> {
        SummaryTable::new(self.config.delimiter.as_str()).write(writer, &report.rows)
    }

    fn process_directory(&self, directory: &Path) -> DirectoryOutcome {
        let log_path = directory.join(&self.config.log_file_name);
        let text = match fs::read_to_string(&log_path) {
            Ok(text) => text,
            Err(e) => {
                let diagnostic = Diagnostic::Skipped {
                    directory: directory.to_path_buf(),
                    reason: format!("cannot read {}: {e}", log_path.display()),
                };
                tracing::warn!("{diagnostic}");
                return DirectoryOutcome {
                    row: None,
                    diagnostics: vec![diagnostic],
                };
            }
        };

        match self.summarize_log(directory, &text) {
            Ok((row, diagnostics)) => {
                tracing::debug!(directory = %directory.display(), "summarized log");
                for diagnostic in &diagnostics {
                    tracing::warn!("{diagnostic}");
                }
                DirectoryOutcome {
                    row: Some(row),
                    diagnostics,
                }
            }
            Err(e) => {
                let diagnostic = Diagnostic::ParseFailed {
                    directory: directory.to_path_buf(),
                    reason: e.to_string(),
                };
                tracing::warn!("{diagnostic}");
                DirectoryOutcome {
                    row: None,
                    diagnostics: vec![diagnostic],
                }
            }
        }
    }
}

/// Subdirectories of `root`, sorted by file name.
pub(crate) fn list_subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut directories = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            directories.push(path);
        }
    }
    directories.sort();
    Ok(directories)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "{Dataset:sift Tables:5 Probes:1 Lattice:2 ApproximationFactor:2 \
        SequenceType:normal2 Mode:test ProjectionWidthMean:129.3 ProjectionWidthStddev:43.46}\n\
        Hits: 8000\n[10 20 30]\n";

    #[test]
    fn test_config_builder() {
        let config = AggregatorConfig::default()
            .log_file_name("out.txt")
            .delimiter("\t")
            .percentile(0.9);
        assert_eq!(config.log_file_name, "out.txt");
        assert_eq!(config.delimiter, "\t");
        assert!((config.percentile - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: AggregatorConfig = serde_json::from_str(r#"{"delimiter":"\t"}"#).unwrap();
        assert_eq!(config.delimiter, "\t");
        assert_eq!(config.log_file_name, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_summarize_log() {
        let aggregator = ResultAggregator::default();
        let (row, diagnostics) = aggregator.summarize_log(Path::new("sift"), LOG).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(row.key().dataset, "sift");
        // 3 samples > 0.95 * 3 = 2.85 -> rank 2
        assert!((row.percentile() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summarize_log_reports_inconsistency() {
        let aggregator = ResultAggregator::default();
        let text = format!("{LOG}{{Dataset:gist}}\n");
        let (row, diagnostics) = aggregator.summarize_log(Path::new("d"), &text).unwrap();
        assert_eq!(row.key().dataset, "sift");
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_row_omitted());
        assert!(diagnostics[0].to_string().contains("Inconsistent configuration"));
    }

    #[test]
    fn test_invalid_percentile_rejected() {
        let aggregator = ResultAggregator::new(AggregatorConfig::default().percentile(1.5));
        assert!(matches!(
            aggregator.aggregate_dir("."),
            Err(Error::InvalidInput(_))
        ));
    }
}
