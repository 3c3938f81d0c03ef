//! Summary rows and the delimited summary table

use std::fmt::Write as _;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::record::TrialRecord;
use crate::{Error, Result};

/// Configuration fields copied into every row, in column order.
pub const CONFIG_COLUMNS: [&str; 9] = [
    "Dataset",
    "Tables",
    "Probes",
    "Lattice",
    "ApproximationFactor",
    "SequenceType",
    "Mode",
    "ProjectionWidthMean",
    "ProjectionWidthStddev",
];

/// Column holding the percentile.
pub const PERCENTILE_COLUMN: &str = "95thCentile";

/// Trial hit-count columns; extra trials beyond these are ignored.
pub const TRIAL_COLUMNS: [&str; 3] = ["trial1", "trial2", "trial3"];

/// Default delimiter, matching the historical `res.csv` layout.
pub const DEFAULT_DELIMITER: &str = ", ";

/// Fields that identify one benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigurationKey {
    /// Dataset name or path
    pub dataset: String,
    /// Number of hash tables
    pub tables: String,
    /// Number of probes
    pub probes: String,
    /// Lattice type
    pub lattice: String,
    /// Approximation factor c
    pub approximation_factor: String,
    /// Radius sequence type
    pub sequence_type: String,
    /// Train or test mode
    pub mode: String,
}

impl ConfigurationKey {
    /// Extract the key from a parsed record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] naming the first absent field.
    pub fn from_record(record: &TrialRecord) -> Result<Self> {
        Ok(Self {
            dataset: required(record, "Dataset")?,
            tables: required(record, "Tables")?,
            probes: required(record, "Probes")?,
            lattice: required(record, "Lattice")?,
            approximation_factor: required(record, "ApproximationFactor")?,
            sequence_type: required(record, "SequenceType")?,
            mode: required(record, "Mode")?,
        })
    }

    fn columns(&self) -> [&str; 7] {
        [
            self.dataset.as_str(),
            self.tables.as_str(),
            self.probes.as_str(),
            self.lattice.as_str(),
            self.approximation_factor.as_str(),
            self.sequence_type.as_str(),
            self.mode.as_str(),
        ]
    }
}

fn required(record: &TrialRecord, field: &str) -> Result<String> {
    record
        .field(field)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingField(field.to_string()))
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    key: ConfigurationKey,
    projection_width_mean: String,
    projection_width_stddev: String,
    percentile: f64,
    trials: [Option<u64>; 3],
}

impl SummaryRow {
    /// Build a row from a merged record.
    ///
    /// # Errors
    ///
    /// Returns error if a required configuration field is missing or `q` is
    /// outside (0, 1).
    pub fn from_record(record: &TrialRecord, q: f64) -> Result<Self> {
        let key = ConfigurationKey::from_record(record)?;
        let mut trials = [None; 3];
        for (slot, hits) in trials.iter_mut().zip(record.hits()) {
            *slot = Some(*hits);
        }
        Ok(Self {
            key,
            projection_width_mean: required(record, "ProjectionWidthMean")?,
            projection_width_stddev: required(record, "ProjectionWidthStddev")?,
            percentile: record.percentile(q)?,
            trials,
        })
    }

    /// Configuration key.
    #[must_use]
    pub const fn key(&self) -> &ConfigurationKey {
        &self.key
    }

    /// Projection-width mean as logged.
    #[must_use]
    pub fn projection_width_mean(&self) -> &str {
        &self.projection_width_mean
    }

    /// Projection-width standard deviation as logged.
    #[must_use]
    pub fn projection_width_stddev(&self) -> &str {
        &self.projection_width_stddev
    }

    /// Percentile of pooled distances (`0.0` when unreliable).
    #[must_use]
    pub const fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Hit counts of the first three trials.
    #[must_use]
    pub const fn trials(&self) -> &[Option<u64>; 3] {
        &self.trials
    }

    /// Render the row's fields in column order.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.key.columns().iter().map(|s| (*s).to_string()).collect();
        fields.push(self.projection_width_mean.clone());
        fields.push(self.projection_width_stddev.clone());
        fields.push(self.percentile.to_string());
        fields.extend(
            self.trials
                .iter()
                .map(|trial| trial.map_or_else(String::new, |hits| hits.to_string())),
        );
        fields
    }
}

/// Writer for the fixed-width summary table.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    delimiter: String,
}

impl Default for SummaryTable {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl SummaryTable {
    /// Create a table writer with the given field delimiter.
    #[must_use]
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    /// Header line, without trailing newline.
    #[must_use]
    pub fn header(&self) -> String {
        CONFIG_COLUMNS
            .iter()
            .chain(std::iter::once(&PERCENTILE_COLUMN))
            .chain(TRIAL_COLUMNS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(self.delimiter.as_str())
    }

    /// One row, without trailing newline.
    #[must_use]
    pub fn render_row(&self, row: &SummaryRow) -> String {
        row.fields().join(self.delimiter.as_str())
    }

    /// Render header and rows into a string.
    #[must_use]
    pub fn render(&self, rows: &[SummaryRow]) -> String {
        let mut out = self.header();
        out.push('\n');
        for row in rows {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{}", self.render_row(row));
        }
        out
    }

    /// Write header and rows.
    ///
    /// # Errors
    ///
    /// Returns error if the writer fails.
    pub fn write<W: Write>(&self, mut writer: W, rows: &[SummaryRow]) -> Result<()> {
        writeln!(writer, "{}", self.header())?;
        for row in rows {
            writeln!(writer, "{}", self.render_row(row))?;
        }
        writer.flush()?;
        Ok(())
    }
}
