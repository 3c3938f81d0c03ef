//! Error types for pann-stats
//!
//! Parse failures carry the 1-based line number of the offending log line so
//! batch diagnostics can point at the exact input.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// pann-stats error types
#[derive(Error, Debug)]
pub enum Error {
    /// A log line had a recognized prefix but an unparseable layout
    #[error("Malformed line {line}: {message}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A numeric token inside a hits or distance line failed to parse
    #[error("Malformed number on line {line}: {token:?}")]
    MalformedNumber {
        /// 1-based line number
        line: usize,
        /// The offending token
        token: String,
    },

    /// A configuration field required for the summary table is absent
    #[error("Missing configuration field: {0}")]
    MissingField(String),

    /// Parameter outside the domain of the requested computation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not enough samples to fit a distribution
    #[error("Insufficient samples: need at least {needed}, got {got}")]
    InsufficientSamples {
        /// Minimum number of samples
        needed: usize,
        /// Number of samples provided
        got: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON results could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
