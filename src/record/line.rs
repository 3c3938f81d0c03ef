//! Line classification for experiment logs
//!
//! Every log line is classified by its prefix into one of four variants.
//! Recognized variants carry typed payloads; a recognized line whose payload
//! does not parse is an error rather than a silent misparse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration block: field name → raw string value.
pub type ConfigMap = BTreeMap<String, String>;

/// Pooled distance readings from one or more `[...]` lines.
///
/// `values` only holds strictly positive readings, while `raw_count` counts
/// every token parsed. The gap between the two is the number of zero,
/// negative or NaN sentinels seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceSample {
    values: Vec<f64>,
    raw_count: usize,
}

impl DistanceSample {
    /// Create a sample from already-filtered values and a raw token count.
    ///
    /// Non-positive entries in `values` are dropped, so the invariant
    /// `values.len() <= raw_count` holds when `raw_count` counts them.
    #[must_use]
    pub fn new(values: Vec<f64>, raw_count: usize) -> Self {
        let values: Vec<f64> = values.into_iter().filter(|v| *v > 0.0).collect();
        let raw_count = raw_count.max(values.len());
        Self { values, raw_count }
    }

    /// Build a sample from every reading, filtering as the parser does.
    #[must_use]
    pub fn from_readings(readings: &[f64]) -> Self {
        Self::new(readings.to_vec(), readings.len())
    }

    /// Strictly positive readings, in input order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of readings before filtering.
    #[must_use]
    pub const fn raw_count(&self) -> usize {
        self.raw_count
    }

    /// Number of readings that were filtered out.
    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.raw_count - self.values.len()
    }

    /// Append another sample, keeping both the pool and the denominator.
    pub fn extend(&mut self, other: &Self) {
        self.values.extend_from_slice(&other.values);
        self.raw_count += other.raw_count;
    }
}

/// One classified log line.
#[derive(Debug, Clone, PartialEq)]
pub enum LogLine {
    /// `{Key:Value Key:Value ...}`
    Config(ConfigMap),
    /// `Hits: <int>`
    Hits(u64),
    /// `[v1 v2 ... vn]`
    Distances(DistanceSample),
    /// Timestamps, `Misses:`, radius tables and anything else
    Unrecognized,
}

impl LogLine {
    /// Classify and parse a single line.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw line (surrounding whitespace is ignored)
    /// * `line` - 1-based line number, used in error messages
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLine`] or [`Error::MalformedNumber`] when a
    /// line has a recognized prefix but its payload cannot be parsed.
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        let text = text.trim();
        if text.starts_with('{') {
            parse_config(text, line).map(Self::Config)
        } else if text.starts_with("Hits") {
            parse_hits(text, line).map(Self::Hits)
        } else if text.starts_with('[') {
            parse_distances(text, line).map(Self::Distances)
        } else {
            Ok(Self::Unrecognized)
        }
    }

    /// Whether the line carried a payload.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

fn clean_value(value: &str) -> &str {
    value.trim().trim_end_matches(',').trim()
}

fn parse_config(text: &str, line: usize) -> Result<ConfigMap> {
    let mut config = ConfigMap::new();
    // Key seen as `Key:` whose value may arrive as the next token
    let mut pending: Option<String> = None;

    for token in text.split_whitespace() {
        let token = token.trim_matches(|c| c == '{' || c == '}');
        if token.is_empty() {
            continue;
        }

        if let Some((key, value)) = token.split_once(':') {
            if let Some(previous) = pending.take() {
                config.insert(previous, String::new());
            }
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::MalformedLine {
                    line,
                    message: format!("configuration token {token:?} has no field name"),
                });
            }
            let value = clean_value(value);
            if value.is_empty() {
                pending = Some(key.to_string());
            } else {
                config.insert(key.to_string(), value.to_string());
            }
        } else if let Some(key) = pending.take() {
            config.insert(key, clean_value(token).to_string());
        } else {
            return Err(Error::MalformedLine {
                line,
                message: format!("configuration token {token:?} is not a key:value pair"),
            });
        }
    }

    if let Some(key) = pending {
        config.insert(key, String::new());
    }

    Ok(config)
}

fn parse_hits(text: &str, line: usize) -> Result<u64> {
    let (_, value) = text.split_once(':').ok_or_else(|| Error::MalformedLine {
        line,
        message: "hits line has no ':' separator".to_string(),
    })?;
    let value = value.trim();
    value.parse().map_err(|_| Error::MalformedNumber {
        line,
        token: value.to_string(),
    })
}

fn parse_distances(text: &str, line: usize) -> Result<DistanceSample> {
    let mut sample = DistanceSample::default();
    for token in text.split_whitespace() {
        let token = token.trim_matches(|c| c == '[' || c == ']');
        if token.is_empty() {
            continue;
        }
        let value: f64 = token.parse().map_err(|_| Error::MalformedNumber {
            line,
            token: token.to_string(),
        })?;
        sample.raw_count += 1;
        if value > 0.0 {
            sample.values.push(value);
        }
    }
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert!(matches!(LogLine::parse("{A:1}", 1).unwrap(), LogLine::Config(_)));
        assert_eq!(LogLine::parse("Hits: 9700", 1).unwrap(), LogLine::Hits(9700));
        assert!(matches!(LogLine::parse("[1 2]", 1).unwrap(), LogLine::Distances(_)));
        assert_eq!(LogLine::parse("Misses:12", 1).unwrap(), LogLine::Unrecognized);
        assert_eq!(
            LogLine::parse("2021-06-01 10:00:00 +0000 UTC", 1).unwrap(),
            LogLine::Unrecognized
        );
        assert_eq!(LogLine::parse("887.7: 5123", 1).unwrap(), LogLine::Unrecognized);
        assert_eq!(LogLine::parse("", 1).unwrap(), LogLine::Unrecognized);
    }

    #[test]
    fn test_config_splits_on_first_colon() {
        let LogLine::Config(config) =
            LogLine::parse("{Dataset:../../datasets/mnist Tables:10 Mode:test}", 1).unwrap()
        else {
            panic!("expected config");
        };
        assert_eq!(config["Dataset"], "../../datasets/mnist");
        assert_eq!(config["Tables"], "10");
        assert_eq!(config["Mode"], "test");

        let LogLine::Config(config) = LogLine::parse("{Url:http://a:b}", 1).unwrap() else {
            panic!("expected config");
        };
        assert_eq!(config["Url"], "http://a:b");
    }

    #[test]
    fn test_config_tolerates_spaced_values() {
        let LogLine::Config(config) =
            LogLine::parse("  {Dataset: mnist,   Tables: 10, Probes:5}  ", 1).unwrap()
        else {
            panic!("expected config");
        };
        assert_eq!(config["Dataset"], "mnist");
        assert_eq!(config["Tables"], "10");
        assert_eq!(config["Probes"], "5");
    }

    #[test]
    fn test_config_empty_value() {
        let LogLine::Config(config) = LogLine::parse("{Mode: Tables:3}", 1).unwrap() else {
            panic!("expected config");
        };
        assert_eq!(config["Mode"], "");
        assert_eq!(config["Tables"], "3");
    }

    #[test]
    fn test_config_rejects_bare_token() {
        let err = LogLine::parse("{Tables:3 oops}", 7).unwrap_err();
        assert!(matches!(err, Error::MalformedLine { line: 7, .. }));
    }

    #[test]
    fn test_hits_malformed() {
        let err = LogLine::parse("Hits: lots", 3).unwrap_err();
        assert!(matches!(err, Error::MalformedNumber { line: 3, ref token } if token == "lots"));
        assert!(matches!(
            LogLine::parse("Hits 12", 4).unwrap_err(),
            Error::MalformedLine { line: 4, .. }
        ));
    }

    #[test]
    fn test_distances_filter_and_count() {
        let LogLine::Distances(sample) = LogLine::parse("[1.2 3.4 0.0 5.6 -1]", 1).unwrap()
        else {
            panic!("expected distances");
        };
        assert_eq!(sample.values(), &[1.2, 3.4, 5.6]);
        assert_eq!(sample.raw_count(), 5);
        assert_eq!(sample.filtered_count(), 2);
    }

    #[test]
    fn test_distances_padded_brackets_and_empty() {
        let LogLine::Distances(sample) = LogLine::parse("[ 2 ]", 1).unwrap() else {
            panic!("expected distances");
        };
        assert_eq!(sample.values(), &[2.0]);
        assert_eq!(sample.raw_count(), 1);

        let LogLine::Distances(empty) = LogLine::parse("[]", 1).unwrap() else {
            panic!("expected distances");
        };
        assert_eq!(empty.raw_count(), 0);
    }

    #[test]
    fn test_distances_nan_counts_but_is_filtered() {
        let LogLine::Distances(sample) = LogLine::parse("[NaN 1e-3]", 1).unwrap() else {
            panic!("expected distances");
        };
        assert_eq!(sample.values(), &[1e-3]);
        assert_eq!(sample.raw_count(), 2);
    }

    #[test]
    fn test_distances_malformed_token() {
        let err = LogLine::parse("[1.0 abc 2.0]", 9).unwrap_err();
        assert!(matches!(err, Error::MalformedNumber { line: 9, ref token } if token == "abc"));
    }
}
