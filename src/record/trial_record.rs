//! Trial Record - merged view of one experiment log

use serde::{Deserialize, Serialize};

use super::line::{ConfigMap, DistanceSample, LogLine};
use crate::Result;

/// A piece of a trial record contributed by one recognized log line.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Configuration block
    Config(ConfigMap),
    /// Hit count of one trial run
    Hits(u64),
    /// Distance readings
    Distances(DistanceSample),
}

impl Fragment {
    /// Convert a classified line, dropping unrecognized ones.
    #[must_use]
    pub fn from_line(line: LogLine) -> Option<Self> {
        match line {
            LogLine::Config(config) => Some(Self::Config(config)),
            LogLine::Hits(hits) => Some(Self::Hits(hits)),
            LogLine::Distances(sample) => Some(Self::Distances(sample)),
            LogLine::Unrecognized => None,
        }
    }
}

/// A configuration block that disagreed with the first one seen.
///
/// The first configuration always wins; this only records the conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMismatch {
    /// Line number when parsed from text, 1-based fragment index when merged
    pub position: usize,
    /// Fields whose values differ or that appear on only one side
    pub fields: Vec<String>,
}

/// Parse output: the merged record plus non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    /// Merged record
    pub record: TrialRecord,
    /// Configuration blocks that conflicted with the first one
    pub mismatches: Vec<ConfigMismatch>,
}

/// All trials recorded in one log, merged into a single logical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    config: ConfigMap,
    hits: Vec<u64>,
    distances: DistanceSample,
}

impl TrialRecord {
    /// Parse the full text of an experiment log.
    ///
    /// # Errors
    ///
    /// Returns the first line-level parse error. No partial record is
    /// returned in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pann_stats::record::TrialRecord;
    ///
    /// let log = "{Dataset:mnist Tables:10}\nHits: 9700\n[1.5 0 2.5]\n";
    /// let parsed = TrialRecord::parse_log(log)?;
    /// assert_eq!(parsed.record.hits(), &[9700]);
    /// assert_eq!(parsed.record.raw_count(), 3);
    /// # Ok::<(), pann_stats::Error>(())
    /// ```
    pub fn parse_log(text: &str) -> Result<ParsedLog> {
        let mut builder = RecordBuilder::default();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            if let Some(fragment) = Fragment::from_line(LogLine::parse(raw, line)?) {
                builder.push(fragment, line);
            }
        }
        Ok(builder.finish())
    }

    /// Fold fragments into one record, first configuration winning.
    #[must_use]
    pub fn merge<I>(fragments: I) -> ParsedLog
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut builder = RecordBuilder::default();
        for (index, fragment) in fragments.into_iter().enumerate() {
            builder.push(fragment, index + 1);
        }
        builder.finish()
    }

    /// Split the record back into fragments.
    ///
    /// Merging the result yields a record equal to `self`.
    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment> {
        let mut fragments = Vec::with_capacity(self.hits.len() + 2);
        if !self.config.is_empty() {
            fragments.push(Fragment::Config(self.config.clone()));
        }
        fragments.extend(self.hits.iter().copied().map(Fragment::Hits));
        if self.distances.raw_count() > 0 {
            fragments.push(Fragment::Distances(self.distances.clone()));
        }
        fragments
    }

    /// Configuration of the log.
    #[must_use]
    pub const fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Look up one configuration field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.config.get(name).map(String::as_str)
    }

    /// Hit counts in log order.
    #[must_use]
    pub fn hits(&self) -> &[u64] {
        &self.hits
    }

    /// Pooled strictly positive distances.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        self.distances.values()
    }

    /// Distance readings seen before filtering.
    #[must_use]
    pub const fn raw_count(&self) -> usize {
        self.distances.raw_count()
    }

    /// The pooled distance sample.
    #[must_use]
    pub const fn sample(&self) -> &DistanceSample {
        &self.distances
    }

    /// Nearest-rank percentile of the pooled distances against `raw_count`.
    ///
    /// # Errors
    ///
    /// Returns error if `q` is outside (0, 1).
    pub fn percentile(&self, q: f64) -> Result<f64> {
        crate::stats::percentile(self.distances.values(), self.distances.raw_count(), q)
    }
}

#[derive(Default)]
struct RecordBuilder {
    record: TrialRecord,
    mismatches: Vec<ConfigMismatch>,
}

impl RecordBuilder {
    fn push(&mut self, fragment: Fragment, position: usize) {
        match fragment {
            Fragment::Config(config) => {
                if self.record.config.is_empty() {
                    self.record.config = config;
                } else if config != self.record.config {
                    let fields = differing_fields(&self.record.config, &config);
                    tracing::warn!(
                        position,
                        ?fields,
                        "inconsistent configuration within one log"
                    );
                    self.mismatches.push(ConfigMismatch { position, fields });
                }
            }
            Fragment::Hits(hits) => self.record.hits.push(hits),
            Fragment::Distances(sample) => self.record.distances.extend(&sample),
        }
    }

    fn finish(self) -> ParsedLog {
        ParsedLog {
            record: self.record,
            mismatches: self.mismatches,
        }
    }
}

fn differing_fields(first: &ConfigMap, other: &ConfigMap) -> Vec<String> {
    let mut fields: Vec<String> = first
        .iter()
        .filter(|(key, value)| other.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    fields.extend(
        other
            .keys()
            .filter(|key| !first.contains_key(*key))
            .cloned(),
    );
    fields.sort();
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
2021-06-01 10:00:00 +0000 UTC
{Dataset:mnist Tables:10 Probes:0}
Hits: 9700
Misses:300
[1.2 3.4 0.0 5.6]
{Dataset:mnist Tables:10 Probes:0}
Hits: 9650
";

    #[test]
    fn test_parse_log_merges_blocks() {
        let parsed = TrialRecord::parse_log(LOG).unwrap();
        let record = parsed.record;
        assert!(parsed.mismatches.is_empty());
        assert_eq!(record.field("Dataset"), Some("mnist"));
        assert_eq!(record.hits(), &[9700, 9650]);
        assert_eq!(record.distances(), &[1.2, 3.4, 5.6]);
        assert_eq!(record.raw_count(), 4);
    }

    #[test]
    fn test_first_config_wins() {
        let log = "{Dataset:mnist Tables:10}\n{Dataset:sift Tables:10 Extra:1}\n";
        let parsed = TrialRecord::parse_log(log).unwrap();
        assert_eq!(parsed.record.field("Dataset"), Some("mnist"));
        assert_eq!(parsed.mismatches.len(), 1);
        assert_eq!(parsed.mismatches[0].position, 2);
        assert_eq!(parsed.mismatches[0].fields, vec!["Dataset", "Extra"]);
    }

    #[test]
    fn test_empty_config_is_replaced() {
        let parsed = TrialRecord::parse_log("{}\n{Dataset:gist}\n").unwrap();
        assert_eq!(parsed.record.field("Dataset"), Some("gist"));
        assert!(parsed.mismatches.is_empty());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = TrialRecord::parse_log("{A:1}\nHits: 3\n[1.0 x]\n").unwrap_err();
        assert!(matches!(err, crate::Error::MalformedNumber { line: 3, .. }));
    }

    #[test]
    fn test_fragments_remerge() {
        let record = TrialRecord::parse_log(LOG).unwrap().record;
        let remerged = TrialRecord::merge(record.fragments()).record;
        assert_eq!(remerged, record);
    }

    #[test]
    fn test_percentile_uses_raw_count() {
        let record = TrialRecord::parse_log("[1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21]")
            .unwrap()
            .record;
        // 0.95 * 21 = 19.95 -> rank 19
        assert!((record.percentile(0.95).unwrap() - 19.0).abs() < f64::EPSILON);
    }
}
