//! Log parsing against realistic search-engine output

use pann_stats::record::{DistanceSample, Fragment, LogLine, TrialRecord};
use pann_stats::Error;

const ENGINE_LOG: &str = "\
2021-06-03 18:22:07.671 +0000 UTC m=+0.004
{Dataset:../../datasets/sift Samples:10000 Tables:30 Probes:5 PartitionFactor:1 Lattice:2 ApproximationFactor:2 SequenceType:normal2 Mode:test MaxCoordinateValue:1000 ProjectionWidthMean:129.3 ProjectionWidthStddev:43.46 MinDistance:7 MaxDistance:720 Profiling:false}
Hits: 9123
Misses:877
Neither: 0
Ideal 9600
51.2: 3011
88.1: 2210
[52.1 0 77.25 103.5 -1 61.75]
2021-06-03 18:31:00.120 +0000 UTC m=+532.1
{Dataset:../../datasets/sift Samples:10000 Tables:30 Probes:5 PartitionFactor:1 Lattice:2 ApproximationFactor:2 SequenceType:normal2 Mode:test MaxCoordinateValue:1000 ProjectionWidthMean:129.3 ProjectionWidthStddev:43.46 MinDistance:7 MaxDistance:720 Profiling:false}
Hits: 9140
[55.0 80.5]
";

#[test]
fn test_engine_log_merges_trials() {
    let parsed = TrialRecord::parse_log(ENGINE_LOG).unwrap();
    assert!(parsed.mismatches.is_empty());

    let record = parsed.record;
    assert_eq!(record.field("Dataset"), Some("../../datasets/sift"));
    assert_eq!(record.field("Profiling"), Some("false"));
    assert_eq!(record.config().len(), 15);
    assert_eq!(record.hits(), &[9123, 9140]);
    assert_eq!(record.distances(), &[52.1, 77.25, 103.5, 61.75, 55.0, 80.5]);
    assert_eq!(record.raw_count(), 8);
    assert_eq!(record.sample().filtered_count(), 2);
}

#[test]
fn test_engine_log_percentile() {
    let record = TrialRecord::parse_log(ENGINE_LOG).unwrap().record;
    // 6 samples <= 0.95 * 8 = 7.6: unreliable
    assert!(record.percentile(0.95).unwrap().abs() < f64::EPSILON);
    // 0.5 * 8 = 4 -> rank 4 of [52.1, 55.0, 61.75, 77.25, 80.5, 103.5]
    assert!((record.percentile(0.5).unwrap() - 77.25).abs() < f64::EPSILON);
}

#[test]
fn test_windows_line_endings() {
    let log = "{Dataset:mnist Tables:1}\r\nHits: 5\r\n[1 2]\r\n";
    let record = TrialRecord::parse_log(log).unwrap().record;
    assert_eq!(record.field("Tables"), Some("1"));
    assert_eq!(record.hits(), &[5]);
    assert_eq!(record.raw_count(), 2);
}

#[test]
fn test_empty_log_is_empty_record() {
    let parsed = TrialRecord::parse_log("").unwrap();
    assert_eq!(parsed.record, TrialRecord::default());
    assert!(parsed.record.percentile(0.95).unwrap().abs() < f64::EPSILON);
}

#[test]
fn test_negative_hits_rejected() {
    let err = TrialRecord::parse_log("{A:1}\nHits: -3\n").unwrap_err();
    assert!(matches!(err, Error::MalformedNumber { line: 2, ref token } if token == "-3"));
}

#[test]
fn test_merge_of_parsed_lines() {
    let fragments: Vec<Fragment> = ["{Dataset:gist}", "Misses:1", "Hits: 7", "[0.5 0.25]", "Hits: 8"]
        .iter()
        .enumerate()
        .filter_map(|(i, text)| Fragment::from_line(LogLine::parse(text, i + 1).unwrap()))
        .collect();
    assert_eq!(fragments.len(), 4);

    let record = TrialRecord::merge(fragments).record;
    assert_eq!(record.hits(), &[7, 8]);
    assert_eq!(record.distances(), &[0.5, 0.25]);
}

#[test]
fn test_merge_reports_fragment_position() {
    let mut other = std::collections::BTreeMap::new();
    other.insert("Dataset".to_string(), "sift".to_string());
    let mut first = other.clone();
    first.insert("Dataset".to_string(), "mnist".to_string());

    let parsed = TrialRecord::merge(vec![
        Fragment::Config(first),
        Fragment::Hits(1),
        Fragment::Config(other),
    ]);
    assert_eq!(parsed.record.field("Dataset"), Some("mnist"));
    assert_eq!(parsed.mismatches.len(), 1);
    assert_eq!(parsed.mismatches[0].position, 3);
}

#[test]
fn test_distance_sample_pooling() {
    let mut pooled = DistanceSample::from_readings(&[1.0, 0.0, 2.0]);
    pooled.extend(&DistanceSample::from_readings(&[-4.0, 3.0]));
    assert_eq!(pooled.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(pooled.raw_count(), 5);

    let constructed = DistanceSample::new(vec![1.0, -1.0], 0);
    assert_eq!(constructed.values(), &[1.0]);
    assert_eq!(constructed.raw_count(), 1);
}
