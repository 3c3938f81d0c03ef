//! JSON benchmark results: loading and reduction

use std::fs;

use pann_stats::aggregate::Diagnostic;
use pann_stats::results::{
    accuracy_by_config, default_query_count, load_results_dir, parse_results, RuntimeSummary,
};
use tempfile::TempDir;

const SERVER_RUN: &str = r#"{
    "dataset_name": "sift",
    "num_tables": 10,
    "num_probes": 5,
    "query_client_ms": [800.0, 820.0, 780.0],
    "dpf_server_ms": [10.0, 20.0, 30.0],
    "masking_server_us": [500.0, 1500.0, 1000.0],
    "query_up_bandwidth_bytes": [100, 200, 300],
    "query_down_bandwidth_bytes": [1000, 1000, 1000]
}"#;

#[test]
fn test_runtime_summary() {
    let result = parse_results(SERVER_RUN).unwrap().remove(0);
    let summary = RuntimeSummary::from_result(&result).unwrap();

    assert_eq!(summary.dataset, "sift");
    assert_eq!((summary.tables, summary.probes), (10, 5));
    assert!((summary.bandwidth_total_bytes.mean - 1200.0).abs() < 1e-9);
    assert!((summary.bandwidth_up_bytes.mean - 200.0).abs() < 1e-9);
    assert!((summary.bandwidth_down_bytes.std_dev).abs() < 1e-12);
    assert!((summary.client_latency_ms.mean - 800.0).abs() < 1e-9);
    // dpf + masking/1000 = [10.5, 21.5, 31.0]
    assert!((summary.server_ms.mean - 21.0).abs() < 1e-9);

    let sd = (200.0f64 / 3.0 * 100.0).sqrt();
    assert!((summary.bandwidth_up_bytes.std_dev - sd).abs() < 1e-9);
    let half_width = 1.96 * sd / 3.0f64.sqrt();
    assert!((summary.bandwidth_up_bytes.half_width - half_width).abs() < 1e-9);
    assert!(summary.bandwidth_up_bytes.lower() < 200.0);
    assert!(summary.bandwidth_up_bytes.upper() > 200.0);
}

#[test]
fn test_runtime_summary_requires_series() {
    let result = parse_results(r#"{"Dataset":"mnist","Tables":1,"Probes":0}"#)
        .unwrap()
        .remove(0);
    assert!(matches!(
        RuntimeSummary::from_result(&result),
        Err(pann_stats::Error::InsufficientSamples { .. })
    ));
}

#[test]
fn test_accuracy_by_config() {
    let json = r#"[
        {"Dataset":"mnist","Tables":10,"Probes":0,"Hits":9000},
        {"Dataset":"mnist","Tables":10,"Probes":0,"Hits":9200},
        {"Dataset":"gist","Tables":10,"Probes":0,"Hits":700},
        {"Dataset":"mnist","Tables":5,"Probes":0,"Hits":8000},
        {"Dataset":"mnist","Tables":5,"Probes":0}
    ]"#;
    let results = parse_results(json).unwrap();
    let points = accuracy_by_config(&results, default_query_count);

    assert_eq!(points.len(), 3);
    assert_eq!(points[0].dataset, "gist");
    assert!((points[0].mean - 0.7).abs() < 1e-12);
    assert_eq!((points[1].tables, points[1].runs), (5, 1));
    assert!((points[1].mean - 0.8).abs() < 1e-12);
    assert_eq!((points[2].tables, points[2].runs), (10, 2));
    assert!((points[2].mean - 0.91).abs() < 1e-12);
    assert!((points[2].std_dev - 0.01).abs() < 1e-12);
}

#[test]
fn test_load_results_dir() {
    let root = TempDir::new().unwrap();
    let mnist = root.path().join("mnist");
    let sift = root.path().join("sift");
    fs::create_dir_all(&mnist).unwrap();
    fs::create_dir_all(&sift).unwrap();

    fs::write(
        mnist.join("results1622700000.json"),
        r#"{"Dataset":"mnist","Tables":10,"Probes":0,"Hits":9700}"#,
    )
    .unwrap();
    fs::write(
        mnist.join("results1622800000.json"),
        r#"[{"Dataset":"mnist","Tables":10,"Probes":0,"Hits":9650}]"#,
    )
    .unwrap();
    fs::write(mnist.join("results.txt"), "{Dataset:mnist}").unwrap();
    fs::write(mnist.join("notes.json"), "ignored").unwrap();
    fs::write(sift.join("results1.json"), "{ not json").unwrap();

    let set = load_results_dir(root.path()).unwrap();

    let hits: Vec<Option<u64>> = set.results.iter().map(|r| r.hits).collect();
    assert_eq!(hits, vec![Some(9700), Some(9650)]);
    assert_eq!(set.diagnostics.len(), 1);
    match &set.diagnostics[0] {
        Diagnostic::ParseFailed { directory, reason } => {
            assert!(directory.ends_with("sift"));
            assert!(reason.contains("results1.json"));
            assert!(reason.contains("JSON error"));
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }
}
