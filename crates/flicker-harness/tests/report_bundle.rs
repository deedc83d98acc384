//! Report bundle layout and validation.

use std::fs;

use flicker_harness::fixtures::LaunchFixture;
use flicker_harness::report::{
    REPORT_SCHEMA_VERSION, REQUIRED_BUNDLE_FILES, read_results_jsonl, validate_bundle,
    validate_required_files, write_report_bundle,
};
use flicker_harness::runner::EvaluationRunner;
use flicker_harness::templates::TemplateCatalog;
use flicker_harness::EvaluationReport;
use tempfile::tempdir;

fn sample_report() -> EvaluationReport {
    EvaluationRunner::new(TemplateCatalog::standard())
        .run(&[
            LaunchFixture::new().scenario(),
            LaunchFixture::new().with_single_frame_flicker().scenario(),
        ])
        .expect("evaluation should succeed")
}

#[test]
fn test_bundle_contains_required_files() {
    let temp = tempdir().expect("tempdir should be created");
    let root = write_report_bundle(temp.path(), "launch-run", &sample_report())
        .expect("bundle should be written");
    for name in REQUIRED_BUNDLE_FILES {
        assert!(root.join(name).is_file(), "missing {name}");
    }
    validate_required_files(&root).expect("required files should be present");
}

#[test]
fn test_bundle_roundtrip_validates() {
    let temp = tempdir().expect("tempdir should be created");
    let report = sample_report();
    let root = write_report_bundle(temp.path(), "launch-run", &report)
        .expect("bundle should be written");

    let meta = validate_bundle(&root).expect("bundle should validate");
    assert_eq!(meta.schema_version, REPORT_SCHEMA_VERSION);
    assert_eq!(meta.run_id, "launch-run");
    assert_eq!(meta.fingerprint, report.fingerprint().expect("fingerprint"));
    assert!(!meta.overall_pass);
    assert_eq!(meta.summary, report.summary);

    let results = read_results_jsonl(&root).expect("results should parse");
    assert_eq!(results.len(), report.summary.assertions);
    assert_eq!(results.iter().filter(|r| !r.passed()).count(), 1);
}

#[test]
fn test_missing_results_file_is_rejected() {
    let temp = tempdir().expect("tempdir should be created");
    let root = write_report_bundle(temp.path(), "launch-run", &sample_report())
        .expect("bundle should be written");
    fs::remove_file(root.join("results.jsonl")).expect("results file should be removed");
    assert!(validate_bundle(&root).is_err());
}

#[test]
fn test_truncated_results_are_rejected() {
    let temp = tempdir().expect("tempdir should be created");
    let root = write_report_bundle(temp.path(), "launch-run", &sample_report())
        .expect("bundle should be written");
    let path = root.join("results.jsonl");
    let content = fs::read_to_string(&path).expect("results should be readable");
    let truncated: Vec<&str> = content.lines().skip(1).collect();
    fs::write(&path, truncated.join("\n") + "\n").expect("results should be rewritten");

    let err = validate_bundle(&root).expect_err("count mismatch should be detected");
    assert!(err.to_string().contains("summary reports"));
}

#[test]
fn test_schema_version_mismatch_is_rejected() {
    let temp = tempdir().expect("tempdir should be created");
    let root = write_report_bundle(temp.path(), "launch-run", &sample_report())
        .expect("bundle should be written");
    let meta_path = root.join("meta.json");
    let mut meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&meta_path).expect("meta should be readable"))
            .expect("meta should parse");
    meta["schema_version"] = serde_json::json!(REPORT_SCHEMA_VERSION + 1);
    fs::write(&meta_path, meta.to_string()).expect("meta should be rewritten");

    assert!(validate_bundle(&root).is_err());
}
