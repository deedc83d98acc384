//! Extraction through evaluation with the default harness configuration.

use flicker_error::FlickerError;
use flicker_harness::fixtures::{self, LaunchFixture};
use flicker_harness::reader::InMemoryReader;
use flicker_harness::{HarnessConfig, extract_and_evaluate};
use flicker_types::{CujTrace, CujType};

#[test]
fn test_clean_launch_passes_default_templates() {
    let config = HarnessConfig {
        include_system_ui_assertions: true,
        ..HarnessConfig::default()
    };
    let report = extract_and_evaluate(&config, &LaunchFixture::new().reader())
        .expect("evaluation should succeed");

    assert_eq!(report.summary.scenarios, 1);
    let scenario = &report.scenarios[0];
    assert_eq!(scenario.template, "APP_LAUNCH_FROM_HOME");
    assert_eq!(scenario.results.len(), 12 + 3 + 2);
    assert!(
        report.overall_pass(),
        "failures: {:?}",
        scenario.failures().collect::<Vec<_>>()
    );
}

#[test]
fn test_single_frame_flicker_fails_consecutive_entry_check() {
    let report = extract_and_evaluate(
        &HarnessConfig::default(),
        &LaunchFixture::new().with_single_frame_flicker().reader(),
    )
    .expect("evaluation should succeed");

    let failures: Vec<&str> = report.scenarios[0]
        .failures()
        .map(|r| r.assertion_name.as_str())
        .collect();
    assert_eq!(failures, vec!["VisibleLayersShownMoreThanOneConsecutiveEntry"]);
    assert!(!report.overall_pass());
}

#[test]
fn test_configured_ignore_suppresses_flicker() {
    let config = HarnessConfig {
        consecutive_entry_ignore: vec![LaunchFixture::FLICKER_LAYER_NAME.to_owned()],
        ..HarnessConfig::default()
    };
    let report = extract_and_evaluate(
        &config,
        &LaunchFixture::new().with_single_frame_flicker().reader(),
    )
    .expect("evaluation should succeed");
    assert!(report.overall_pass());
}

#[test]
fn test_transitionless_launch_fails_app_assertions_only() {
    let report = extract_and_evaluate(
        &HarnessConfig::default(),
        &LaunchFixture::new().without_transition().reader(),
    )
    .expect("evaluation should succeed");

    let scenario = &report.scenarios[0];
    assert!(!scenario.passed);
    for failed in scenario.failures() {
        assert!(
            failed.assertion_name.contains("OPENING_APP"),
            "unexpected failure {}",
            failed.assertion_name
        );
    }
    for name in [
        "EntireScreenCoveredAlways",
        "AppLayerIsVisibleAtStart(LAUNCHER)",
    ] {
        assert!(
            scenario
                .results
                .iter()
                .any(|r| r.assertion_name == name && r.passed()),
            "{name} should pass"
        );
    }
}

#[test]
fn test_per_marker_failure_is_recorded_and_others_evaluated() {
    let mut broken = fixtures::marker(CujType::LauncherAppLaunchFromIcon, 50, 60, false);
    broken.end_timestamp.unix_nanos = None;
    let fixture = LaunchFixture::new();
    let reader = fixture
        .reader()
        .with_cuj_trace(CujTrace::new(vec![broken, LaunchFixture::marker()]));

    let report =
        extract_and_evaluate(&HarnessConfig::default(), &reader).expect("evaluation should succeed");
    assert_eq!(report.summary.extraction_errors, 1);
    assert_eq!(report.summary.scenarios, 1);
    assert_eq!(report.scenarios[0].scenario_id.ordinal, 1);
    assert!(report.extraction_errors[0].contains("incomplete timestamps"));
}

#[test]
fn test_missing_layers_trace_aborts_the_run() {
    let reader = InMemoryReader::new().with_cuj_trace(CujTrace::new(vec![LaunchFixture::marker()]));
    let err = extract_and_evaluate(&HarnessConfig::default(), &reader)
        .expect_err("layers trace is required");
    assert!(matches!(err, FlickerError::MissingTrace { .. }));
    assert_eq!(err.exit_code(), 2);
}
