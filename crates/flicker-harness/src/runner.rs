//! Evaluation runner: applies the template of each scenario's type and
//! aggregates the verdicts.

use std::fmt::Write as _;

use flicker_error::{FlickerError, Result};
use flicker_types::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::reader::TraceReader;
use crate::result::AssertionResult;
use crate::scenario::{ScenarioId, ScenarioInstance, ScenarioType};
use crate::subject::TraceSubjects;
use crate::templates::TemplateCatalog;

pub const EVALUATION_REPORT_SCHEMA_VERSION: u32 = 1;

/// Verdict for one scenario instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario_id: ScenarioId,
    pub scenario_type: ScenarioType,
    pub template: String,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub passed: bool,
    pub results: Vec<AssertionResult>,
}

impl ScenarioReport {
    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}

/// Summary counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub scenarios: usize,
    pub scenarios_passed: usize,
    pub scenarios_failed: usize,
    pub assertions: usize,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    pub extraction_errors: usize,
}

/// Machine-readable report for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub schema_version: u32,
    pub scenarios: Vec<ScenarioReport>,
    /// Markers that could not be reconciled into a scenario.
    pub extraction_errors: Vec<String>,
    pub summary: EvaluationSummary,
}

impl EvaluationReport {
    pub fn new(scenarios: Vec<ScenarioReport>, extraction_errors: Vec<String>) -> Self {
        let assertions_passed = scenarios
            .iter()
            .map(|s| s.results.iter().filter(|r| r.passed()).count())
            .sum();
        let assertions: usize = scenarios.iter().map(|s| s.results.len()).sum();
        let scenarios_passed = scenarios.iter().filter(|s| s.passed).count();
        let summary = EvaluationSummary {
            scenarios: scenarios.len(),
            scenarios_passed,
            scenarios_failed: scenarios.len() - scenarios_passed,
            assertions,
            assertions_passed,
            assertions_failed: assertions - assertions_passed,
            extraction_errors: extraction_errors.len(),
        };
        Self {
            schema_version: EVALUATION_REPORT_SCHEMA_VERSION,
            scenarios,
            extraction_errors,
            summary,
        }
    }

    /// Every scenario passed and every marker was reconciled.
    pub fn overall_pass(&self) -> bool {
        self.summary.scenarios_failed == 0 && self.extraction_errors.is_empty()
    }

    /// SHA-256 of the canonical JSON encoding, lowercase hex.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|error| FlickerError::internal(format!("report serialization: {error}")))?;
        Ok(sha256_hex(&bytes))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[derive(Debug, Clone)]
pub struct EvaluationRunner {
    catalog: TemplateCatalog,
}

impl EvaluationRunner {
    pub const fn new(catalog: TemplateCatalog) -> Self {
        Self { catalog }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.catalog())
    }

    pub const fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Run every assertion of the scenario's template, in template order.
    pub fn run_scenario(&self, scenario: &ScenarioInstance) -> Result<ScenarioReport> {
        let template = self.catalog.get(scenario.scenario_type())?;
        let subjects = TraceSubjects::from_reader(scenario.reader());
        let results: Vec<AssertionResult> = template
            .assertions
            .iter()
            .map(|assertion| assertion.evaluate(scenario, &subjects))
            .collect();

        for failed in results.iter().filter(|r| !r.passed()) {
            warn!(
                target: "flicker.assert",
                scenario = %scenario.id,
                assertion = %failed.assertion_name,
                failure = %failed
                    .failure
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string),
                "assertion failed"
            );
        }

        let passed = results.iter().all(AssertionResult::passed);
        info!(
            target: "flicker.assert",
            scenario = %scenario.id,
            template = template.name,
            assertions = results.len(),
            passed,
            "scenario evaluated"
        );

        Ok(ScenarioReport {
            scenario_id: scenario.id,
            scenario_type: scenario.scenario_type(),
            template: template.name.to_owned(),
            start_timestamp: scenario.start_timestamp,
            end_timestamp: scenario.end_timestamp,
            passed,
            results,
        })
    }

    pub fn run(&self, scenarios: &[ScenarioInstance]) -> Result<EvaluationReport> {
        let reports = scenarios
            .iter()
            .map(|s| self.run_scenario(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(EvaluationReport::new(reports, Vec::new()))
    }
}

/// Extract with every configured extractor, then evaluate.
///
/// Markers that fail to reconcile are recorded in the report; the rest are
/// still evaluated. Reader-wide failures abort the run.
pub fn extract_and_evaluate(
    config: &HarnessConfig,
    reader: &dyn TraceReader,
) -> Result<EvaluationReport> {
    let runner = EvaluationRunner::from_config(config);
    let mut scenario_reports = Vec::new();
    let mut extraction_errors = Vec::new();

    for extractor in config.extractors()? {
        for outcome in extractor.extract_each(reader)? {
            match outcome {
                Ok(scenario) => scenario_reports.push(runner.run_scenario(&scenario)?),
                Err(error) if error.is_per_marker() => {
                    extraction_errors.push(format!("{}: {error}", extractor.target_tag()));
                }
                Err(error) => return Err(error),
            }
        }
    }

    let report = EvaluationReport::new(scenario_reports, extraction_errors);
    info!(
        target: "flicker.report",
        scenarios = report.summary.scenarios,
        failed = report.summary.scenarios_failed,
        extraction_errors = report.summary.extraction_errors,
        "evaluation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::LaunchFixture;
    use crate::templates::AssertionTemplate;

    #[test]
    fn clean_launch_passes_its_template() {
        let runner = EvaluationRunner::new(TemplateCatalog::standard());
        let report = runner
            .run_scenario(&LaunchFixture::new().scenario())
            .expect("template registered");
        assert!(
            report.passed,
            "{:?}",
            report.failures().collect::<Vec<_>>()
        );
        assert_eq!(report.template, "APP_LAUNCH_FROM_HOME");
        assert_eq!(report.results.len(), 12);
    }

    #[test]
    fn missing_template_fails_the_run() {
        let catalog = TemplateCatalog::new().with_template(
            ScenarioType::AppClose,
            AssertionTemplate::standard(ScenarioType::AppClose),
        );
        let err = EvaluationRunner::new(catalog)
            .run(&[LaunchFixture::new().scenario()])
            .expect_err("no template for launch from home");
        assert!(matches!(err, FlickerError::NoTemplateForScenario { .. }));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let report = EvaluationRunner::new(TemplateCatalog::standard())
            .run(&[LaunchFixture::new().scenario()])
            .expect("run");
        let first = report.fingerprint().expect("fingerprint");
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, report.clone().fingerprint().expect("fingerprint"));
    }

    #[test]
    fn summary_counts_failures() {
        let runner = EvaluationRunner::new(TemplateCatalog::standard());
        let report = runner
            .run(&[
                LaunchFixture::new().scenario(),
                LaunchFixture::new().with_single_frame_flicker().scenario(),
            ])
            .expect("run");
        assert_eq!(report.summary.scenarios, 2);
        assert_eq!(report.summary.scenarios_failed, 1);
        assert_eq!(report.summary.assertions, 24);
        assert_eq!(report.summary.assertions_failed, 1);
        assert!(!report.overall_pass());
    }
}
