//! On-disk report bundles.
//!
//! A bundle is one directory per run holding:
//! - `meta.json` for run metadata, summary counters and the report fingerprint
//! - `results.jsonl` with one assertion result per line, in evaluation order

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flicker_error::{FlickerError, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::result::AssertionResult;
use crate::runner::{EvaluationReport, EvaluationSummary};

/// Version of the bundle layout.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Files that must be present in every bundle.
pub const REQUIRED_BUNDLE_FILES: [&str; 2] = ["meta.json", "results.jsonl"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub schema_version: u32,
    pub run_id: String,
    pub harness_version: String,
    pub fingerprint: String,
    pub overall_pass: bool,
    pub summary: EvaluationSummary,
    pub extraction_errors: Vec<String>,
}

/// Write `report` into `base_dir/<run_id>` and return the bundle root.
pub fn write_report_bundle(
    base_dir: &Path,
    run_id: &str,
    report: &EvaluationReport,
) -> Result<PathBuf> {
    if run_id.is_empty() {
        return Err(internal_error("run_id must be non-empty"));
    }

    let root = base_dir.join(sanitize_segment(run_id));
    fs::create_dir_all(&root)?;

    let meta = BundleMeta {
        schema_version: REPORT_SCHEMA_VERSION,
        run_id: run_id.to_owned(),
        harness_version: env!("CARGO_PKG_VERSION").to_owned(),
        fingerprint: report.fingerprint()?,
        overall_pass: report.overall_pass(),
        summary: report.summary.clone(),
        extraction_errors: report.extraction_errors.clone(),
    };
    let meta_bytes = serde_json::to_vec_pretty(&meta)
        .map_err(|err| internal_error(format!("failed to serialize meta.json: {err}")))?;
    fs::write(root.join("meta.json"), meta_bytes)?;

    let mut results = BufWriter::new(File::create(root.join("results.jsonl"))?);
    for result in report.scenarios.iter().flat_map(|s| s.results.iter()) {
        let encoded = serde_json::to_string(result)
            .map_err(|err| internal_error(format!("failed to serialize result: {err}")))?;
        writeln!(results, "{encoded}")?;
    }
    results.flush()?;

    info!(
        target: "flicker.report",
        root = %root.display(),
        fingerprint = %meta.fingerprint,
        overall_pass = meta.overall_pass,
        "report bundle finalized"
    );
    Ok(root)
}

pub fn validate_required_files(bundle_root: &Path) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_BUNDLE_FILES
        .iter()
        .copied()
        .filter(|name| !bundle_root.join(name).is_file())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    error!(
        target: "flicker.report",
        bundle = %bundle_root.display(),
        missing_count = missing.len(),
        "missing required report bundle files"
    );
    Err(internal_error(format!(
        "missing required bundle files: {}",
        missing.join(", ")
    )))
}

pub fn read_bundle_meta(bundle_root: &Path) -> Result<BundleMeta> {
    let bytes = fs::read(bundle_root.join("meta.json"))?;
    let meta: BundleMeta = serde_json::from_slice(&bytes)
        .map_err(|err| internal_error(format!("meta.json parse failure: {err}")))?;

    if meta.schema_version != REPORT_SCHEMA_VERSION {
        warn!(
            target: "flicker.report",
            expected = REPORT_SCHEMA_VERSION,
            found = meta.schema_version,
            "bundle schema version mismatch"
        );
        return Err(internal_error(format!(
            "unsupported schema version: expected {REPORT_SCHEMA_VERSION}, got {}",
            meta.schema_version
        )));
    }
    if meta.run_id.is_empty() || meta.fingerprint.is_empty() {
        return Err(internal_error(
            "meta.json must include non-empty run_id and fingerprint",
        ));
    }
    Ok(meta)
}

pub fn read_results_jsonl(bundle_root: &Path) -> Result<Vec<AssertionResult>> {
    let reader = BufReader::new(File::open(bundle_root.join("results.jsonl"))?);
    let mut results = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            return Err(internal_error(format!(
                "results.jsonl has empty line at {}",
                line_no + 1
            )));
        }
        let result: AssertionResult = serde_json::from_str(&line).map_err(|err| {
            internal_error(format!(
                "results.jsonl parse failure at line {}: {err}",
                line_no + 1
            ))
        })?;
        results.push(result);
    }
    Ok(results)
}

/// Check a bundle read back from disk: required files, schema, and result
/// lines consistent with the summary counters.
pub fn validate_bundle(bundle_root: &Path) -> Result<BundleMeta> {
    validate_required_files(bundle_root)?;
    let meta = read_bundle_meta(bundle_root)?;
    let results = read_results_jsonl(bundle_root)?;

    if results.len() != meta.summary.assertions {
        return Err(internal_error(format!(
            "results.jsonl has {} lines, summary reports {} assertions",
            results.len(),
            meta.summary.assertions
        )));
    }
    let failed = results.iter().filter(|r| !r.passed()).count();
    if failed != meta.summary.assertions_failed {
        return Err(internal_error(format!(
            "results.jsonl has {failed} failures, summary reports {}",
            meta.summary.assertions_failed
        )));
    }
    if results.iter().any(|r| r.passed() == r.failure.is_some()) {
        return Err(internal_error(
            "results.jsonl has a result whose status disagrees with its failure",
        ));
    }
    Ok(meta)
}

fn sanitize_segment(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn internal_error(message: impl Into<String>) -> FlickerError {
    FlickerError::Internal(message.into())
}
