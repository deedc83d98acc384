//! Flicker scenario extraction and assertion evaluation.
//!
//! A run is captured as a set of traces behind a [`reader::TraceReader`].
//! Extractors carve reconciled scenario windows out of the run from CUJ
//! markers; the runner checks each scenario against the assertion template
//! of its type and aggregates the verdicts into a report.

pub mod assertion;
pub mod component;
pub mod config;
pub mod extractor;
pub mod fixtures;
pub mod lifecycle;
pub mod reader;
pub mod report;
pub mod result;
pub mod runner;
pub mod scenario;
pub mod subject;
pub mod templates;
pub mod transition_matcher;

pub use config::HarnessConfig;
pub use extractor::{ScenarioExtractor, TaggedScenarioExtractor};
pub use reader::{InMemoryReader, TraceReader};
pub use result::{AssertionFailure, AssertionResult, AssertionStatus};
pub use runner::{EvaluationReport, EvaluationRunner, ScenarioReport, extract_and_evaluate};
pub use scenario::{ScenarioId, ScenarioInstance, ScenarioType};
