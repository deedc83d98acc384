//! Assertion outcomes.

use std::fmt;

use flicker_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioId;

/// A violated expectation, located in the trace where possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    pub timestamp: Option<Timestamp>,
    /// Index of the offending entry within the scenario slice.
    pub entry_index: Option<usize>,
    pub message: String,
}

impl AssertionFailure {
    /// A failure not tied to any entry.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            entry_index: None,
            message: message.into(),
        }
    }

    /// A failure located at one entry of the slice.
    pub fn at(timestamp: Timestamp, entry_index: usize, message: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp),
            entry_index: Some(entry_index),
            message: message.into(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.timestamp, self.entry_index) {
            (Some(ts), Some(index)) => write!(f, "{} (entry {index}, {ts})", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionStatus {
    Passed,
    Failed,
}

/// Outcome of one assertion against one scenario instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub assertion_name: String,
    pub scenario_id: ScenarioId,
    pub status: AssertionStatus,
    pub failure: Option<AssertionFailure>,
}

impl AssertionResult {
    pub fn from_outcome(
        assertion_name: String,
        scenario_id: ScenarioId,
        outcome: Result<(), AssertionFailure>,
    ) -> Self {
        match outcome {
            Ok(()) => Self {
                assertion_name,
                scenario_id,
                status: AssertionStatus::Passed,
                failure: None,
            },
            Err(failure) => Self {
                assertion_name,
                scenario_id,
                status: AssertionStatus::Failed,
                failure: Some(failure),
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.status == AssertionStatus::Passed
    }
}
