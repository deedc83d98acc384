use thiserror::Error;

/// Primary error type for flicker scenario extraction and evaluation.
///
/// Every variant here is fatal for the call that produced it. Assertion
/// violations are not errors: they are reported as failed assertion results
/// so that sibling evaluations keep running.
#[derive(Error, Debug)]
pub enum FlickerError {
    // === Missing input ===
    /// A trace required by the current operation is absent from the reader.
    #[error("missing {trace} trace")]
    MissingTrace { trace: &'static str },

    /// No trace entry exists at or before the requested instant.
    #[error("no {trace} trace entry at or before {at}")]
    NoEntryAt { trace: &'static str, at: String },

    // === Reconciliation ===
    /// The finish transaction of a matched transition is not in the
    /// transactions trace.
    #[error("couldn't find finish transaction {transaction_id} of transition {transition_id}")]
    FinishTransactionNotFound {
        transition_id: i32,
        transaction_id: u64,
    },

    /// No layers trace entry applied the given transaction.
    #[error("no layers trace entry for transaction {transaction_id} (vsync {vsync_id})")]
    NoLayersEntryForTransaction { transaction_id: u64, vsync_id: i64 },

    /// A marker lacks one or more clock readings.
    #[error("marker {cuj} has incomplete timestamps: start={start} end={end}")]
    IncompleteMarkerTimestamps {
        cuj: String,
        start: String,
        end: String,
    },

    /// The reconciled window ends before it starts.
    #[error("marker {cuj} produced an inverted window: start={start} end={end}")]
    InvertedScenarioWindow {
        cuj: String,
        start: String,
        end: String,
    },

    /// No physical display with a non-empty layer stack exists at an instant.
    #[error("no physical display with non-empty layer stack space at {at}")]
    NoPhysicalDisplay { at: String },

    // === Harness configuration ===
    /// A scenario type has no assertion template in the catalog.
    #[error("no assertion template registered for scenario type {scenario_type}")]
    NoTemplateForScenario { scenario_type: String },

    /// Harness configuration failed validation.
    #[error("invalid harness configuration: {detail}")]
    InvalidConfig { detail: String },

    // === I/O ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Internal ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`FlickerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorClass {
    /// Malformed or incomplete input; the harness must investigate.
    Configuration = 2,
    /// Filesystem failure while reading or writing artifacts.
    Io = 3,
    /// Bug in the engine.
    Internal = 4,
}

impl FlickerError {
    /// Classify this error.
    #[allow(clippy::match_same_arms)]
    pub const fn error_class(&self) -> ErrorClass {
        match self {
            Self::MissingTrace { .. }
            | Self::NoEntryAt { .. }
            | Self::FinishTransactionNotFound { .. }
            | Self::NoLayersEntryForTransaction { .. }
            | Self::IncompleteMarkerTimestamps { .. }
            | Self::InvertedScenarioWindow { .. }
            | Self::NoPhysicalDisplay { .. }
            | Self::NoTemplateForScenario { .. }
            | Self::InvalidConfig { .. } => ErrorClass::Configuration,
            Self::Io(_) => ErrorClass::Io,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Whether the error concerns a single marker rather than the whole
    /// reader. Extraction of the remaining markers is still meaningful.
    pub const fn is_per_marker(&self) -> bool {
        matches!(
            self,
            Self::FinishTransactionNotFound { .. }
                | Self::NoLayersEntryForTransaction { .. }
                | Self::IncompleteMarkerTimestamps { .. }
                | Self::InvertedScenarioWindow { .. }
                | Self::NoPhysicalDisplay { .. }
                | Self::NoEntryAt { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingTrace { .. } => {
                Some("Re-run the capture with every required trace enabled")
            }
            Self::FinishTransactionNotFound { .. } | Self::NoLayersEntryForTransaction { .. } => {
                Some("Check that the transactions and layers traces cover the whole run")
            }
            Self::IncompleteMarkerTimestamps { .. } => {
                Some("Capture markers with elapsed, uptime and wall-clock readings")
            }
            Self::NoTemplateForScenario { .. } => {
                Some("Register a template for the scenario type or drop its extractor")
            }
            _ => None,
        }
    }

    /// Get the process exit code for this error (for CLI use).
    pub const fn exit_code(&self) -> i32 {
        self.error_class() as i32
    }

    /// Create a missing-trace error.
    pub const fn missing_trace(trace: &'static str) -> Self {
        Self::MissingTrace { trace }
    }

    /// Create a configuration validation error.
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `FlickerError`.
pub type Result<T> = std::result::Result<T, FlickerError>;
