//! Harness configuration.
//!
//! Maps CUJ tags to scenario types and transition matchers, and controls
//! how the template catalog is assembled.

use std::collections::BTreeSet;

use flicker_error::{FlickerError, Result};
use flicker_types::{CujType, TransitionType};
use serde::{Deserialize, Serialize};

use crate::extractor::TaggedScenarioExtractor;
use crate::scenario::ScenarioType;
use crate::templates::TemplateCatalog;
use crate::transition_matcher::{NoTransitionMatcher, TransitionMatcher, TransitionTypeMatcher};

/// Element names exempt from the consecutive-entry checks by default:
/// starting windows are expected to show briefly.
pub const DEFAULT_CONSECUTIVE_ENTRY_IGNORE: [&str; 3] =
    ["Splash Screen", "SnapshotStartingWindow", "IME-snapshot-surface"];

/// How an extractor finds the transition behind a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherConfig {
    None,
    TransitionTypes { types: Vec<TransitionType> },
}

impl MatcherConfig {
    pub fn build(&self) -> Box<dyn TransitionMatcher> {
        match self {
            Self::None => Box::new(NoTransitionMatcher),
            Self::TransitionTypes { types } => {
                Box::new(TransitionTypeMatcher::new(types.iter().copied()))
            }
        }
    }
}

/// One CUJ tag to scenario type mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub cuj: CujType,
    pub scenario_type: ScenarioType,
    pub matcher: MatcherConfig,
}

impl ExtractorConfig {
    pub fn build(&self) -> TaggedScenarioExtractor {
        TaggedScenarioExtractor::new(self.cuj, self.scenario_type, self.matcher.build())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub extractors: Vec<ExtractorConfig>,
    /// Append the navigation bar and status bar groups to every template.
    pub include_system_ui_assertions: bool,
    /// Name fragments of elements exempt from the consecutive-entry checks.
    pub consecutive_entry_ignore: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let opening = || MatcherConfig::TransitionTypes {
            types: vec![TransitionType::Open, TransitionType::ToFront],
        };
        let closing = MatcherConfig::TransitionTypes {
            types: vec![TransitionType::Close, TransitionType::ToBack],
        };
        Self {
            extractors: vec![
                ExtractorConfig {
                    cuj: CujType::LauncherAppLaunchFromIcon,
                    scenario_type: ScenarioType::AppLaunchFromHome,
                    matcher: opening(),
                },
                ExtractorConfig {
                    cuj: CujType::LauncherAppCloseToHome,
                    scenario_type: ScenarioType::AppCloseToHome,
                    matcher: closing,
                },
                ExtractorConfig {
                    cuj: CujType::NotificationAppStart,
                    scenario_type: ScenarioType::AppLaunchFromNotification,
                    matcher: opening(),
                },
                ExtractorConfig {
                    cuj: CujType::LauncherQuickSwitch,
                    scenario_type: ScenarioType::LauncherQuickSwitch,
                    matcher: MatcherConfig::TransitionTypes {
                        types: vec![TransitionType::ToFront, TransitionType::Change],
                    },
                },
                ExtractorConfig {
                    cuj: CujType::LauncherAppLaunchFromRecents,
                    scenario_type: ScenarioType::AppLaunch,
                    matcher: opening(),
                },
            ],
            include_system_ui_assertions: false,
            consecutive_entry_ignore: DEFAULT_CONSECUTIVE_ENTRY_IGNORE
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl HarnessConfig {
    /// Problems found in this configuration; empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();
        for extractor in &self.extractors {
            if !seen.insert(extractor.cuj) {
                errors.push(format!("duplicate extractor for CUJ {}", extractor.cuj));
            }
            if let MatcherConfig::TransitionTypes { types } = &extractor.matcher {
                if types.is_empty() {
                    errors.push(format!(
                        "extractor for CUJ {} has an empty transition_types list",
                        extractor.cuj
                    ));
                }
            }
        }
        if self
            .consecutive_entry_ignore
            .iter()
            .any(|fragment| fragment.is_empty())
        {
            errors.push("consecutive_entry_ignore contains an empty fragment".to_owned());
        }
        errors
    }

    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlickerError::invalid_config(errors.join("; ")))
        }
    }

    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|error| FlickerError::invalid_config(format!("parse failed: {error}")))?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|error| FlickerError::internal(format!("config serialization: {error}")))
    }

    pub fn extractors(&self) -> Result<Vec<TaggedScenarioExtractor>> {
        self.ensure_valid()?;
        Ok(self.extractors.iter().map(ExtractorConfig::build).collect())
    }

    pub fn catalog(&self) -> TemplateCatalog {
        TemplateCatalog::build(
            self.include_system_ui_assertions,
            &self.consecutive_entry_ignore,
        )
    }
}
