//! Scenario types and reconciled scenario instances.

use std::fmt;

use flicker_types::{CujEntry, Rotation, Timestamp, Transition};
use serde::{Deserialize, Serialize};

use crate::reader::TraceReader;

/// Behaviour class a scenario instance is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    AppLaunch,
    AppClose,
    AppLaunchFromHome,
    AppCloseToHome,
    AppLaunchFromNotification,
    LauncherQuickSwitch,
}

impl ScenarioType {
    pub const ALL: [Self; 6] = [
        Self::AppLaunch,
        Self::AppClose,
        Self::AppLaunchFromHome,
        Self::AppCloseToHome,
        Self::AppLaunchFromNotification,
        Self::LauncherQuickSwitch,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AppLaunch => "APP_LAUNCH",
            Self::AppClose => "APP_CLOSE",
            Self::AppLaunchFromHome => "APP_LAUNCH_FROM_HOME",
            Self::AppCloseToHome => "APP_CLOSE_TO_HOME",
            Self::AppLaunchFromNotification => "APP_LAUNCH_FROM_NOTIFICATION",
            Self::LauncherQuickSwitch => "LAUNCHER_QUICK_SWITCH",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a scenario instance within one extraction: its type and the
/// position of its marker among the qualifying markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioId {
    pub scenario_type: ScenarioType,
    pub ordinal: usize,
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scenario_type, self.ordinal)
    }
}

/// One reconciled occurrence of a behaviour, with its own trace slice.
#[derive(Debug)]
pub struct ScenarioInstance {
    pub id: ScenarioId,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub start_rotation: Rotation,
    pub end_rotation: Rotation,
    pub associated_cuj: CujEntry,
    pub associated_transition: Option<Transition>,
    /// Traces restricted to `[start_timestamp, end_timestamp]`.
    pub reader: Box<dyn TraceReader>,
}

impl ScenarioInstance {
    pub const fn scenario_type(&self) -> ScenarioType {
        self.id.scenario_type
    }

    pub fn reader(&self) -> &dyn TraceReader {
        self.reader.as_ref()
    }
}
