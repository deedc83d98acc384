//! Critical-user-journey (CUJ) marker trace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Tag identifying the behaviour class a marker brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CujType {
    LauncherAppLaunchFromIcon,
    LauncherAppLaunchFromRecents,
    LauncherAppCloseToHome,
    LauncherQuickSwitch,
    NotificationAppStart,
    NotificationShadeExpandCollapse,
    SplitScreenEnter,
    ShadeAppLaunchFromHistoryButton,
}

impl CujType {
    pub const ALL: [Self; 8] = [
        Self::LauncherAppLaunchFromIcon,
        Self::LauncherAppLaunchFromRecents,
        Self::LauncherAppCloseToHome,
        Self::LauncherQuickSwitch,
        Self::NotificationAppStart,
        Self::NotificationShadeExpandCollapse,
        Self::SplitScreenEnter,
        Self::ShadeAppLaunchFromHistoryButton,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LauncherAppLaunchFromIcon => "LAUNCHER_APP_LAUNCH_FROM_ICON",
            Self::LauncherAppLaunchFromRecents => "LAUNCHER_APP_LAUNCH_FROM_RECENTS",
            Self::LauncherAppCloseToHome => "LAUNCHER_APP_CLOSE_TO_HOME",
            Self::LauncherQuickSwitch => "LAUNCHER_QUICK_SWITCH",
            Self::NotificationAppStart => "NOTIFICATION_APP_START",
            Self::NotificationShadeExpandCollapse => "NOTIFICATION_SHADE_EXPAND_COLLAPSE",
            Self::SplitScreenEnter => "SPLIT_SCREEN_ENTER",
            Self::ShadeAppLaunchFromHistoryButton => "SHADE_APP_LAUNCH_FROM_HISTORY_BUTTON",
        }
    }
}

impl fmt::Display for CujType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One begin/end marker pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CujEntry {
    pub cuj: CujType,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub canceled: bool,
}

/// Markers in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CujTrace {
    pub entries: Vec<CujEntry>,
}

impl CujTrace {
    pub const fn new(entries: Vec<CujEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CujEntry] {
        &self.entries
    }

    /// Markers overlapping `[start, end]`.
    #[must_use]
    pub fn slice(&self, start: &Timestamp, end: &Timestamp) -> Self {
        Self::new(
            self.entries
                .iter()
                .filter(|e| {
                    e.end_timestamp.is_at_or_after(start) && e.start_timestamp.is_at_or_before(end)
                })
                .cloned()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_platform_tag_names() {
        let json = serde_json::to_string(&CujType::LauncherQuickSwitch).expect("serialize");
        assert_eq!(json, "\"LAUNCHER_QUICK_SWITCH\"");
        for cuj in CujType::ALL {
            let encoded = serde_json::to_string(&cuj).expect("serialize");
            assert_eq!(encoded, format!("\"{}\"", cuj.as_str()));
        }
    }

    #[test]
    fn slice_keeps_overlapping_markers() {
        let marker = |s, e| CujEntry {
            cuj: CujType::LauncherQuickSwitch,
            start_timestamp: Timestamp::from_elapsed(s),
            end_timestamp: Timestamp::from_elapsed(e),
            canceled: false,
        };
        let trace = CujTrace::new(vec![marker(0, 5), marker(8, 20), marker(30, 40)]);
        let sliced = trace.slice(&Timestamp::from_elapsed(10), &Timestamp::from_elapsed(25));
        assert_eq!(sliced.entries, vec![marker(8, 20)]);
    }
}
