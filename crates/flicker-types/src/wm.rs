//! Window manager trace model.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::timestamp::{Timestamp, Timestamped, slice_entries};

/// One window in the window hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    /// Stable identity of the window across entries.
    pub id: i32,
    pub name: String,
    /// Compositor layer backing this window.
    pub layer_id: i32,
    pub is_visible: bool,
    pub is_app_window: bool,
    pub frame: Rect,
}

/// A display as seen by the window manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmDisplay {
    pub id: u64,
    pub bounds: Rect,
}

/// Window manager state at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmTraceEntry {
    pub timestamp: Timestamp,
    /// Windows ordered from top-most to bottom-most.
    pub windows: Vec<WindowState>,
    pub displays: Vec<WmDisplay>,
    /// Name of the focused activity, if any.
    pub focused_app: Option<String>,
}

impl WmTraceEntry {
    pub fn visible_windows(&self) -> impl Iterator<Item = &WindowState> {
        self.windows.iter().filter(|w| w.is_visible)
    }

    /// Top-most visible application window.
    pub fn top_visible_app_window(&self) -> Option<&WindowState> {
        self.visible_windows().find(|w| w.is_app_window)
    }
}

impl Timestamped for WmTraceEntry {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Time-ordered window manager snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WmTrace {
    pub entries: Vec<WmTraceEntry>,
}

impl WmTrace {
    pub const fn new(entries: Vec<WmTraceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[WmTraceEntry] {
        &self.entries
    }

    /// First entry whose timestamp is at or after `timestamp`.
    pub fn first_entry_at_or_after(&self, timestamp: &Timestamp) -> Option<&WmTraceEntry> {
        self.entries
            .iter()
            .find(|e| e.timestamp.is_at_or_after(timestamp))
    }

    /// Entries within `[start, end]`, plus the state in force at `start`.
    #[must_use]
    pub fn slice(&self, start: &Timestamp, end: &Timestamp) -> Self {
        Self::new(slice_entries(&self.entries, start, end, true))
    }
}
