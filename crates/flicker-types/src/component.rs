//! Matching traced elements against a component description.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layers::{Layer, LayersTraceEntry};
use crate::wm::WindowState;

/// Identifies the layers and windows that belong to one component.
///
/// A layer matches when its own id or any ancestor id is listed, or when
/// its name contains one of the name fragments. A window matches on its id,
/// its backing layer id, or a name fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentMatcher {
    pub label: String,
    pub layer_ids: BTreeSet<i32>,
    pub window_ids: BTreeSet<i32>,
    pub name_fragments: Vec<String>,
}

impl ComponentMatcher {
    /// Matcher on a single name fragment.
    pub fn named(label: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name_fragments: vec![fragment.into()],
            ..Self::default()
        }
    }

    /// Matcher on explicit layer and window identities.
    pub fn with_ids(
        label: impl Into<String>,
        layer_ids: impl IntoIterator<Item = i32>,
        window_ids: impl IntoIterator<Item = i32>,
    ) -> Self {
        Self {
            label: label.into(),
            layer_ids: layer_ids.into_iter().collect(),
            window_ids: window_ids.into_iter().collect(),
            name_fragments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layer_ids.is_empty() && self.window_ids.is_empty() && self.name_fragments.is_empty()
    }

    fn name_matches(&self, name: &str) -> bool {
        self.name_fragments.iter().any(|f| name.contains(f.as_str()))
    }

    pub fn matches_layer(&self, entry: &LayersTraceEntry, layer: &Layer) -> bool {
        self.name_matches(&layer.name)
            || (!self.layer_ids.is_empty()
                && entry
                    .lineage(layer)
                    .iter()
                    .any(|id| self.layer_ids.contains(id)))
    }

    pub fn matches_window(&self, window: &WindowState) -> bool {
        self.window_ids.contains(&window.id)
            || self.layer_ids.contains(&window.layer_id)
            || self.name_matches(&window.name)
    }
}

impl fmt::Display for ComponentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Region};
    use crate::timestamp::Timestamp;

    fn layer(id: i32, parent_id: Option<i32>, name: &str) -> Layer {
        Layer {
            id,
            parent_id,
            name: name.to_owned(),
            is_visible: true,
            visible_region: Region::new(),
        }
    }

    fn entry(layers: Vec<Layer>) -> LayersTraceEntry {
        LayersTraceEntry {
            timestamp: Timestamp::from_elapsed(0),
            vsync_id: 0,
            displays: Vec::new(),
            layers,
        }
    }

    #[test]
    fn layer_matches_through_ancestor() {
        let e = entry(vec![
            layer(1, None, "Task=12"),
            layer(2, Some(1), "com.example/.Main#0"),
        ]);
        let matcher = ComponentMatcher::with_ids("OPENING_APP", [1], []);
        let child = e.layer(2).cloned().expect("child");
        assert!(matcher.matches_layer(&e, &child));
    }

    #[test]
    fn layer_matches_by_name() {
        let e = entry(vec![layer(5, None, "NavigationBar0#12")]);
        let matcher = ComponentMatcher::named("NAV_BAR", "NavigationBar0");
        let nav = e.layer(5).cloned().expect("nav");
        assert!(matcher.matches_layer(&e, &nav));
        assert!(!ComponentMatcher::named("STATUS_BAR", "StatusBar").matches_layer(&e, &nav));
    }

    #[test]
    fn window_matches_on_backing_layer() {
        let window = WindowState {
            id: 99,
            name: "com.example/.Main".into(),
            layer_id: 4,
            is_visible: true,
            is_app_window: true,
            frame: Rect::from_size(1, 1),
        };
        assert!(ComponentMatcher::with_ids("APP", [4], []).matches_window(&window));
        assert!(ComponentMatcher::with_ids("APP", [], [99]).matches_window(&window));
        assert!(!ComponentMatcher::with_ids("APP", [5], [98]).matches_window(&window));
    }
}
