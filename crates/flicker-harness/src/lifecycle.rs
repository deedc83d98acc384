//! Per-element timelines across a trace slice.
//!
//! Each trace kind gets its own typed tracker: layers are keyed by layer id,
//! windows by window id. A tracker is built once per scenario evaluation by
//! scanning the slice forward and recording what each element looked like in
//! every entry it appears in.

use std::collections::BTreeMap;

use flicker_types::{LayersTrace, Rect, Region, WmTrace};

/// What one element looked like in one trace entry.
pub trait Observation {
    fn name(&self) -> &str;

    fn is_visible(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerObservation {
    pub name: String,
    pub visible: bool,
    pub visible_region: Region,
}

impl Observation for LayerObservation {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowObservation {
    pub name: String,
    pub visible: bool,
    pub frame: Rect,
}

impl Observation for WindowObservation {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Ordered per-entry states of one element. `None` marks entries the
/// element was absent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLifecycle<S> {
    states: Vec<Option<S>>,
}

impl<S> ElementLifecycle<S> {
    /// A lifecycle spanning `entry_count` entries with no observations.
    pub fn new(entry_count: usize) -> Self {
        Self {
            states: (0..entry_count).map(|_| None).collect(),
        }
    }

    /// Record the state observed at `entry_index`, growing the timeline if
    /// needed.
    pub fn record(&mut self, entry_index: usize, state: S) {
        if entry_index >= self.states.len() {
            self.states.resize_with(entry_index + 1, || None);
        }
        self.states[entry_index] = Some(state);
    }

    pub fn state_at(&self, entry_index: usize) -> Option<&S> {
        self.states.get(entry_index).and_then(Option::as_ref)
    }

    pub fn states(&self) -> &[Option<S>] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Index of the first entry the element was observed in.
    pub fn first_seen(&self) -> Option<usize> {
        self.states.iter().position(Option::is_some)
    }
}

impl<S: Observation> ElementLifecycle<S> {
    fn visible_at(&self, entry_index: usize) -> bool {
        self.state_at(entry_index).is_some_and(Observation::is_visible)
    }

    /// Entries where the element is visible while hidden or absent in both
    /// neighbouring entries. The first and last entries are never reported
    /// since one of their neighbours lies outside the slice.
    ///
    /// Detection is one-directional: an element hidden for a single entry
    /// between visible entries is not a run.
    pub fn single_entry_runs(&self) -> Vec<usize> {
        let len = self.states.len();
        if len < 3 {
            return Vec::new();
        }
        (1..len - 1)
            .filter(|&i| {
                self.visible_at(i) && !self.visible_at(i - 1) && !self.visible_at(i + 1)
            })
            .collect()
    }
}

/// An element shown for exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleEntryFlicker<K> {
    pub id: K,
    pub name: String,
    pub entry_index: usize,
}

/// One lifecycle per element identity across a trace slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLifecycle<K, S> {
    elements: BTreeMap<K, ElementLifecycle<S>>,
    entry_count: usize,
}

pub type LayersTraceLifecycle = TraceLifecycle<i32, LayerObservation>;
pub type WindowsTraceLifecycle = TraceLifecycle<i32, WindowObservation>;

impl<K: Ord + Clone, S> TraceLifecycle<K, S> {
    pub fn new(entry_count: usize) -> Self {
        Self {
            elements: BTreeMap::new(),
            entry_count,
        }
    }

    pub fn get(&self, id: &K) -> Option<&ElementLifecycle<S>> {
        self.elements.get(id)
    }

    /// Replace the lifecycle of `id`.
    pub fn set(&mut self, id: K, lifecycle: ElementLifecycle<S>) {
        self.elements.insert(id, lifecycle);
    }

    /// The lifecycle of `id`, inserting `default` on first reference.
    pub fn get_or_put(&mut self, id: K, default: ElementLifecycle<S>) -> &mut ElementLifecycle<S> {
        self.elements.entry(id).or_insert(default)
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &ElementLifecycle<S>)> {
        self.elements.iter()
    }

    fn observe(&mut self, id: K, entry_index: usize, state: S) {
        let entry_count = self.entry_count;
        self.get_or_put(id, ElementLifecycle::new(entry_count))
            .record(entry_index, state);
    }
}

impl<K: Ord + Clone, S: Observation> TraceLifecycle<K, S> {
    /// Every single-entry visibility blip, skipping elements whose name
    /// contains one of `ignore`.
    pub fn single_entry_flickers(&self, ignore: &[String]) -> Vec<SingleEntryFlicker<K>> {
        let mut found = Vec::new();
        for (id, lifecycle) in &self.elements {
            for entry_index in lifecycle.single_entry_runs() {
                let Some(state) = lifecycle.state_at(entry_index) else {
                    continue;
                };
                if ignore.iter().any(|frag| state.name().contains(frag.as_str())) {
                    continue;
                }
                found.push(SingleEntryFlicker {
                    id: id.clone(),
                    name: state.name().to_owned(),
                    entry_index,
                });
            }
        }
        found.sort_by_key(|f| f.entry_index);
        found
    }
}

impl LayersTraceLifecycle {
    pub fn from_layers_trace(trace: &LayersTrace) -> Self {
        let mut lifecycle = Self::new(trace.entries().len());
        for (index, entry) in trace.entries().iter().enumerate() {
            for layer in &entry.layers {
                lifecycle.observe(
                    layer.id,
                    index,
                    LayerObservation {
                        name: layer.name.clone(),
                        visible: layer.is_visible,
                        visible_region: layer.visible_region.clone(),
                    },
                );
            }
        }
        lifecycle
    }
}

impl WindowsTraceLifecycle {
    pub fn from_wm_trace(trace: &WmTrace) -> Self {
        let mut lifecycle = Self::new(trace.entries().len());
        for (index, entry) in trace.entries().iter().enumerate() {
            for window in &entry.windows {
                lifecycle.observe(
                    window.id,
                    index,
                    WindowObservation {
                        name: window.name.clone(),
                        visible: window.is_visible,
                        frame: window.frame,
                    },
                );
            }
        }
        lifecycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(visible: bool) -> WindowObservation {
        WindowObservation {
            name: "com.example/.Main".into(),
            visible,
            frame: Rect::from_size(10, 10),
        }
    }

    fn lifecycle(pattern: &[Option<bool>]) -> ElementLifecycle<WindowObservation> {
        let mut lc = ElementLifecycle::new(pattern.len());
        for (i, state) in pattern.iter().enumerate() {
            if let Some(visible) = state {
                lc.record(i, window(*visible));
            }
        }
        lc
    }

    #[test]
    fn get_or_put_inserts_once() {
        let mut tracker: TraceLifecycle<i32, WindowObservation> = TraceLifecycle::new(3);
        tracker.get_or_put(7, ElementLifecycle::new(3)).record(0, window(true));
        tracker.get_or_put(7, ElementLifecycle::new(3)).record(1, window(false));
        assert_eq!(tracker.len(), 1);
        let lc = tracker.get(&7).expect("inserted");
        assert!(lc.state_at(0).is_some_and(|s| s.visible));
        assert!(lc.state_at(1).is_some_and(|s| !s.visible));
        assert!(lc.state_at(2).is_none());
    }

    #[test]
    fn set_replaces() {
        let mut tracker: TraceLifecycle<i32, WindowObservation> = TraceLifecycle::new(1);
        tracker.set(1, lifecycle(&[Some(true)]));
        tracker.set(1, lifecycle(&[Some(false)]));
        assert!(tracker.get(&1).is_some_and(|lc| !lc.visible_at(0)));
    }

    #[test]
    fn record_grows_timeline() {
        let mut lc: ElementLifecycle<WindowObservation> = ElementLifecycle::new(1);
        lc.record(4, window(true));
        assert_eq!(lc.len(), 5);
        assert_eq!(lc.first_seen(), Some(4));
    }

    #[test]
    fn single_entry_run_detected_mid_trace() {
        let lc = lifecycle(&[Some(false), Some(true), None, Some(true), Some(true)]);
        assert_eq!(lc.single_entry_runs(), vec![1]);
    }

    #[test]
    fn single_entry_gap_is_not_a_run() {
        let lc = lifecycle(&[Some(true), Some(false), Some(true), Some(true)]);
        assert!(lc.single_entry_runs().is_empty());
    }

    #[test]
    fn edges_are_not_single_entry_runs() {
        let lc = lifecycle(&[Some(true), None, None, Some(true)]);
        assert!(lc.single_entry_runs().is_empty());
        assert!(lifecycle(&[None, Some(true)]).single_entry_runs().is_empty());
    }

    #[test]
    fn ignored_names_are_skipped() {
        let mut tracker: TraceLifecycle<i32, WindowObservation> = TraceLifecycle::new(3);
        tracker.set(1, lifecycle(&[None, Some(true), None]));
        assert_eq!(tracker.single_entry_flickers(&[]).len(), 1);
        assert!(
            tracker
                .single_entry_flickers(&["com.example".to_owned()])
                .is_empty()
        );
    }
}
