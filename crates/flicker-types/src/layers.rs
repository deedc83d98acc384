//! Compositor (layers) trace model.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Region, Transform};
use crate::timestamp::{Timestamp, Timestamped, slice_entries};
use crate::transition::Transaction;

/// A display known to the compositor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: u64,
    pub name: String,
    pub is_virtual: bool,
    /// Area of the layer stack rendered onto this display.
    pub layer_stack_space: Rect,
    pub transform: Transform,
}

impl Display {
    /// Physical display with something to show.
    pub const fn is_anchor(&self) -> bool {
        !self.is_virtual && self.layer_stack_space.is_not_empty()
    }
}

/// One compositor layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub is_visible: bool,
    /// Screen-space region this layer draws, after occlusion.
    pub visible_region: Region,
}

/// Snapshot of the compositor state at one vsync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayersTraceEntry {
    pub timestamp: Timestamp,
    pub vsync_id: i64,
    pub displays: Vec<Display>,
    pub layers: Vec<Layer>,
}

impl LayersTraceEntry {
    pub fn layer(&self, id: i32) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// First physical display with non-empty layer stack space.
    pub fn anchor_display(&self) -> Option<&Display> {
        self.displays.iter().find(|d| d.is_anchor())
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.is_visible)
    }

    /// Union of the visible regions of every visible layer.
    pub fn visible_region(&self) -> Region {
        let mut region = Region::new();
        for layer in self.visible_layers() {
            region.union(&layer.visible_region);
        }
        region
    }

    /// Ids of the layer and all of its ancestors, nearest first.
    pub fn lineage(&self, layer: &Layer) -> Vec<i32> {
        let mut ids = vec![layer.id];
        let mut next = layer.parent_id;
        // Bounded by layer count so a malformed parent cycle terminates.
        while let Some(parent) = next {
            if ids.len() > self.layers.len() || ids.contains(&parent) {
                break;
            }
            ids.push(parent);
            next = self.layer(parent).and_then(|p| p.parent_id);
        }
        ids
    }
}

impl Timestamped for LayersTraceEntry {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Time-ordered compositor snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayersTrace {
    pub entries: Vec<LayersTraceEntry>,
}

impl LayersTrace {
    pub const fn new(entries: Vec<LayersTraceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LayersTraceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State in force at `timestamp`: the last entry at or before it.
    pub fn entry_at(&self, timestamp: &Timestamp) -> Option<&LayersTraceEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.timestamp.is_at_or_before(timestamp))
    }

    /// The entry that applied `transaction`.
    pub fn entry_for_transaction(&self, transaction: &Transaction) -> Option<&LayersTraceEntry> {
        self.entries
            .iter()
            .find(|e| e.vsync_id == transaction.applied_vsync_id)
    }

    /// Entries within `[start, end]`, plus the state in force at `start`.
    #[must_use]
    pub fn slice(&self, start: &Timestamp, end: &Timestamp) -> Self {
        Self::new(slice_entries(&self.entries, start, end, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(elapsed: i64, vsync_id: i64) -> LayersTraceEntry {
        LayersTraceEntry {
            timestamp: Timestamp::from_elapsed(elapsed),
            vsync_id,
            displays: Vec::new(),
            layers: Vec::new(),
        }
    }

    fn layer(id: i32, parent_id: Option<i32>) -> Layer {
        Layer {
            id,
            parent_id,
            name: format!("layer#{id}"),
            is_visible: true,
            visible_region: Region::new(),
        }
    }

    #[test]
    fn entry_at_returns_state_in_force() {
        let trace = LayersTrace::new(vec![entry(10, 1), entry(20, 2), entry(30, 3)]);
        assert_eq!(
            trace.entry_at(&Timestamp::from_elapsed(25)).map(|e| e.vsync_id),
            Some(2)
        );
        assert_eq!(
            trace.entry_at(&Timestamp::from_elapsed(30)).map(|e| e.vsync_id),
            Some(3)
        );
        assert!(trace.entry_at(&Timestamp::from_elapsed(5)).is_none());
        assert_eq!(
            trace.entry_at(&Timestamp::from_elapsed(99)).map(|e| e.vsync_id),
            Some(3)
        );
    }

    #[test]
    fn entry_for_transaction_matches_vsync() {
        let trace = LayersTrace::new(vec![entry(10, 1), entry(20, 2)]);
        let tx = Transaction {
            id: 77,
            applied_vsync_id: 2,
        };
        assert_eq!(
            trace.entry_for_transaction(&tx).map(|e| e.timestamp),
            Some(Timestamp::from_elapsed(20))
        );
    }

    #[test]
    fn anchor_display_skips_virtual_and_empty() {
        let mut e = entry(0, 0);
        e.displays = vec![
            Display {
                id: 1,
                name: "virtual".into(),
                is_virtual: true,
                layer_stack_space: Rect::from_size(10, 10),
                transform: Transform::IDENTITY,
            },
            Display {
                id: 2,
                name: "off".into(),
                is_virtual: false,
                layer_stack_space: Rect::EMPTY,
                transform: Transform::IDENTITY,
            },
            Display {
                id: 3,
                name: "builtin".into(),
                is_virtual: false,
                layer_stack_space: Rect::from_size(10, 10),
                transform: Transform::IDENTITY,
            },
        ];
        assert_eq!(e.anchor_display().map(|d| d.id), Some(3));
    }

    #[test]
    fn lineage_walks_parents() {
        let mut e = entry(0, 0);
        e.layers = vec![layer(1, None), layer(2, Some(1)), layer(3, Some(2))];
        let leaf = e.layer(3).cloned().expect("leaf layer");
        assert_eq!(e.lineage(&leaf), vec![3, 2, 1]);
    }

    #[test]
    fn lineage_survives_cycles() {
        let mut e = entry(0, 0);
        e.layers = vec![layer(1, Some(2)), layer(2, Some(1))];
        let first = e.layer(1).cloned().expect("layer");
        assert_eq!(e.lineage(&first), vec![1, 2]);
    }
}
