//! Value types shared across the flicker workspace: three-clock timestamps,
//! screen geometry, and the object model of the traces the engine consumes.

pub mod component;
pub mod cuj;
pub mod geometry;
pub mod layers;
pub mod timestamp;
pub mod transition;
pub mod wm;

pub use component::ComponentMatcher;
pub use cuj::{CujEntry, CujTrace, CujType};
pub use geometry::{Rect, Region, Rotation, Transform};
pub use layers::{Display, Layer, LayersTrace, LayersTraceEntry};
pub use timestamp::{Timestamp, Timestamped, slice_entries};
pub use transition::{
    TransactionsTrace, TransactionsTraceEntry, Transaction, TransitMode, Transition,
    TransitionChange, TransitionType, TransitionsTrace,
};
pub use wm::{WindowState, WmDisplay, WmTrace, WmTraceEntry};

/// Names of the trace kinds a reader can provide.
pub mod trace_kind {
    pub const WM: &str = "window manager";
    pub const LAYERS: &str = "layers";
    pub const CUJ: &str = "CUJ";
    pub const TRANSACTIONS: &str = "transactions";
    pub const TRANSITIONS: &str = "transitions";
}
