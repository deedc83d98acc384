//! Trace reader seam.
//!
//! Parsing trace files is the caller's concern. The engine only needs typed
//! access to each trace kind and the ability to restrict a reader to a time
//! window. An absent trace (`None`) is distinct from a present but empty one.

use std::fmt;

use flicker_types::{
    CujTrace, LayersTrace, Timestamp, TransactionsTrace, TransitionsTrace, WmTrace,
};

/// Typed access to the traces captured for one run.
pub trait TraceReader: fmt::Debug + Send + Sync {
    fn read_wm_trace(&self) -> Option<&WmTrace>;

    fn read_layers_trace(&self) -> Option<&LayersTrace>;

    fn read_cuj_trace(&self) -> Option<&CujTrace>;

    fn read_transactions_trace(&self) -> Option<&TransactionsTrace>;

    fn read_transitions_trace(&self) -> Option<&TransitionsTrace>;

    /// A reader restricted to `[start, end]`.
    fn slice(&self, start: &Timestamp, end: &Timestamp) -> Box<dyn TraceReader>;
}

/// Reader over traces already held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryReader {
    wm: Option<WmTrace>,
    layers: Option<LayersTrace>,
    cuj: Option<CujTrace>,
    transactions: Option<TransactionsTrace>,
    transitions: Option<TransitionsTrace>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_wm_trace(mut self, trace: WmTrace) -> Self {
        self.wm = Some(trace);
        self
    }

    #[must_use]
    pub fn with_layers_trace(mut self, trace: LayersTrace) -> Self {
        self.layers = Some(trace);
        self
    }

    #[must_use]
    pub fn with_cuj_trace(mut self, trace: CujTrace) -> Self {
        self.cuj = Some(trace);
        self
    }

    #[must_use]
    pub fn with_transactions_trace(mut self, trace: TransactionsTrace) -> Self {
        self.transactions = Some(trace);
        self
    }

    #[must_use]
    pub fn with_transitions_trace(mut self, trace: TransitionsTrace) -> Self {
        self.transitions = Some(trace);
        self
    }

    /// Concrete slice, for callers that want to keep the in-memory type.
    #[must_use]
    pub fn sliced(&self, start: &Timestamp, end: &Timestamp) -> Self {
        Self {
            wm: self.wm.as_ref().map(|t| t.slice(start, end)),
            layers: self.layers.as_ref().map(|t| t.slice(start, end)),
            cuj: self.cuj.as_ref().map(|t| t.slice(start, end)),
            transactions: self.transactions.as_ref().map(|t| t.slice(start, end)),
            transitions: self.transitions.as_ref().map(|t| t.slice(start, end)),
        }
    }
}

impl TraceReader for InMemoryReader {
    fn read_wm_trace(&self) -> Option<&WmTrace> {
        self.wm.as_ref()
    }

    fn read_layers_trace(&self) -> Option<&LayersTrace> {
        self.layers.as_ref()
    }

    fn read_cuj_trace(&self) -> Option<&CujTrace> {
        self.cuj.as_ref()
    }

    fn read_transactions_trace(&self) -> Option<&TransactionsTrace> {
        self.transactions.as_ref()
    }

    fn read_transitions_trace(&self) -> Option<&TransitionsTrace> {
        self.transitions.as_ref()
    }

    fn slice(&self, start: &Timestamp, end: &Timestamp) -> Box<dyn TraceReader> {
        Box::new(self.sliced(start, end))
    }
}
