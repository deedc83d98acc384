//! Locating the platform transition behind a marker.

use std::fmt;

use flicker_types::{CujEntry, Transition, TransitionType};
use tracing::{debug, warn};

use crate::reader::TraceReader;

/// Finds the transition responsible for a marker, if any.
pub trait TransitionMatcher: fmt::Debug + Send + Sync {
    fn get_transition(&self, cuj: &CujEntry, reader: &dyn TraceReader) -> Option<Transition>;
}

/// Never associates a transition; scenarios use marker timestamps only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransitionMatcher;

impl TransitionMatcher for NoTransitionMatcher {
    #[inline]
    fn get_transition(&self, _cuj: &CujEntry, _reader: &dyn TraceReader) -> Option<Transition> {
        None
    }
}

/// Picks the first non-aborted transition of an accepted type dispatched
/// inside the marker's `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTypeMatcher {
    types: Vec<TransitionType>,
}

impl TransitionTypeMatcher {
    pub fn new(types: impl IntoIterator<Item = TransitionType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn types(&self) -> &[TransitionType] {
        &self.types
    }
}

impl TransitionMatcher for TransitionTypeMatcher {
    fn get_transition(&self, cuj: &CujEntry, reader: &dyn TraceReader) -> Option<Transition> {
        let transitions = reader.read_transitions_trace()?;
        let mut candidates = transitions.entries().iter().filter(|t| {
            !t.aborted
                && self.types.contains(&t.transition_type)
                && t.send_time.is_at_or_after(&cuj.start_timestamp)
                && t.send_time.is_at_or_before(&cuj.end_timestamp)
        });

        let chosen = candidates.next()?;
        let extra = candidates.count();
        if extra > 0 {
            warn!(
                target: "flicker.extract",
                cuj = %cuj.cuj,
                transition_id = chosen.id,
                ignored = extra,
                "multiple transitions match marker; using the earliest"
            );
        } else {
            debug!(
                target: "flicker.extract",
                cuj = %cuj.cuj,
                transition_id = chosen.id,
                "matched transition"
            );
        }
        Some(chosen.clone())
    }
}
