//! Shell transitions and compositor transactions.

use serde::{Deserialize, Serialize};

use crate::timestamp::{Timestamp, Timestamped, slice_entries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionType {
    Open,
    Close,
    ToFront,
    ToBack,
    Change,
}

/// What a transition does to one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitMode {
    Open,
    Close,
    ToFront,
    ToBack,
    Change,
}

impl TransitMode {
    /// Participant is being shown.
    pub const fn is_opening(self) -> bool {
        matches!(self, Self::Open | Self::ToFront)
    }

    /// Participant is being hidden.
    pub const fn is_closing(self) -> bool {
        matches!(self, Self::Close | Self::ToBack)
    }
}

/// One participant of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionChange {
    pub mode: TransitMode,
    pub layer_id: i32,
    pub window_id: i32,
}

/// A platform transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: i32,
    pub transition_type: TransitionType,
    pub send_time: Timestamp,
    pub finish_time: Timestamp,
    pub start_transaction_id: u64,
    pub finish_transaction_id: u64,
    pub changes: Vec<TransitionChange>,
    pub aborted: bool,
}

impl Transition {
    /// The transaction that finished this transition, if it was traced.
    pub fn finish_transaction(&self, transactions: &TransactionsTrace) -> Option<Transaction> {
        transactions.find(self.finish_transaction_id)
    }

    pub fn opening_changes(&self) -> impl Iterator<Item = &TransitionChange> {
        self.changes.iter().filter(|c| c.mode.is_opening())
    }

    pub fn closing_changes(&self) -> impl Iterator<Item = &TransitionChange> {
        self.changes.iter().filter(|c| c.mode.is_closing())
    }
}

/// Transitions in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionsTrace {
    pub entries: Vec<Transition>,
}

impl TransitionsTrace {
    pub const fn new(entries: Vec<Transition>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Transition] {
        &self.entries
    }

    /// Transitions that overlap `[start, end]`.
    #[must_use]
    pub fn slice(&self, start: &Timestamp, end: &Timestamp) -> Self {
        Self::new(
            self.entries
                .iter()
                .filter(|t| {
                    let finish = if t.finish_time == Timestamp::EMPTY {
                        t.send_time
                    } else {
                        t.finish_time
                    };
                    finish.is_at_or_after(start) && t.send_time.is_at_or_before(end)
                })
                .cloned()
                .collect(),
        )
    }
}

/// A compositor transaction, resolved to the vsync that applied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub applied_vsync_id: i64,
}

/// Transactions applied together on one vsync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsTraceEntry {
    pub timestamp: Timestamp,
    pub vsync_id: i64,
    pub transaction_ids: Vec<u64>,
}

impl Timestamped for TransactionsTraceEntry {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionsTrace {
    pub entries: Vec<TransactionsTraceEntry>,
}

impl TransactionsTrace {
    pub const fn new(entries: Vec<TransactionsTraceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TransactionsTraceEntry] {
        &self.entries
    }

    /// Resolve a transaction id to the vsync that applied it.
    pub fn find(&self, id: u64) -> Option<Transaction> {
        self.entries
            .iter()
            .find(|e| e.transaction_ids.contains(&id))
            .map(|e| Transaction {
                id,
                applied_vsync_id: e.vsync_id,
            })
    }

    #[must_use]
    pub fn slice(&self, start: &Timestamp, end: &Timestamp) -> Self {
        Self::new(slice_entries(&self.entries, start, end, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(changes: Vec<TransitionChange>) -> Transition {
        Transition {
            id: 1,
            transition_type: TransitionType::Open,
            send_time: Timestamp::from_elapsed(10),
            finish_time: Timestamp::from_elapsed(50),
            start_transaction_id: 100,
            finish_transaction_id: 101,
            changes,
            aborted: false,
        }
    }

    #[test]
    fn finish_transaction_resolves_applied_vsync() {
        let transactions = TransactionsTrace::new(vec![
            TransactionsTraceEntry {
                timestamp: Timestamp::from_elapsed(12),
                vsync_id: 3,
                transaction_ids: vec![100],
            },
            TransactionsTraceEntry {
                timestamp: Timestamp::from_elapsed(55),
                vsync_id: 9,
                transaction_ids: vec![7, 101],
            },
        ]);
        let tx = transition(vec![])
            .finish_transaction(&transactions)
            .expect("finish transaction traced");
        assert_eq!(tx.applied_vsync_id, 9);
        assert!(transactions.find(555).is_none());
    }

    #[test]
    fn changes_split_by_mode() {
        let t = transition(vec![
            TransitionChange {
                mode: TransitMode::Open,
                layer_id: 1,
                window_id: 11,
            },
            TransitionChange {
                mode: TransitMode::ToBack,
                layer_id: 2,
                window_id: 22,
            },
            TransitionChange {
                mode: TransitMode::Change,
                layer_id: 3,
                window_id: 33,
            },
        ]);
        assert_eq!(
            t.opening_changes().map(|c| c.layer_id).collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(
            t.closing_changes().map(|c| c.layer_id).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn slice_keeps_overlapping_transitions() {
        let trace = TransitionsTrace::new(vec![transition(vec![])]);
        assert_eq!(
            trace
                .slice(&Timestamp::from_elapsed(40), &Timestamp::from_elapsed(60))
                .entries
                .len(),
            1
        );
        assert!(
            trace
                .slice(&Timestamp::from_elapsed(51), &Timestamp::from_elapsed(60))
                .entries
                .is_empty()
        );
    }
}
