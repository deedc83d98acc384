//! Three-clock timestamps.
//!
//! Every trace entry is stamped with up to three synchronized clock readings
//! for the same instant: monotonic elapsed time, boot-relative uptime and
//! wall-clock time. Any of them may be missing depending on which subsystem
//! produced the trace.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One instant, read from up to three clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Monotonic time since boot, including deep sleep.
    pub elapsed_nanos: Option<i64>,
    /// Monotonic time since boot, excluding deep sleep.
    pub system_uptime_nanos: Option<i64>,
    /// Wall-clock time since the Unix epoch.
    pub unix_nanos: Option<i64>,
}

impl Timestamp {
    /// A timestamp with no clock reading at all.
    pub const EMPTY: Self = Self {
        elapsed_nanos: None,
        system_uptime_nanos: None,
        unix_nanos: None,
    };

    /// A timestamp with every clock set.
    #[inline]
    pub const fn new(elapsed_nanos: i64, system_uptime_nanos: i64, unix_nanos: i64) -> Self {
        Self {
            elapsed_nanos: Some(elapsed_nanos),
            system_uptime_nanos: Some(system_uptime_nanos),
            unix_nanos: Some(unix_nanos),
        }
    }

    /// A timestamp carrying only the elapsed clock.
    #[inline]
    pub const fn from_elapsed(elapsed_nanos: i64) -> Self {
        Self {
            elapsed_nanos: Some(elapsed_nanos),
            system_uptime_nanos: None,
            unix_nanos: None,
        }
    }

    /// The minimum possible timestamp. Field-wise maximum with it is the
    /// identity for any fully set timestamp.
    #[inline]
    pub const fn min() -> Self {
        Self::new(i64::MIN, i64::MIN, i64::MIN)
    }

    /// The maximum possible timestamp.
    #[inline]
    pub const fn max() -> Self {
        Self::new(i64::MAX, i64::MAX, i64::MAX)
    }

    pub const fn has_elapsed_timestamp(&self) -> bool {
        self.elapsed_nanos.is_some()
    }

    pub const fn has_system_uptime_timestamp(&self) -> bool {
        self.system_uptime_nanos.is_some()
    }

    pub const fn has_unix_timestamp(&self) -> bool {
        self.unix_nanos.is_some()
    }

    /// Whether all three clocks are set.
    pub const fn has_all_timestamps(&self) -> bool {
        self.has_elapsed_timestamp()
            && self.has_system_uptime_timestamp()
            && self.has_unix_timestamp()
    }

    /// Field-wise maximum. A field set on only one side keeps that value.
    #[must_use]
    pub fn max_fieldwise(self, other: Self) -> Self {
        Self {
            elapsed_nanos: merge(self.elapsed_nanos, other.elapsed_nanos, i64::max),
            system_uptime_nanos: merge(
                self.system_uptime_nanos,
                other.system_uptime_nanos,
                i64::max,
            ),
            unix_nanos: merge(self.unix_nanos, other.unix_nanos, i64::max),
        }
    }

    /// Field-wise minimum. A field set on only one side keeps that value.
    #[must_use]
    pub fn min_fieldwise(self, other: Self) -> Self {
        Self {
            elapsed_nanos: merge(self.elapsed_nanos, other.elapsed_nanos, i64::min),
            system_uptime_nanos: merge(
                self.system_uptime_nanos,
                other.system_uptime_nanos,
                i64::min,
            ),
            unix_nanos: merge(self.unix_nanos, other.unix_nanos, i64::min),
        }
    }

    /// Compare on the first clock set on both sides, in the order elapsed,
    /// uptime, unix. Returns `None` when no clock is shared.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        [
            (self.elapsed_nanos, other.elapsed_nanos),
            (self.system_uptime_nanos, other.system_uptime_nanos),
            (self.unix_nanos, other.unix_nanos),
        ]
        .into_iter()
        .find_map(|pair| match pair {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        })
    }

    /// `self >= other` on the shared clock; `false` when incomparable.
    pub fn is_at_or_after(&self, other: &Self) -> bool {
        matches!(
            self.compare(other),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }

    /// `self <= other` on the shared clock; `false` when incomparable.
    pub fn is_at_or_before(&self, other: &Self) -> bool {
        matches!(self.compare(other), Some(Ordering::Less | Ordering::Equal))
    }

    /// `self <= other` on every clock set on both sides, and at least one
    /// clock is shared.
    pub fn is_at_or_before_on_all_clocks(&self, other: &Self) -> bool {
        let pairs = [
            (self.elapsed_nanos, other.elapsed_nanos),
            (self.system_uptime_nanos, other.system_uptime_nanos),
            (self.unix_nanos, other.unix_nanos),
        ];
        let mut shared = false;
        for pair in pairs {
            if let (Some(a), Some(b)) = pair {
                shared = true;
                if a > b {
                    return false;
                }
            }
        }
        shared
    }
}

fn merge(a: Option<i64>, b: Option<i64>, pick: fn(i64, i64) -> i64) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field(value: Option<i64>) -> String {
            value.map_or_else(|| "unset".to_owned(), |v| format!("{v}ns"))
        }
        write!(
            f,
            "elapsed={} uptime={} unix={}",
            field(self.elapsed_nanos),
            field(self.system_uptime_nanos),
            field(self.unix_nanos)
        )
    }
}

/// Anything stamped with a [`Timestamp`].
pub trait Timestamped {
    fn timestamp(&self) -> Timestamp;
}

/// Restrict time-ordered entries to `[start, end]`.
///
/// With `keep_initial`, the last entry strictly before `start` is kept as
/// well when no entry sits exactly on `start`, so the state in force at the
/// beginning of the window stays observable. Entries whose timestamp shares
/// no clock with the bounds are dropped.
pub fn slice_entries<T: Timestamped + Clone>(
    entries: &[T],
    start: &Timestamp,
    end: &Timestamp,
    keep_initial: bool,
) -> Vec<T> {
    let mut sliced: Vec<T> = entries
        .iter()
        .filter(|e| {
            let ts = e.timestamp();
            ts.is_at_or_after(start) && ts.is_at_or_before(end)
        })
        .cloned()
        .collect();

    if keep_initial {
        let starts_exactly = sliced
            .first()
            .is_some_and(|e| e.timestamp().compare(start) == Some(Ordering::Equal));
        if !starts_exactly {
            let initial = entries.iter().rev().find(|e| {
                matches!(e.timestamp().compare(start), Some(Ordering::Less))
            });
            if let Some(initial) = initial {
                sliced.insert(0, initial.clone());
            }
        }
    }

    sliced
}
