//! # Resumption cursor.
//!
//! A [`Cursor`] tells the source where to resume: only events stamped at or after
//! `since` and with an index greater than `last_index` are eligible. Both fields
//! use `None` as the "unset" sentinel.
//!
//! ```text
//! unset ──(poller spawned)─────► since=now, last_index=None
//!       ──(event #7 fetched)──► since=now, last_index=Some(7)
//!       ──(registry empty)────► unset
//! ```

use std::time::Instant;

/// Resumption point passed to [`EventSource::fetch_next`](crate::EventSource::fetch_next).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Earliest eligible event time.
    pub since: Option<Instant>,
    /// Index of the last event returned.
    pub last_index: Option<u64>,
}

impl Cursor {
    /// The unset cursor.
    pub const UNSET: Cursor = Cursor {
        since: None,
        last_index: None,
    };

    /// True if neither field is set.
    pub fn is_unset(&self) -> bool {
        self.since.is_none() && self.last_index.is_none()
    }

    /// Sets `since` to `now` if it is unset.
    pub fn start_at(&mut self, now: Instant) {
        self.since.get_or_insert(now);
    }

    /// Records `index` as the last delivered event.
    ///
    /// Returns the number of indices skipped between the previous and this one.
    pub fn advance(&mut self, index: u64) -> u64 {
        let skipped = match self.last_index {
            Some(last) if index > last => index - last - 1,
            _ => 0,
        };
        self.last_index = Some(index);
        skipped
    }

    /// Resets both fields to unset.
    pub fn reset(&mut self) {
        *self = Cursor::UNSET;
    }

    /// True if an event with `index` stamped at `at` is past this cursor.
    pub fn admits(&self, at: Instant, index: u64) -> bool {
        self.since.is_none_or(|since| at >= since) && self.last_index.is_none_or(|last| index > last)
    }
}
