//! # Diagnostic notices emitted by the controller and subscriber workers.
//!
//! [`NoticeKind`] classifies lifecycle facts of the event layer; [`Notice`] carries
//! the metadata (event name, subscriber, reason, counters).
//!
//! Notices are not events: they never reach [`Handler`](crate::Handler)s and exist
//! for observability and tests only.
//!
//! ## Ordering
//! Each notice has a globally unique sequence number (`seq`) that increases
//! monotonically. Use it to restore order across receivers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for notices.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    // === Poller lifecycle ===
    /// Poller execution unit was spawned (registry became non-empty).
    PollerStarted,

    /// Poller exited (registry found empty); the cursor was reset.
    PollerStopped,

    /// The poller was asked to stop: token cancelled and source interrupted.
    PollerInterrupted,

    /// A fetch failed; the next one is delayed.
    ///
    /// Sets:
    /// - `reason`: error label
    /// - `count`: consecutive failures so far
    FetchFailed,

    /// The source returned an index past `last_index + 1`.
    ///
    /// Sets:
    /// - `event`: name of the event that revealed the gap
    /// - `count`: number of indices skipped
    EventsSkipped,

    // === Delivery ===
    /// An event was delivered through `fire_event`.
    ///
    /// Sets:
    /// - `event`: event name
    /// - `count`: number of targeted subscribers
    EventFired,

    /// A bounded subscriber queue was full; the new event was dropped for it.
    ///
    /// Sets:
    /// - `event`: event name
    /// - `subscriber`: handler name
    EventDropped,

    /// Pending events were discarded when a subscriber was unregistered.
    ///
    /// Sets:
    /// - `event`: name the subscriber was removed from
    /// - `subscriber`: handler name
    /// - `count`: number of discarded events
    QueueDiscarded,

    /// A handler panicked; its worker continues with the next event.
    ///
    /// Sets:
    /// - `event`: event name
    /// - `subscriber`: handler name
    /// - `reason`: panic message
    HandlerPanicked,
}

/// Diagnostic record with optional metadata.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: NoticeKind,
    /// Event name, if applicable.
    pub event: Option<Arc<str>>,
    /// Handler name, if applicable.
    pub subscriber: Option<&'static str>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Counter whose meaning depends on `kind`.
    pub count: Option<u64>,
}

impl Notice {
    /// Creates a notice of the given kind with the current timestamp and next sequence number.
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            event: None,
            subscriber: None,
            reason: None,
            count: None,
        }
    }

    #[inline]
    pub fn with_event(mut self, name: impl Into<Arc<str>>) -> Self {
        self.event = Some(name.into());
        self
    }

    #[inline]
    pub fn with_subscriber(mut self, name: &'static str) -> Self {
        self.subscriber = Some(name);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Creates a handler panic notice.
    pub(crate) fn handler_panicked(subscriber: &'static str, event: &Arc<str>, info: String) -> Self {
        Notice::new(NoticeKind::HandlerPanicked)
            .with_subscriber(subscriber)
            .with_event(Arc::clone(event))
            .with_reason(info)
    }

    /// Creates a dropped-event notice for a full bounded queue.
    pub(crate) fn event_dropped(subscriber: &'static str, event: &Arc<str>) -> Self {
        Notice::new(NoticeKind::EventDropped)
            .with_subscriber(subscriber)
            .with_event(Arc::clone(event))
            .with_reason("queue full")
    }
}
