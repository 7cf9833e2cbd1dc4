//! # Named events delivered to subscribers.
//!
//! An [`Event`] is a name plus optional payload supplied by the event source.
//! Routing is by name only; the controller never compares events by identity.
//!
//! Once dispatched an event is shared as `Arc<Event>` between the queues of all
//! subscribers registered under its name.
//!
//! ## Example
//! ```rust
//! use rtevent::Event;
//!
//! let ev = Event::new("BTN").with_payload(&b"pressed"[..]);
//!
//! assert_eq!(ev.name(), "BTN");
//! assert_eq!(ev.payload.as_deref(), Some(&b"pressed"[..]));
//! assert!(ev.is_fired());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Event with a name and optional source-populated payload.
#[derive(Clone)]
pub struct Event {
    /// Event name used for registry lookup.
    pub name: Arc<str>,
    /// Wall-clock creation timestamp (for logs).
    pub at: SystemTime,
    /// Source index, stamped by the poller. `None` for events delivered via
    /// [`Controller::fire_event`](crate::Controller::fire_event).
    pub index: Option<u64>,
    /// Opaque payload bytes.
    pub payload: Option<Arc<[u8]>>,
}

impl Event {
    /// Creates an event with the given name and the current timestamp.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            at: SystemTime::now(),
            index: None,
            payload: None,
        }
    }

    /// Returns the event name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_payload(mut self, payload: impl Into<Arc<[u8]>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attaches the source index.
    #[inline]
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// Overrides the creation timestamp.
    #[inline]
    pub fn with_time(mut self, at: SystemTime) -> Self {
        self.at = at;
        self
    }

    /// True if the event did not come through the event source.
    #[inline]
    pub fn is_fired(&self) -> bool {
        self.index.is_none()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("payload_len", &self.payload.as_ref().map(|p| p.len()))
            .finish()
    }
}
