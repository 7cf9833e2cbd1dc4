//! # Event sources.
//!
//! [`EventSource`] is the interface to whatever detects events (hardware, OS,
//! native layer). The controller's poller drives it:
//!
//! ```text
//! first subscriber added ──► cursor.start_at(now), poller spawned
//!
//! loop {
//!   fetch_next(cursor) ─┬─ Ok(Fetched{index, event}) → cursor.advance(index), dispatch
//!                       └─ Err(FetchError)           → nothing this iteration
//! }
//!
//! last subscriber removed ──► interrupt() ──► pending fetch_next returns Err(Interrupted)
//! ```
//!
//! ## Contract
//! - `fetch_next` may wait indefinitely for an event.
//! - `interrupt` must make a waiting `fetch_next` return `Interrupted` promptly.
//!   If no fetch is waiting, the interrupt should apply to the next one.
//! - Resuming from a cursor returned earlier must neither re-deliver nor skip
//!   events the source still holds.
//!
//! [`RingSource`] is the in-memory implementation.

mod cursor;
mod ring;

pub use cursor::Cursor;
pub use ring::{RingConfig, RingSource};

use async_trait::async_trait;

use crate::error::{FetchError, SourceError};
use crate::events::Event;

/// An event returned by a source together with its index.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Source index (strictly increasing per source).
    pub index: u64,
    /// The event.
    pub event: Event,
}

/// Supplier of raw events.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Returns the next event past `cursor`, waiting for one if necessary.
    async fn fetch_next(&self, cursor: Cursor) -> Result<Fetched, FetchError>;

    /// Wakes a pending [`fetch_next`](Self::fetch_next) with `FetchError::Interrupted`.
    fn interrupt(&self);

    /// Injects an event so that it is delivered through the normal poll path.
    ///
    /// Returns the index assigned to the event. Sources that cannot accept
    /// injected events keep the default.
    fn post(&self, event: Event) -> Result<u64, SourceError> {
        let _ = event;
        Err(SourceError::Unsupported)
    }

    /// Source name for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
