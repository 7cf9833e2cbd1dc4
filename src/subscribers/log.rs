//! # LogWriter: handler that traces every event
//!
//! A minimal [`Handler`] that writes each received [`Event`] through
//! `tracing::info!`. Use it for demos or to eyeball what a source produces.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO rtevent: event name="BTN" index=Some(3) payload_len=0
//! INFO rtevent: event name="PWR" index=None payload_len=2
//! ```

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Handler;

/// Event writer handler.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for LogWriter {
    async fn handle(&self, e: &Event) {
        tracing::info!(
            target: "rtevent",
            name = %e.name,
            index = ?e.index,
            payload_len = e.payload.as_ref().map_or(0, |p| p.len()),
            "event"
        );
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
