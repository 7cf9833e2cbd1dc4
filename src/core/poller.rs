//! # Poller: the single loop between an [`EventSource`] and the registry.
//!
//! ```text
//! loop {
//!   ├─► lock: registry empty? ─► stop
//!   │         read cursor and token
//!   ├─► select(biased) { token.cancelled() ─► Interrupted, source.fetch_next(cursor) }
//!   │         a panic inside fetch_next counts as FetchError::Failed
//!   ├─► lock: registry empty? ─► stop
//!   │         Ok  ─► cursor.advance(index), snapshot subscribers for name
//!   │         Err ─► Interrupted/Timeout: next iteration
//!   │                Closed/Failed: backoff (cancellable)
//!   └─► unlock, enqueue the event on every snapshotted subscriber
//! }
//!
//! stop = cursor.reset() + poller slot cleared + PollerStopped, under the same lock
//! ```
//!
//! The poller holds only a `Weak` reference to the controller; once the last
//! handle is gone it exits at its next step.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::controller::{Shared, State};
use crate::error::FetchError;
use crate::events::{Event, Notice, NoticeKind};
use crate::policies::BackoffPolicy;
use crate::rt::panic_message;
use crate::source::{Cursor, EventSource, Fetched};
use crate::subscribers::{Delivery, Subscriber};

pub(super) struct Poller {
    shared: Weak<Shared>,
    source: Arc<dyn EventSource>,
    delivery: Delivery,
    backoff: BackoffPolicy,
}

enum Step {
    Stop,
    Next,
    Dispatch(Arc<Event>, Vec<Arc<Subscriber>>),
    Retry(Duration),
}

impl Poller {
    pub(super) fn new(
        shared: Weak<Shared>,
        source: Arc<dyn EventSource>,
        delivery: Delivery,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            shared,
            source,
            delivery,
            backoff,
        }
    }

    pub(super) async fn run(self) {
        let mut failures: u32 = 0;
        loop {
            let Some((cursor, token)) = self.prepare() else {
                return;
            };

            let fetched = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Interrupted),
                res = AssertUnwindSafe(self.source.fetch_next(cursor)).catch_unwind() => {
                    res.unwrap_or_else(|panic| Err(FetchError::Failed {
                        reason: format!("source panicked: {}", panic_message(&*panic)),
                    }))
                }
            };

            match self.settle(fetched, &mut failures) {
                Step::Stop => return,
                Step::Next => {}
                Step::Dispatch(event, targets) => {
                    for sub in targets {
                        sub.enqueue(Arc::clone(&event), &self.delivery);
                    }
                }
                Step::Retry(delay) => {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Returns what the next fetch needs. The cursor was stamped at spawn time.
    fn prepare(&self) -> Option<(Cursor, CancellationToken)> {
        let shared = self.shared.upgrade()?;
        let mut state = shared.lock();
        if self.stop_if_idle(&mut state) {
            return None;
        }
        let token = state.poller.as_ref()?.token.clone();
        Some((state.cursor, token))
    }

    fn settle(&self, fetched: Result<Fetched, FetchError>, failures: &mut u32) -> Step {
        let Some(shared) = self.shared.upgrade() else {
            return Step::Stop;
        };
        let mut state = shared.lock();
        if self.stop_if_idle(&mut state) {
            return Step::Stop;
        }

        match fetched {
            Ok(Fetched { index, event }) => {
                *failures = 0;
                let skipped = state.cursor.advance(index);
                if skipped > 0 {
                    tracing::warn!(event = %event.name, index, skipped, "source skipped events");
                    self.delivery.bus.publish(
                        Notice::new(NoticeKind::EventsSkipped)
                            .with_event(Arc::clone(&event.name))
                            .with_count(skipped),
                    );
                }
                let targets = state.registry.snapshot(event.name());
                if targets.is_empty() {
                    tracing::trace!(event = %event.name, index, "no subscribers for event");
                    return Step::Next;
                }
                Step::Dispatch(Arc::new(event.with_index(index)), targets)
            }
            Err(err) if !err.needs_backoff() => {
                tracing::debug!(error = %err, "fetch returned no event");
                Step::Next
            }
            Err(err) => {
                let delay = self.backoff.delay(*failures);
                *failures = failures.saturating_add(1);
                tracing::warn!(
                    source = self.source.name(),
                    error = %err,
                    failures = *failures,
                    delay_ms = delay.as_millis() as u64,
                    "fetch failed"
                );
                self.delivery.bus.publish(
                    Notice::new(NoticeKind::FetchFailed)
                        .with_reason(err.as_label())
                        .with_count(u64::from(*failures)),
                );
                Step::Retry(delay)
            }
        }
    }

    /// Exit procedure; must run under the controller lock so that a concurrent
    /// `add_subscriber` either sees the slot cleared or keeps this poller alive.
    fn stop_if_idle(&self, state: &mut State) -> bool {
        if !state.registry.is_empty() {
            return false;
        }
        state.cursor.reset();
        state.poller = None;
        tracing::debug!(source = self.source.name(), "poller stopped");
        self.delivery
            .bus
            .publish(Notice::new(NoticeKind::PollerStopped));
        true
    }
}
