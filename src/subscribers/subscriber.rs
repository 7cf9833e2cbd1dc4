//! # Subscriber: private queue plus lazily started serial drain.
//!
//! A [`Subscriber`] owns a FIFO of pending events for one [`Handler`] and starts a
//! worker unit only while that FIFO is non-empty.
//!
//! ## Architecture
//! ```text
//! Controller ── enqueue(ev) ──► [pending: VecDeque] ──► worker ──► handler.handle(&ev)
//!                  │                   ▲                   │
//!                  └─ start worker     └── pop under lock ─┘  (lock released during handle)
//!                     if none running
//!
//! worker exits when it finds the queue empty (and marks "no worker" under the same lock)
//! ```
//!
//! ## Rules
//! - `enqueue` never waits on the handler; with no capacity set it always succeeds.
//! - FIFO per subscriber; the lock is never held while `handle` runs.
//! - `drain` discards everything not yet dequeued; an event already inside `handle`
//!   completes normally.
//! - Panics inside `handle` are caught; the worker moves on to the next event.
//!
//! One `Subscriber` may be registered under several names; it still has a single
//! queue, so its events stay in the order they were dispatched.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;

use super::handler::{Handler, HandlerRef};
use crate::events::{Bus, Event, Notice};
use crate::rt::{Executor, RealtimeThread, panic_message};

/// Everything a subscriber needs from its controller to deliver an event.
#[derive(Clone)]
pub(crate) struct Delivery {
    pub exec: Arc<dyn Executor>,
    pub bus: Bus,
}

/// Outcome of [`Subscriber::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enqueued {
    /// Appended; a worker was already draining.
    Queued,
    /// Appended and a new worker was started.
    Started,
    /// Bounded queue was full; the event was dropped for this subscriber.
    Dropped,
}

/// Delivery counters of one subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberStats {
    /// Events for which `handle` returned.
    pub delivered: u64,
    /// Events for which `handle` panicked.
    pub panicked: u64,
    /// Events rejected by a full bounded queue.
    pub dropped: u64,
    /// Pending events discarded by unregistration.
    pub discarded: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    panicked: AtomicU64,
    dropped: AtomicU64,
    discarded: AtomicU64,
}

struct Queue {
    pending: VecDeque<Arc<Event>>,
    /// Present iff a drain is running.
    worker: Option<Arc<RealtimeThread>>,
}

/// Registered consumer of events with its own serial delivery queue.
///
/// Registration identity is the `Arc` pointer: registering the same
/// `Arc<Subscriber>` twice under one name is a no-op.
pub struct Subscriber {
    handler: HandlerRef,
    capacity: Option<usize>,
    queue: Mutex<Queue>,
    counters: Counters,
}

impl Subscriber {
    /// Wraps a shared handler.
    pub fn new(handler: HandlerRef) -> Arc<Self> {
        let capacity = handler.queue_capacity().map(|c| c.max(1));
        Arc::new(Self {
            handler,
            capacity,
            queue: Mutex::new(Queue {
                pending: VecDeque::new(),
                worker: None,
            }),
            counters: Counters::default(),
        })
    }

    /// Wraps an owned handler.
    pub fn from_handler<H: Handler>(handler: H) -> Arc<Self> {
        Self::new(Arc::new(handler))
    }

    /// Handler name.
    pub fn name(&self) -> &'static str {
        self.handler.name()
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Queue bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Events waiting to be handled (excludes one currently inside `handle`).
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// True while a worker is draining the queue.
    pub fn is_draining(&self) -> bool {
        self.lock().worker.is_some()
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> SubscriberStats {
        SubscriberStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }

    /// Appends `event` and makes sure a worker is draining.
    pub(crate) fn enqueue(self: &Arc<Self>, event: Arc<Event>, ctx: &Delivery) -> Enqueued {
        let mut queue = self.lock();

        if self.capacity.is_some_and(|cap| queue.pending.len() >= cap) {
            drop(queue);
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(subscriber = self.name(), event = %event.name, "queue full, event dropped");
            ctx.bus.publish(Notice::event_dropped(self.name(), &event.name));
            return Enqueued::Dropped;
        }

        queue.pending.push_back(event);
        if queue.worker.is_some() {
            return Enqueued::Queued;
        }

        let unit = Arc::new(RealtimeThread::new(
            format!("rtevent-sub-{}", self.name()),
            Arc::clone(&ctx.exec),
        ));
        match unit.start(run_worker(Arc::clone(self), ctx.bus.clone())) {
            Ok(()) => {
                queue.worker = Some(unit);
                Enqueued::Started
            }
            Err(err) => {
                // Events stay queued; the next enqueue retries with a fresh unit.
                tracing::error!(subscriber = self.name(), error = %err, "failed to start worker");
                Enqueued::Queued
            }
        }
    }

    /// Discards all pending events. Returns how many were discarded.
    pub(crate) fn drain(&self) -> usize {
        let discarded = {
            let mut queue = self.lock();
            let n = queue.pending.len();
            queue.pending.clear();
            n
        };
        if discarded > 0 {
            self.counters
                .discarded
                .fetch_add(discarded as u64, Ordering::Relaxed);
            tracing::debug!(subscriber = self.name(), discarded, "pending events discarded");
        }
        discarded
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("name", &self.name())
            .field("capacity", &self.capacity)
            .field("pending", &self.pending())
            .finish()
    }
}

/// Worker body: pop, handle, repeat until the queue is found empty.
async fn run_worker(sub: Arc<Subscriber>, bus: Bus) {
    loop {
        let event = {
            let mut queue = sub.lock();
            match queue.pending.pop_front() {
                Some(event) => event,
                None => {
                    queue.worker = None;
                    return;
                }
            }
        };

        let fut = sub.handler.handle(event.as_ref());
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(()) => {
                sub.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(panic) => {
                let info = panic_message(&*panic);
                sub.counters.panicked.fetch_add(1, Ordering::Relaxed);
                tracing::error!(subscriber = sub.name(), event = %event.name, panic = %info, "handler panicked");
                bus.publish(Notice::handler_panicked(sub.name(), &event.name, info));
            }
        }
    }
}
