//! # Controller: registry, poller lifecycle and dispatch.
//!
//! The [`Controller`] owns the name → subscriber registry, at most one poller
//! unit, and the resumption [`Cursor`]. One lock guards all three; subscriber
//! queues have their own locks and are never touched while this one is held
//! for longer than an append.
//!
//! ## Poller lifecycle
//! ```text
//! should_run = !registry.is_empty()        (re-evaluated on every mutation)
//!
//!   false → true, no poller          ─► stamp cursor, spawn poller (fresh token)
//!   poller unit died                 ─► slot reclaimed, respawned if still needed
//!   true  → false, poller running    ─► token.cancel() + source.interrupt()
//!   true again before poller exited  ─► revive: replace the cancelled token
//!
//! poller, after every fetch:
//!   registry empty? ─► cursor.reset(), poller slot cleared, exit
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use rtevent::{Controller, Event, HandlerFn, RingSource, Subscriber};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(RingSource::new());
//! let ctl = Controller::new(source.clone())?;
//!
//! let buttons = Subscriber::new(HandlerFn::arc("buttons", |ev: Event| async move {
//!     println!("{} #{:?}", ev.name(), ev.index);
//! }));
//! ctl.add_subscriber("BTN", &buttons)?;
//! assert!(ctl.is_polling());
//!
//! ctl.remove_subscribers("BTN")?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::builder::ControllerBuilder;
use super::config::Config;
use super::poller::Poller;
use super::registry::Registry;
use crate::error::{ControllerError, ThreadError};
use crate::events::{Bus, Event, Notice, NoticeKind};
use crate::rt::{Executor, RealtimeThread, TokioExecutor};
use crate::source::{Cursor, EventSource};
use crate::subscribers::{Delivery, Subscriber};

/// Coordinator of named subscriptions over one [`EventSource`].
///
/// Cheap to clone; all clones share the same registry and poller. Dropping the
/// last clone stops the poller and discards pending events.
#[derive(Clone)]
pub struct Controller {
    shared: Arc<Shared>,
}

pub(super) struct Shared {
    pub(super) cfg: Config,
    pub(super) source: Arc<dyn EventSource>,
    pub(super) delivery: Delivery,
    state: Mutex<State>,
    me: Weak<Shared>,
}

pub(super) struct State {
    pub(super) registry: Registry,
    pub(super) poller: Option<PollerSlot>,
    pub(super) cursor: Cursor,
}

pub(super) struct PollerSlot {
    pub(super) unit: Arc<RealtimeThread>,
    pub(super) token: CancellationToken,
}

impl Controller {
    /// Starts building a controller over `source`.
    pub fn builder(source: Arc<dyn EventSource>) -> ControllerBuilder {
        ControllerBuilder::new(source)
    }

    /// Creates a controller with default config on the current tokio runtime.
    pub fn new(source: Arc<dyn EventSource>) -> Result<Self, ControllerError> {
        Self::builder(source).build()
    }

    pub(super) fn new_internal(
        cfg: Config,
        source: Arc<dyn EventSource>,
        exec: Option<Arc<dyn Executor>>,
    ) -> Result<Self, ThreadError> {
        let exec = match exec {
            Some(exec) => exec,
            None => Arc::new(TokioExecutor::try_current()?),
        };
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let shared = Arc::new_cyclic(|me| Shared {
            cfg,
            source,
            delivery: Delivery { exec, bus },
            state: Mutex::new(State {
                registry: Registry::default(),
                poller: None,
                cursor: Cursor::UNSET,
            }),
            me: me.clone(),
        });
        Ok(Self { shared })
    }

    /// Registers `sub` under `name` and makes sure the poller runs.
    ///
    /// Registering the same subscriber under the same name again is a no-op.
    pub fn add_subscriber(&self, name: &str, sub: &Arc<Subscriber>) -> Result<(), ControllerError> {
        check_name(name)?;
        let mut state = self.shared.lock();
        if state.registry.insert(name, sub) {
            tracing::debug!(event = name, subscriber = sub.name(), "subscriber added");
        }
        self.shared.reconcile(&mut state);
        Ok(())
    }

    /// Unregisters every subscriber under `name` and discards their pending events.
    ///
    /// Returns how many subscribers were removed (0 if `name` was not registered).
    pub fn remove_subscribers(&self, name: &str) -> Result<usize, ControllerError> {
        check_name(name)?;
        let removed = {
            let mut state = self.shared.lock();
            let removed = state.registry.remove_name(name);
            self.shared.reconcile(&mut state);
            removed
        };
        for sub in &removed {
            self.shared.discard(name, sub);
        }
        if !removed.is_empty() {
            tracing::debug!(event = name, count = removed.len(), "subscribers removed");
        }
        Ok(removed.len())
    }

    /// Unregisters `sub` from `name` and discards its pending events.
    ///
    /// Returns `false` if `sub` was not registered under `name`.
    pub fn remove_subscriber(&self, name: &str, sub: &Arc<Subscriber>) -> Result<bool, ControllerError> {
        check_name(name)?;
        let removed = {
            let mut state = self.shared.lock();
            let removed = state.registry.remove(name, sub);
            self.shared.reconcile(&mut state);
            removed
        };
        if removed {
            self.shared.discard(name, sub);
            tracing::debug!(event = name, subscriber = sub.name(), "subscriber removed");
        }
        Ok(removed)
    }

    /// Delivers `event` to the subscribers registered under its name right now,
    /// bypassing the event source. The cursor is not touched.
    ///
    /// Enqueueing happens on a one-shot execution unit. Returns the number of
    /// targeted subscribers.
    pub fn fire_event(&self, event: Event) -> Result<usize, ControllerError> {
        check_name(event.name())?;
        let targets = self.shared.lock().registry.snapshot(event.name());
        let count = targets.len();

        self.shared.delivery.bus.publish(
            Notice::new(NoticeKind::EventFired)
                .with_event(Arc::clone(&event.name))
                .with_count(count as u64),
        );
        if targets.is_empty() {
            return Ok(0);
        }

        let event = Arc::new(event);
        let ctx = self.shared.delivery.clone();
        let unit = RealtimeThread::new("rtevent-fire", Arc::clone(&ctx.exec));
        unit.start(async move {
            for sub in targets {
                sub.enqueue(Arc::clone(&event), &ctx);
            }
        })?;
        Ok(count)
    }

    /// Injects `event` into the event source so it is delivered through the poller.
    ///
    /// Returns the index the source assigned.
    pub fn post(&self, event: Event) -> Result<u64, ControllerError> {
        check_name(event.name())?;
        Ok(self.shared.source.post(event)?)
    }

    /// Unregisters everything. The poller stops at its next opportunity.
    ///
    /// Returns the number of registrations removed.
    pub fn shutdown(&self) -> usize {
        let all = {
            let mut state = self.shared.lock();
            let all = state.registry.clear();
            self.shared.reconcile(&mut state);
            all
        };
        let mut count = 0;
        for (name, subs) in &all {
            for sub in subs {
                self.shared.discard(name, sub);
                count += 1;
            }
        }
        count
    }

    /// True while a poller unit exists (including one that was asked to stop
    /// and has not exited yet).
    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .poller
            .as_ref()
            .is_some_and(|slot| !slot.unit.is_finished())
    }

    /// Current resumption cursor.
    pub fn cursor(&self) -> Cursor {
        self.shared.lock().cursor
    }

    /// Sorted list of names with at least one subscriber.
    pub fn names(&self) -> Vec<String> {
        self.shared.lock().registry.names()
    }

    /// Number of subscribers registered under `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.shared.lock().registry.count(name)
    }

    /// Receiver for diagnostic notices published after this call.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.shared.delivery.bus.subscribe()
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// The event source this controller polls.
    pub fn source(&self) -> &Arc<dyn EventSource> {
        &self.shared.source
    }
}

impl Shared {
    pub(super) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Aligns the poller with `!registry.is_empty()`.
    fn reconcile(&self, state: &mut State) {
        let should_run = !state.registry.is_empty();
        // A poller that exits normally clears its own slot; a finished unit
        // still in the slot died without doing so.
        if state.poller.as_ref().is_some_and(|slot| slot.unit.is_finished()) {
            tracing::warn!(source = self.source.name(), "poller ended abnormally, slot reclaimed");
            state.poller = None;
            if !should_run {
                state.cursor.reset();
            }
        }
        match (state.poller.as_mut(), should_run) {
            (None, true) => self.spawn_poller(state),
            (Some(slot), true) if slot.token.is_cancelled() => {
                slot.token = CancellationToken::new();
                tracing::debug!("poller revived before exit");
            }
            (Some(slot), false) if !slot.token.is_cancelled() => {
                slot.token.cancel();
                self.source.interrupt();
                tracing::debug!(source = self.source.name(), "poller interrupted: no subscribers left");
                self.delivery
                    .bus
                    .publish(Notice::new(NoticeKind::PollerInterrupted));
            }
            _ => {}
        }
    }

    fn spawn_poller(&self, state: &mut State) {
        // Stamped before the caller regains control, so an event posted right
        // after `add_subscriber` returns is admitted.
        state.cursor.start_at(Instant::now());
        let unit = Arc::new(RealtimeThread::new(
            self.cfg.poller_name.clone(),
            Arc::clone(&self.delivery.exec),
        ));
        let poller = Poller::new(
            self.me.clone(),
            Arc::clone(&self.source),
            self.delivery.clone(),
            self.cfg.fetch_backoff,
        );
        match unit.start(poller.run()) {
            Ok(()) => {
                state.poller = Some(PollerSlot {
                    unit,
                    token: CancellationToken::new(),
                });
                tracing::debug!(source = self.source.name(), "poller started");
                self.delivery
                    .bus
                    .publish(Notice::new(NoticeKind::PollerStarted));
            }
            Err(err) => {
                state.cursor.reset();
                tracing::error!(error = %err, "failed to start poller");
            }
        }
    }

    /// Drains `sub` after it was unregistered from `name`.
    fn discard(&self, name: &str, sub: &Arc<Subscriber>) {
        let discarded = sub.drain();
        if discarded > 0 {
            self.delivery.bus.publish(
                Notice::new(NoticeKind::QueueDiscarded)
                    .with_event(name)
                    .with_subscriber(sub.name())
                    .with_count(discarded as u64),
            );
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = state.poller.take() {
            slot.token.cancel();
            self.source.interrupt();
        }
        for (_, subs) in state.registry.clear() {
            for sub in subs {
                sub.drain();
            }
        }
    }
}

fn check_name(name: &str) -> Result<(), ControllerError> {
    if name.is_empty() {
        return Err(ControllerError::InvalidArgument {
            reason: "empty event name",
        });
    }
    Ok(())
}
