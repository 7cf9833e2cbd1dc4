//! # Application callback contract.
//!
//! [`Handler`] is the extension point application code implements to receive
//! events. Wrap it in a [`Subscriber`](crate::Subscriber) to register it.
//!
//! ## Contract
//! - `handle` runs on the subscriber's own worker, never on the poller.
//! - It may be slow; that only delays this subscriber's queue.
//! - Events arrive in source order (FIFO per subscriber).
//! - A panic is caught and reported; the next event is still delivered.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use rtevent::{Event, Handler};
//!
//! struct Buttons;
//!
//! #[async_trait]
//! impl Handler for Buttons {
//!     async fn handle(&self, event: &Event) {
//!         println!("button event #{:?}", event.index);
//!     }
//!
//!     fn name(&self) -> &'static str { "buttons" }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of events.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Processes one event.
    async fn handle(&self, event: &Event);

    /// Name used in logs and notices.
    ///
    /// The default is `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bound on pending events for this handler.
    ///
    /// `None` (default) keeps the queue unbounded. With `Some(n)`, an event that
    /// arrives while `n` are pending is dropped for this handler only and an
    /// `EventDropped` notice is published. Values are clamped to at least 1.
    fn queue_capacity(&self) -> Option<usize> {
        None
    }
}

/// Shared handler handle.
pub type HandlerRef = Arc<dyn Handler>;

/// Closure-backed [`Handler`].
///
/// The closure receives an owned (cheaply cloned) [`Event`] and returns a future.
///
/// ```rust
/// use rtevent::{Event, Handler, HandlerFn, HandlerRef};
///
/// let h: HandlerRef = HandlerFn::arc("printer", |ev: Event| async move {
///     println!("{}", ev.name());
/// });
/// assert_eq!(h.name(), "printer");
/// ```
pub struct HandlerFn<F> {
    name: &'static str,
    capacity: Option<usize>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a closure-backed handler.
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            capacity: None,
            f,
        }
    }

    /// Bounds the subscriber queue (see [`Handler::queue_capacity`]).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, event: &Event) {
        (self.f)(event.clone()).await
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn queue_capacity(&self) -> Option<usize> {
        self.capacity
    }
}
