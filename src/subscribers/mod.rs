//! # Event subscribers.
//!
//! This module provides the [`Handler`] trait, the closure-backed [`HandlerFn`],
//! and [`Subscriber`], which gives a handler its own queue and worker.
//!
//! ## Architecture
//! ```text
//! poller / fire_event
//!     │  (Arc<Event> per name, snapshot of the registry list)
//!     ├──► Subscriber A ─► [queue A] ─► worker A ─► handler_a.handle()
//!     ├──► Subscriber B ─► [queue B] ─► worker B ─► handler_b.handle()
//!     └──► ...
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: A may handle event N while B handles N+5.
//! - **Per-subscriber FIFO**: each subscriber sees its events in dispatch order.
//! - **Non-blocking enqueue**: dispatch never waits on a handler.
//! - **Isolation**: a slow or panicking handler only affects itself.

mod handler;
#[cfg(feature = "logging")]
mod log;
mod subscriber;

pub use handler::{Handler, HandlerFn, HandlerRef};
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::{Subscriber, SubscriberStats};

pub(crate) use subscriber::Delivery;
