//! # rtevent
//!
//! **rtevent** is an asynchronous event-notification layer. Clients subscribe
//! handlers to named events; a single poller pulls events from an
//! [`EventSource`] and hands each one to every subscriber registered under its
//! name. Every subscriber has its own FIFO queue drained by its own execution
//! unit, so a slow handler never holds back the poller or other subscribers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   client code                                   EventSource (RingSource, native, ...)
//!      │ add_subscriber / remove_subscriber(s)           ▲ fetch_next(cursor)   ▲ post(ev)
//!      │ fire_event                                      │ interrupt()          │
//!      ▼                                                 │                      │
//! ┌──────────────────────────────────────────────────────┴──────────────────────┴───┐
//! │  Controller                                                                     │
//! │  - Registry (name → [Subscriber] in insertion order)                            │
//! │  - Poller slot (at most one, alive iff the registry is non-empty)               │
//! │  - Cursor (since, last_index) owned by the poller                               │
//! │  - Bus (diagnostic notices)                                                     │
//! └──────┬──────────────────────────┬───────────────────────────┬───────────────────┘
//!        ▼                          ▼                           ▼
//!   Subscriber A               Subscriber B                Subscriber C
//!   [queue] ─► worker A        [queue] ─► worker B         [queue] ─► worker C
//!        ▼                          ▼                           ▼
//!   handler.handle(&ev)        handler.handle(&ev)         handler.handle(&ev)
//! ```
//!
//! ### Poller lifecycle
//! ```text
//! registry empty → non-empty  ─► cursor.start_at(now), spawn poller
//! registry non-empty → empty  ─► cancel token + source.interrupt()
//!
//! loop {
//!   ├─► fetch_next(cursor)
//!   │       ├─ Ok  ─► cursor.advance(index) ─► enqueue on each subscriber of name
//!   │       └─ Err ─► Interrupted/Timeout: retry, Failed/Closed: backoff
//!   └─► registry empty ─► cursor.reset(), exit
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                         |
//! |-------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Controller**    | Registry, poller lifecycle, direct firing.               | [`Controller`], [`ControllerBuilder`]      |
//! | **Subscribers**   | Handlers with private queues and lazy workers.           | [`Handler`], [`HandlerFn`], [`Subscriber`] |
//! | **Sources**       | Where events come from and how polling resumes.          | [`EventSource`], [`RingSource`], [`Cursor`]|
//! | **Execution**     | Named one-shot units on a pluggable executor.            | [`RealtimeThread`], [`Executor`]           |
//! | **Diagnostics**   | Lifecycle notices over a broadcast bus.                  | [`Notice`], [`NoticeKind`]                 |
//! | **Errors**        | Typed errors for every fallible operation.               | [`ControllerError`], [`FetchError`]        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] handler _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use rtevent::{Controller, Event, HandlerFn, RingSource, Subscriber};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(RingSource::new());
//!     let ctl = Controller::new(source.clone())?;
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     let buttons = Subscriber::new(HandlerFn::arc("buttons", move |ev: Event| {
//!         let tx = tx.clone();
//!         async move {
//!             let _ = tx.send(ev.index);
//!         }
//!     }));
//!     ctl.add_subscriber("BTN", &buttons)?;
//!     ctl.post(Event::new("BTN"))?;
//!     assert_eq!(rx.recv().await, Some(Some(0)));
//!
//!     ctl.shutdown();
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod rt;
mod source;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Config, Controller, ControllerBuilder};
pub use error::{ControllerError, FetchError, SourceError, ThreadError};
pub use events::{Bus, Event, Notice, NoticeKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use rt::{Executor, RealtimeThread, TokioExecutor};
pub use source::{Cursor, EventSource, Fetched, RingConfig, RingSource};
pub use subscribers::{Handler, HandlerFn, HandlerRef, Subscriber, SubscriberStats};

// Optional: expose a simple built-in logger handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
