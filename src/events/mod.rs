//! Events and diagnostic notices.
//!
//! ## Contents
//! - [`Event`] named occurrence routed to subscribers
//! - [`Notice`], [`NoticeKind`] lifecycle facts of the event layer
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast` for notices
//!
//! ## Quick reference
//! - **Event producers**: an [`EventSource`](crate::EventSource) (via the poller)
//!   and [`Controller::fire_event`](crate::Controller::fire_event).
//! - **Notice publishers**: the controller, the poller, subscriber workers.
//! - **Notice consumers**: anything holding [`Controller::notices`](crate::Controller::notices).

mod bus;
mod event;
mod notice;

pub use bus::Bus;
pub use event::Event;
pub use notice::{Notice, NoticeKind};
