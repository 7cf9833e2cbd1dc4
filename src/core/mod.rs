//! Runtime core: registry, poller and dispatch.
//!
//! The public API from this module is [`Controller`] (built through
//! [`ControllerBuilder`]) and its [`Config`].
//!
//! Internal modules:
//! - [`controller`]: registry mutations, poller lifecycle, `fire_event`;
//! - [`poller`]: the fetch loop that owns the resumption cursor;
//! - [`registry`]: name → ordered subscriber lists.

mod builder;
mod config;
mod controller;
mod poller;
mod registry;

pub use builder::ControllerBuilder;
pub use config::Config;
pub use controller::Controller;
