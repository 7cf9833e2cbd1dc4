//! Execution units.
//!
//! - [`Executor`] / [`TokioExecutor`]: the substrate that starts units.
//! - [`RealtimeThread`]: named, start-once unit used by the poller, subscriber
//!   workers and one-shot fire deliveries.

mod executor;
mod thread;

pub use executor::{Executor, TokioExecutor};
pub use thread::RealtimeThread;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
