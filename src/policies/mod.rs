//! Poller retry policies.
//!
//! - [`BackoffPolicy`] pause before the next fetch after consecutive failures
//! - [`JitterPolicy`] randomization of that pause
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=10ms, factor=2.0, max=1s, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
