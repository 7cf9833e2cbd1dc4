//! # Controller configuration.
//!
//! Provides [`Config`], the settings of one [`Controller`](crate::Controller).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the notice bus

use std::borrow::Cow;

use crate::policies::BackoffPolicy;

/// Settings for a controller.
///
/// ## Field semantics
/// - `bus_capacity`: notice ring buffer size (min 1)
/// - `fetch_backoff`: pause before the next fetch after a failed one
/// - `poller_name`: name of the poller execution unit in logs
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the notice broadcast channel.
    ///
    /// Receivers that lag more than `bus_capacity` notices observe `Lagged`.
    pub bus_capacity: usize,

    /// Retry delay policy for `FetchError::Failed` / `FetchError::Closed`.
    ///
    /// Interrupts and timeouts never wait.
    pub fetch_backoff: BackoffPolicy,

    /// Name given to the poller unit.
    pub poller_name: Cow<'static, str>,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// - `bus_capacity = 1024`
    /// - `fetch_backoff = BackoffPolicy::default()` (10ms doubling up to 1s)
    /// - `poller_name = "rtevent-poller"`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            fetch_backoff: BackoffPolicy::default(),
            poller_name: Cow::Borrowed("rtevent-poller"),
        }
    }
}
