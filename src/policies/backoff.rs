//! # Backoff between failed fetches.
//!
//! The poller never surfaces source failures, but a source that fails instantly
//! (closed device, driver error) would otherwise turn the poll loop into a spin.
//! [`BackoffPolicy`] computes the pause before the next fetch from the number of
//! consecutive failures: `first × factor^failures`, clamped to `max`, then jittered.
//! Interrupts and timeouts do not count as failures.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use rtevent::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(10),
//!     max: Duration::from_millis(500),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay(0), Duration::from_millis(10));
//! assert_eq!(backoff.delay(3), Duration::from_millis(80));
//! assert_eq!(backoff.delay(20), Duration::from_millis(500));
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Retry delay policy for the poller.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth per consecutive failure (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied after clamping.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 10ms`, `factor = 2.0`, `max = 1s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(10),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after `failures` previous consecutive failures (0-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let exp = failures.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
