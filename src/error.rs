//! Error types used by the controller, the execution units and event sources.
//!
//! - [`ControllerError`]: rejected registry calls (surfaced to the caller).
//! - [`ThreadError`]: execution unit misuse or a missing runtime.
//! - [`FetchError`]: outcome of a source fetch that produced no event; recovered
//!   inside the poller and never surfaced to application code.
//! - [`SourceError`]: rejected injection into an event source.
//!
//! Every enum provides `as_label` (stable snake_case for logs/notices).

use std::sync::Arc;

use thiserror::Error;

/// # Errors returned by [`Controller`](crate::Controller) operations.
///
/// A call that returns an error performs no partial mutation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// An argument was rejected (e.g. an empty event name).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },

    /// The event source refused an injected event.
    #[error("event source rejected event: {0}")]
    Source(#[from] SourceError),

    /// An execution unit could not be created or started.
    #[error("execution unit failure: {0}")]
    Thread(#[from] ThreadError),
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use rtevent::ControllerError;
    ///
    /// let err = ControllerError::InvalidArgument { reason: "empty event name" };
    /// assert_eq!(err.as_label(), "controller_invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::InvalidArgument { .. } => "controller_invalid_argument",
            ControllerError::Source(_) => "controller_source_rejected",
            ControllerError::Thread(_) => "controller_thread_failure",
        }
    }
}

/// # Errors produced by [`RealtimeThread`](crate::RealtimeThread) and executors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// `start` was called on a unit that has already been started (illegal state).
    #[error("execution unit '{name}' already started")]
    AlreadyStarted {
        /// Name of the unit.
        name: Arc<str>,
    },

    /// No executor was supplied and no tokio runtime is current.
    #[error("no tokio runtime available to run execution units")]
    NoRuntime,
}

impl ThreadError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ThreadError::AlreadyStarted { .. } => "thread_illegal_state",
            ThreadError::NoRuntime => "thread_no_runtime",
        }
    }
}

/// # Reasons a fetch returned without an event.
///
/// The poller treats every variant as "no event this iteration".
/// `Failed` and `Closed` additionally delay the next fetch by the configured
/// [`BackoffPolicy`](crate::BackoffPolicy).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The wait was interrupted (`EventSource::interrupt` or poller cancellation).
    #[error("fetch interrupted")]
    Interrupted,

    /// The source gave up waiting without an event.
    #[error("fetch timed out")]
    Timeout,

    /// The source is closed and will not produce events.
    #[error("event source closed")]
    Closed,

    /// Any other source failure.
    #[error("fetch failed: {reason}")]
    Failed {
        /// Source-provided description.
        reason: String,
    },
}

impl FetchError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Interrupted => "fetch_interrupted",
            FetchError::Timeout => "fetch_timeout",
            FetchError::Closed => "fetch_closed",
            FetchError::Failed { .. } => "fetch_failed",
        }
    }

    /// True for outcomes that warrant a retry delay before the next fetch.
    pub fn needs_backoff(&self) -> bool {
        matches!(self, FetchError::Closed | FetchError::Failed { .. })
    }
}

/// # Errors returned when injecting an event into a source.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source does not accept injected events.
    #[error("event injection not supported by this source")]
    Unsupported,

    /// The event name does not fit the source's constraints.
    #[error("invalid event name {name:?}: {reason}")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Constraint that was violated.
        reason: &'static str,
    },

    /// The source is closed.
    #[error("event source closed")]
    Closed,
}

impl SourceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SourceError::Unsupported => "source_unsupported",
            SourceError::InvalidName { .. } => "source_invalid_name",
            SourceError::Closed => "source_closed",
        }
    }
}
