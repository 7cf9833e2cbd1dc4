//! # Execution substrate.
//!
//! [`Executor`] is the seam through which the event layer starts its units of
//! execution (the poller, subscriber workers, one-shot fire units). The default
//! [`TokioExecutor`] spawns onto a `tokio` runtime handle; pass the handle of a
//! dedicated runtime to keep event delivery off the application's worker threads.

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::ThreadError;

/// Starts independent units of execution.
pub trait Executor: Send + Sync + 'static {
    /// Spawns `task` as a new unit. `name` identifies the unit in logs.
    fn spawn(&self, name: &str, task: BoxFuture<'static, ()>) -> JoinHandle<()>;
}

/// Executor backed by a `tokio` runtime handle.
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    /// Creates an executor that spawns onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates an executor for the runtime the caller is running in.
    pub fn try_current() -> Result<Self, ThreadError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| ThreadError::NoRuntime)
    }
}

impl Executor for TokioExecutor {
    fn spawn(&self, name: &str, task: BoxFuture<'static, ()>) -> JoinHandle<()> {
        tracing::trace!(unit = name, "spawning execution unit");
        self.handle.spawn(task)
    }
}
