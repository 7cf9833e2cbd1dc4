//! # Dedicated execution unit.
//!
//! [`RealtimeThread`] is a named, start-once unit of execution. The poller and each
//! subscriber drain run on their own unit so a slow callback never shares a loop
//! with event detection.
//!
//! ## Rules
//! - `start` may be called once; the second call fails with
//!   [`ThreadError::AlreadyStarted`] and leaves the running task untouched.
//! - There is no cancel: callers stop a unit by making its loop exit
//!   (the poller observes a `CancellationToken`, workers exit on an empty queue).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use rtevent::{RealtimeThread, TokioExecutor, ThreadError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let exec = Arc::new(TokioExecutor::try_current().unwrap());
//! let unit = RealtimeThread::new("demo", exec);
//!
//! unit.start(async {}).unwrap();
//! assert!(matches!(unit.start(async {}), Err(ThreadError::AlreadyStarted { .. })));
//! unit.join().await;
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::task::JoinHandle;

use super::executor::Executor;
use crate::error::ThreadError;

/// Start-once unit of execution running on an [`Executor`].
pub struct RealtimeThread {
    name: Arc<str>,
    exec: Arc<dyn Executor>,
    started: AtomicBool,
    joined: AtomicBool,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeThread {
    /// Creates an unstarted unit.
    pub fn new(name: impl Into<Arc<str>>, exec: Arc<dyn Executor>) -> Self {
        Self {
            name: name.into(),
            exec,
            started: AtomicBool::new(false),
            joined: AtomicBool::new(false),
            join: Mutex::new(None),
        }
    }

    /// Unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Begins running `task`.
    pub fn start<F>(&self, task: F) -> Result<(), ThreadError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ThreadError::AlreadyStarted {
                name: Arc::clone(&self.name),
            });
        }
        let handle = self.exec.spawn(&self.name, task.boxed());
        *self.join.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// True once `start` has succeeded.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// True if the unit was started and its task has completed.
    pub fn is_finished(&self) -> bool {
        self.joined.load(Ordering::Acquire)
            || self
                .join
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_ref()
                .is_some_and(JoinHandle::is_finished)
    }

    /// Waits for the task to complete. Returns immediately if not started or already joined.
    pub async fn join(&self) {
        let handle = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(unit = %self.name, error = %err, "execution unit ended abnormally");
            }
            self.joined.store(true, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for RealtimeThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeThread")
            .field("name", &self.name)
            .field("started", &self.is_started())
            .finish()
    }
}
