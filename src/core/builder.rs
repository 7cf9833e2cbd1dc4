use std::sync::Arc;

use super::{config::Config, controller::Controller};
use crate::{error::ControllerError, rt::Executor, source::EventSource};

/// Builder for constructing a [`Controller`].
pub struct ControllerBuilder {
    source: Arc<dyn EventSource>,
    cfg: Config,
    exec: Option<Arc<dyn Executor>>,
}

impl ControllerBuilder {
    /// Creates a builder over `source` with default configuration.
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            cfg: Config::default(),
            exec: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the executor that runs the poller, subscriber workers and
    /// `fire_event` units.
    ///
    /// Without one, the builder captures the current tokio runtime.
    pub fn with_executor(mut self, exec: Arc<dyn Executor>) -> Self {
        self.exec = Some(exec);
        self
    }

    /// Builds the controller. No execution unit is started until the first
    /// subscriber is registered.
    ///
    /// Fails with `ThreadError::NoRuntime` when no executor was given and the
    /// caller is outside a tokio runtime.
    pub fn build(self) -> Result<Controller, ControllerError> {
        Ok(Controller::new_internal(self.cfg, self.source, self.exec)?)
    }
}
