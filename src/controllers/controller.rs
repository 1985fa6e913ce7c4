//! # Controller abstraction.
//!
//! A [`Controller`] has a stable [`name`](Controller::name) and a blocking
//! async [`start`](Controller::start) that runs until its stop token fires.
//!
//! Dependencies are pushed in before `start` through two optional
//! capabilities. A controller opts in by returning `Some(self)` from
//! [`Controller::config_sink`] / [`Controller::informers_sink`]; the default
//! is to opt out, and the injector skips it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::deps::{InformersRef, RestConfig};
use crate::error::ControllerError;

/// Accepts the connection configuration.
pub trait InjectConfig: Send + Sync {
    fn inject_config(&self, config: Arc<RestConfig>);
}

/// Accepts the watch subsystem.
pub trait InjectInformers: Send + Sync {
    fn inject_informers(&self, informers: InformersRef);
}

/// # Long-running reconciliation unit.
///
/// # Example
/// ```
/// use std::sync::{Arc, OnceLock};
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use ctrlvisor::{Controller, ControllerError, InjectConfig, RestConfig};
///
/// #[derive(Default)]
/// struct Replicas {
///     config: OnceLock<Arc<RestConfig>>,
/// }
///
/// impl InjectConfig for Replicas {
///     fn inject_config(&self, config: Arc<RestConfig>) {
///         let _ = self.config.set(config);
///     }
/// }
///
/// #[async_trait]
/// impl Controller for Replicas {
///     fn name(&self) -> &str { "replicas" }
///
///     fn config_sink(&self) -> Option<&dyn InjectConfig> { Some(self) }
///
///     async fn start(&self, stop: CancellationToken) -> Result<(), ControllerError> {
///         stop.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    /// Returns a stable, human-readable controller name.
    fn name(&self) -> &str;

    /// Runs until `stop` fires (returns `Ok`) or the controller fails.
    ///
    /// Implementations must return promptly once `stop` is cancelled.
    async fn start(&self, stop: CancellationToken) -> Result<(), ControllerError>;

    /// Opt-in for configuration injection.
    fn config_sink(&self) -> Option<&dyn InjectConfig> {
        None
    }

    /// Opt-in for informers injection.
    fn informers_sink(&self) -> Option<&dyn InjectInformers> {
        None
    }
}

/// Shared controller handle.
pub type ControllerRef = Arc<dyn Controller>;
