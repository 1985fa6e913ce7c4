//! Error types used by the manager, controllers and the config loader.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`]: the API-server connection configuration could not be resolved.
//! - [`ControllerError`]: raised by a controller's own `start`.
//! - [`ManagerError`]: returned by [`Manager::start`](crate::Manager::start).
//!
//! All of them provide `as_label` for logs/metrics.

use std::sync::Arc;

use thiserror::Error;

/// # Errors produced while resolving the connection configuration.
///
/// Captured once during lazy initialization and replayed to every later
/// `start` call, so the type is `Clone` and keeps messages rather than the
/// underlying `kube` errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No kubeconfig and no usable in-cluster environment were found.
    #[error("no API server configuration found ({error})")]
    NotFound {
        /// What was tried, in order.
        error: String,
    },

    /// A kubeconfig was found but could not be read or used.
    #[error("kubeconfig error: {error}")]
    Kubeconfig {
        /// The underlying error message.
        error: String,
    },

    /// A custom loader rejected the environment.
    #[error("config loader failed: {error}")]
    Loader {
        /// The underlying error message.
        error: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Loader`], for custom loaders.
    pub fn loader(error: impl Into<String>) -> Self {
        ConfigError::Loader {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use ctrlvisor::ConfigError;
    ///
    /// assert_eq!(ConfigError::loader("offline").as_label(), "config_loader");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NotFound { .. } => "config_not_found",
            ConfigError::Kubeconfig { .. } => "config_kubeconfig",
            ConfigError::Loader { .. } => "config_loader",
        }
    }
}

/// # Errors produced by a controller.
///
/// A controller's `start` returns one of these when it cannot keep running.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Controller failed to start or stopped with an error.
    #[error("controller failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error.
    #[error("fatal controller error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Controller gave up because its stop signal fired.
    #[error("controller cancelled")]
    Canceled,
}

impl ControllerError {
    /// Shorthand for [`ControllerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ControllerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use ctrlvisor::ControllerError;
    ///
    /// assert_eq!(ControllerError::fail("boom").as_label(), "controller_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::Fail { .. } => "controller_failed",
            ControllerError::Fatal { .. } => "controller_fatal",
            ControllerError::Canceled => "controller_canceled",
        }
    }
}

/// # Errors returned by [`Manager::start`](crate::Manager::start).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ManagerError {
    /// Connection configuration could not be resolved during initialization.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The first controller that reported an error.
    ///
    /// `source` is the controller's error unchanged; `name` says which
    /// controller returned it.
    #[error("controller {name:?}: {source}")]
    Controller {
        /// Name of the failing controller.
        name: Arc<str>,
        /// The error exactly as the controller returned it.
        source: Arc<ControllerError>,
    },

    /// `start` was called on a manager that had already been started.
    #[error("manager already started")]
    AlreadyStarted,

    /// A previous initialization attempt panicked before completing.
    #[error("manager initialization was interrupted")]
    InitInterrupted,
}

impl ManagerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use ctrlvisor::ManagerError;
    ///
    /// assert_eq!(ManagerError::AlreadyStarted.as_label(), "manager_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ManagerError::Config(_) => "manager_config",
            ManagerError::Controller { .. } => "manager_controller_failed",
            ManagerError::AlreadyStarted => "manager_already_started",
            ManagerError::InitInterrupted => "manager_init_interrupted",
        }
    }

    /// Returns the controller error if this is a [`ManagerError::Controller`].
    pub fn controller_error(&self) -> Option<&ControllerError> {
        match self {
            ManagerError::Controller { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_variant_keeps_the_error_unchanged() {
        let err = ManagerError::Controller {
            name: Arc::from("leader"),
            source: Arc::new(ControllerError::fail("lease lost")),
        };

        assert!(
            matches!(err.controller_error(), Some(ControllerError::Fail { error }) if error == "lease lost")
        );
        let source = std::error::Error::source(&err).expect("source is set");
        assert_eq!(source.to_string(), ControllerError::fail("lease lost").to_string());
        assert!(err.to_string().starts_with("controller \"leader\""));
        assert!(ManagerError::AlreadyStarted.controller_error().is_none());
    }
}
