//! # Function-backed controller (`ControllerFn`)
//!
//! [`ControllerFn`] wraps a closure `F: Fn(ControllerContext, CancellationToken) -> Fut`
//! and accepts both injectable dependencies. The closure receives them as a
//! [`ControllerContext`] when the manager starts it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use ctrlvisor::{ControllerContext, ControllerError, ControllerFn, ControllerRef};
//!
//! let c = ControllerFn::arc("pods", |ctx: ControllerContext, stop: CancellationToken| async move {
//!     let _informers = ctx.informers.ok_or_else(|| ControllerError::fail("not injected"))?;
//!     stop.cancelled().await;
//!     Ok::<_, ControllerError>(())
//! });
//!
//! // Keep the concrete handle for promises, hand the trait object to the manager.
//! let handle: ControllerRef = c.clone();
//! assert_eq!(handle.name(), "pods");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::deps::{InformersRef, RestConfig};
use crate::error::ControllerError;

use super::controller::{Controller, InjectConfig, InjectInformers};

/// Dependencies injected into a [`ControllerFn`].
#[derive(Clone, Default)]
pub struct ControllerContext {
    pub config: Option<Arc<RestConfig>>,
    pub informers: Option<InformersRef>,
}

/// Function-backed controller.
pub struct ControllerFn<F> {
    name: Cow<'static, str>,
    f: F,
    config: OnceLock<Arc<RestConfig>>,
    informers: OnceLock<InformersRef>,
}

impl<F> ControllerFn<F> {
    /// Creates a new function-backed controller.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            config: OnceLock::new(),
            informers: OnceLock::new(),
        }
    }

    /// Creates the controller as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Snapshot of what has been injected so far.
    ///
    /// Promises use this to reach the informers, which are injected before
    /// any promise runs.
    pub fn context(&self) -> ControllerContext {
        ControllerContext {
            config: self.config.get().cloned(),
            informers: self.informers.get().cloned(),
        }
    }
}

impl<F: Send + Sync> InjectConfig for ControllerFn<F> {
    fn inject_config(&self, config: Arc<RestConfig>) {
        // First injection wins.
        let _ = self.config.set(config);
    }
}

impl<F: Send + Sync> InjectInformers for ControllerFn<F> {
    fn inject_informers(&self, informers: InformersRef) {
        let _ = self.informers.set(informers);
    }
}

#[async_trait]
impl<F, Fut> Controller for ControllerFn<F>
where
    F: Fn(ControllerContext, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ControllerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, stop: CancellationToken) -> Result<(), ControllerError> {
        (self.f)(self.context(), stop).await
    }

    fn config_sink(&self) -> Option<&dyn InjectConfig> {
        Some(self)
    }

    fn informers_sink(&self) -> Option<&dyn InjectInformers> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::inject;
    use crate::deps::{Scheme, SelfPopulatingInformers};

    #[tokio::test]
    async fn test_closure_sees_injected_context() {
        let c = ControllerFn::arc("seen", |ctx: ControllerContext, _stop: CancellationToken| async move {
            match ctx.config {
                Some(cfg) if cfg.cluster_url.host() == Some("h") && ctx.informers.is_some() => Ok(()),
                _ => Err(ControllerError::fail("missing dependencies")),
            }
        });

        let informers: InformersRef =
            Arc::new(SelfPopulatingInformers::new(None, Arc::new(Scheme::new())));
        inject::inject_informers(&informers, c.as_ref());
        inject::inject_config(&Arc::new(RestConfig::new("https://h".parse().unwrap())), c.as_ref());

        c.start(CancellationToken::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_first_injection_wins() {
        let c = ControllerFn::arc("once", |_ctx: ControllerContext, _stop: CancellationToken| async {
            Ok::<_, ControllerError>(())
        });
        c.inject_config(Arc::new(RestConfig::new("https://first".parse().unwrap())));
        c.inject_config(Arc::new(RestConfig::new("https://second".parse().unwrap())));
        assert_eq!(c.context().config.unwrap().cluster_url.host(), Some("first"));
    }

    #[tokio::test]
    async fn test_uninjected_context_is_empty() {
        let c = ControllerFn::new("empty", |_ctx: ControllerContext, _stop: CancellationToken| async {
            Ok::<_, ControllerError>(())
        });
        let ctx = c.context();
        assert!(ctx.config.is_none());
        assert!(ctx.informers.is_none());
    }
}
