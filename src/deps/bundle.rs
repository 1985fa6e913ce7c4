//! # Dependency bundle shared by every registered controller.
//!
//! [`Dependencies`] holds the connection configuration, the type registry and
//! the watch subsystem. A caller may supply any of them up front
//! ([`Overrides`]); the rest are defaulted once by [`Overrides::resolve`].
//!
//! ## Defaulting
//! ```text
//! config    unset → loader.resolve()   (failure captured, defaulting continues)
//! scheme    unset → Scheme::global()
//! informers unset → SelfPopulatingInformers::new(config?, scheme)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

use super::informers::{InformersRef, SelfPopulatingInformers};
use super::rest::{LoaderRef, RestConfig};
use super::scheme::Scheme;

/// Dependencies supplied explicitly by the caller.
#[derive(Default, Clone)]
pub struct Overrides {
    pub config: Option<Arc<RestConfig>>,
    pub scheme: Option<Arc<Scheme>>,
    pub informers: Option<InformersRef>,
}

/// Defaulted dependency bundle; immutable once built.
#[derive(Clone)]
pub struct Dependencies {
    /// `None` only when resolution failed.
    pub config: Option<Arc<RestConfig>>,
    pub scheme: Arc<Scheme>,
    pub informers: InformersRef,
}

impl Overrides {
    /// Fills every unset field and reports a configuration failure, if any.
    ///
    /// The loader is only consulted when no config was supplied.
    pub fn resolve(self, loader: &LoaderRef) -> (Dependencies, Option<ConfigError>) {
        let (config, error) = match self.config {
            Some(cfg) => (Some(cfg), None),
            None => match loader.resolve() {
                Ok(cfg) => (Some(Arc::new(cfg)), None),
                Err(e) => (None, Some(e)),
            },
        };

        let scheme = self.scheme.unwrap_or_else(Scheme::global);

        let informers = self.informers.unwrap_or_else(|| {
            Arc::new(SelfPopulatingInformers::new(
                config.clone(),
                Arc::clone(&scheme),
            ))
        });

        (
            Dependencies {
                config,
                scheme,
                informers,
            },
            error,
        )
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("config", &self.config)
            .field("scheme", &self.scheme)
            .field("informers_started", &self.informers.is_started())
            .finish()
    }
}
