use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::config::ManagerConfig;
use crate::core::init::LazyInit;
use crate::core::manager::Manager;
use crate::deps::{
    ConfigLoader, KubeConfigLoader, InformersRef, LoaderRef, Overrides, RestConfig, Scheme,
};
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Manager`] with explicit dependencies.
///
/// Anything not supplied is defaulted lazily on first use.
pub struct ManagerBuilder {
    cfg: ManagerConfig,
    overrides: Overrides,
    loader: Option<LoaderRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ManagerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ManagerConfig) -> Self {
        Self {
            cfg,
            overrides: Overrides::default(),
            loader: None,
            subscribers: Vec::new(),
        }
    }

    /// Uses `config` instead of resolving one; the loader is never called.
    pub fn with_config(mut self, config: RestConfig) -> Self {
        self.overrides.config = Some(Arc::new(config));
        self
    }

    /// Uses `scheme` instead of [`Scheme::global`].
    pub fn with_scheme(mut self, scheme: Arc<Scheme>) -> Self {
        self.overrides.scheme = Some(scheme);
        self
    }

    /// Uses `informers` instead of building a
    /// [`SelfPopulatingInformers`](crate::SelfPopulatingInformers).
    pub fn with_informers(mut self, informers: InformersRef) -> Self {
        self.overrides.informers = Some(informers);
        self
    }

    /// Resolves the configuration with `loader` instead of [`KubeConfigLoader`].
    pub fn with_loader(mut self, loader: impl ConfigLoader) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the manager.
    ///
    /// Must be called within a tokio runtime when subscribers are configured
    /// (their workers are spawned here).
    pub fn build(self) -> Manager {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let closed = CancellationToken::new();
        if !self.subscribers.is_empty() {
            subscriber_listener(&bus, self.subscribers, closed.clone());
        }

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(KubeConfigLoader::new()));
        let init = LazyInit::new(self.overrides, loader);

        Manager::new_internal(self.cfg, init, bus, closed)
    }
}

/// Forwards bus events to a subscriber set until the manager is dropped.
///
/// Events already queued when `closed` fires are still delivered.
fn subscriber_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>, closed: CancellationToken) {
    use tokio::sync::broadcast::error::RecvError;

    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers, bus.clone());
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = closed.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
        set.shutdown().await;
    });
}
