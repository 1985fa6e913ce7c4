//! # Manager: wires dependencies into controllers and starts them.
//!
//! The [`Manager`] owns the registered controllers, their promises, the
//! lazily defaulted dependencies and the event bus.
//!
//! ## Startup sequence
//! ```text
//! start(stop)
//!   1. LazyInit::ensure()  (blocking pool) ── Failed ──► return Err(Config)
//!   2. for c in controllers (in order):
//!        inject_informers(c); inject_config(c)
//!   3. for p in promises (in order): p()      (register watches)
//!   4. informers.start(stop)                  (non-blocking)
//!   5. for c in controllers:
//!        tokio::spawn(c.start(token)) ──► mpsc (capacity = #controllers)
//!   6. select! {
//!        stop.cancelled()          ──► Ok(())
//!        first outcome: Ok         ──► Ok(())
//!        first outcome: Err        ──► Err(Controller { name, source })
//!      }
//! ```
//!
//! ## Rules
//! - Every step completes before the next begins.
//! - Controller execution is unordered; the first outcome reported wins,
//!   whether it is a clean exit or an error.
//! - The manager never aborts a controller task. With
//!   [`ManagerConfig::cancel_on_failure`] it cancels the token the
//!   controllers were started with; otherwise it simply stops waiting.
//! - A late controller result never blocks: the channel has a slot for
//!   every controller.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use ctrlvisor::{ControllerContext, ControllerError, ControllerFn, Manager, ManagerConfig, RestConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mgr = Manager::builder(ManagerConfig::default())
//!         .with_config(RestConfig::new("https://127.0.0.1:6443".parse()?))
//!         .build();
//!
//!     let pods = ControllerFn::arc("pods", |_ctx: ControllerContext, stop: CancellationToken| async move {
//!         stop.cancelled().await;
//!         Ok::<_, ControllerError>(())
//!     });
//!     mgr.register(pods, None);
//!
//!     let stop = CancellationToken::new();
//!     stop.cancel();
//!     mgr.start(stop).await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::controllers::{ControllerRef, inject};
use crate::core::builder::ManagerBuilder;
use crate::core::config::ManagerConfig;
use crate::core::init::LazyInit;
use crate::deps::{Dependencies, InformersRef, RestConfig, Scheme};
use crate::error::{ControllerError, ManagerError};
use crate::events::{Bus, Event, EventKind};

/// Deferred callback run once during startup, after injection and before
/// the informers start. Typically registers watches.
pub type Promise = Box<dyn FnOnce() + Send + 'static>;

/// Terminal outcome reported by one controller task.
type Outcome = (Arc<str>, Result<(), ControllerError>);

/// Controllers and promises accumulated by `register`.
#[derive(Default)]
struct Registered {
    controllers: Vec<ControllerRef>,
    promises: Vec<Promise>,
    started: bool,
}

struct Inner {
    cfg: ManagerConfig,
    init: LazyInit,
    registered: Mutex<Registered>,
    bus: Bus,
    /// Cancelled when the last handle is dropped; ends the subscriber listener.
    closed: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

/// Initializes shared dependencies and starts registered controllers.
///
/// Cheap to clone; every clone drives the same manager.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

impl Manager {
    /// Returns a builder for a manager with the given config.
    pub fn builder(cfg: ManagerConfig) -> ManagerBuilder {
        ManagerBuilder::new(cfg)
    }

    /// Creates a manager that defaults every dependency.
    pub fn new(cfg: ManagerConfig) -> Self {
        ManagerBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(
        cfg: ManagerConfig,
        init: LazyInit,
        bus: Bus,
        closed: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                init,
                registered: Mutex::new(Registered::default()),
                bus,
                closed,
            }),
        }
    }

    /// Registers a controller and, optionally, its promise.
    ///
    /// Triggers lazy initialization. Initialization failures are not
    /// reported here; they surface from [`Manager::start`].
    /// Controllers registered after `start` began are not started.
    pub fn register(&self, controller: ControllerRef, promise: Option<Promise>) {
        let _ = self.ensure_init();

        let name = controller.name().to_string();
        let has_promise = promise.is_some();
        let late = {
            let mut reg = self.registered();
            reg.controllers.push(controller);
            if let Some(p) = promise {
                reg.promises.push(p);
            }
            reg.started
        };

        let kind = if late {
            EventKind::RegisteredAfterStart
        } else {
            EventKind::ControllerRegistered
        };
        self.inner.bus.publish(
            Event::new(kind)
                .with_controller(name)
                .with_count(usize::from(has_promise)),
        );
    }

    /// Starts every registered controller and blocks until `stop` fires or
    /// a controller returns.
    ///
    /// Returns `Ok(())` on stop (even if controllers are still shutting down)
    /// or when the first controller to return did so cleanly. Returns that
    /// controller's error as [`ManagerError::Controller`] otherwise, and a
    /// configuration failure as [`ManagerError::Config`] before touching
    /// anything.
    ///
    /// If nothing has triggered initialization yet, the config loader runs
    /// on tokio's blocking pool.
    pub async fn start(&self, stop: CancellationToken) -> Result<(), ManagerError> {
        let deps = self.ensure_init_off_runtime().await?;
        let (controllers, promises) = self.take_registered()?;

        self.inject_all(&deps, &controllers);
        self.run_promises(promises);

        deps.informers.start(stop.clone());
        self.inner
            .bus
            .publish(Event::new(EventKind::InformersStarted));

        let run_token = if self.inner.cfg.cancel_on_failure {
            stop.child_token()
        } else {
            stop.clone()
        };
        let mut results = self.spawn_controllers(&controllers, &run_token);
        let res = self
            .wait_for_outcome(&stop, &mut results, controllers.len())
            .await;

        if res.is_err() && self.inner.cfg.cancel_on_failure {
            run_token.cancel();
        }
        res
    }

    /// Connection configuration (triggers lazy initialization).
    ///
    /// `None` if resolution failed.
    pub fn config(&self) -> Option<Arc<RestConfig>> {
        let _ = self.ensure_init();
        self.inner.init.dependencies().and_then(|d| d.config)
    }

    /// Type registry (triggers lazy initialization).
    pub fn scheme(&self) -> Option<Arc<Scheme>> {
        let _ = self.ensure_init();
        self.inner.init.dependencies().map(|d| d.scheme)
    }

    /// Watch subsystem (triggers lazy initialization).
    ///
    /// Promises may use this to register watches.
    pub fn informers(&self) -> Option<InformersRef> {
        let _ = self.ensure_init();
        self.inner.init.dependencies().map(|d| d.informers)
    }

    /// Creates a receiver for this manager's runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Number of registered controllers.
    pub fn len(&self) -> usize {
        self.registered().controllers.len()
    }

    /// Returns true if no controller is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn registered(&self) -> std::sync::MutexGuard<'_, Registered> {
        self.inner
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs lazy initialization once and publishes its outcome on the first call.
    fn ensure_init(&self) -> Result<Dependencies, ManagerError> {
        let ensured = self.inner.init.ensure();
        if ensured.first {
            let ev = match &ensured.result {
                Ok(_) => Event::new(EventKind::Initialized),
                Err(e) => Event::new(EventKind::InitFailed).with_reason(e.to_string()),
            };
            self.inner.bus.publish(ev);
        }
        ensured.result
    }

    /// Like `ensure_init`, but keeps a first-time loader off the async worker.
    async fn ensure_init_off_runtime(&self) -> Result<Dependencies, ManagerError> {
        if !self.inner.init.is_pending() {
            return self.ensure_init();
        }
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.ensure_init())
            .await
            .unwrap_or(Err(ManagerError::InitInterrupted))
    }

    /// Marks the manager as started and takes a snapshot of what to run.
    fn take_registered(&self) -> Result<(Vec<ControllerRef>, Vec<Promise>), ManagerError> {
        let mut reg = self.registered();
        if reg.started {
            return Err(ManagerError::AlreadyStarted);
        }
        reg.started = true;
        Ok((reg.controllers.clone(), std::mem::take(&mut reg.promises)))
    }

    /// Injects informers, then config, into each controller in registration order.
    fn inject_all(&self, deps: &Dependencies, controllers: &[ControllerRef]) {
        for c in controllers {
            let mut accepted = Vec::with_capacity(2);
            if inject::inject_informers(&deps.informers, c.as_ref()) {
                accepted.push("informers");
            }
            if let Some(cfg) = &deps.config {
                if inject::inject_config(cfg, c.as_ref()) {
                    accepted.push("config");
                }
            }
            self.inner.bus.publish(
                Event::new(EventKind::DependenciesInjected)
                    .with_controller(c.name())
                    .with_reason(accepted.join(",")),
            );
        }
    }

    fn run_promises(&self, promises: Vec<Promise>) {
        let count = promises.len();
        for p in promises {
            p();
        }
        self.inner
            .bus
            .publish(Event::new(EventKind::PromisesExecuted).with_count(count));
    }

    /// Spawns one task per controller; each reports its outcome exactly once.
    fn spawn_controllers(
        &self,
        controllers: &[ControllerRef],
        token: &CancellationToken,
    ) -> mpsc::Receiver<Outcome> {
        let (tx, rx) = mpsc::channel::<Outcome>(controllers.len().max(1));

        for c in controllers {
            let c = Arc::clone(c);
            let tx = tx.clone();
            let token = token.clone();
            let bus = self.inner.bus.clone();

            tokio::spawn(async move {
                let name: Arc<str> = Arc::from(c.name());
                bus.publish(Event::new(EventKind::ControllerStarting).with_controller(name.clone()));

                let res = match std::panic::AssertUnwindSafe(c.start(token))
                    .catch_unwind()
                    .await
                {
                    Ok(res) => res,
                    Err(panic_err) => Err(ControllerError::Fatal {
                        error: panic_message(&*panic_err),
                    }),
                };

                let ev = match &res {
                    Ok(()) | Err(ControllerError::Canceled) => {
                        Event::new(EventKind::ControllerStopped).with_controller(name.clone())
                    }
                    Err(e) => Event::new(EventKind::ControllerFailed)
                        .with_controller(name.clone())
                        .with_reason(e.to_string()),
                };
                bus.publish(ev);

                // A slot is reserved for every controller, so this never waits;
                // it fails only if the manager already returned.
                let _ = tx.send((name, res)).await;
            });
        }
        rx
    }

    /// Races the stop signal against the first controller outcome.
    ///
    /// With no controllers there is no outcome to wait for, only `stop`.
    async fn wait_for_outcome(
        &self,
        stop: &CancellationToken,
        results: &mut mpsc::Receiver<Outcome>,
        running: usize,
    ) -> Result<(), ManagerError> {
        tokio::select! {
            _ = stop.cancelled() => {
                self.inner.bus.publish(Event::new(EventKind::StopRequested));
                Ok(())
            }
            msg = results.recv(), if running > 0 => match msg {
                Some((_, Ok(()) | Err(ControllerError::Canceled))) | None => Ok(()),
                Some((name, Err(e))) => Err(ManagerError::Controller {
                    name,
                    source: Arc::new(e),
                }),
            },
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        format!("controller panicked: {msg}")
    } else if let Some(msg) = any.downcast_ref::<String>() {
        format!("controller panicked: {msg}")
    } else {
        "controller panicked".to_string()
    }
}
