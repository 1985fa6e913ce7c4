//! # ctrlvisor
//!
//! **ctrlvisor** brings up a set of independently defined reconciliation
//! controllers together. It wires their shared dependencies in, runs their
//! watch registrations before event delivery begins, starts them
//! concurrently and reports the first fatal error.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Controller  │   │  Controller  │   │  Controller  │
//!     │  + promise   │   │              │   │  + promise   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ register         ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Manager                                                          │
//! │  - LazyInit (Uninitialized → Initializing → Ready | Failed)       │
//! │  - Dependencies: RestConfig, Scheme, Informers                    │
//! │  - Bus (broadcast events) → SubscriberSet                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼ inject           ▼ promises         ▼ informers.start(stop)
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ tokio task   │   │ tokio task   │   │ tokio task   │
//!     │ c.start(stop)│   │ c.start(stop)│   │ c.start(stop)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!                    mpsc (one slot per controller)
//!                               ▼
//!              select! { stop.cancelled(), first error }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Manager**       | Lazy dependency wiring, ordered startup, first-error return.  | [`Manager`], [`ManagerBuilder`]             |
//! | **Controllers**   | Controller contract and capability-based injection.           | [`Controller`], [`ControllerFn`]            |
//! | **Dependencies**  | Connection config, type registry, watch subsystem.            | [`RestConfig`], [`Scheme`], [`Informers`]   |
//! | **Subscriber API**| Hook into manager lifecycle events.                           | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for config, controllers and the manager.         | [`ManagerError`], [`ControllerError`]       |
//! | **Configuration** | Bus capacity and failure behavior.                            | [`ManagerConfig`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use ctrlvisor::{
//!     ControllerContext, ControllerError, ControllerFn, GroupVersionKind, Manager, ManagerConfig,
//!     RestConfig,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mgr = Manager::builder(ManagerConfig::default())
//!         .with_config(RestConfig::new("https://127.0.0.1:6443".parse()?))
//!         .build();
//!
//!     let pods = ControllerFn::arc("pods", |ctx: ControllerContext, stop: CancellationToken| async move {
//!         let _informers = ctx.informers.ok_or_else(|| ControllerError::fail("no informers"))?;
//!         stop.cancelled().await;
//!         Ok::<_, ControllerError>(())
//!     });
//!
//!     // The promise registers a watch before the informers start.
//!     let for_promise = pods.clone();
//!     mgr.register(
//!         pods,
//!         Some(Box::new(move || {
//!             if let Some(informers) = for_promise.context().informers {
//!                 let _rx = informers.watch(&GroupVersionKind::gvk("", "v1", "Pod"));
//!             }
//!         })),
//!     );
//!
//!     let stop = CancellationToken::new();
//!     stop.cancel();
//!     mgr.start(stop).await?;
//!     Ok(())
//! }
//! ```
mod controllers;
mod core;
mod deps;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use controllers::{
    Controller, ControllerContext, ControllerFn, ControllerRef, InjectConfig, InjectInformers,
    inject,
};
pub use core::shutdown::{stop_on_signal, wait_for_shutdown_signal};
pub use core::{Manager, ManagerBuilder, ManagerConfig, Promise};
pub use deps::{
    ConfigLoader, GroupVersionKind, Informers, InformersRef, KubeConfigLoader, LoaderRef,
    ObjectRef, RestConfig, Scheme, SelfPopulatingInformers, WatchEvent,
};
pub use error::{ConfigError, ControllerError, ManagerError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
