//! # Example: basic_manager
//!
//! Two controllers sharing one connection and one watch subsystem.
//!
//! Demonstrates how to:
//! - Define controllers with [`ControllerFn`].
//! - Register a watch from a promise, before event delivery starts.
//! - Print lifecycle events with [`LogWriter`].
//! - Stop everything on Ctrl-C (or when a controller fails).
//!
//! ## Flow
//! ```text
//! register(pods, promise) ──► Manager::start(stop)
//!     ├─► LazyInit (config, scheme, informers)
//!     ├─► inject informers + config
//!     ├─► promise: informers.watch(Pod)
//!     ├─► informers.start(stop)
//!     ├─► spawn pods, ticker
//!     └─► first error or stop ──► exit
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_manager --features logging
//! ```

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use ctrlvisor::{
    ControllerContext, ControllerError, ControllerFn, GroupVersionKind, LogWriter, Manager,
    ManagerConfig, ObjectRef, RestConfig, Scheme, SelfPopulatingInformers, Subscribe, WatchEvent,
    stop_on_signal,
};

struct Pod;

fn pod_kind() -> GroupVersionKind {
    GroupVersionKind::gvk("", "v1", "Pod")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut config = RestConfig::new("https://127.0.0.1:6443".parse()?);
    config.default_namespace = "default".to_string();
    let config = Arc::new(config);
    let scheme = Arc::new(Scheme::new());
    scheme.register::<Pod>(pod_kind());

    // Keep a concrete handle so the demo can feed events in.
    let informers = Arc::new(SelfPopulatingInformers::new(
        Some(Arc::clone(&config)),
        Arc::clone(&scheme),
    ));

    let cfg = ManagerConfig {
        cancel_on_failure: true,
        ..ManagerConfig::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mgr = Manager::builder(cfg)
        .with_config((*config).clone())
        .with_scheme(scheme)
        .with_informers(informers.clone())
        .with_subscribers(subs)
        .build();

    let pods = ControllerFn::arc(
        "pods",
        |ctx: ControllerContext, stop: CancellationToken| async move {
            let informers = ctx
                .informers
                .ok_or_else(|| ControllerError::fail("informers were not injected"))?;
            let mut rx = informers.watch(&pod_kind());
            loop {
                tokio::select! {
                    _ = stop.cancelled() => return Ok::<_, ControllerError>(()),
                    ev = rx.recv() => match ev {
                        Ok(ev) => println!("[pods] reconcile {ev:?}"),
                        Err(e) => return Err(ControllerError::fail(e.to_string())),
                    },
                }
            }
        },
    );

    let for_promise = pods.clone();
    mgr.register(
        pods,
        Some(Box::new(move || {
            if let Some(informers) = for_promise.context().informers {
                let _rx = informers.watch(&pod_kind());
            }
        })),
    );

    let feeder = Arc::clone(&informers);
    let ticker = ControllerFn::arc(
        "ticker",
        move |_ctx: ControllerContext, stop: CancellationToken| {
            let feeder = Arc::clone(&feeder);
            async move {
                let mut n = 0u32;
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => return Ok::<_, ControllerError>(()),
                        _ = tokio::time::sleep(Duration::from_millis(500)) => {
                            n += 1;
                            let obj = ObjectRef::namespaced("default", format!("pod-{n}"));
                            feeder.notify(&pod_kind(), WatchEvent::Added(obj));
                        }
                    }
                }
            }
        },
    );
    mgr.register(ticker, None);

    mgr.start(stop_on_signal()).await?;
    println!("manager stopped");
    Ok(())
}
