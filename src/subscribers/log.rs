//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [initialized]
//! [registered] controller="pods" promise=1
//! [injected] controller="pods" deps="informers,config"
//! [promises] count=1
//! [informers-started]
//! [starting] controller="pods"
//! [failed] controller="pods" err="controller failed: boom"
//! [stop-requested]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn field(v: &Option<std::sync::Arc<str>>) -> &str {
    v.as_deref().unwrap_or("unknown")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Initialized => println!("[initialized]"),
            EventKind::InitFailed => println!("[init-failed] err={:?}", field(&e.reason)),
            EventKind::ControllerRegistered => println!(
                "[registered] controller={:?} promise={}",
                field(&e.controller),
                e.count.unwrap_or(0)
            ),
            EventKind::RegisteredAfterStart => println!(
                "[registered-after-start] controller={:?} (not started)",
                field(&e.controller)
            ),
            EventKind::DependenciesInjected => println!(
                "[injected] controller={:?} deps={:?}",
                field(&e.controller),
                e.reason.as_deref().unwrap_or("")
            ),
            EventKind::PromisesExecuted => println!("[promises] count={}", e.count.unwrap_or(0)),
            EventKind::InformersStarted => println!("[informers-started]"),
            EventKind::StopRequested => println!("[stop-requested]"),
            EventKind::ControllerStarting => {
                println!("[starting] controller={:?}", field(&e.controller))
            }
            EventKind::ControllerStopped => {
                println!("[stopped] controller={:?}", field(&e.controller))
            }
            EventKind::ControllerFailed => println!(
                "[failed] controller={:?} err={:?}",
                field(&e.controller),
                field(&e.reason)
            ),
            EventKind::SubscriberOverflow => println!(
                "[subscriber-overflow] subscriber={:?} reason={:?}",
                field(&e.controller),
                field(&e.reason)
            ),
            EventKind::SubscriberPanicked => println!(
                "[subscriber-panicked] subscriber={} info={}",
                field(&e.controller),
                field(&e.reason)
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
