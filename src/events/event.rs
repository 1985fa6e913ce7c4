//! # Runtime events emitted by the manager.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Setup events**: initialization, registration, injection, promises
//! - **Controller events**: per-controller start and terminal outcome
//! - **Subscriber events**: delivery problems inside the subscriber set
//!
//! The [`Event`] struct carries metadata such as timestamps, controller name,
//! reasons and counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use ctrlvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ControllerFailed)
//!     .with_controller("pods")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::ControllerFailed);
//! assert_eq!(ev.controller.as_deref(), Some("pods"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Setup events ===
    /// Lazy initialization completed.
    ///
    /// Sets:
    /// - `at`, `seq`
    Initialized,

    /// Configuration resolution failed during lazy initialization.
    ///
    /// Sets:
    /// - `reason`: error message
    /// - `at`, `seq`
    InitFailed,

    /// A controller was registered.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `count`: 1 if a promise came with it, else 0
    /// - `at`, `seq`
    ControllerRegistered,

    /// A controller was registered after `start` began; it will not be started.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `at`, `seq`
    RegisteredAfterStart,

    /// Dependencies were injected into a controller.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `reason`: which dependencies were accepted (e.g. "informers,config")
    /// - `at`, `seq`
    DependenciesInjected,

    /// All promises ran.
    ///
    /// Sets:
    /// - `count`: number of promises
    /// - `at`, `seq`
    PromisesExecuted,

    /// The watch subsystem was started.
    ///
    /// Sets:
    /// - `at`, `seq`
    InformersStarted,

    /// Stop signal observed by the manager.
    ///
    /// Sets:
    /// - `at`, `seq`
    StopRequested,

    // === Controller events ===
    /// A controller's `start` is about to be called.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `at`, `seq`
    ControllerStarting,

    /// A controller returned `Ok` (or was cancelled).
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `at`, `seq`
    ControllerStopped,

    /// A controller returned an error.
    ///
    /// Sets:
    /// - `controller`: controller name
    /// - `reason`: error message
    /// - `at`, `seq`
    ControllerFailed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `controller`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`, `seq`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `controller`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`, `seq`
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Controller (or subscriber) name, if applicable.
    pub controller: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Generic counter (promises run, promise attached).
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            controller: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches a controller name.
    #[inline]
    pub fn with_controller(mut self, name: impl Into<Arc<str>>) -> Self {
        self.controller = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a count (saturating at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_controller(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_controller(subscriber)
            .with_reason(info)
    }
}
