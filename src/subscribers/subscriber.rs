//! # Manager event hooks.
//!
//! A [`Subscribe`] implementation sees every [`Event`] a [`Manager`](crate::Manager)
//! publishes: dependency initialization, injection, promises, informer start and
//! each controller's start and exit. Subscribers are passed to
//! [`ManagerBuilder::with_subscribers`](crate::ManagerBuilder::with_subscribers).
//!
//! Delivery never slows the manager down. Every subscriber has its own worker
//! and queue; when the queue is full the event is dropped and
//! `EventKind::SubscriberOverflow` is published instead. A panicking
//! `on_event` is reported as `EventKind::SubscriberPanicked` and the worker
//! keeps going. Workers drain and exit once the last manager handle is dropped.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use ctrlvisor::{Event, EventKind, Subscribe};
//!
//! struct FailedControllers;
//!
//! #[async_trait]
//! impl Subscribe for FailedControllers {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::ControllerFailed) {
//!             eprintln!("{:?} failed: {:?}", ev.controller, ev.reason);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failed-controllers" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives manager lifecycle events.
///
/// `on_event` runs on the subscriber's own worker, so a slow implementation
/// only backs up its own queue. It must not block the thread.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publish order.
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events for this subscriber.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length before events for this subscriber are dropped (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
