//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! that fans events from the [`Bus`](crate::events::Bus) out to every
//! subscriber.
//!
//! ## Architecture
//! ```text
//! Manager ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                        │
//!                                            ┌───────────┼───────────┐
//!                                            ▼           ▼           ▼
//!                                        LogWriter    Metrics     Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
