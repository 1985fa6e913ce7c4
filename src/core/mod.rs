//! Manager core: lazy initialization, startup sequencing and shutdown.
//!
//! The public API from this module is [`Manager`], its [`ManagerBuilder`]
//! and [`ManagerConfig`].
//!
//! Internal modules:
//! - [`init`]: one-time dependency defaulting state machine;
//! - [`manager`]: registration, injection, promises, concurrent startup;
//! - [`builder`]: explicit dependencies and subscriber wiring;
//! - [`shutdown`]: OS-signal stop token.

mod builder;
mod config;
mod init;
mod manager;
pub mod shutdown;


pub use builder::ManagerBuilder;
pub use config::ManagerConfig;
pub use manager::{Manager, Promise};
