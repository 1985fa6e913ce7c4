//! # Controller abstractions and dependency injection.
//!
//! - [`Controller`] - trait for long-running reconciliation units
//! - [`ControllerFn`] - function-backed controller that accepts every dependency
//! - [`ControllerRef`] - shared handle (`Arc<dyn Controller>`)
//! - [`inject`] - pushes configuration and informers into controllers

mod controller;
mod controller_fn;
pub mod inject;

pub use controller::{Controller, ControllerRef, InjectConfig, InjectInformers};
pub use controller_fn::{ControllerContext, ControllerFn};
