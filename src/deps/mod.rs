//! Shared runtime dependencies injected into controllers.
//!
//! - [`rest`]: connection configuration and the loader that resolves it;
//! - [`scheme`]: type registry;
//! - [`informers`]: watch subsystem contract and its default implementation;
//! - [`bundle`]: the defaulted set handed to controllers.

mod bundle;
mod informers;
mod rest;
mod scheme;

pub(crate) use bundle::{Dependencies, Overrides};
pub use informers::{Informers, InformersRef, ObjectRef, SelfPopulatingInformers, WatchEvent};
pub use rest::{ConfigLoader, KubeConfigLoader, LoaderRef, RestConfig};
pub use scheme::{GroupVersionKind, Scheme};
