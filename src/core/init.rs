//! # One-time dependency initialization.
//!
//! [`LazyInit`] is a small state machine guarded by a single mutex:
//!
//! ```text
//! Uninitialized(overrides) ──► Initializing ──┬──► Ready(deps)
//!                                             └──► Failed(deps, error)
//! ```
//!
//! ## Rules
//! - The first caller runs the defaulting while holding the lock; concurrent
//!   callers block and then observe the same outcome.
//! - `Ready` and `Failed` are terminal. `Failed` keeps the defaulted scheme
//!   and informers next to the sticky error.
//! - A panic inside the loader leaves the machine in `Initializing`; every
//!   later call reports [`ManagerError::InitInterrupted`].

use std::sync::{Mutex, PoisonError};

use crate::deps::{Dependencies, LoaderRef, Overrides};
use crate::error::{ConfigError, ManagerError};

enum InitState {
    Uninitialized(Overrides),
    Initializing,
    Ready(Dependencies),
    Failed(Dependencies, ConfigError),
}

/// Result of [`LazyInit::ensure`].
pub(crate) struct Ensured {
    /// Dependencies, or the sticky error.
    pub result: Result<Dependencies, ManagerError>,
    /// True for the single call that ran the defaulting.
    pub first: bool,
}

pub(crate) struct LazyInit {
    state: Mutex<InitState>,
    loader: LoaderRef,
}

impl LazyInit {
    pub fn new(overrides: Overrides, loader: LoaderRef) -> Self {
        Self {
            state: Mutex::new(InitState::Uninitialized(overrides)),
            loader,
        }
    }

    /// Runs the defaulting if nobody has yet, then reports the outcome.
    ///
    /// The loader runs under the lock and may block on file reads.
    pub fn ensure(&self) -> Ensured {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let first = match std::mem::replace(&mut *state, InitState::Initializing) {
            InitState::Uninitialized(overrides) => {
                let (deps, error) = overrides.resolve(&self.loader);
                *state = match error {
                    None => InitState::Ready(deps),
                    Some(e) => InitState::Failed(deps, e),
                };
                true
            }
            settled => {
                *state = settled;
                false
            }
        };

        let result = match &*state {
            InitState::Ready(deps) => Ok(deps.clone()),
            InitState::Failed(_, e) => Err(ManagerError::Config(e.clone())),
            InitState::Initializing | InitState::Uninitialized(_) => {
                Err(ManagerError::InitInterrupted)
            }
        };
        Ensured { result, first }
    }

    /// Returns true until the first `ensure` call begins.
    pub fn is_pending(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            InitState::Uninitialized(_)
        )
    }

    /// Dependencies that were defaulted, even when configuration failed.
    pub fn dependencies(&self) -> Option<Dependencies> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            InitState::Ready(deps) | InitState::Failed(deps, _) => Some(deps.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::{RestConfig, Scheme};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn counting(calls: Arc<AtomicUsize>, ok: bool) -> LoaderRef {
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            // Widen the race window for concurrent callers.
            thread::sleep(Duration::from_millis(20));
            if ok {
                Ok(RestConfig::new("https://lazy".parse().unwrap()))
            } else {
                Err(ConfigError::loader("offline"))
            }
        })
    }

    #[test]
    fn test_concurrent_first_calls_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let init = Arc::new(LazyInit::new(Overrides::default(), counting(calls.clone(), true)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let init = Arc::clone(&init);
                thread::spawn(move || init.ensure())
            })
            .collect();
        let outcomes: Vec<Ensured> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcomes.iter().filter(|o| o.first).count(), 1);

        let deps: Vec<Dependencies> = outcomes.into_iter().map(|o| o.result.unwrap()).collect();
        for d in &deps[1..] {
            assert!(Arc::ptr_eq(&d.informers, &deps[0].informers));
            assert!(Arc::ptr_eq(
                d.config.as_ref().unwrap(),
                deps[0].config.as_ref().unwrap()
            ));
        }
    }

    #[test]
    fn test_failure_is_sticky_and_loader_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let init = LazyInit::new(Overrides::default(), counting(calls.clone(), false));

        for _ in 0..3 {
            match init.ensure().result {
                Err(ManagerError::Config(e)) => {
                    assert_eq!(e, ConfigError::loader("offline"))
                }
                other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let deps = init.dependencies().expect("scheme and informers still defaulted");
        assert!(deps.config.is_none());
    }

    #[test]
    fn test_settled_state_survives_later_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let init = LazyInit::new(Overrides::default(), counting(calls.clone(), true));
        assert!(init.is_pending());

        let first = init.ensure();
        assert!(first.first);
        assert!(!init.is_pending());
        let informers = Arc::clone(&first.result.as_ref().unwrap().informers);

        for _ in 0..3 {
            let again = init.ensure();
            assert!(!again.first);
            assert!(Arc::ptr_eq(&again.result.unwrap().informers, &informers));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dependencies_absent_before_first_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let overrides = Overrides {
            scheme: Some(Arc::new(Scheme::new())),
            ..Overrides::default()
        };
        let init = LazyInit::new(overrides, counting(calls, true));
        assert!(init.dependencies().is_none());
        assert!(init.ensure().result.is_ok());
        assert!(init.dependencies().is_some());
    }

    #[test]
    fn test_loader_panic_reports_interrupted() {
        let loader: LoaderRef = Arc::new(|| -> Result<RestConfig, ConfigError> {
            panic!("loader exploded")
        });
        let init = Arc::new(LazyInit::new(Overrides::default(), loader));

        let first = Arc::clone(&init);
        assert!(thread::spawn(move || first.ensure()).join().is_err());
        assert!(matches!(
            init.ensure().result,
            Err(ManagerError::InitInterrupted)
        ));
    }
}
