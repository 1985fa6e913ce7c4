//! # Watch subsystem.
//!
//! [`Informers`] is the contract the manager consumes: promises register
//! watches through [`Informers::watch`] and the manager calls
//! [`Informers::start`] once every promise has run.
//!
//! [`SelfPopulatingInformers`] is the default implementation. It creates a
//! broadcast channel per kind the first time that kind is watched.
//!
//! ## Architecture
//! ```text
//! promise ──► watch(kind) ──► HashMap<kind, broadcast::Sender<WatchEvent>>
//!                                           │
//! list-watch backend ──► notify(kind, ev) ──┘──► receivers (controllers)
//!                         (dropped until start)
//! ```
//!
//! ## Rules
//! - `start` never blocks; it spawns a task that observes the stop token.
//! - Events are only delivered between `start` and stop.
//! - Lagging receivers observe `RecvError::Lagged` like any broadcast receiver.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::rest::RestConfig;
use super::scheme::{GroupVersionKind, Scheme, sort_kinds};

/// Per-kind channel capacity.
const WATCH_CAPACITY: usize = 256;

/// Reference to a single API object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Namespace, `None` for cluster-scoped objects.
    pub namespace: Option<String>,
    /// Object name.
    pub name: String,
}

impl ObjectRef {
    /// Creates a namespaced reference.
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Creates a cluster-scoped reference.
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }
}

/// Change notification delivered to watchers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    Added(ObjectRef),
    Modified(ObjectRef),
    Deleted(ObjectRef),
}

/// Watch subsystem consumed by the manager.
pub trait Informers: Send + Sync + 'static {
    /// Registers interest in `kind` and returns a receiver for its events.
    fn watch(&self, kind: &GroupVersionKind) -> broadcast::Receiver<WatchEvent>;

    /// Begins delivering events. Must not block.
    fn start(&self, stop: CancellationToken);

    /// Returns true once `start` has been called and `stop` has not fired.
    fn is_started(&self) -> bool;
}

/// Shared informers handle.
pub type InformersRef = Arc<dyn Informers>;

/// Default watch subsystem: one broadcast channel per watched kind.
pub struct SelfPopulatingInformers {
    config: Option<Arc<RestConfig>>,
    scheme: Arc<Scheme>,
    channels: Mutex<HashMap<GroupVersionKind, broadcast::Sender<WatchEvent>>>,
    started: Arc<AtomicBool>,
}

impl SelfPopulatingInformers {
    /// Creates informers for the given connection and scheme.
    ///
    /// `config` is `None` when configuration resolution failed; the manager
    /// refuses to start in that case, so these informers are never started.
    pub fn new(config: Option<Arc<RestConfig>>, scheme: Arc<Scheme>) -> Self {
        Self {
            config,
            scheme,
            channels: Mutex::new(HashMap::new()),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connection the informers list and watch through.
    pub fn config(&self) -> Option<&Arc<RestConfig>> {
        self.config.as_ref()
    }

    /// Scheme used to map kinds to types.
    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    /// Returns the watched kinds, sorted.
    pub fn watched(&self) -> Vec<GroupVersionKind> {
        let channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        let mut kinds: Vec<GroupVersionKind> = channels.keys().cloned().collect();
        sort_kinds(&mut kinds);
        kinds
    }

    /// Delivers `event` to every watcher of `kind`.
    ///
    /// Returns the number of receivers reached; `0` before start, after stop,
    /// or when nobody watches `kind`.
    pub fn notify(&self, kind: &GroupVersionKind, event: WatchEvent) -> usize {
        if !self.is_started() {
            return 0;
        }
        let channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        channels
            .get(kind)
            .and_then(|tx| tx.send(event).ok())
            .unwrap_or(0)
    }
}

impl Informers for SelfPopulatingInformers {
    fn watch(&self, kind: &GroupVersionKind) -> broadcast::Receiver<WatchEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        channels
            .entry(kind.clone())
            .or_insert_with(|| broadcast::channel(WATCH_CAPACITY).0)
            .subscribe()
    }

    fn start(&self, stop: CancellationToken) {
        if stop.is_cancelled() || self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let started = Arc::clone(&self.started);
        tokio::spawn(async move {
            stop.cancelled().await;
            started.store(false, Ordering::Release);
        });
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pods() -> GroupVersionKind {
        GroupVersionKind::gvk("", "v1", "Pod")
    }

    fn informers() -> SelfPopulatingInformers {
        SelfPopulatingInformers::new(
            Some(Arc::new(RestConfig::new("https://h".parse().unwrap()))),
            Arc::new(Scheme::new()),
        )
    }

    #[tokio::test]
    async fn test_events_dropped_before_start() {
        let inf = informers();
        let mut rx = inf.watch(&pods());

        assert_eq!(inf.notify(&pods(), WatchEvent::Added(ObjectRef::cluster("a"))), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delivers_after_start_to_all_watchers() {
        let inf = informers();
        let mut rx1 = inf.watch(&pods());
        let mut rx2 = inf.watch(&pods());
        inf.start(CancellationToken::new());

        let ev = WatchEvent::Modified(ObjectRef::namespaced("ns", "p"));
        assert_eq!(inf.notify(&pods(), ev.clone()), 2);
        assert_eq!(rx1.recv().await.unwrap(), ev);
        assert_eq!(rx2.recv().await.unwrap(), ev);
    }

    #[tokio::test]
    async fn test_unwatched_kind_reaches_nobody() {
        let inf = informers();
        inf.start(CancellationToken::new());
        let other = GroupVersionKind::gvk("apps", "v1", "Deployment");
        assert_eq!(inf.notify(&other, WatchEvent::Deleted(ObjectRef::cluster("x"))), 0);
    }

    #[tokio::test]
    async fn test_stop_ends_delivery() {
        let inf = informers();
        let _rx = inf.watch(&pods());
        let stop = CancellationToken::new();
        inf.start(stop.clone());
        assert!(inf.is_started());

        stop.cancel();
        tokio::time::timeout(Duration::from_secs(1), async {
            while inf.is_started() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("informers did not observe stop");

        assert_eq!(inf.notify(&pods(), WatchEvent::Added(ObjectRef::cluster("a"))), 0);
    }

    #[tokio::test]
    async fn test_start_with_fired_stop_is_noop() {
        let inf = informers();
        let stop = CancellationToken::new();
        stop.cancel();
        inf.start(stop);
        assert!(!inf.is_started());
    }

    #[test]
    fn test_watched_is_sorted_and_deduplicated() {
        let inf = informers();
        let _a = inf.watch(&GroupVersionKind::gvk("b", "v1", "X"));
        let _b = inf.watch(&GroupVersionKind::gvk("a", "v1", "X"));
        let _c = inf.watch(&GroupVersionKind::gvk("a", "v1", "X"));
        let groups: Vec<String> = inf.watched().into_iter().map(|k| k.group).collect();
        assert_eq!(groups, vec!["a", "b"]);
    }
}
