//! # Type registry.
//!
//! [`Scheme`] maps API kinds ([`GroupVersionKind`], re-exported from `kube`)
//! to the Rust type that represents them. Managers without an explicit
//! scheme share [`Scheme::global`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

pub use kube::api::GroupVersionKind;

/// Registry of known kinds.
///
/// Interior mutability lets a shared scheme accept registrations after it
/// has been handed to a manager.
#[derive(Default)]
pub struct Scheme {
    kinds: RwLock<HashMap<GroupVersionKind, &'static str>>,
}

impl Scheme {
    /// Creates an empty scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide default scheme.
    pub fn global() -> Arc<Scheme> {
        static GLOBAL: OnceLock<Arc<Scheme>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Scheme::new())))
    }

    /// Registers `T` as the representation of `gvk`.
    ///
    /// Returns `false` if the kind was already registered (the first type wins).
    pub fn register<T: 'static>(&self, gvk: GroupVersionKind) -> bool {
        let mut kinds = self.kinds.write().unwrap_or_else(|p| p.into_inner());
        if kinds.contains_key(&gvk) {
            return false;
        }
        kinds.insert(gvk, std::any::type_name::<T>());
        true
    }

    /// Returns true if `gvk` is registered.
    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(gvk)
    }

    /// Returns the Rust type name registered for `gvk`.
    pub fn type_name(&self, gvk: &GroupVersionKind) -> Option<&'static str> {
        self.kinds
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(gvk)
            .copied()
    }

    /// Returns all registered kinds, sorted.
    pub fn kinds(&self) -> Vec<GroupVersionKind> {
        let mut kinds: Vec<GroupVersionKind> = self
            .kinds
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        sort_kinds(&mut kinds);
        kinds
    }
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme").field("kinds", &self.kinds()).finish()
    }
}

/// Orders kinds by group, then version, then kind.
pub(crate) fn sort_kinds(kinds: &mut [GroupVersionKind]) {
    kinds.sort_unstable_by(|a, b| {
        (&a.group, &a.version, &a.kind).cmp(&(&b.group, &b.version, &b.kind))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pod;
    struct OtherPod;

    #[test]
    fn test_register_first_type_wins() {
        let scheme = Scheme::new();
        let gvk = GroupVersionKind::gvk("", "v1", "Pod");

        assert!(scheme.register::<Pod>(gvk.clone()));
        assert!(!scheme.register::<OtherPod>(gvk.clone()));
        assert!(scheme.type_name(&gvk).unwrap().ends_with("Pod"));
        assert!(!scheme.type_name(&gvk).unwrap().ends_with("OtherPod"));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&Scheme::global(), &Scheme::global()));
    }

    #[test]
    fn test_kinds_sorted() {
        let scheme = Scheme::new();
        scheme.register::<Pod>(GroupVersionKind::gvk("b", "v1", "X"));
        scheme.register::<Pod>(GroupVersionKind::gvk("a", "v2", "X"));
        scheme.register::<Pod>(GroupVersionKind::gvk("a", "v1", "X"));
        let versions: Vec<String> = scheme
            .kinds()
            .into_iter()
            .map(|k| k.api_version())
            .collect();
        assert_eq!(versions, vec!["a/v1", "a/v2", "b/v1"]);
        assert!(scheme.recognizes(&GroupVersionKind::gvk("a", "v1", "X")));
    }
}
