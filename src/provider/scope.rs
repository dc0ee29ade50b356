//! Scope store: instances of Scoped services built within one scope.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::key::ServiceKey;
use crate::registration::AnyArc;

/// Private instance store of one scope.
///
/// Guarded by a mutex so a scope can be shared across threads. Racing builds
/// of the same key keep the first committed instance.
#[derive(Default)]
pub(crate) struct ScopeStore {
    scoped: Mutex<HashMap<ServiceKey, AnyArc>>,
}

impl ScopeStore {
    #[inline]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<AnyArc> {
        self.scoped.lock().get(key).cloned()
    }

    /// Stores `instance` unless the key is already present and returns the
    /// instance that ends up stored.
    pub(crate) fn commit(&self, key: ServiceKey, instance: AnyArc) -> AnyArc {
        self.scoped.lock().entry(key).or_insert(instance).clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.scoped.lock().len()
    }
}
