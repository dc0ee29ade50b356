//! Service descriptors for introspection and diagnostics.

use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::registration::{ParameterStore, ServiceRegistration};

/// Snapshot of one registration, as returned by
/// [`Container::descriptors`](crate::Container::descriptors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub key: ServiceKey,
    pub lifetime: Lifetime,
    pub impl_type_name: &'static str,
    /// Constants registered under the key
    pub constant_count: usize,
    /// Whether a singleton instance is cached
    pub has_instance: bool,
}

impl ServiceDescriptor {
    pub(crate) fn from_registration(registration: &ServiceRegistration, parameters: &ParameterStore) -> Self {
        Self {
            key: registration.key.clone(),
            lifetime: registration.lifetime,
            impl_type_name: registration.implementation_name(),
            constant_count: parameters.count(&registration.key),
            has_instance: registration.singleton.get().is_some(),
        }
    }

    pub fn service_name(&self) -> Option<&str> {
        self.key.service_name()
    }

    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn is_named(&self) -> bool {
        self.key.is_named()
    }
}
