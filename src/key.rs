//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Separator between the type name and the service name in the canonical form.
pub const NAME_SEPARATOR: char = '_';

/// Identity of a requested service type.
///
/// Works for concrete types and for trait objects alike (`dyn Trait`).
/// Equality and hashing use the `TypeId` only; the name is kept for
/// diagnostics and the canonical key form.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::ServiceType;
///
/// trait Logger: Send + Sync {}
///
/// let string = ServiceType::of::<String>();
/// assert_eq!(string.name(), "alloc::string::String");
/// assert_ne!(string, ServiceType::of::<dyn Logger>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
}

impl ServiceType {
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as reported by `std::any::type_name`
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceType {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Key for service storage and lookup.
///
/// Derived deterministically from a requested type and an optional service
/// name. Blank or whitespace-only names are treated as absent. Two keys are
/// equal iff both components are equal.
///
/// The canonical form is `"{TypeFullName}"` for unnamed keys and
/// `"{TypeFullName}_{name}"` for named ones.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::ServiceKey;
///
/// let unnamed = ServiceKey::of::<u32>(None);
/// let blank = ServiceKey::of::<u32>(Some("   "));
/// let named = ServiceKey::of::<u32>(Some("port"));
///
/// assert_eq!(unnamed, blank);
/// assert_eq!(unnamed.to_string(), "u32");
/// assert_eq!(named.to_string(), "u32_port");
/// assert_eq!(named.unnamed(), unnamed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    service: ServiceType,
    name: Option<Arc<str>>,
}

impl ServiceKey {
    pub fn new(service: ServiceType, name: Option<&str>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .map(Arc::from);
        Self { service, name }
    }

    pub fn of<T: ?Sized + 'static>(name: Option<&str>) -> Self {
        Self::new(ServiceType::of::<T>(), name)
    }

    pub fn service_type(&self) -> ServiceType {
        self.service
    }

    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        self.service.name()
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// The same key with the service name stripped.
    pub fn unnamed(&self) -> Self {
        Self {
            service: self.service,
            name: None,
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}{}", self.service.name(), NAME_SEPARATOR, name),
            None => f.write_str(self.service.name()),
        }
    }
}

// Helper function for creating unnamed type keys
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> ServiceKey {
    ServiceKey::of::<T>(None)
}
