//! Service registration types: the service metadata store and the parameter store.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;

use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::metadata::descriptor::AnyBox;
use crate::metadata::{Assignable, Injectable, TypeDescriptor};

// Type-erased Arc for storage. Resolved services hold an `Arc<S>` inside.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

// Externally supplied value, stored as the raw value.
pub(crate) type Constant = Arc<dyn Any + Send + Sync>;

// Turns a freshly built implementation into the stored `Arc<S>` form.
type UpcastFn = Arc<dyn Fn(AnyBox) -> Option<AnyArc> + Send + Sync>;

/// Ordered constant values consumed by parameters marked external.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{constants, Constants};
///
/// let built = Constants::new().with(8080u16).with("localhost".to_string());
/// let from_macro = constants![8080u16, "localhost".to_string()];
///
/// assert_eq!(built.len(), 2);
/// assert_eq!(from_macro.len(), 2);
/// assert!(Constants::default().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Constants {
    values: Vec<Constant>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value; order of calls is the consumption order.
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_shared(self) -> Arc<[Constant]> {
        Arc::from(self.values)
    }
}

impl fmt::Debug for Constants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constants").field("len", &self.values.len()).finish()
    }
}

/// Builds a [`Constants`] list from expressions, in order.
#[macro_export]
macro_rules! constants {
    () => {
        $crate::Constants::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Constants::new()$(.with($value))+
    };
}

/// One entry of the service metadata store.
pub(crate) struct ServiceRegistration {
    pub(crate) key: ServiceKey,
    pub(crate) lifetime: Lifetime,
    pub(crate) descriptor: Arc<TypeDescriptor>,
    pub(crate) upcast: UpcastFn,
    /// Written at most once, after a fully successful build
    pub(crate) singleton: OnceCell<AnyArc>,
    /// Held while building under `SingletonPolicy::Exclusive`
    pub(crate) build_lock: ReentrantMutex<()>,
}

impl ServiceRegistration {
    pub(crate) fn new<S, I>(key: ServiceKey, lifetime: Lifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        let upcast: UpcastFn = Arc::new(|instance: AnyBox| {
            let concrete: Box<I> = instance.downcast::<I>().ok()?;
            let service: Arc<S> = <I as Assignable<S>>::into_service(Arc::from(concrete));
            Some(Arc::new(service) as AnyArc)
        });

        Self {
            key,
            lifetime,
            descriptor: Arc::new(TypeDescriptor::of::<I>()),
            upcast,
            singleton: OnceCell::new(),
            build_lock: ReentrantMutex::new(()),
        }
    }

    pub(crate) fn implementation_name(&self) -> &'static str {
        self.descriptor.implementation().name()
    }
}

impl fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("key", &self.key.to_string())
            .field("lifetime", &self.lifetime)
            .field("implementation", &self.implementation_name())
            .field("cached", &self.singleton.get().is_some())
            .finish()
    }
}

/// Service metadata store, shared by every scope of a container tree.
#[derive(Default)]
pub(crate) struct Registry {
    entries: DashMap<ServiceKey, Arc<ServiceRegistration>>,
}

impl Registry {
    /// Inserts unless the key is taken. Returns false for a duplicate.
    pub(crate) fn insert_if_absent(&self, registration: ServiceRegistration) -> bool {
        match self.entries.entry(registration.key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(registration));
                true
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Arc<ServiceRegistration>> {
        // clone out so no shard lock is held across recursive resolution
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Exact key first, then the unnamed key for a named request.
    pub(crate) fn lookup(&self, key: &ServiceKey) -> Option<Arc<ServiceRegistration>> {
        match self.get(key) {
            Some(registration) => Some(registration),
            None if key.is_named() => self.get(&key.unnamed()),
            None => None,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<ServiceRegistration>> {
        self.entries.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Parameter store: constant sets keyed like registrations.
#[derive(Default)]
pub(crate) struct ParameterStore {
    entries: DashMap<ServiceKey, Arc<[Constant]>>,
}

impl ParameterStore {
    /// Stores a non-empty set unless the key already has one.
    ///
    /// Returns false when the set was empty or a set already existed.
    pub(crate) fn insert_if_absent(&self, key: ServiceKey, constants: Constants) -> bool {
        if constants.is_empty() {
            return false;
        }
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(constants.into_shared());
                true
            }
        }
    }

    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Arc<[Constant]>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn count(&self, key: &ServiceKey) -> usize {
        self.entries.get(key).map_or(0, |entry| entry.value().len())
    }

    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }
}
