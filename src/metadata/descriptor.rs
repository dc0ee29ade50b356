//! Plain descriptors produced by [`DescriptorBuilder`](super::DescriptorBuilder).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::args::Arguments;
use super::{Injectable, Marked, Marker, MarkerSet};
use crate::error::BoxError;
use crate::key::ServiceType;
use crate::registration::AnyArc;

pub(crate) type AnyBox = Box<dyn Any + Send + Sync>;
pub(crate) type CtorFn = Arc<dyn Fn(&Arguments) -> Result<AnyBox, BoxError> + Send + Sync>;
pub(crate) type SetterFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync + 'static), AnyArc) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type MethodFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync + 'static), &Arguments) -> Result<(), BoxError> + Send + Sync>;

/// One constructor or method parameter.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub(crate) position: usize,
    pub(crate) service: ServiceType,
    pub(crate) markers: MarkerSet,
}

impl ParameterDescriptor {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Declared type, resolved recursively unless the value is external
    pub fn service_type(&self) -> ServiceType {
        self.service
    }

    pub fn is_external(&self) -> bool {
        self.has_marker(Marker::External)
    }
}

impl Marked for ParameterDescriptor {
    fn markers(&self) -> MarkerSet {
        self.markers
    }
}

/// A constructor of an implementation type.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub(crate) index: usize,
    pub(crate) params: Vec<ParameterDescriptor>,
    pub(crate) markers: MarkerSet,
    pub(crate) invoke: CtorFn,
}

impl ConstructorDescriptor {
    /// Declaration order among the type's constructors
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn is_selected(&self) -> bool {
        self.has_marker(Marker::Selected)
    }

    pub(crate) fn external_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_external()).count()
    }
}

impl Marked for ConstructorDescriptor {
    fn markers(&self) -> MarkerSet {
        self.markers
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("index", &self.index)
            .field("params", &self.params)
            .field("markers", &self.markers)
            .finish()
    }
}

/// A property (field) of an implementation type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub(crate) name: &'static str,
    pub(crate) service: ServiceType,
    pub(crate) markers: MarkerSet,
    pub(crate) set: SetterFn,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn service_type(&self) -> ServiceType {
        self.service
    }
}

impl Marked for PropertyDescriptor {
    fn markers(&self) -> MarkerSet {
        self.markers
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("service", &self.service.name())
            .field("markers", &self.markers)
            .finish()
    }
}

/// A method of an implementation type.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<ParameterDescriptor>,
    pub(crate) markers: MarkerSet,
    pub(crate) invoke: MethodFn,
}

impl MethodDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub(crate) fn external_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_external()).count()
    }
}

impl Marked for MethodDescriptor {
    fn markers(&self) -> MarkerSet {
        self.markers
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("markers", &self.markers)
            .finish()
    }
}

/// Everything the engine needs to know about one implementation type.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{DescriptorBuilder, Injectable, TypeDescriptor};
///
/// struct Pool { size: usize }
///
/// impl Injectable for Pool {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor().build(|_| Ok(Pool { size: 4 }));
///         d.constructor().external::<usize>().build(|a| Ok(Pool { size: a.constant(0)? }));
///     }
/// }
///
/// let descriptor = TypeDescriptor::of::<Pool>();
/// assert_eq!(descriptor.constructors().len(), 2);
/// // no constructor is marked, so the one with the most parameters wins
/// assert_eq!(descriptor.select_constructor().unwrap().index(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub(crate) implementation: ServiceType,
    pub(crate) constructors: Vec<ConstructorDescriptor>,
    pub(crate) properties: Vec<PropertyDescriptor>,
    pub(crate) methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    pub fn of<T: Injectable>() -> Self {
        let mut builder = super::DescriptorBuilder::<T>::new();
        T::describe(&mut builder);
        builder.finish()
    }

    pub fn implementation(&self) -> ServiceType {
        self.implementation
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Picks the constructor used to build the type.
    ///
    /// The first constructor marked [`Marker::Selected`] wins. Otherwise the
    /// constructor with the most parameters is used, the earliest declared
    /// one on ties.
    pub fn select_constructor(&self) -> Option<&ConstructorDescriptor> {
        if let Some(selected) = self.constructors.iter().find(|c| c.is_selected()) {
            return Some(selected);
        }
        self.constructors.iter().fold(None, |best, ctor| match best {
            Some(b) if b.params.len() >= ctor.params.len() => Some(b),
            _ => Some(ctor),
        })
    }

    pub fn injected_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.has_marker(Marker::Inject))
    }

    pub fn injected_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().filter(|m| m.has_marker(Marker::Inject))
    }

    /// External parameters consumed by one build through `ctor`.
    pub(crate) fn external_count(&self, ctor: &ConstructorDescriptor) -> usize {
        ctor.external_count() + self.injected_methods().map(|m| m.external_count()).sum::<usize>()
    }
}
