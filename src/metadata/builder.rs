//! Declarative builder used by [`Injectable::describe`](super::Injectable::describe).

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use super::args::Arguments;
use super::descriptor::{
    AnyBox, ConstructorDescriptor, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, TypeDescriptor,
};
use super::{Marker, MarkerSet};
use crate::error::BoxError;
use crate::key::ServiceType;
use crate::registration::AnyArc;

/// Collects the constructors, properties and methods of `T`.
///
/// Sub-builders borrow the descriptor builder and append their declaration
/// when finished (`build`, `set`, `invoke`), so declaration order is
/// preserved.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{DescriptorBuilder, Injectable, Marked, Marker, TypeDescriptor};
/// use std::sync::Arc;
///
/// struct Audit;
/// struct Handler {
///     audit: Option<Arc<Audit>>,
///     ready: bool,
/// }
///
/// impl Injectable for Handler {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor().build(|_| Ok(Handler { audit: None, ready: false }));
///         d.property::<Audit>("audit").inject().set(|h, audit| h.audit = Some(audit));
///         d.method("warm_up").inject().invoke(|h, _| {
///             h.ready = true;
///             Ok(())
///         });
///     }
/// }
///
/// let descriptor = TypeDescriptor::of::<Handler>();
/// assert!(descriptor.properties()[0].has_marker(Marker::Inject));
/// assert_eq!(descriptor.methods()[0].name(), "warm_up");
/// ```
pub struct DescriptorBuilder<T> {
    constructors: Vec<ConstructorDescriptor>,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            constructors: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Starts declaring a constructor.
    pub fn constructor(&mut self) -> ConstructorBuilder<'_, T> {
        ConstructorBuilder {
            owner: self,
            params: ParameterList::default(),
            markers: MarkerSet::empty(),
        }
    }

    /// Starts declaring a property of declared type `P`.
    pub fn property<P: ?Sized + Send + Sync + 'static>(&mut self, name: &'static str) -> PropertyBuilder<'_, T, P> {
        PropertyBuilder {
            owner: self,
            name,
            markers: MarkerSet::empty(),
            _marker: PhantomData,
        }
    }

    /// Starts declaring a method.
    pub fn method(&mut self, name: &'static str) -> MethodBuilder<'_, T> {
        MethodBuilder {
            owner: self,
            name,
            params: ParameterList::default(),
            markers: MarkerSet::empty(),
        }
    }

    pub(crate) fn finish(self) -> TypeDescriptor {
        TypeDescriptor {
            implementation: ServiceType::of::<T>(),
            constructors: self.constructors,
            properties: self.properties,
            methods: self.methods,
        }
    }
}

#[derive(Default)]
struct ParameterList(Vec<ParameterDescriptor>);

impl ParameterList {
    fn push(&mut self, service: ServiceType, markers: MarkerSet) {
        let position = self.0.len();
        self.0.push(ParameterDescriptor {
            position,
            service,
            markers,
        });
    }
}

/// Declares one constructor; see [`DescriptorBuilder::constructor`].
pub struct ConstructorBuilder<'a, T> {
    owner: &'a mut DescriptorBuilder<T>,
    params: ParameterList,
    markers: MarkerSet,
}

impl<'a, T: Send + Sync + 'static> ConstructorBuilder<'a, T> {
    /// Adds a parameter resolved from the container.
    pub fn param<P: ?Sized + 'static>(mut self) -> Self {
        self.params.push(ServiceType::of::<P>(), MarkerSet::empty());
        self
    }

    /// Adds a parameter marked as externally supplied.
    pub fn external<C: Send + Sync + 'static>(mut self) -> Self {
        self.params
            .push(ServiceType::of::<C>(), MarkerSet::empty().with(Marker::External));
        self
    }

    /// Marks this constructor as the preferred one.
    pub fn selected(mut self) -> Self {
        self.markers.insert(Marker::Selected);
        self
    }

    pub fn build<F>(self, constructor: F)
    where
        F: Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let index = self.owner.constructors.len();
        self.owner.constructors.push(ConstructorDescriptor {
            index,
            params: self.params.0,
            markers: self.markers,
            invoke: Arc::new(move |args: &Arguments| -> Result<AnyBox, BoxError> {
                let instance: AnyBox = Box::new(constructor(args)?);
                Ok(instance)
            }),
        });
    }
}

/// Declares one property; see [`DescriptorBuilder::property`].
pub struct PropertyBuilder<'a, T, P: ?Sized> {
    owner: &'a mut DescriptorBuilder<T>,
    name: &'static str,
    markers: MarkerSet,
    _marker: PhantomData<fn() -> Arc<P>>,
}

impl<'a, T, P> PropertyBuilder<'a, T, P>
where
    T: Send + Sync + 'static,
    P: ?Sized + Send + Sync + 'static,
{
    /// Marks the property as receiving an injected value.
    pub fn inject(mut self) -> Self {
        self.markers.insert(Marker::Inject);
        self
    }

    pub fn set<F>(self, setter: F)
    where
        F: Fn(&mut T, Arc<P>) + Send + Sync + 'static,
    {
        let name = self.name;
        self.owner.properties.push(PropertyDescriptor {
            name,
            service: ServiceType::of::<P>(),
            markers: self.markers,
            set: Arc::new(move |target: &mut (dyn Any + Send + Sync + 'static), value: AnyArc| -> Result<(), BoxError> {
                let target = target
                    .downcast_mut::<T>()
                    .ok_or_else(|| format!("target of property `{}` is not a {}", name, std::any::type_name::<T>()))?;
                let value = value
                    .downcast_ref::<Arc<P>>()
                    .cloned()
                    .ok_or_else(|| format!("value for property `{}` is not a {}", name, std::any::type_name::<P>()))?;
                setter(target, value);
                Ok(())
            }),
        });
    }
}

/// Declares one method; see [`DescriptorBuilder::method`].
pub struct MethodBuilder<'a, T> {
    owner: &'a mut DescriptorBuilder<T>,
    name: &'static str,
    params: ParameterList,
    markers: MarkerSet,
}

impl<'a, T: Send + Sync + 'static> MethodBuilder<'a, T> {
    /// Marks the method for invocation right after construction.
    pub fn inject(mut self) -> Self {
        self.markers.insert(Marker::Inject);
        self
    }

    pub fn param<P: ?Sized + 'static>(mut self) -> Self {
        self.params.push(ServiceType::of::<P>(), MarkerSet::empty());
        self
    }

    /// Adds an externally supplied parameter. Its constant comes after the
    /// ones taken by the constructor and by earlier injected methods.
    pub fn external<C: Send + Sync + 'static>(mut self) -> Self {
        self.params
            .push(ServiceType::of::<C>(), MarkerSet::empty().with(Marker::External));
        self
    }

    pub fn invoke<F>(self, method: F)
    where
        F: Fn(&mut T, &Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = self.name;
        self.owner.methods.push(MethodDescriptor {
            name,
            params: self.params.0,
            markers: self.markers,
            invoke: Arc::new(move |target: &mut (dyn Any + Send + Sync + 'static), args: &Arguments| -> Result<(), BoxError> {
                let target = target
                    .downcast_mut::<T>()
                    .ok_or_else(|| format!("target of method `{}` is not a {}", name, std::any::type_name::<T>()))?;
                method(target, args)
            }),
        });
    }
}
