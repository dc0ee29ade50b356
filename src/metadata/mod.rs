//! Type metadata consulted by the resolution engine.
//!
//! Rust has no runtime reflection, so every implementation type describes
//! itself once through [`Injectable::describe`]. The resulting
//! [`TypeDescriptor`] lists constructors, properties and methods together with
//! their markers, and is built when the type is registered rather than on
//! every resolution.

use std::sync::Arc;

pub mod args;
pub mod builder;
pub mod descriptor;

pub use args::Arguments;
pub use builder::{ConstructorBuilder, DescriptorBuilder, MethodBuilder, PropertyBuilder};
pub use descriptor::{
    ConstructorDescriptor, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, TypeDescriptor,
};

/// Declaration-time flags understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Parameter value comes from the registration's constants
    External,
    /// Property receives an injected value, or method is invoked after construction
    Inject,
    /// Preferred constructor
    Selected,
}

impl Marker {
    const fn bit(self) -> u8 {
        match self {
            Marker::External => 0b001,
            Marker::Inject => 0b010,
            Marker::Selected => 0b100,
        }
    }
}

/// Compact set of [`Marker`]s attached to one declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerSet(u8);

impl MarkerSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn with(self, marker: Marker) -> Self {
        Self(self.0 | marker.bit())
    }

    pub fn insert(&mut self, marker: Marker) {
        self.0 |= marker.bit();
    }

    pub const fn contains(self, marker: Marker) -> bool {
        self.0 & marker.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Marker query implemented by every descriptor.
pub trait Marked {
    fn markers(&self) -> MarkerSet;

    fn has_marker(&self, marker: Marker) -> bool {
        self.markers().contains(marker)
    }
}

/// Implementation types the container knows how to build.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Arguments, DescriptorBuilder, Injectable};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct Scheduler {
///     clock: Arc<dyn Clock>,
///     interval: u64,
/// }
///
/// impl Injectable for Scheduler {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor()
///             .param::<dyn Clock>()
///             .external::<u64>()
///             .build(|args: &Arguments| {
///                 Ok(Scheduler {
///                     clock: args.service(0)?,
///                     interval: args.constant(1)?,
///                 })
///             });
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    fn describe(descriptor: &mut DescriptorBuilder<Self>);
}

/// Proof that an implementation can be viewed as service `S`.
///
/// Every type is assignable to itself. Trait objects are opted in with the
/// [`assignable!`](crate::assignable) macro.
pub trait Assignable<S: ?Sized + 'static>: Send + Sync + 'static {
    fn into_service(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Assignable<T> for T {
    #[inline(always)]
    fn into_service(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that implementation types can be resolved as trait objects.
///
/// ```rust
/// use ferrous_ioc::{assignable, Assignable};
/// use std::sync::Arc;
///
/// trait Repository: Send + Sync {}
/// struct SqlRepository;
/// impl Repository for SqlRepository {}
///
/// assignable!(SqlRepository => dyn Repository);
///
/// let repo = <SqlRepository as Assignable<dyn Repository>>::into_service(Arc::new(SqlRepository));
/// # let _ = repo;
/// ```
#[macro_export]
macro_rules! assignable {
    ($($implementation:ty => $service:ty),+ $(,)?) => {
        $(
            impl $crate::Assignable<$service> for $implementation {
                fn into_service(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}
