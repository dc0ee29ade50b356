//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{ServiceKey, ServiceType};

/// Object-safe core of every resolver.
///
/// Returns the type-erased instance: an `Arc<S>` stored behind `Any`.
pub trait ResolverCore: Send + Sync {
    fn resolve_any(&self, service: &ServiceType, name: Option<&str>) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// Typed resolution helpers, available on every [`ResolverCore`].
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{assignable, Container, DescriptorBuilder, Injectable, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// impl Injectable for English {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor().build(|_| Ok(English));
///     }
/// }
/// assignable!(English => dyn Greeter);
///
/// let container = Container::new();
/// container.register_singleton::<dyn Greeter, English>();
///
/// let greeter: Arc<dyn Greeter> = container.get_required::<dyn Greeter>();
/// assert_eq!(greeter.greet(), "hello");
/// // a named request falls back to the unnamed registration
/// assert!(container.get_named::<dyn Greeter>("formal").is_ok());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `S` under an optional service name.
    fn resolve<S: ?Sized + Send + Sync + 'static>(&self, name: Option<&str>) -> DiResult<Arc<S>> {
        let service = ServiceType::of::<S>();
        let any = self.resolve_any(&service, name)?;
        // instances are stored as Arc<Arc<S>> behind Any
        any.downcast::<Arc<S>>()
            .map(|stored| (*stored).clone())
            .map_err(|_| DiError::TypeMismatch {
                key: ServiceKey::new(service, name).to_string(),
                expected: std::any::type_name::<S>(),
            })
    }

    fn get<S: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<S>> {
        self.resolve::<S>(None)
    }

    fn get_named<S: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<S>> {
        self.resolve::<S>(Some(name))
    }

    /// Panics when resolution fails. Meant for tests and bootstrap code.
    fn get_required<S: ?Sized + Send + Sync + 'static>(&self) -> Arc<S> {
        self.get::<S>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<S>(), e))
    }

    fn get_named_required<S: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Arc<S> {
        self.get_named::<S>(name)
            .unwrap_or_else(|e| panic!("Failed to resolve named {} ({}): {}", std::any::type_name::<S>(), name, e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
