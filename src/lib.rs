//! # ferrous-ioc
//!
//! Descriptor-driven inversion-of-control container for Rust.
//!
//! Implementation types describe their constructors, injectable properties
//! and post-construction methods once through [`Injectable`]. The container
//! maps a service identity (type plus optional name) to an implementation and
//! builds fully wired instances on demand, resolving each dependency
//! recursively.
//!
//! ## Features
//!
//! - **Four lifetimes**: Transient, Singleton, Scoped and PerContext
//! - **Named services** with fallback to the unnamed registration
//! - **Constructor, property and method injection**
//! - **External constants** supplied at registration and consumed in order
//! - **Trait objects** as service types via [`assignable!`]
//! - **Circular dependency detection** with the full resolution path
//! - **Thread-safe**: registration and resolution from any thread
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{assignable, Container, DescriptorBuilder, Injectable, Resolver};
//! use std::sync::Arc;
//!
//! trait Database: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//!
//! struct Postgres;
//! impl Database for Postgres {
//!     fn url(&self) -> &str { "postgres://localhost" }
//! }
//! impl Injectable for Postgres {
//!     fn describe(d: &mut DescriptorBuilder<Self>) {
//!         d.constructor().build(|_| Ok(Postgres));
//!     }
//! }
//! assignable!(Postgres => dyn Database);
//!
//! struct UserService {
//!     db: Arc<dyn Database>,
//! }
//! impl Injectable for UserService {
//!     fn describe(d: &mut DescriptorBuilder<Self>) {
//!         d.constructor()
//!             .param::<dyn Database>()
//!             .build(|args| Ok(UserService { db: args.service(0)? }));
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .register_singleton::<dyn Database, Postgres>()
//!     .register_transient::<UserService, UserService>();
//!
//! let users = container.get_required::<UserService>();
//! assert_eq!(users.db.url(), "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Transient**: built on every resolution
//! - **Singleton**: built once per registration and shared by every scope
//! - **Scoped**: built once per scope, see [`Container::create_scope`]
//! - **PerContext**: built once per execution context, see [`ContextSource`]
//!
//! ## Scoped Services
//!
//! ```rust
//! use ferrous_ioc::{Container, DescriptorBuilder, Injectable, Resolver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! static NEXT: AtomicUsize = AtomicUsize::new(0);
//!
//! struct RequestId(usize);
//! impl Injectable for RequestId {
//!     fn describe(d: &mut DescriptorBuilder<Self>) {
//!         d.constructor().build(|_| Ok(RequestId(NEXT.fetch_add(1, Ordering::SeqCst))));
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_scoped::<RequestId, RequestId>();
//!
//! let scope1 = container.create_scope();
//! let scope2 = container.create_scope();
//!
//! let req1 = scope1.get_required::<RequestId>();
//! assert!(Arc::ptr_eq(&req1, &scope1.get_required::<RequestId>()));
//! assert_ne!(req1.0, scope2.get_required::<RequestId>().0);
//! ```

// Module declarations
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod metadata;
pub mod observer;
pub mod provider;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-exports
pub use config::{ContainerOptions, SingletonPolicy};
pub use descriptors::ServiceDescriptor;
pub use error::{ArgumentError, BoxError, ConstructionStage, DiError, DiResult, PanicError, ResolutionChain};
pub use key::{key_of_type, ServiceKey, ServiceType};
pub use lifetime::Lifetime;
pub use metadata::{
    Arguments, Assignable, ConstructorBuilder, ConstructorDescriptor, DescriptorBuilder, Injectable, Marked,
    Marker, MarkerSet, MethodBuilder, MethodDescriptor, ParameterDescriptor, PropertyBuilder, PropertyDescriptor,
    TypeDescriptor,
};
pub use observer::{DiObserver, LoggingObserver, MetricsObserver};
pub use provider::{Container, ContainerBuilder, ContextId, ContextSource, ThreadContextSource};
pub use registration::Constants;
pub use traits::{Resolver, ResolverCore};
