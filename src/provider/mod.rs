//! Container module for dependency injection.
//!
//! This module contains the [`Container`] façade and its
//! [`ContainerBuilder`]. A container combines the shared stores (service
//! metadata, parameters, per-context instances) with a private scope store;
//! [`Container::create_scope`] produces a sibling node that shares the former
//! and owns a fresh instance of the latter.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::config::{ContainerOptions, SingletonPolicy};
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::BuildWaits;
use crate::key::{ServiceKey, ServiceType};
use crate::lifetime::Lifetime;
use crate::metadata::{Assignable, Injectable};
use crate::observer::{DiObserver, Observers};
use crate::registration::{AnyArc, Constants, ParameterStore, Registry, ServiceRegistration};
use crate::traits::ResolverCore;

pub mod context;
pub(crate) mod resolve;
pub(crate) mod scope;

pub use context::{ContextId, ContextSource, ThreadContextSource};
use context::ContextStore;
use resolve::Resolution;
use scope::ScopeStore;

/// State shared by every scope of one container tree.
pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) parameters: ParameterStore,
    pub(crate) contexts: ContextStore,
    pub(crate) build_waits: BuildWaits,
    pub(crate) options: ContainerOptions,
    pub(crate) observers: Observers,
    pub(crate) context_source: Box<dyn ContextSource>,
}

/// Dependency injection container.
///
/// Registrations, constants, singletons and per-context instances are shared
/// across the scope tree; Scoped instances live in the node that built them.
/// Cloning a `Container` yields another handle to the same node.
///
/// # Thread Safety
///
/// `Container` is `Send + Sync`. Registration and resolution may run
/// concurrently from any thread, including on a shared scope.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{constants, Container, DescriptorBuilder, Injectable, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Settings { url: String, pool: u32 }
///
/// impl Injectable for Settings {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor()
///             .external::<String>()
///             .external::<u32>()
///             .build(|a| Ok(Settings { url: a.constant(0)?, pool: a.constant(1)? }));
///     }
/// }
///
/// struct Repository { settings: Arc<Settings> }
///
/// impl Injectable for Repository {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor()
///             .param::<Settings>()
///             .build(|a| Ok(Repository { settings: a.service(0)? }));
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register::<Settings, Settings>(None, Lifetime::Singleton, constants!["postgres://db".to_string(), 8u32])
///     .register_transient::<Repository, Repository>();
///
/// let repo = container.get_required::<Repository>();
/// assert_eq!(repo.settings.url, "postgres://db");
/// assert_eq!(repo.settings.pool, 8);
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) shared: Arc<Shared>,
    pub(crate) scope: Arc<ScopeStore>,
}

impl Container {
    /// Creates a container with default options and thread-based contexts.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Creates a new scope sharing registrations, constants, singletons and
    /// per-context instances, with its own empty Scoped store.
    pub fn create_scope(&self) -> Container {
        Container {
            shared: Arc::clone(&self.shared),
            scope: Arc::new(ScopeStore::default()),
        }
    }

    /// Registers implementation `I` for service `S`.
    ///
    /// A blank or whitespace-only name counts as no name. If the key is
    /// already registered the call leaves the existing registration in place.
    /// A non-empty constant set is stored when the key has none yet, even if
    /// the registration itself was a duplicate.
    ///
    /// Constants are consumed in order by the external parameters of the
    /// selected constructor and then by those of each injected method, in
    /// declaration order. The position carries over from one member to the
    /// next: an injected method does not start again at the first constant,
    /// so its own external parameters are read with indices local to the
    /// method while the values come from further along the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_ioc::{constants, Container, DescriptorBuilder, Injectable, Lifetime, Resolver};
    ///
    /// struct Radio { channel: u8, volume: u8 }
    ///
    /// impl Injectable for Radio {
    ///     fn describe(d: &mut DescriptorBuilder<Self>) {
    ///         d.constructor()
    ///             .external::<u8>()
    ///             .build(|a| Ok(Radio { channel: a.constant(0)?, volume: 0 }));
    ///         d.method("set_volume").inject().external::<u8>().invoke(|r, a| {
    ///             r.volume = a.constant(0)?;
    ///             Ok(())
    ///         });
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register::<Radio, Radio>(None, Lifetime::Transient, constants![4u8, 9u8]);
    ///
    /// let radio = container.get_required::<Radio>();
    /// assert_eq!((radio.channel, radio.volume), (4, 9));
    /// ```
    pub fn register<S, I>(&self, name: Option<&str>, lifetime: Lifetime, constants: Constants) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        let key = ServiceKey::of::<S>(name);
        let supplied = constants.len();

        let registration = ServiceRegistration::new::<S, I>(key.clone(), lifetime);
        if self.shared.registry.insert_if_absent(registration) {
            tracing::debug!(
                key = %key,
                implementation = std::any::type_name::<I>(),
                lifetime = %lifetime,
                "registered service"
            );
        } else {
            tracing::debug!(key = %key, "duplicate registration ignored");
        }

        if supplied > 0 && !self.shared.parameters.insert_if_absent(key.clone(), constants) {
            tracing::warn!(key = %key, supplied, "constants already registered for key; keeping the first set");
        }
        self
    }

    pub fn register_transient<S, I>(&self) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        self.register::<S, I>(None, Lifetime::Transient, Constants::new())
    }

    pub fn register_singleton<S, I>(&self) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        self.register::<S, I>(None, Lifetime::Singleton, Constants::new())
    }

    pub fn register_scoped<S, I>(&self) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        self.register::<S, I>(None, Lifetime::Scoped, Constants::new())
    }

    pub fn register_per_context<S, I>(&self) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        self.register::<S, I>(None, Lifetime::PerContext, Constants::new())
    }

    pub fn register_named<S, I>(&self, name: &str, lifetime: Lifetime) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Assignable<S>,
    {
        self.register::<S, I>(Some(name), lifetime, Constants::new())
    }

    /// Resolves `S` within an explicit execution context instead of the one
    /// reported by the configured [`ContextSource`].
    ///
    /// ```rust
    /// use ferrous_ioc::{Container, ContextId, DescriptorBuilder, Injectable};
    /// use std::sync::Arc;
    ///
    /// struct Session;
    /// impl Injectable for Session {
    ///     fn describe(d: &mut DescriptorBuilder<Self>) {
    ///         d.constructor().build(|_| Ok(Session));
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_per_context::<Session, Session>();
    ///
    /// let a1 = container.resolve_in::<Session>(ContextId::new(1), None).unwrap();
    /// let a2 = container.resolve_in::<Session>(ContextId::new(1), None).unwrap();
    /// let b = container.resolve_in::<Session>(ContextId::new(2), None).unwrap();
    /// assert!(Arc::ptr_eq(&a1, &a2));
    /// assert!(!Arc::ptr_eq(&a1, &b));
    /// ```
    pub fn resolve_in<S>(&self, context: ContextId, name: Option<&str>) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let service = ServiceType::of::<S>();
        let any = self.resolve_with_context(&service, name, context)?;
        any.downcast::<Arc<S>>()
            .map(|stored| (*stored).clone())
            .map_err(|_| DiError::TypeMismatch {
                key: ServiceKey::new(service, name).to_string(),
                expected: std::any::type_name::<S>(),
            })
    }

    /// Drops every per-context instance cached for `context`.
    ///
    /// Instances cached under a thread's default context are dropped
    /// automatically when that thread exits. Call this for explicit or
    /// custom-source contexts that are reused. Returns the number of
    /// instances removed.
    pub fn clear_context(&self, context: ContextId) -> usize {
        let removed = self.shared.contexts.clear(context);
        tracing::trace!(context = %context, removed, "cleared execution context");
        removed
    }

    /// Whether resolving `S` under `name` would find a registration,
    /// applying the same named fallback as resolution.
    pub fn is_registered<S: ?Sized + 'static>(&self, name: Option<&str>) -> bool {
        self.shared.registry.lookup(&ServiceKey::of::<S>(name)).is_some()
    }

    /// Snapshot of every registration, in no particular order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.shared
            .registry
            .snapshot()
            .iter()
            .map(|registration| ServiceDescriptor::from_registration(registration, &self.shared.parameters))
            .collect()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.shared.options
    }

    /// Number of Scoped instances cached in this scope.
    pub fn scoped_count(&self) -> usize {
        self.scope.len()
    }

    /// Number of per-context instances cached across all contexts.
    pub fn context_count(&self) -> usize {
        self.shared.contexts.len()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut registrations = self.shared.registry.snapshot();
        registrations.sort_by_key(|registration| registration.key.to_string());

        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str(&format!("Options: {:?}\n", self.shared.options));
        s.push_str("Registrations:\n");
        for registration in registrations {
            s.push_str(&format!(
                "  {} -> {} ({}, {} constants)\n",
                registration.key,
                registration.implementation_name(),
                registration.lifetime,
                self.shared.parameters.count(&registration.key),
            ));
        }
        s.push_str(&format!("Scoped instances: {}\n", self.scope.len()));
        s
    }

    fn resolve_with_context(
        &self,
        service: &ServiceType,
        name: Option<&str>,
        context: ContextId,
    ) -> DiResult<AnyArc> {
        let key = ServiceKey::new(*service, name);
        let span = tracing::trace_span!("resolve", key = %key, context = %context);
        let _entered = span.enter();
        Resolution::new(self, context).resolve(&key)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.shared.registry.len())
            .field("scoped", &self.scope.len())
            .field("options", &self.shared.options)
            .finish()
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, service: &ServiceType, name: Option<&str>) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let context = self.shared.context_source.current();
        self.resolve_with_context(service, name, context)
    }
}

/// Builder for a [`Container`] with custom options, observers or context
/// source.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, ContextId, LoggingObserver, SingletonPolicy};
/// use std::sync::Arc;
///
/// let container = Container::builder()
///     .max_depth(64)
///     .singleton_policy(SingletonPolicy::FirstCommitWins)
///     .observer(Arc::new(LoggingObserver::new()))
///     .context_source(|| ContextId::new(1))
///     .build();
///
/// assert_eq!(container.options().max_depth, 64);
/// ```
pub struct ContainerBuilder {
    options: ContainerOptions,
    observers: Observers,
    context_source: Option<Box<dyn ContextSource>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            options: ContainerOptions::default(),
            observers: Observers::new(),
            context_source: None,
        }
    }

    /// Replaces all options at once, e.g. with
    /// [`ContainerOptions::from_env`].
    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth.max(1);
        self
    }

    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.options.detect_cycles = enabled;
        self
    }

    pub fn singleton_policy(mut self, policy: SingletonPolicy) -> Self {
        self.options.singleton_policy = policy;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn context_source<C: ContextSource + 'static>(mut self, source: C) -> Self {
        self.context_source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Container {
        let mut options = self.options;
        options.max_depth = options.max_depth.max(1);
        Container {
            shared: Arc::new(Shared {
                registry: Registry::default(),
                parameters: ParameterStore::default(),
                contexts: ContextStore::default(),
                build_waits: BuildWaits::default(),
                options,
                observers: self.observers,
                context_source: self
                    .context_source
                    .unwrap_or_else(|| Box::new(ThreadContextSource)),
            }),
            scope: Arc::new(ScopeStore::default()),
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("options", &self.options)
            .field("observers", &self.observers.len())
            .field("custom_context_source", &self.context_source.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DescriptorBuilder;
    use crate::traits::Resolver;

    struct Probe;

    impl Injectable for Probe {
        fn describe(d: &mut DescriptorBuilder<Self>) {
            d.constructor().build(|_| Ok(Probe));
        }
    }

    #[test]
    fn scopes_share_registrations_but_not_scoped_instances() {
        let root = Container::new();
        let scope = root.create_scope();
        scope.register_scoped::<Probe, Probe>();

        assert!(root.is_registered::<Probe>(None));
        let _ = scope.get_required::<Probe>();
        assert_eq!(scope.scoped_count(), 1);
        assert_eq!(root.scoped_count(), 0);

        // clones are handles to the same node
        assert_eq!(scope.clone().scoped_count(), 1);
    }

    #[test]
    fn builder_clamps_depth() {
        let container = Container::builder().max_depth(0).build();
        assert_eq!(container.options().max_depth, 1);

        let container = Container::builder()
            .options(ContainerOptions {
                max_depth: 0,
                detect_cycles: false,
                singleton_policy: SingletonPolicy::FirstCommitWins,
            })
            .build();
        assert_eq!(container.options().max_depth, 1);
        assert!(!container.options().detect_cycles);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn debug_string_lists_registrations() {
        let container = Container::new();
        container.register_singleton::<Probe, Probe>();
        let dump = container.to_debug_string();
        assert!(dump.contains("Probe"));
        assert!(dump.contains("singleton"));
    }
}
