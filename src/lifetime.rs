//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// Each lifetime is checked before construction (returning a cached instance
/// when one exists) and committed after a fully successful build.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DescriptorBuilder, Injectable, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn describe(d: &mut DescriptorBuilder<Self>) {
///         d.constructor().build(|_| Ok(Clock));
///     }
/// }
///
/// let container = Container::new();
/// container.register::<Clock, Clock>(None, Lifetime::Scoped, Default::default());
///
/// let scope1 = container.create_scope();
/// let scope2 = container.create_scope();
///
/// let a = scope1.get_required::<Clock>();
/// let b = scope1.get_required::<Clock>();
/// let c = scope2.get_required::<Clock>();
///
/// assert!(Arc::ptr_eq(&a, &b)); // Same within scope
/// assert!(!Arc::ptr_eq(&a, &c)); // Different across scopes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum Lifetime {
    /// New instance per resolution, never cached
    #[default]
    Transient,
    /// Single instance per registration, cached for the process lifetime
    ///
    /// The instance lives in the registration entry, so it is shared by
    /// every scope of the container tree.
    Singleton,
    /// Single instance per scope, cached for scope lifetime
    ///
    /// Never promoted to the parent scope or shared with sibling scopes.
    Scoped,
    /// Single instance per execution context
    ///
    /// Cached under the pair (service key, context id). With the default
    /// context source, one context is one OS thread.
    PerContext,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Transient => "transient",
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::PerContext => "per-context",
        }
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
