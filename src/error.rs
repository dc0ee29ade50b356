//! Error types for the dependency injection container.

use std::fmt;

use thiserror::Error;

/// Boxed error returned by user constructors, setters and injected methods.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Path of service keys walked by a resolution, from the originally requested
/// service down to the one that failed.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::ResolutionChain;
///
/// let chain = ResolutionChain::from(vec!["app::Api".to_string(), "app::Repo_sql".to_string()]);
/// assert_eq!(chain.to_string(), "app::Api -> app::Repo_sql");
/// assert_eq!(chain.requested(), Some("app::Api"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionChain(Vec<String>);

impl ResolutionChain {
    /// The service the caller originally asked for.
    pub fn requested(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The service at which resolution stopped.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ResolutionChain {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

impl fmt::Display for ResolutionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Where in the build of an instance a user callback failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionStage {
    Constructor,
    Property(&'static str),
    Method(&'static str),
}

impl fmt::Display for ConstructionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionStage::Constructor => write!(f, "constructor"),
            ConstructionStage::Property(name) => write!(f, "property `{}`", name),
            ConstructionStage::Method(name) => write!(f, "method `{}`", name),
        }
    }
}

/// Errors raised by [`Arguments`](crate::Arguments) accessors inside
/// constructor and method callbacks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("argument {index} is out of range ({len} arguments supplied)")]
    OutOfRange { index: usize, len: usize },
    #[error("argument {index} is not a `{expected}`")]
    TypeMismatch { index: usize, expected: &'static str },
}

/// Dependency injection errors
///
/// Every resolution failure aborts the whole object-graph build and surfaces
/// as exactly one of these variants at the original `resolve` call.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, Resolver};
///
/// struct Unregistered;
///
/// let container = Container::new();
/// match container.get::<Unregistered>() {
///     Err(DiError::ServiceNotRegistered { key, chain }) => {
///         assert!(key.ends_with("Unregistered"));
///         assert_eq!(chain.len(), 1);
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// Neither the requested key nor its unnamed fallback is registered
    #[error("service not registered: {key} (resolving {chain})")]
    ServiceNotRegistered { key: String, chain: ResolutionChain },
    /// The implementation type declares no constructor
    #[error("no constructor available on {implementation} for {key}")]
    NoConstructorAvailable { key: String, implementation: &'static str },
    /// A user constructor, setter or injected method failed or panicked
    #[error("construction of {implementation} for {key} failed in {stage}: {source}")]
    ConstructionFailed {
        key: String,
        implementation: &'static str,
        stage: ConstructionStage,
        #[source]
        source: BoxError,
    },
    /// Registered constants do not match the external parameters
    #[error("parameter mismatch for {key}: {supplied} constants supplied, {required} external parameters declared")]
    ParameterMismatch { key: String, supplied: usize, required: usize },
    /// Circular dependency detected (includes path)
    #[error("circular dependency: {0}")]
    CircularDependency(ResolutionChain),
    /// Maximum recursion depth exceeded
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// Resolved instance could not be viewed as the requested type
    #[error("type mismatch for {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    /// Invalid configuration value
    #[error("invalid configuration value for {key}: {value:?}")]
    Configuration { key: String, value: String },
}

impl DiError {
    /// The resolution chain carried by the error, if any.
    pub fn chain(&self) -> Option<&ResolutionChain> {
        match self {
            DiError::ServiceNotRegistered { chain, .. } => Some(chain),
            DiError::CircularDependency(chain) => Some(chain),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Error wrapping a caught panic so it can travel as a [`BoxError`].
#[derive(Debug, Error)]
#[error("panicked: {0}")]
pub struct PanicError(pub String);
