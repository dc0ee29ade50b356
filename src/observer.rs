//! Diagnostic observers for resolution events.
//!
//! Observers are registered on a [`ContainerBuilder`](crate::ContainerBuilder)
//! and called for every key the engine resolves, nested dependencies
//! included. With no observer registered the engine skips timing entirely.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::ServiceKey;

/// Hooks into the resolution of each service key.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiObserver, ServiceKey};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl DiObserver for Counter {
///     fn resolving(&self, _key: &ServiceKey) {}
///     fn resolved(&self, _key: &ServiceKey, _duration: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let counter = Arc::new(Counter::default());
/// let container = Container::builder().observer(counter.clone()).build();
/// # let _ = container;
/// ```
pub trait DiObserver: Send + Sync {
    fn resolving(&self, key: &ServiceKey);

    fn resolved(&self, key: &ServiceKey, duration: Duration);

    fn failed(&self, _key: &ServiceKey, _error: &DiError) {}

    /// A user constructor, setter or injected method panicked.
    fn factory_panic(&self, _key: &ServiceKey, _message: &str) {}
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &ServiceKey) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &ServiceKey, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, key: &ServiceKey, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }

    #[inline]
    pub(crate) fn factory_panic(&self, key: &ServiceKey, message: &str) {
        for observer in &self.observers {
            observer.factory_panic(key, message);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

/// Forwards resolution events to `tracing`.
///
/// Start and completion are emitted at `trace` level, failures at `debug`
/// and factory panics at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl LoggingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &ServiceKey) {
        tracing::trace!(key = %key, "resolving");
    }

    fn resolved(&self, key: &ServiceKey, duration: Duration) {
        tracing::trace!(key = %key, elapsed_us = duration.as_micros() as u64, "resolved");
    }

    fn failed(&self, key: &ServiceKey, error: &DiError) {
        tracing::debug!(key = %key, error = %error, "resolution failed");
    }

    fn factory_panic(&self, key: &ServiceKey, message: &str) {
        tracing::error!(key = %key, panic = message, "factory panicked");
    }
}

/// Counts resolutions, failures and panics.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolution_count: AtomicU64,
    failure_count: AtomicU64,
    panic_count: AtomicU64,
    total_resolution_time: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn panic_count(&self) -> u64 {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_resolution_time.load(Ordering::Relaxed))
    }

    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_resolution_time.load(Ordering::Relaxed) / count))
    }

    pub fn reset(&self) {
        self.resolution_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.panic_count.store(0, Ordering::Relaxed);
        self.total_resolution_time.store(0, Ordering::Relaxed);
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &ServiceKey) {}

    fn resolved(&self, _key: &ServiceKey, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_time
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn failed(&self, _key: &ServiceKey, _error: &DiError) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn factory_panic(&self, _key: &ServiceKey, _message: &str) {
        self.panic_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;

    #[test]
    fn metrics_observer_counts_events() {
        let observer = MetricsObserver::new();
        let key = key_of_type::<String>();

        assert_eq!(observer.resolution_count(), 0);
        assert!(observer.average_resolution_time().is_none());

        observer.resolved(&key, Duration::from_millis(10));
        observer.resolved(&key, Duration::from_millis(20));
        assert_eq!(observer.resolution_count(), 2);
        assert!(observer.total_resolution_time() >= Duration::from_millis(30));
        assert_eq!(observer.average_resolution_time(), Some(Duration::from_millis(15)));

        observer.failed(&key, &DiError::DepthExceeded(4));
        observer.factory_panic(&key, "boom");
        assert_eq!(observer.failure_count(), 1);
        assert_eq!(observer.panic_count(), 1);

        observer.reset();
        assert_eq!(observer.resolution_count(), 0);
        assert_eq!(observer.panic_count(), 0);
    }

    #[test]
    fn observers_fan_out() {
        let first = Arc::new(MetricsObserver::new());
        let second = Arc::new(MetricsObserver::new());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());

        observers.add(first.clone());
        observers.add(second.clone());
        observers.add(Arc::new(LoggingObserver::new()));
        assert_eq!(observers.len(), 3);

        let key = key_of_type::<u8>();
        observers.resolving(&key);
        observers.resolved(&key, Duration::from_micros(5));
        observers.factory_panic(&key, "boom");

        assert_eq!(first.resolution_count(), 1);
        assert_eq!(second.resolution_count(), 1);
        assert_eq!(second.panic_count(), 1);
    }
}
