//! The resolution engine: recursive object-graph construction.
//!
//! One [`Resolution`] is created per top-level `resolve` call. It carries the
//! container being resolved from, the execution context and the path of keys
//! under construction. For every key it:
//!
//! 1. looks up the registration, falling back from a named to the unnamed key;
//! 2. returns a cached instance when the lifetime allows it;
//! 3. selects a constructor and assembles its arguments, taking constants for
//!    external parameters and resolving everything else recursively under the
//!    current service name;
//! 4. invokes the constructor, injects properties (unnamed lookups) and calls
//!    injected methods;
//! 5. commits the instance to the lifetime's store.
//!
//! Nothing is cached for a key unless its whole build succeeded.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::ReentrantMutexGuard;

use crate::config::SingletonPolicy;
use crate::error::{panic_message, BoxError, ConstructionStage, DiError, DiResult, PanicError};
use crate::internal::circular::BuildHold;
use crate::internal::ResolutionPath;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::metadata::args::{Argument, Arguments};
use crate::metadata::descriptor::AnyBox;
use crate::metadata::ParameterDescriptor;
use crate::registration::{AnyArc, Constant, ServiceRegistration};

use super::context::ContextId;
use super::Container;

/// How long a blocked singleton build waits between deadlock checks.
const BUILD_WAIT_SLICE: Duration = Duration::from_millis(10);

/// State of one top-level resolution.
pub(crate) struct Resolution<'a> {
    container: &'a Container,
    context: ContextId,
    path: ResolutionPath,
}

/// Running position in a key's constant set, shared by the constructor and
/// every injected method of one build.
struct ConstantCursor<'c> {
    constants: &'c [Constant],
    next: usize,
}

impl<'c> ConstantCursor<'c> {
    fn new(constants: &'c [Constant]) -> Self {
        Self { constants, next: 0 }
    }

    fn take(&mut self) -> Option<Constant> {
        let value = self.constants.get(self.next)?.clone();
        self.next += 1;
        Some(value)
    }
}

/// Exclusive build lock of one singleton registration.
struct BuildGuard<'r> {
    // released before the lock itself
    _hold: BuildHold<'r>,
    _lock: ReentrantMutexGuard<'r, ()>,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(container: &'a Container, context: ContextId) -> Self {
        let options = &container.shared.options;
        Self {
            container,
            context,
            path: ResolutionPath::new(options.detect_cycles, options.max_depth),
        }
    }

    /// Resolves `key` to a stored `Arc<S>` behind `Any`.
    pub(crate) fn resolve(&mut self, key: &ServiceKey) -> DiResult<AnyArc> {
        let container = self.container;
        let observers = &container.shared.observers;
        if !observers.has_observers() {
            return self.resolve_key(key);
        }

        let start = Instant::now();
        observers.resolving(key);
        let result = self.resolve_key(key);
        match &result {
            Ok(_) => observers.resolved(key, start.elapsed()),
            Err(error) => observers.failed(key, error),
        }
        result
    }

    fn resolve_key(&mut self, key: &ServiceKey) -> DiResult<AnyArc> {
        let shared = &self.container.shared;
        let registration = shared
            .registry
            .lookup(key)
            .ok_or_else(|| DiError::ServiceNotRegistered {
                key: key.to_string(),
                chain: self.path.chain_with(key),
            })?;

        if let Some(instance) = self.cached(&registration) {
            tracing::trace!(key = %registration.key, lifetime = %registration.lifetime, "cache hit");
            return Ok(instance);
        }

        self.path.enter(&registration.key)?;
        let result = self.build_and_commit(&registration, key);
        self.path.exit();
        result
    }

    fn cached(&self, registration: &ServiceRegistration) -> Option<AnyArc> {
        match registration.lifetime {
            Lifetime::Transient => None,
            Lifetime::Singleton => registration.singleton.get().cloned(),
            Lifetime::Scoped => self.container.scope.get(&registration.key),
            Lifetime::PerContext => self
                .container
                .shared
                .contexts
                .get(&registration.key, self.context),
        }
    }

    fn build_and_commit(&mut self, registration: &ServiceRegistration, requested: &ServiceKey) -> DiResult<AnyArc> {
        match registration.lifetime {
            Lifetime::Transient => self.build(registration, requested),
            Lifetime::Singleton => match self.container.shared.options.singleton_policy {
                SingletonPolicy::Exclusive => {
                    let _guard = self.lock_for_build(registration)?;
                    // another thread may have finished while we waited
                    if let Some(instance) = registration.singleton.get() {
                        return Ok(instance.clone());
                    }
                    let instance = self.build(registration, requested)?;
                    Ok(registration.singleton.get_or_init(|| instance).clone())
                }
                SingletonPolicy::FirstCommitWins => {
                    let instance = self.build(registration, requested)?;
                    Ok(registration.singleton.get_or_init(|| instance).clone())
                }
            },
            Lifetime::Scoped => {
                let instance = self.build(registration, requested)?;
                Ok(self.container.scope.commit(registration.key.clone(), instance))
            }
            Lifetime::PerContext => {
                let instance = self.build(registration, requested)?;
                self.container
                    .shared
                    .contexts
                    .commit(registration.key.clone(), self.context, instance.clone());
                Ok(instance)
            }
        }
    }

    /// Takes the registration's build lock. While blocked, fails with
    /// `CircularDependency` once the holder turns out to be waiting, directly
    /// or through other threads, on a lock this thread holds.
    fn lock_for_build<'r>(&self, registration: &'r ServiceRegistration) -> DiResult<BuildGuard<'r>>
    where
        'a: 'r,
    {
        let container: &'a Container = self.container;
        let waits = &container.shared.build_waits;
        let thread = thread::current().id();

        let lock = match registration.build_lock.try_lock() {
            Some(lock) => lock,
            None => {
                waits.wait_for(thread, &registration.key);
                let acquired = loop {
                    if let Some(lock) = registration.build_lock.try_lock_for(BUILD_WAIT_SLICE) {
                        break Ok(lock);
                    }
                    if let Some(awaited) = waits.deadlock(thread, &registration.key) {
                        break Err(awaited);
                    }
                };
                waits.stop_waiting(thread);
                match acquired {
                    Ok(lock) => lock,
                    Err(awaited) => {
                        let chain = self.path.chain_through(&awaited);
                        tracing::warn!(key = %registration.key, chain = %chain, "singleton builds wait on each other across threads");
                        return Err(DiError::CircularDependency(chain));
                    }
                }
            }
        };

        Ok(BuildGuard {
            _hold: waits.hold(&registration.key, thread),
            _lock: lock,
        })
    }

    fn build(&mut self, registration: &ServiceRegistration, requested: &ServiceKey) -> DiResult<AnyArc> {
        let descriptor = Arc::clone(&registration.descriptor);
        // the requested name propagates to every dependency
        let name = requested.service_name();

        let ctor = descriptor
            .select_constructor()
            .ok_or_else(|| DiError::NoConstructorAvailable {
                key: registration.key.to_string(),
                implementation: registration.implementation_name(),
            })?;

        let constants = self.container.shared.parameters.get(&registration.key);
        if let Some(constants) = &constants {
            let required = descriptor.external_count(ctor);
            if required != constants.len() {
                return Err(DiError::ParameterMismatch {
                    key: registration.key.to_string(),
                    supplied: constants.len(),
                    required,
                });
            }
        }
        let mut cursor = ConstantCursor::new(constants.as_deref().unwrap_or(&[]));

        let args = self.arguments(&ctor.params, name, &mut cursor)?;
        let mut instance: AnyBox = guarded(registration, self, ConstructionStage::Constructor, || {
            (ctor.invoke)(&args)
        })?;

        for property in descriptor.injected_properties() {
            let value = self.resolve(&ServiceKey::new(property.service, None))?;
            guarded(registration, self, ConstructionStage::Property(property.name), || {
                (property.set)(&mut *instance, value)
            })?;
        }

        for method in descriptor.injected_methods() {
            let args = self.arguments(&method.params, name, &mut cursor)?;
            guarded(registration, self, ConstructionStage::Method(method.name), || {
                (method.invoke)(&mut *instance, &args)
            })?;
        }

        let stored = (registration.upcast)(instance).ok_or_else(|| DiError::TypeMismatch {
            key: registration.key.to_string(),
            expected: registration.key.display_name(),
        })?;
        tracing::debug!(
            key = %registration.key,
            implementation = registration.implementation_name(),
            lifetime = %registration.lifetime,
            depth = self.path.depth(),
            "constructed instance"
        );
        Ok(stored)
    }

    fn arguments(
        &mut self,
        params: &[ParameterDescriptor],
        name: Option<&str>,
        cursor: &mut ConstantCursor<'_>,
    ) -> DiResult<Arguments> {
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            if param.is_external() {
                if let Some(constant) = cursor.take() {
                    values.push(Argument::Constant(constant));
                    continue;
                }
            }
            let dependency = self.resolve(&ServiceKey::new(param.service, name))?;
            values.push(Argument::Service(dependency));
        }
        Ok(Arguments::new(values))
    }
}

// Runs a user callback, turning errors and panics into `ConstructionFailed`.
fn guarded<T, F>(
    registration: &ServiceRegistration,
    resolution: &Resolution<'_>,
    stage: ConstructionStage,
    callback: F,
) -> DiResult<T>
where
    F: FnOnce() -> Result<T, BoxError>,
{
    let source = match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error,
        Err(payload) => {
            let message = panic_message(&*payload);
            resolution
                .container
                .shared
                .observers
                .factory_panic(&registration.key, &message);
            tracing::error!(key = %registration.key, stage = %stage, panic = %message, "user callback panicked");
            Box::new(PanicError(message)) as BoxError
        }
    };
    Err(DiError::ConstructionFailed {
        key: registration.key.to_string(),
        implementation: registration.implementation_name(),
        stage,
        source,
    })
}
