//! Positional arguments handed to constructor and method callbacks.

use std::any::Any;
use std::sync::Arc;

use crate::error::ArgumentError;
use crate::registration::{AnyArc, Constant};

/// One assembled argument.
#[derive(Clone)]
pub(crate) enum Argument {
    /// Recursively resolved service, stored as `Arc<S>` behind `Any`
    Service(AnyArc),
    /// Externally supplied constant, stored as the raw value behind `Any`
    Constant(Constant),
}

/// Arguments assembled by the engine for one constructor or method call.
///
/// Arguments are positional and follow the parameter order declared on the
/// builder. Accessors never panic; a wrong index or type is reported as an
/// [`ArgumentError`] which the engine turns into a construction failure.
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, index: usize) -> Result<&Argument, ArgumentError> {
        self.values.get(index).ok_or(ArgumentError::OutOfRange {
            index,
            len: self.values.len(),
        })
    }

    /// Returns the resolved service at `index`.
    pub fn service<S: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<S>, ArgumentError> {
        let mismatch = ArgumentError::TypeMismatch {
            index,
            expected: std::any::type_name::<S>(),
        };
        match self.get(index)? {
            Argument::Service(value) => value
                .downcast_ref::<Arc<S>>()
                .cloned()
                .ok_or(mismatch),
            Argument::Constant(_) => Err(mismatch),
        }
    }

    /// Returns a copy of the external value at `index`.
    ///
    /// When the registration carried no constants the external parameter was
    /// resolved like any other dependency; the resolved value is accepted
    /// here as well.
    pub fn constant<C: Clone + Send + Sync + 'static>(&self, index: usize) -> Result<C, ArgumentError> {
        let value = match self.get(index)? {
            Argument::Constant(value) => downcast_constant::<C>(value.as_ref()),
            Argument::Service(value) => value.downcast_ref::<Arc<C>>().map(|c| C::clone(c)),
        };
        value.ok_or(ArgumentError::TypeMismatch {
            index,
            expected: std::any::type_name::<C>(),
        })
    }
}

fn downcast_constant<C: Clone + 'static>(value: &(dyn Any + Send + Sync)) -> Option<C> {
    value.downcast_ref::<C>().cloned()
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self
            .values
            .iter()
            .map(|a| match a {
                Argument::Service(_) => "service",
                Argument::Constant(_) => "constant",
            })
            .collect();
        f.debug_struct("Arguments").field("values", &kinds).finish()
    }
}
