#![allow(clippy::used_underscore_binding)]

use crate::ScopeError;
use derive_more::{Display, Error};
use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// A reference-counted pointer holding a service. Services are shared between
/// tasks handling the same request, so the pointer type is always
/// [`Arc<T>`].
pub type Svc<T> = Arc<T>;

/// A reference-counted service pointer holding an instance of `dyn Any`.
pub type DynSvc = Arc<dyn Any + Send + Sync>;

/// A result from attempting to inject dependencies into a service and
/// construct an instance of it.
pub type InjectResult<T> = Result<T, InjectError>;

/// Implemented automatically on types that are capable of being a service.
pub trait Service: Any + Send + Sync {}
impl<T: ?Sized + Any + Send + Sync> Service for T {}

/// Type information about a service.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ServiceInfo {
    id: TypeId,
    name: &'static str,
}

impl ServiceInfo {
    /// Creates a [`ServiceInfo`] for the given type.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + Any>() -> Self {
        ServiceInfo {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Gets the [`TypeId`] for this service.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Gets the type name of this service.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An error that has occurred during creation of a service.
#[derive(Debug, Display, Error)]
#[display(fmt = "an error occurred during injection: {}")]
#[non_exhaustive]
pub enum InjectError {
    /// Failed to find a provider for the requested type.
    #[display(fmt = "{} has no provider", "service_info.name()")]
    MissingProvider {
        /// The service that was requested.
        service_info: ServiceInfo,
    },

    /// A provider for a dependency of the requested service is missing.
    #[display(
        fmt = "{} has no provider (required by {})",
        "dependency_info.name()",
        "service_info.name()"
    )]
    MissingDependency {
        /// The service that was requested.
        service_info: ServiceInfo,

        /// The dependency that is missing a provider.
        dependency_info: ServiceInfo,
    },

    /// A cycle was detected during activation of a service.
    #[display(
        fmt = "a cycle was detected during activation of {} [{}]",
        "service_info.name()",
        "fmt_cycle(cycle)"
    )]
    CycleDetected {
        /// The service that was requested.
        service_info: ServiceInfo,

        /// The chain of services that were requested during resolution of this
        /// service.
        cycle: Vec<ServiceInfo>,
    },

    /// The registered provider returned the wrong service type.
    #[display(
        fmt = "the registered provider for {} returned the wrong type",
        "service_info.name()"
    )]
    InvalidProvider {
        /// The service that was requested.
        service_info: ServiceInfo,
    },

    /// The requested service has too many providers registered.
    #[display(
        fmt = "the requested service {} has {} providers registered (did you mean to request a Vec<Svc<T>> instead?)",
        "service_info.name()",
        providers
    )]
    MultipleProviders {
        /// The service that was requested.
        service_info: ServiceInfo,

        /// The number of providers registered for the service.
        providers: usize,
    },

    /// An error occurred during activation of a service.
    #[display(
        fmt = "an error occurred during activation of {}: {}",
        "service_info.name()",
        inner
    )]
    ActivationFailed {
        /// The service that was requested.
        service_info: ServiceInfo,

        /// The error that was thrown during service initialization.
        inner: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The request scope rejected the request.
    #[display(fmt = "{}", _0)]
    Scope(ScopeError),
}

impl From<ScopeError> for InjectError {
    fn from(error: ScopeError) -> Self {
        InjectError::Scope(error)
    }
}

fn fmt_cycle(cycle: &[ServiceInfo]) -> String {
    let mut joined = String::new();
    for item in cycle {
        if !joined.is_empty() {
            joined.push_str(" -> ");
        }
        joined.push_str(item.name());
    }
    joined
}
