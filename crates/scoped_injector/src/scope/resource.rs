use crate::{DynSvc, ResourceError, Service, Svc};
use async_trait::async_trait;
use std::fmt::{Debug, Formatter};

/// A request-scoped value which needs to be entered when it is created and
/// released when its request scope closes.
///
/// Values only take part in cleanup when their binding opts in with
/// [`RequestScopedProvider::releasable`](crate::RequestScopedProvider::releasable)
/// and cleanup is enabled in the
/// [`RequestScopeOptions`](crate::RequestScopeOptions).
pub trait Releasable: Service {
    /// Called once, right after the value is created and before it is first
    /// handed out.
    fn enter(&self) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Called once, when the scope that created the value closes.
    fn release(&self) -> Result<(), ResourceError>;
}

/// The asynchronous counterpart of [`Releasable`].
///
/// Since services are created synchronously, [`enter`](Self::enter) is
/// bridged onto a background worker when it is called from inside an async
/// runtime. [`release`](Self::release) is awaited directly when the scope
/// closes.
#[async_trait]
pub trait AsyncReleasable: Service {
    /// Called once, right after the value is created and before it is first
    /// handed out.
    async fn enter(&self) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Called once, when the scope that created the value closes.
    async fn release(&self) -> Result<(), ResourceError>;
}

/// A handle to the cleanup capability of a request-scoped value.
#[derive(Clone)]
pub enum ScopedResource {
    /// A resource with synchronous enter and release.
    Sync(Svc<dyn Releasable>),

    /// A resource with asynchronous enter and release.
    Async(Svc<dyn AsyncReleasable>),
}

impl ScopedResource {
    /// Creates a handle from a synchronous resource.
    pub fn releasable<R: Releasable>(resource: Svc<R>) -> Self {
        ScopedResource::Sync(resource)
    }

    /// Creates a handle from an asynchronous resource.
    pub fn async_releasable<R: AsyncReleasable>(resource: Svc<R>) -> Self {
        ScopedResource::Async(resource)
    }

    pub(crate) async fn release(&self) -> Result<(), ResourceError> {
        match self {
            ScopedResource::Sync(resource) => resource.release(),
            ScopedResource::Async(resource) => resource.release().await,
        }
    }
}

impl Debug for ScopedResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopedResource::Sync(_) => f.write_str("ScopedResource::Sync"),
            ScopedResource::Async(_) => f.write_str("ScopedResource::Async"),
        }
    }
}

/// A value produced for a request scope, along with its cleanup capability if
/// the binding declared one.
pub struct ScopedValue {
    /// The value to cache.
    pub value: DynSvc,

    /// The cleanup capability of the value.
    pub resource: Option<ScopedResource>,
}

impl ScopedValue {
    /// Creates a value without any cleanup capability.
    pub fn plain<T: Service>(value: Svc<T>) -> Self {
        ScopedValue {
            value,
            resource: None,
        }
    }

    /// Creates a value with a cleanup capability.
    pub fn with_resource<T: Service>(
        value: Svc<T>,
        resource: ScopedResource,
    ) -> Self {
        ScopedValue {
            value,
            resource: Some(resource),
        }
    }
}
