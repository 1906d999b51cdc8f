use crate::{
    CleanupRegistry, DynSvc, InjectError, InjectResult, RequestScopeOptions,
    ScopeCache, ScopeContext, ScopeError, ScopeId, ScopedValue, Service,
    ServiceInfo, Svc,
};
use std::{
    fmt::{Debug, Formatter},
    future::Future,
    sync::Arc,
};
use tokio::task::futures::TaskLocalFuture;
use tracing::{debug, trace, warn};

/// Owns the cached values and scoped resources of every open request scope.
///
/// A single [`RequestScope`] is registered in the injector by
/// [`InjectorBuilder::attach_request_scope`](crate::InjectorBuilder::attach_request_scope).
/// Application code usually goes through [`RequestScopeFactory`] instead of
/// using it directly.
pub struct RequestScope {
    options: RequestScopeOptions,
    cache: Arc<ScopeCache>,
    cleanup: Arc<CleanupRegistry>,
}

impl RequestScope {
    /// Creates a request scope with no open scopes.
    #[must_use]
    pub fn new(options: RequestScopeOptions) -> Self {
        RequestScope {
            options,
            cache: Arc::default(),
            cleanup: Arc::default(),
        }
    }

    /// Gets the options this request scope was created with.
    #[must_use]
    pub fn options(&self) -> RequestScopeOptions {
        self.options
    }

    /// Gets the cache of values for every open scope.
    #[must_use]
    pub fn cache(&self) -> &ScopeCache {
        &self.cache
    }

    /// Gets the registry of resources for every open scope.
    #[must_use]
    pub fn cleanup(&self) -> &CleanupRegistry {
        &self.cleanup
    }

    /// Gets the scope published for the current task.
    pub fn current_scope(&self) -> Result<ScopeId, ScopeError> {
        ScopeContext::current()
    }

    /// Checks whether a scope is published for the current task.
    #[must_use]
    pub fn is_established(&self) -> bool {
        ScopeContext::is_established()
    }

    /// Gets the number of open scopes.
    #[must_use]
    pub fn open_scopes(&self) -> usize {
        self.cache.len()
    }

    /// Opens a new scope and returns its identifier. The scope is not
    /// published anywhere yet.
    pub fn open(&self) -> Result<ScopeId, ScopeError> {
        let id = ScopeId::new();
        self.cache.open(id)?;
        debug!(scope = %id, "opened request scope");
        Ok(id)
    }

    /// Gets the value cached for a service in a scope, or creates it with
    /// `producer` if there is none.
    ///
    /// When cleanup is enabled and the produced value carries a resource, the
    /// resource is entered and registered before the value is cached. If
    /// entering fails, nothing is cached. If the scope closes while the value
    /// is being created, its resource is released right away and the lookup
    /// fails.
    ///
    /// A producer which requests its own service again gets
    /// [`InjectError::CycleDetected`].
    pub fn get_or_create<F>(
        &self,
        id: ScopeId,
        service_info: ServiceInfo,
        producer: F,
    ) -> InjectResult<DynSvc>
    where
        F: FnOnce() -> InjectResult<ScopedValue>,
    {
        let created: InjectResult<DynSvc> =
            self.cache.get_or_create(id, service_info, || {
                let ScopedValue { value, resource } = producer()?;
                trace!(
                    scope = %id,
                    service = service_info.name(),
                    "created request-scoped value"
                );

                let Some(resource) =
                    resource.filter(|_| self.options.enable_cleanup)
                else {
                    return Ok(value);
                };

                self.cleanup.enter(service_info, &resource)?;
                let registered = self.cache.while_open(id, || {
                    self.cleanup.register(id, service_info, resource.clone());
                });
                if let Err(error) = registered {
                    self.cleanup.release_now(id, service_info, &resource);
                    return Err(error.into());
                }

                Ok(value)
            });

        created.map_err(|error| match error {
            InjectError::Scope(ScopeError::ReentrantCreation {
                service_info,
                ..
            }) => InjectError::CycleDetected {
                service_info,
                cycle: vec![service_info, service_info],
            },
            error => error,
        })
    }

    /// Stores a value created outside of the injector in a scope.
    pub fn seed<T: Service>(
        &self,
        id: ScopeId,
        value: Svc<T>,
    ) -> Result<(), ScopeError> {
        self.cache.seed(id, ServiceInfo::of::<T>(), value)
    }

    /// Gets a value stored in a scope with [`seed`](Self::seed).
    pub fn seeded<T: Service>(&self, id: ScopeId) -> Result<Svc<T>, ScopeError> {
        let service_info = ServiceInfo::of::<T>();
        self.cache
            .seeded(id, service_info)?
            .downcast::<T>()
            .map_err(|_| ScopeError::NotSeeded { id, service_info })
    }

    /// Closes a scope. The scope stays published while its resources are
    /// released, then its cached values are dropped. Nothing new can be
    /// created in the scope once closing starts.
    ///
    /// If releasing fails, that error is returned even when dropping the
    /// cached values also failed.
    pub async fn close_scope(&self, id: ScopeId) -> Result<(), ScopeError> {
        self.cache.seal(id)?;
        ScopeContext::scope(id, async {
            let flushed = self.cleanup.flush(id).await;
            let closed = self.cache.close(id);
            debug!(scope = %id, "closed request scope");
            flushed.and(closed)
        })
        .await
    }

    /// Closes a scope from a context that cannot wait, such as a destructor.
    ///
    /// Scopes with resources to release are torn down on the background
    /// worker. Anything else is closed immediately. Failures are logged.
    pub fn abandon(&self, id: ScopeId) {
        // Once sealed, no more resources can be registered in the scope
        if let Err(error) = self.cache.seal(id) {
            debug!(scope = %id, %error, "abandoned request scope was already closed");
        }

        if self.cleanup.pending(id) == 0 {
            if self.cache.close(id).is_ok() {
                debug!(scope = %id, "closed abandoned request scope");
            }
            return;
        }

        let cache = self.cache.clone();
        let cleanup = self.cleanup.clone();
        let teardown = async move {
            if let Err(error) = ScopeContext::scope(id, cleanup.flush(id)).await
            {
                warn!(scope = %id, %error, "failed to clean up abandoned request scope");
            }
            if cache.close(id).is_ok() {
                debug!(scope = %id, "closed abandoned request scope");
            }
        };

        if let Err(error) = self.cleanup.bridge().spawn(teardown) {
            let dropped = self.cleanup.discard(id);
            if let Err(close_error) = self.cache.close(id) {
                warn!(scope = %id, %close_error, "failed to close abandoned request scope");
            }
            warn!(
                scope = %id,
                %error,
                dropped,
                "request scope closed without releasing its resources"
            );
        }
    }
}

impl Debug for RequestScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("options", &self.options)
            .field("open_scopes", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Opens request scopes. This is registered as a singleton service when the
/// request scope is attached to an injector.
///
/// ## Example
///
/// ```
/// use scoped_injector::{
///     Injector, IntoRequestScoped, RequestScopeFactory, RequestScopeOptions,
///     Svc,
/// };
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut builder = Injector::builder();
/// builder.attach_request_scope(RequestScopeOptions::default());
/// builder.provide(Counter::default.request_scoped());
///
/// let injector = builder.build();
/// let factory: Svc<RequestScopeFactory> = injector.get().unwrap();
///
/// let count = factory
///     .create_scope(async {
///         let first: Svc<Counter> = injector.get().unwrap();
///         let second: Svc<Counter> = injector.get().unwrap();
///         first.0.fetch_add(1, Ordering::SeqCst);
///         second.0.fetch_add(1, Ordering::SeqCst) + 1
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(2, count);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RequestScopeFactory {
    scope: Svc<RequestScope>,
}

impl RequestScopeFactory {
    /// Creates a factory for the given request scope.
    #[must_use]
    pub fn new(scope: Svc<RequestScope>) -> Self {
        RequestScopeFactory { scope }
    }

    /// Gets the request scope this factory opens scopes in.
    #[must_use]
    pub fn request_scope(&self) -> &Svc<RequestScope> {
        &self.scope
    }

    /// Opens a new scope. The scope is closed with [`ScopeGuard::close`], or
    /// in the background when the guard is dropped.
    pub fn open_scope(&self) -> Result<ScopeGuard, ScopeError> {
        let id = self.scope.open()?;
        Ok(ScopeGuard {
            id,
            scope: self.scope.clone(),
            open: true,
        })
    }

    /// Runs a future inside a new scope, then closes the scope.
    ///
    /// If the returned future is dropped before it finishes, the scope is
    /// still closed in the background.
    pub async fn create_scope<F: Future>(
        &self,
        future: F,
    ) -> Result<F::Output, ScopeError> {
        let guard = self.open_scope()?;
        let output = guard.run(future).await;
        guard.close().await?;
        Ok(output)
    }
}

/// An open request scope.
///
/// Dropping the guard without calling [`close`](Self::close) closes the
/// scope in the background.
#[must_use = "dropping the guard closes the scope"]
pub struct ScopeGuard {
    id: ScopeId,
    scope: Svc<RequestScope>,
    open: bool,
}

impl ScopeGuard {
    /// Gets the identifier of the scope.
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Publishes the scope while a future is being polled.
    pub fn run<F: Future>(&self, future: F) -> TaskLocalFuture<ScopeId, F> {
        ScopeContext::scope(self.id, future)
    }

    /// Publishes the scope while a closure runs.
    pub fn enter<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        ScopeContext::sync_scope(self.id, f)
    }

    /// Stores a value created outside of the injector in the scope.
    pub fn seed<T: Service>(&self, value: Svc<T>) -> Result<(), ScopeError> {
        self.scope.seed(self.id, value)
    }

    /// Releases the scope's resources and drops its cached values.
    pub async fn close(mut self) -> Result<(), ScopeError> {
        let result = self.scope.close_scope(self.id).await;
        self.open = false;
        result
    }
}

impl Debug for ScopeGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("id", &self.id)
            .field("open", &self.open)
            .finish()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.open {
            self.scope.abandon(self.id);
        }
    }
}
