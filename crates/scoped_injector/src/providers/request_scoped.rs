use crate::{
    AsyncReleasable, InjectError, InjectResult, Injector, Releasable,
    RequestInfo, RequestScope, ScopeContext, ScopedResource, ScopedValue,
    Service, ServiceFactory, ServiceInfo, Svc, TypedProvider,
};
use std::marker::PhantomData;

/// Resolves the [`RequestScope`] a request-scoped provider stores its values
/// in.
pub(crate) fn request_scope<R: Service>(
    injector: &Injector,
) -> InjectResult<Svc<RequestScope>> {
    match injector.get() {
        Err(InjectError::MissingProvider {
            service_info: dependency_info,
        }) => Err(InjectError::MissingDependency {
            service_info: ServiceInfo::of::<R>(),
            dependency_info,
        }),
        result => result,
    }
}

/// A service provider that creates a single instance of the service for each
/// request scope. Every request for the service made while the same scope is
/// published returns a service pointer to the same instance, including
/// requests made from tasks spawned with [`ScopeContext::spawn`].
///
/// Requesting the service while no scope is published fails with
/// [`ScopeError::ScopeNotEstablished`](crate::ScopeError::ScopeNotEstablished).
pub struct RequestScopedProvider<D, R, F>
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    factory: F,
    resource: Option<fn(Svc<R>) -> ScopedResource>,
    marker: PhantomData<fn(D) -> R>,
}

impl<D, R, F> RequestScopedProvider<D, R, F>
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    /// Creates a new [`RequestScopedProvider`] using a service factory.
    #[must_use]
    pub fn new(func: F) -> Self {
        RequestScopedProvider {
            factory: func,
            resource: None,
            marker: PhantomData,
        }
    }

    /// Marks the service as a resource which is entered when it is created
    /// and released when its scope closes. This only has an effect when
    /// cleanup is enabled in the [`RequestScopeOptions`](crate::RequestScopeOptions).
    #[must_use]
    pub fn releasable(mut self) -> Self
    where
        R: Releasable,
    {
        self.resource = Some(ScopedResource::releasable::<R>);
        self
    }

    /// Like [`releasable`](Self::releasable), but for resources which are
    /// entered and released asynchronously.
    #[must_use]
    pub fn async_releasable(mut self) -> Self
    where
        R: AsyncReleasable,
    {
        self.resource = Some(ScopedResource::async_releasable::<R>);
        self
    }
}

impl<D, R, F> TypedProvider for RequestScopedProvider<D, R, F>
where
    D: 'static,
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    type Result = R;

    fn provide_typed(
        &self,
        injector: &Injector,
        request_info: &RequestInfo,
    ) -> InjectResult<Svc<Self::Result>> {
        let service_info = ServiceInfo::of::<R>();

        // Cycles are caught here, before the scope's slot for this service is
        // locked for creation
        let request_info = request_info.with_request(service_info)?;
        let scope = request_scope::<R>(injector)?;
        let id = ScopeContext::current()?;

        let value = scope.get_or_create(id, service_info, || {
            let result = Svc::new(self.factory.invoke(injector, &request_info)?);
            Ok(match self.resource {
                Some(into_resource) => {
                    ScopedValue::with_resource(result.clone(), into_resource(result))
                }
                None => ScopedValue::plain(result),
            })
        })?;

        value
            .downcast::<R>()
            .map_err(|_| InjectError::InvalidProvider { service_info })
    }
}

/// Defines a conversion into a request-scoped provider. This trait is
/// automatically implemented for all service factories.
pub trait IntoRequestScoped<D, R, F>
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    /// Creates a request-scoped provider. Request-scoped providers create
    /// their values once per request scope and reuse that value for every
    /// request made while the scope is published.
    ///
    /// ## Example
    ///
    /// ```
    /// use scoped_injector::{
    ///     Injector, IntoRequestScoped, RequestScopeFactory,
    ///     RequestScopeOptions, ScopeError, Svc, InjectError,
    /// };
    ///
    /// #[derive(Default)]
    /// struct Foo;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut builder = Injector::builder();
    /// builder.attach_request_scope(RequestScopeOptions::default());
    /// builder.provide(Foo::default.request_scoped());
    ///
    /// let injector = builder.build();
    /// let factory: Svc<RequestScopeFactory> = injector.get().unwrap();
    ///
    /// let (foo1, foo2) = factory
    ///     .create_scope(async {
    ///         let foo1: Svc<Foo> = injector.get().unwrap();
    ///         let foo2: Svc<Foo> = injector.get().unwrap();
    ///         (foo1, foo2)
    ///     })
    ///     .await
    ///     .unwrap();
    /// assert!(Svc::ptr_eq(&foo1, &foo2));
    ///
    /// let outside: Result<Svc<Foo>, _> = injector.get();
    /// assert!(matches!(
    ///     outside,
    ///     Err(InjectError::Scope(ScopeError::ScopeNotEstablished))
    /// ));
    /// # }
    /// ```
    #[must_use]
    fn request_scoped(self) -> RequestScopedProvider<D, R, F>;
}

impl<D, R, F> IntoRequestScoped<D, R, F> for F
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    fn request_scoped(self) -> RequestScopedProvider<D, R, F> {
        RequestScopedProvider::new(self)
    }
}
