use crate::{
    DynSvc, InjectResult, Injector, RequestInfo, Service, ServiceInfo, Svc,
};

/// Weakly typed service provider.
///
/// Given an injector, this can provide an instance of a service. This is
/// automatically implemented for all types that implement [`TypedProvider`],
/// and [`TypedProvider`] should be preferred if possible for custom service
/// providers to allow for stronger type checking.
pub trait Provider: Service {
    /// The [`ServiceInfo`] which describes the type returned by this provider.
    fn result(&self) -> ServiceInfo;

    /// Provides an instance of the service.
    fn provide(
        &self,
        injector: &Injector,
        request_info: &RequestInfo,
    ) -> InjectResult<DynSvc>;
}

impl<T> Provider for T
where
    T: TypedProvider,
{
    fn result(&self) -> ServiceInfo {
        ServiceInfo::of::<T::Result>()
    }

    fn provide(
        &self,
        injector: &Injector,
        request_info: &RequestInfo,
    ) -> InjectResult<DynSvc> {
        let result: DynSvc = self.provide_typed(injector, request_info)?;
        Ok(result)
    }
}

/// A strongly-typed service provider.
///
/// Types which implement this trait can provide strongly-typed instances of a
/// particular service type. Examples of typed providers include providers
/// created from service factories or constant providers. This should be
/// preferred over [`Provider`] for custom service providers if possible due to
/// the strong type guarantees this provides. [`Provider`] is automatically
/// implemented for all types which implement [`TypedProvider`].
///
/// ## Example
///
/// ```
/// use scoped_injector::{
///     InjectResult, Injector, RequestInfo, Svc, TypedProvider,
/// };
///
/// struct Foo;
///
/// struct FooProvider;
/// impl TypedProvider for FooProvider {
///     type Result = Foo;
///
///     fn provide_typed(
///         &self,
///         _injector: &Injector,
///         _request_info: &RequestInfo,
///     ) -> InjectResult<Svc<Self::Result>> {
///         Ok(Svc::new(Foo))
///     }
/// }
///
/// let mut builder = Injector::builder();
/// builder.provide(FooProvider);
///
/// let injector = builder.build();
/// let _foo: Svc<Foo> = injector.get().unwrap();
/// ```
pub trait TypedProvider: Service {
    /// The type of service this can provide.
    type Result: Service;

    /// Provides an instance of the service. The [`Injector`] passed in can be
    /// used to retrieve instances of any dependencies this service has.
    fn provide_typed(
        &self,
        injector: &Injector,
        request_info: &RequestInfo,
    ) -> InjectResult<Svc<Self::Result>>;
}
