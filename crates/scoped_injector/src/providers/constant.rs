use crate::{InjectResult, Injector, RequestInfo, Service, Svc, TypedProvider};

/// Hands out the same, already created value for every request.
pub struct ConstantProvider<R>
where
    R: Service,
{
    value: Svc<R>,
}

impl<R> ConstantProvider<R>
where
    R: Service,
{
    /// Wraps a value so it can be registered with an injector.
    #[must_use]
    pub fn new(value: R) -> Self {
        ConstantProvider {
            value: Svc::new(value),
        }
    }
}

impl<R> TypedProvider for ConstantProvider<R>
where
    R: Service,
{
    type Result = R;

    fn provide_typed(
        &self,
        _injector: &Injector,
        _request_info: &RequestInfo,
    ) -> InjectResult<Svc<Self::Result>> {
        Ok(self.value.clone())
    }
}

/// Registers a value that was built before the injector, such as
/// configuration loaded at startup. The value is shared by every scope, so
/// anything that changes per request belongs in a request-scoped service
/// instead.
///
/// ## Example
///
/// ```
/// use scoped_injector::{constant, Injector, Svc};
///
/// struct ListenAddress(&'static str);
///
/// let mut builder = Injector::builder();
/// builder.provide(constant(ListenAddress("127.0.0.1:8080")));
///
/// let injector = builder.build();
/// let address: Svc<ListenAddress> = injector.get().unwrap();
/// assert_eq!(address.0, "127.0.0.1:8080");
/// ```
pub fn constant<T: Service>(value: T) -> ConstantProvider<T> {
    ConstantProvider::new(value)
}
