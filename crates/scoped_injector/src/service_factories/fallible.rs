use crate::{
    InjectError, InjectResult, Injector, RequestInfo, Service, ServiceFactory,
    ServiceInfo,
};
use std::{error::Error, marker::PhantomData};

/// Wraps a factory returning `Result<R, E>` so that it provides `R`, turning
/// `E` into [`InjectError::ActivationFailed`].
pub struct FallibleServiceFactory<D, R, E, F>
where
    R: Service,
    E: Service + Error,
    F: ServiceFactory<D, Result = Result<R, E>>,
{
    inner: F,
    marker: PhantomData<fn(D) -> Result<R, E>>,
}

impl<D, R, E, F> ServiceFactory<D> for FallibleServiceFactory<D, R, E, F>
where
    D: 'static,
    R: Service,
    E: Service + Error,
    F: ServiceFactory<D, Result = Result<R, E>>,
{
    type Result = R;

    fn invoke(
        &self,
        injector: &Injector,
        request_info: &RequestInfo,
    ) -> InjectResult<Self::Result> {
        self.inner
            .invoke(injector, request_info)?
            .map_err(|error| InjectError::ActivationFailed {
                service_info: ServiceInfo::of::<R>(),
                inner: Box::new(error),
            })
    }
}

/// Turns a factory returning a [`Result`] into a [`FallibleServiceFactory`].
pub trait IntoFallible<D, R, E, F>
where
    R: Service,
    E: Service + Error,
    F: ServiceFactory<D, Result = Result<R, E>>,
{
    /// Lets the factory fail. Request-scoped services created by a failing
    /// factory are not cached, so the next request for the service within
    /// the same scope tries again.
    ///
    /// ## Example
    ///
    /// ```
    /// use scoped_injector::{InjectError, Injector, IntoFallible, IntoTransient, Svc};
    /// use std::fmt::{Display, Formatter};
    ///
    /// #[derive(Debug)]
    /// struct PoolExhausted;
    ///
    /// impl std::error::Error for PoolExhausted {}
    /// impl Display for PoolExhausted {
    ///     fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    ///         f.write_str("no connections are available")
    ///     }
    /// }
    ///
    /// struct Connection;
    ///
    /// fn connect() -> Result<Connection, PoolExhausted> {
    ///     Err(PoolExhausted)
    /// }
    ///
    /// let mut builder = Injector::builder();
    /// builder.provide(connect.fallible().transient());
    ///
    /// let injector = builder.build();
    /// assert!(matches!(
    ///     injector.get::<Svc<Connection>>(),
    ///     Err(InjectError::ActivationFailed { .. })
    /// ));
    /// ```
    #[must_use]
    fn fallible(self) -> FallibleServiceFactory<D, R, E, F>;
}

impl<D, R, E, F> IntoFallible<D, R, E, F> for F
where
    R: Service,
    E: Service + Error,
    F: ServiceFactory<D, Result = Result<R, E>>,
{
    fn fallible(self) -> FallibleServiceFactory<D, R, E, F> {
        FallibleServiceFactory {
            inner: self,
            marker: PhantomData,
        }
    }
}
