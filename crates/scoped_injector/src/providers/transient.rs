use crate::{
    InjectResult, Injector, RequestInfo, Service, ServiceFactory, ServiceInfo,
    Svc, TypedProvider,
};
use std::marker::PhantomData;

/// Runs its factory for every request, including repeated requests made
/// within the same request scope.
pub struct TransientProvider<D, R, F>
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    factory: F,
    marker: PhantomData<fn(D) -> R>,
}

impl<D, R, F> TransientProvider<D, R, F>
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    /// Creates a provider from a factory.
    #[must_use]
    pub fn new(factory: F) -> Self {
        TransientProvider {
            factory,
            marker: PhantomData,
        }
    }
}

impl<D, R, F> TypedProvider for TransientProvider<D, R, F>
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
        let request_info = request_info.with_request(ServiceInfo::of::<R>())?;
        Ok(Svc::new(self.factory.invoke(injector, &request_info)?))
    }
}

/// Turns a factory into a [`TransientProvider`].
pub trait IntoTransient<D, R, F>
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    /// Creates a provider which builds a fresh value on every request.
    ///
    /// ```
    /// use scoped_injector::{
    ///     Injector, IntoTransient, RequestScopeFactory, RequestScopeOptions,
    ///     Svc,
    /// };
    ///
    /// #[derive(Default)]
    /// struct Stopwatch;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut builder = Injector::builder();
    /// builder.attach_request_scope(RequestScopeOptions::default());
    /// builder.provide(Stopwatch::default.transient());
    ///
    /// let injector = builder.build();
    /// let factory: Svc<RequestScopeFactory> = injector.get().unwrap();
    /// factory
    ///     .create_scope(async {
    ///         let first: Svc<Stopwatch> = injector.get().unwrap();
    ///         let second: Svc<Stopwatch> = injector.get().unwrap();
    ///         assert!(!Svc::ptr_eq(&first, &second));
    ///     })
    ///     .await
    ///     .unwrap();
    /// # }
    /// ```
    #[must_use]
    fn transient(self) -> TransientProvider<D, R, F>;
}

impl<D, R, F> IntoTransient<D, R, F> for F
where
    R: Service,
    F: ServiceFactory<D, Result = R>,
{
    fn transient(self) -> TransientProvider<D, R, F> {
        TransientProvider::new(self)
    }
}
