use super::request_scoped::request_scope;
use crate::{
    InjectResult, Injector, RequestInfo, ScopeContext, Service, Svc,
    TypedProvider,
};
use std::marker::PhantomData;

/// A provider for values stored directly in a request scope with
/// [`ScopeGuard::seed`](crate::ScopeGuard::seed), such as details about the
/// inbound request which opened the scope.
pub struct SeededProvider<R>
where
    R: Service,
{
    marker: PhantomData<fn() -> R>,
}

impl<R> TypedProvider for SeededProvider<R>
where
    R: Service,
{
    type Result = R;

    fn provide_typed(
        &self,
        injector: &Injector,
        _request_info: &RequestInfo,
    ) -> InjectResult<Svc<Self::Result>> {
        let scope = request_scope::<R>(injector)?;
        let id = ScopeContext::current()?;
        Ok(scope.seeded(id)?)
    }
}

/// Binds a service to the value seeded into the current request scope.
/// Requesting the service fails if no scope is published, or if the scope
/// was never seeded with a value of this type.
///
/// ## Example
///
/// ```
/// use scoped_injector::{
///     seeded, Injector, RequestScopeFactory, RequestScopeOptions, Svc,
/// };
///
/// struct UserAgent(String);
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut builder = Injector::builder();
/// builder.attach_request_scope(RequestScopeOptions::default());
/// builder.provide(seeded::<UserAgent>());
///
/// let injector = builder.build();
/// let factory: Svc<RequestScopeFactory> = injector.get().unwrap();
///
/// let guard = factory.open_scope().unwrap();
/// guard.seed(Svc::new(UserAgent("curl".to_owned()))).unwrap();
///
/// let agent: Svc<UserAgent> = guard.enter(|| injector.get()).unwrap();
/// assert_eq!("curl", agent.0);
///
/// guard.close().await.unwrap();
/// # }
/// ```
#[must_use]
pub fn seeded<R: Service>() -> SeededProvider<R> {
    SeededProvider {
        marker: PhantomData,
    }
}
