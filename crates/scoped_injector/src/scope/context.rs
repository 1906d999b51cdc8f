use crate::{ScopeError, ScopeId};
use futures::future::Either;
use std::future::Future;
use tokio::task::{futures::TaskLocalFuture, JoinHandle};

tokio::task_local! {
    static CURRENT_SCOPE: ScopeId;
}

/// Carries the identifier of the current request scope through a task.
///
/// A scope is published for the lifetime of a future with
/// [`scope`](Self::scope) or for a synchronous closure with
/// [`sync_scope`](Self::sync_scope). Leaving either restores whatever was
/// published before, so scopes can be nested. Tasks spawned with
/// [`tokio::spawn`] do not inherit the published scope. Use
/// [`spawn`](Self::spawn) or [`propagate`](Self::propagate) to hand it to a
/// child task.
///
/// ## Example
///
/// ```
/// use scoped_injector::{ScopeContext, ScopeId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let id = ScopeId::new();
/// assert!(!ScopeContext::is_established());
///
/// ScopeContext::scope(id, async move {
///     assert_eq!(id, ScopeContext::current().unwrap());
///
///     let child = ScopeContext::spawn(async { ScopeContext::current() });
///     assert_eq!(id, child.await.unwrap().unwrap());
/// })
/// .await;
/// # }
/// ```
pub struct ScopeContext;

impl ScopeContext {
    /// Gets the identifier of the scope published for the current task.
    pub fn current() -> Result<ScopeId, ScopeError> {
        CURRENT_SCOPE
            .try_with(|id| *id)
            .map_err(|_| ScopeError::ScopeNotEstablished)
    }

    /// Checks whether a scope is published for the current task.
    #[must_use]
    pub fn is_established() -> bool {
        CURRENT_SCOPE.try_with(|_| ()).is_ok()
    }

    /// Publishes a scope for as long as the returned future is being polled.
    pub fn scope<F: Future>(
        id: ScopeId,
        future: F,
    ) -> TaskLocalFuture<ScopeId, F> {
        CURRENT_SCOPE.scope(id, future)
    }

    /// Publishes a scope while a closure runs.
    pub fn sync_scope<F, R>(id: ScopeId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_SCOPE.sync_scope(id, f)
    }

    /// Captures the scope published right now and publishes it again while
    /// the returned future is polled. If no scope is published, the future is
    /// returned unchanged.
    pub fn propagate<F: Future>(
        future: F,
    ) -> Either<TaskLocalFuture<ScopeId, F>, F> {
        match ScopeContext::current() {
            Ok(id) => Either::Left(ScopeContext::scope(id, future)),
            Err(_) => Either::Right(future),
        }
    }

    /// Spawns a task on the current runtime which inherits the scope published
    /// right now.
    pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(ScopeContext::propagate(future))
    }
}
