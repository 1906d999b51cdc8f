use crate::ScopedRequest;
use actix_web::HttpMessage;
use actix_web::{
    body::{BodySize, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    web::Bytes,
    Error,
};
use futures_util::future::{ok, ready, LocalBoxFuture, Ready};
use pin_project::pin_project;
use scoped_injector::{
    InjectResult, Injector, RequestScopeFactory, ScopeGuard, Svc,
};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tracing::{info_span, warn, Instrument};

/// Opens a request scope for every request passing through it.
///
/// The scope is published while the wrapped service handles the request and
/// while the response body is streamed. It is closed once the body has been
/// fully sent, when the body fails, or when the response is dropped. If the
/// wrapped service fails, the scope is closed before the error is returned.
///
/// Each scope is seeded with a [`ScopedRequest`] describing the request.
#[derive(Clone)]
pub struct RequestScopeMiddleware {
    factory: Svc<RequestScopeFactory>,
}

impl RequestScopeMiddleware {
    /// Creates the middleware from an injector. This fails if the request
    /// scope was never attached to the injector.
    pub fn new(injector: &Injector) -> InjectResult<Self> {
        Ok(RequestScopeMiddleware {
            factory: injector.get()?,
        })
    }

    /// Creates the middleware from a scope factory.
    #[must_use]
    pub fn from_factory(factory: Svc<RequestScopeFactory>) -> Self {
        RequestScopeMiddleware { factory }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestScopeMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>
        + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<ScopedBody<B>>;
    type Error = Error;
    type Transform = RequestScopeService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestScopeService {
            service,
            factory: self.factory.clone(),
        })
    }
}

/// The service created by [`RequestScopeMiddleware`].
pub struct RequestScopeService<S> {
    service: S,
    factory: Svc<RequestScopeFactory>,
}

impl<S, B> Service<ServiceRequest> for RequestScopeService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>
        + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<ScopedBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let guard = match self.factory.open_scope() {
            Ok(guard) => guard,
            Err(error) => {
                return Box::pin(ready(Err(ErrorInternalServerError(error))))
            }
        };

        let inbound = Svc::new(ScopedRequest::from_request(&req));
        if let Err(error) = guard.seed(inbound) {
            warn!(scope = %guard.id(), %error, "failed to seed inbound request");
        }
        req.extensions_mut().insert(guard.id());

        let span = info_span!("request_scope", scope = %guard.id());
        let response = guard.enter(|| self.service.call(req));

        Box::pin(
            async move {
                match guard.run(response).await {
                    Ok(response) => Ok(response
                        .map_body(move |_, body| ScopedBody::new(body, guard))),
                    Err(error) => {
                        if let Err(close_error) = guard.close().await {
                            warn!(%close_error, "failed to close request scope");
                        }
                        Err(error)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// A response body which keeps its request scope open until it has been
/// fully streamed.
///
/// The scope is published every time the body is polled, so streaming
/// responses can keep using request-scoped services.
#[pin_project]
pub struct ScopedBody<B> {
    #[pin]
    body: B,
    guard: Option<ScopeGuard>,
}

impl<B> ScopedBody<B> {
    /// Wraps a body. The scope is closed when the body ends.
    pub fn new(body: B, guard: ScopeGuard) -> Self {
        ScopedBody {
            body,
            guard: Some(guard),
        }
    }

    /// Checks whether the body's scope is still open.
    pub fn is_scope_open(&self) -> bool {
        self.guard.is_some()
    }
}

impl<B: MessageBody> MessageBody for ScopedBody<B> {
    type Error = B::Error;

    fn size(&self) -> BodySize {
        self.body.size()
    }

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = self.project();
        let poll = match this.guard.as_ref() {
            Some(guard) => guard.enter(|| this.body.poll_next(cx)),
            None => this.body.poll_next(cx),
        };

        if let Poll::Ready(None | Some(Err(_))) = poll {
            if let Some(guard) = this.guard.take() {
                actix_web::rt::spawn(async move {
                    let id = guard.id();
                    if let Err(error) = guard.close().await {
                        warn!(scope = %id, %error, "failed to close request scope");
                    }
                });
            }
        }

        poll
    }
}
