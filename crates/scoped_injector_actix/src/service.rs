use actix_web::HttpMessage;
use actix_web::{
    dev::Payload, error::ErrorInternalServerError, FromRequest, HttpRequest,
};
use futures_util::future::{err, ok, Ready};
use scoped_injector::{Injector, Request, ScopeContext, ScopeId};
use std::{fmt::Display, ops::Deref};

/// An injected request. Any request to the [`Injector`] can be injected by
/// wrapping it in this type and adding it as a parameter to a request
/// handler. The [`Injector`] is read from the application data.
///
/// Inside [`RequestScopeMiddleware`](crate::RequestScopeMiddleware), requests
/// are resolved in the scope of the request being handled, so request-scoped
/// services are shared with everything else that handles the same request.
///
/// ## Example
///
/// ```no_run
/// use actix_web::{get, App, HttpResponse, HttpServer, Responder};
/// use scoped_injector_actix::{
///     attach, Injected, Injector, IntoRequestScoped, RequestScopeMiddleware,
///     RequestScopeOptions, Svc,
/// };
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Hits {
///     count: AtomicUsize,
/// }
///
/// #[actix_web::main]
/// async fn main() -> std::io::Result<()> {
///     let mut builder = Injector::builder();
///     attach(&mut builder, RequestScopeOptions::default());
///     builder.provide(Hits::default.request_scoped());
///
///     let injector = builder.build();
///     let scope = RequestScopeMiddleware::new(&injector).unwrap();
///     HttpServer::new(move || {
///         App::new()
///             .app_data(injector.clone())
///             .wrap(scope.clone())
///             .service(index)
///     })
///     .bind(("127.0.0.1", 8080))?
///     .run()
///     .await
/// }
///
/// #[get("/")]
/// async fn index(hits: Injected<Svc<Hits>>) -> impl Responder {
///     let hits = hits.count.fetch_add(1, Ordering::SeqCst) + 1;
///     HttpResponse::Ok().body(format!("{hits} hit(s) in this request"))
/// }
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Injected<R>(R)
where
    R: Request;

impl<R> Injected<R>
where
    R: Request,
{
    /// Converts an [`Injected<R>`] to its inner value.
    pub fn into_inner(value: Injected<R>) -> R {
        value.0
    }
}

impl<R> Deref for Injected<R>
where
    R: Request,
{
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<R> Display for Injected<R>
where
    R: Request + Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<R> FromRequest for Injected<R>
where
    R: Request,
{
    type Error = actix_web::Error;
    type Future = Ready<actix_web::Result<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(injector) = req.app_data::<Injector>() else {
            return err(ErrorInternalServerError(
                "no injector is present in app_data",
            ));
        };

        // Extraction may run outside of the future the middleware published
        // the scope for, so the scope is published again from the request
        let scope = req.extensions().get::<ScopeId>().copied();
        let result = match scope {
            Some(id) => ScopeContext::sync_scope(id, || injector.get()),
            None => injector.get(),
        };

        match result {
            Ok(inner) => ok(Injected(inner)),
            Err(error) => err(ErrorInternalServerError(error)),
        }
    }
}
