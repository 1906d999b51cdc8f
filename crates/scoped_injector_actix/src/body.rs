use actix_web::HttpMessage;
use actix_web::{
    dev::Payload, error::ErrorInternalServerError, web::Json, FromRequest,
    HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use scoped_injector::{Injector, RequestScope, ScopeError, ScopeId, Service, Svc};
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// A JSON request body which is also stored in the request scope.
///
/// Once extracted, the body can be requested as a `Svc<T>` by request-scoped
/// services for the rest of the request, as long as it was bound with
/// [`seeded`](scoped_injector::seeded). Since handler arguments are extracted
/// together, services which depend on the body should be requested from the
/// handler itself rather than through another extractor.
///
/// ## Example
///
/// ```no_run
/// use actix_web::{post, HttpResponse, Responder};
/// use scoped_injector_actix::{
///     attach, seeded, InjectBody, Injected, Injector, IntoRequestScoped,
///     RequestScopeOptions, Svc,
/// };
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Order {
///     items: Vec<u32>,
/// }
///
/// struct OrderTotal(u32);
///
/// impl OrderTotal {
///     fn new(order: Svc<Order>) -> Self {
///         OrderTotal(order.items.iter().sum())
///     }
/// }
///
/// let mut builder = Injector::builder();
/// attach(&mut builder, RequestScopeOptions::default());
/// builder.provide(seeded::<Order>());
/// builder.provide(OrderTotal::new.request_scoped());
///
/// #[post("/orders")]
/// async fn create(
///     _order: InjectBody<Order>,
///     injector: Injected<Injector>,
/// ) -> impl Responder {
///     let total: Svc<OrderTotal> = injector.get().unwrap();
///     HttpResponse::Ok().body(total.0.to_string())
/// }
/// ```
#[derive(Debug)]
pub struct InjectBody<T>(Svc<T>);

impl<T> InjectBody<T> {
    /// Gets the body as it was stored in the request scope.
    pub fn into_inner(value: InjectBody<T>) -> Svc<T> {
        value.0
    }
}

impl<T> Deref for InjectBody<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromRequest for InjectBody<T>
where
    T: DeserializeOwned + Service,
{
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, actix_web::Result<Self>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = Json::<T>::from_request(req, payload);
        let req = req.clone();

        Box::pin(async move {
            let body = Svc::new(json.await?.into_inner());
            let id = req
                .extensions()
                .get::<ScopeId>()
                .copied()
                .ok_or_else(|| {
                    ErrorInternalServerError(ScopeError::ScopeNotEstablished)
                })?;
            let injector = req.app_data::<Injector>().ok_or_else(|| {
                ErrorInternalServerError("no injector is present in app_data")
            })?;

            let scope: Svc<RequestScope> =
                injector.get().map_err(ErrorInternalServerError)?;
            scope
                .seed(id, body.clone())
                .map_err(ErrorInternalServerError)?;
            Ok(InjectBody(body))
        })
    }
}
