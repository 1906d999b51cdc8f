use actix_web::{
    dev::ServiceRequest,
    http::{header::HeaderMap, Method, Uri, Version},
};
use scoped_injector::{seeded, InjectorBuilder, RequestScopeOptions};
use std::net::SocketAddr;

/// Details about the inbound request which opened the current request scope.
///
/// This is seeded into every scope opened by
/// [`RequestScopeMiddleware`](crate::RequestScopeMiddleware) and can be
/// requested as a `Svc<ScopedRequest>` once [`attach`] has bound it.
#[derive(Clone, Debug)]
pub struct ScopedRequest {
    /// The request method.
    pub method: Method,

    /// The request URI.
    pub uri: Uri,

    /// The HTTP version of the request.
    pub version: Version,

    /// The request headers.
    pub headers: HeaderMap,

    /// The address of the peer, if known.
    pub peer_addr: Option<SocketAddr>,
}

impl ScopedRequest {
    pub(crate) fn from_request(req: &ServiceRequest) -> Self {
        ScopedRequest {
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            headers: req.headers().clone(),
            peer_addr: req.peer_addr(),
        }
    }
}

/// Enables request-scoped services on a builder and binds
/// [`ScopedRequest`] so services can depend on the inbound request.
///
/// ## Example
///
/// ```
/// use scoped_injector_actix::{
///     attach, Injector, IntoRequestScoped, RequestScopeOptions, ScopedRequest,
///     Svc,
/// };
///
/// struct UserAgent(Option<String>);
///
/// impl UserAgent {
///     fn new(request: Svc<ScopedRequest>) -> Self {
///         let agent = request
///             .headers
///             .get("user-agent")
///             .and_then(|value| value.to_str().ok())
///             .map(ToOwned::to_owned);
///         UserAgent(agent)
///     }
/// }
///
/// let mut builder = Injector::builder();
/// attach(&mut builder, RequestScopeOptions::default());
/// builder.provide(UserAgent::new.request_scoped());
///
/// let _injector = builder.build();
/// ```
pub fn attach(builder: &mut InjectorBuilder, options: RequestScopeOptions) {
    builder.attach_request_scope(options);
    builder.provide(seeded::<ScopedRequest>());
}
