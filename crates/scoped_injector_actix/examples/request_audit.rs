//! Spawns a web server that listens on localhost and keeps an audit trail for
//! every request. Try <http://localhost:8080/orders/1?code=letmein> and then
//! the same URL without the query string.
//!
//! The audit trail is a request-scoped service: the authenticator, the
//! handler and a task spawned by the handler all write to the same trail, and
//! the trail is flushed to the log once the response has been sent.

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use async_trait::async_trait;
use scoped_injector_actix::{
    attach, AsyncReleasable, Injected, Injector, IntoRequestScoped,
    IntoSingleton, RequestScopeMiddleware, RequestScopeOptions,
    ResourceError, ScopeContext, ScopedRequest, Svc,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Mutex};
use tracing::info;

/// Everything that happened while handling a single request.
#[derive(Default)]
pub struct AuditTrail {
    events: Mutex<Vec<String>>,
}

impl AuditTrail {
    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl AsyncReleasable for AuditTrail {
    async fn release(&self) -> Result<(), ResourceError> {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        info!(?events, "request audit trail");
        Ok(())
    }
}

/// Checks the `code` query parameter of the inbound request.
pub struct Authenticator {
    allowed: bool,
}

impl Authenticator {
    fn new(request: Svc<ScopedRequest>, audit: Svc<AuditTrail>) -> Self {
        #[derive(Deserialize)]
        struct QueryData {
            code: String,
        }

        let query = request.uri.query().unwrap_or_default();
        let allowed = web::Query::<QueryData>::from_query(query)
            .map(|query| query.code == "letmein")
            .unwrap_or(false);

        audit.record(format!(
            "{} {} authenticated: {allowed}",
            request.method, request.uri
        ));
        Authenticator { allowed }
    }
}

#[derive(Clone, Serialize)]
pub struct Order {
    id: u32,
    item: &'static str,
}

pub struct OrderRepository {
    orders: HashMap<u32, Order>,
}

impl OrderRepository {
    fn new() -> Self {
        let orders = [
            Order { id: 1, item: "keyboard" },
            Order { id: 2, item: "monitor" },
        ];
        OrderRepository {
            orders: orders.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    fn find(&self, id: u32) -> Option<Order> {
        self.orders.get(&id).cloned()
    }
}

fn configure_services() -> Injector {
    let mut builder = Injector::builder();
    attach(&mut builder, RequestScopeOptions::new().with_cleanup(true));
    builder.provide(AuditTrail::default.request_scoped().async_releasable());
    builder.provide(Authenticator::new.request_scoped());
    builder.provide(OrderRepository::new.singleton());
    builder.build()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,scoped_injector=debug")
        .init();

    let injector = configure_services();
    let scope = RequestScopeMiddleware::new(&injector)
        .map_err(std::io::Error::other)?;

    HttpServer::new(move || {
        App::new()
            .app_data(injector.clone())
            .wrap(scope.clone())
            .service(order)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}

#[get("/orders/{id}")]
async fn order(
    id: web::Path<u32>,
    auth: Injected<Svc<Authenticator>>,
    audit: Injected<Svc<AuditTrail>>,
    orders: Injected<Svc<OrderRepository>>,
) -> impl Responder {
    if !auth.allowed {
        audit.record("rejected");
        return HttpResponse::Forbidden().body("Incorrect code");
    }

    let id = id.into_inner();

    // The spawned task shares this request's audit trail
    let trail = Svc::clone(&audit);
    let lookup = ScopeContext::spawn(async move {
        trail.record(format!("looked up order {id}"));
    });
    let _ = lookup.await;

    match orders.find(id) {
        Some(order) => HttpResponse::Ok().json(order),
        None => {
            audit.record("not found");
            HttpResponse::NotFound().finish()
        }
    }
}
