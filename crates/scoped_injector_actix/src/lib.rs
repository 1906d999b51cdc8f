//! Request-scoped dependency injection for actix-web applications.
//!
//! Wrap an application in [`RequestScopeMiddleware`] to give each inbound
//! request its own request scope. The scope stays open while the handler runs
//! and while the response body is streamed, then it is closed and every value
//! cached in it is dropped. Handlers receive services through the
//! [`Injected`] extractor, and JSON bodies can be shared with request-scoped
//! services through [`InjectBody`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

pub use scoped_injector::*;

mod body;
mod middleware;
mod request;
mod service;

pub use body::*;
pub use middleware::*;
pub use request::*;
pub use service::*;
