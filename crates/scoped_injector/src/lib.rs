//! # Runtime dependency injection with request-scoped services.
//!
//! Services are registered with an [`InjectorBuilder`] and resolved at
//! runtime through an [`Injector`]. Services are always held in thread-safe
//! [`Svc<T>`] pointers, since a single request is often handled by several
//! tasks at once.
//!
//! ## Service lifetimes
//!
//! Lifetimes of services created by the [`Injector`] are controlled by the
//! [`Provider`] used to construct those lifetimes. There are four built-in
//! lifetimes:
//!
//! - [`Transient`](crate::TransientProvider): A service is created each time
//!   it is requested. This will never return the same instance of a service
//!   more than once.
//! - [`Singleton`](crate::SingletonProvider): A service is created only the
//!   first time it is requested, then that single instance is reused for each
//!   future request.
//! - [`Request-scoped`](crate::RequestScopedProvider): A service is created
//!   once per request scope and reused for every request made while that
//!   scope is published. Each inbound request gets its own instance.
//! - [`Constant`](crate::constant()): Used for services that are already
//!   created before the injector is built.
//!
//! ## Request scopes
//!
//! Request-scoped services need the request scope to be attached to the
//! builder with [`InjectorBuilder::attach_request_scope`]. Each scope is
//! opened by the [`RequestScopeFactory`], published to the tasks serving the
//! request through the [`ScopeContext`], and closed when the request is
//! done. Closing a scope drops every value cached in it.
//!
//! When cleanup is enabled in the [`RequestScopeOptions`], services whose
//! bindings are marked [`releasable`](RequestScopedProvider::releasable) or
//! [`async_releasable`](RequestScopedProvider::async_releasable) are entered
//! when they are created and released, most recent first, when their scope
//! closes.
//!
//! Tasks spawned while handling a request only see the request's scope when
//! they are spawned with [`ScopeContext::spawn`] (or wrapped with
//! [`ScopeContext::propagate`]).
//!
//! ## Example
//!
//! ```
//! use scoped_injector::{
//!     constant, Injector, IntoRequestScoped, IntoSingleton, Releasable,
//!     RequestScopeFactory, RequestScopeOptions, ResourceError, ScopeContext,
//!     Svc,
//! };
//! use std::sync::Mutex;
//!
//! struct Config {
//!     greeting: &'static str,
//! }
//!
//! #[derive(Default)]
//! struct Transaction {
//!     statements: Mutex<Vec<String>>,
//! }
//!
//! impl Releasable for Transaction {
//!     fn release(&self) -> Result<(), ResourceError> {
//!         // Commit or roll back here
//!         Ok(())
//!     }
//! }
//!
//! struct Greeter {
//!     config: Svc<Config>,
//!     transaction: Svc<Transaction>,
//! }
//!
//! impl Greeter {
//!     fn new(config: Svc<Config>, transaction: Svc<Transaction>) -> Self {
//!         Greeter { config, transaction }
//!     }
//!
//!     fn greet(&self, name: &str) -> String {
//!         let greeting = format!("{}, {}!", self.config.greeting, name);
//!         self.transaction
//!             .statements
//!             .lock()
//!             .unwrap()
//!             .push(greeting.clone());
//!         greeting
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut builder = Injector::builder();
//! builder.attach_request_scope(RequestScopeOptions::new().with_cleanup(true));
//! builder.provide(constant(Config { greeting: "Hello" }));
//! builder.provide(Transaction::default.request_scoped().releasable());
//! builder.provide(Greeter::new.request_scoped());
//!
//! let injector = builder.build();
//! let factory: Svc<RequestScopeFactory> = injector.get().unwrap();
//!
//! let statements = factory
//!     .create_scope(async {
//!         let greeter: Svc<Greeter> = injector.get().unwrap();
//!         greeter.greet("Alice");
//!
//!         let child_injector = injector.clone();
//!         ScopeContext::spawn(async move {
//!             let greeter: Svc<Greeter> = child_injector.get().unwrap();
//!             greeter.greet("Bob");
//!         })
//!         .await
//!         .unwrap();
//!
//!         let transaction: Svc<Transaction> = injector.get().unwrap();
//!         let statements = transaction.statements.lock().unwrap().len();
//!         statements
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(2, statements);
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::needless_doctest_main
)]

mod builder;
mod injector;
mod providers;
mod requests;
mod scope;
mod service;
mod service_factories;

pub use builder::*;
pub use injector::*;
pub use providers::*;
pub use requests::*;
pub use scope::*;
pub use service::*;
pub use service_factories::*;

#[cfg(test)]
mod tests;
