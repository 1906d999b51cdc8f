use crate::{
    InjectError, InjectResult, InjectorBuilder, Provider, Request, RequestInfo,
    Service, ServiceInfo, Svc,
};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
};

pub(crate) type ProviderMap = HashMap<ServiceInfo, Vec<Box<dyn Provider>>>;

/// A runtime dependency injection container. This holds all the bindings
/// between service types and their providers.
///
/// # Injecting the injector
///
/// Cloning the injector does not clone the providers inside of it. Instead,
/// both injectors will use the same providers, meaning that an injector can be
/// passed to a service as a dependency. The injector can be requested as
/// itself without using a service pointer. It does not need to be registered
/// as a dependency in the builder beforehand.
///
/// Note that requesting the injector inside of your services is generally bad
/// practice, and is known as the service locator antipattern. This is mostly
/// useful for service factories where you can create instances of your
/// services on demand.
///
/// ```
/// use scoped_injector::{constant, InjectResult, Injector, IntoSingleton, IntoTransient, Svc};
/// use std::sync::Mutex;
///
/// struct FloatFactory(Injector);
///
/// impl FloatFactory {
///     pub fn new(injector: Injector) -> Self {
///         FloatFactory(injector)
///     }
///
///     pub fn get(&self) -> InjectResult<f32> {
///         let int: Svc<i32> = self.0.get()?;
///         Ok(*int as f32)
///     }
/// }
///
/// fn count(counter: Svc<Mutex<i32>>) -> i32 {
///     let mut counter = counter.lock().unwrap();
///     *counter += 1;
///     *counter
/// }
///
/// let mut builder = Injector::builder();
/// builder.provide(constant(Mutex::new(0i32)));
/// builder.provide(count.transient());
/// builder.provide(FloatFactory::new.singleton());
///
/// let injector = builder.build();
/// let float_factory: Svc<FloatFactory> = injector.get().unwrap();
/// let value1 = float_factory.get().unwrap();
/// let value2 = float_factory.get().unwrap();
///
/// assert_eq!(1.0, value1);
/// assert_eq!(2.0, value2);
/// ```
#[derive(Clone)]
pub struct Injector {
    providers: Svc<ProviderMap>,
    root_info: RequestInfo,
}

impl Injector {
    /// Creates a builder for this injector. This is the preferred way of
    /// creating an injector.
    #[must_use]
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::default()
    }

    pub(crate) fn new_from_parts(
        providers: ProviderMap,
        root_info: RequestInfo,
    ) -> Self {
        Injector {
            providers: Svc::new(providers),
            root_info,
        }
    }

    /// Performs a request for a service. There are several types of requests
    /// that can be made to the service container by default:
    ///
    /// - [`Svc<T>`](crate::Svc): Requests a service pointer to the given
    ///   service and creates an instance of the service if needed. If
    ///   multiple service providers are registered for that service, then
    ///   returns an error instead.
    /// - `Option<Svc<T>>`: Like [`Svc<T>`](crate::Svc), but returns `Ok(None)`
    ///   rather than an error if no provider is registered.
    /// - `Vec<Svc<T>>`: Requests all the implementations of a service.
    /// - [`ScopeId`](crate::ScopeId): Requests the identifier of the request
    ///   scope published for the current task.
    /// - [`Injector`]: Requests a clone of the injector.
    ///
    /// Requests for request-scoped services fail with
    /// [`ScopeError::ScopeNotEstablished`](crate::ScopeError) when no request
    /// scope has been published for the current task.
    ///
    /// Custom request types can also be used by implementing [`Request`].
    pub fn get<R: Request>(&self) -> InjectResult<R> {
        self.get_with(&self.root_info)
    }

    /// Performs a request for a service with additional request information.
    pub fn get_with<R: Request>(
        &self,
        request_info: &RequestInfo,
    ) -> InjectResult<R> {
        R::request(self, request_info)
    }

    /// Gets the providers registered for a service.
    #[must_use]
    pub fn providers_for(
        &self,
        service_info: ServiceInfo,
    ) -> &[Box<dyn Provider>] {
        self.providers
            .get(&service_info)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Activates a single provider and downcasts the service it provides.
    pub(crate) fn activate<S: Service>(
        &self,
        provider: &dyn Provider,
        request_info: &RequestInfo,
    ) -> InjectResult<Svc<S>> {
        let service_info = ServiceInfo::of::<S>();
        provider
            .provide(self, request_info)?
            .downcast::<S>()
            .map_err(|_| InjectError::InvalidProvider { service_info })
    }
}

impl Debug for Injector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.providers.iter().map(|(service_info, providers)| {
                (
                    service_info.name(),
                    format!("<{} providers>", providers.len()),
                )
            }))
            .finish()
    }
}
