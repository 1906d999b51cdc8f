use crate::{
    InjectError, InjectResult, Injector, RequestInfo, ScopeContext, ScopeId,
    Service, ServiceInfo, Svc,
};

/// A request to an injector.
///
/// ## Grouping requests
///
/// Requests can be grouped together by using tuples to make multiple requests
/// at once. Since there is a limit of 12 supported parameters/dependencies for
/// factories, tuples can also be used to get around that limitation.
///
/// ```
/// use scoped_injector::{Injector, IntoSingleton, Svc};
///
/// #[derive(Default)]
/// struct Bar;
/// #[derive(Default)]
/// struct Baz;
/// struct Foo(Svc<Bar>, Svc<Baz>);
///
/// impl Foo {
///     pub fn new((bar, baz): (Svc<Bar>, Svc<Baz>)) -> Self {
///         Foo(bar, baz)
///     }
/// }
///
/// let mut builder = Injector::builder();
/// builder.provide(Foo::new.singleton());
/// builder.provide(Bar::default.singleton());
/// builder.provide(Baz::default.singleton());
///
/// let injector = builder.build();
/// let _foo: Svc<Foo> = injector.get().unwrap();
/// ```
pub trait Request: Sized {
    /// Performs the request to the injector.
    fn request(injector: &Injector, info: &RequestInfo) -> InjectResult<Self>;
}

/// Requests the injector used to resolve services.
impl Request for Injector {
    #[inline]
    fn request(injector: &Injector, _info: &RequestInfo) -> InjectResult<Self> {
        Ok(injector.clone())
    }
}

/// Requests the information about the current request.
impl Request for RequestInfo {
    #[inline]
    fn request(_injector: &Injector, info: &RequestInfo) -> InjectResult<Self> {
        Ok(info.clone())
    }
}

/// Requests the identifier of the request scope published for the current
/// task. Fails if no scope has been established.
impl Request for ScopeId {
    #[inline]
    fn request(_injector: &Injector, _info: &RequestInfo) -> InjectResult<Self> {
        Ok(ScopeContext::current()?)
    }
}

/// Requests a service pointer to a service. This request fails if there is not
/// exactly one provider registered for the given service type.
impl<S: Service> Request for Svc<S> {
    fn request(injector: &Injector, info: &RequestInfo) -> InjectResult<Self> {
        let service_info = ServiceInfo::of::<S>();
        match injector.providers_for(service_info) {
            [] => Err(InjectError::MissingProvider { service_info }),
            [provider] => injector.activate(provider.as_ref(), info),
            providers => Err(InjectError::MultipleProviders {
                service_info,
                providers: providers.len(),
            }),
        }
    }
}

/// Requests all the implementations of a service. If no provider is
/// registered for the given service, then this will return an empty
/// [`Vec<T>`].
impl<S: Service> Request for Vec<Svc<S>> {
    fn request(injector: &Injector, info: &RequestInfo) -> InjectResult<Self> {
        injector
            .providers_for(ServiceInfo::of::<S>())
            .iter()
            .map(|provider| injector.activate(provider.as_ref(), info))
            .collect()
    }
}

/// Tries to request a service pointer for a service. If no provider has been
/// registered for it, then returns `None`. This fails if there are multiple
/// providers of the given service.
impl<S: Service> Request for Option<Svc<S>> {
    fn request(injector: &Injector, info: &RequestInfo) -> InjectResult<Self> {
        match injector.get_with(info) {
            Ok(response) => Ok(Some(response)),
            Err(InjectError::MissingProvider { service_info })
                if service_info == ServiceInfo::of::<S>() =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

macro_rules! impl_tuple_request {
    () => {
        impl_tuple_request!(@impl ());
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_tuple_request!(@impl ($first $(, $rest)*));
        impl_tuple_request!($($rest),*);
    };
    (@impl ($($type_name:ident),*)) => {
        /// Performs multiple requests at once. This is useful for grouping
        /// together related requests.
        impl <$($type_name),*> Request for ($($type_name,)*)
        where
            $($type_name: Request,)*
        {
            #[allow(unused_variables)]
            fn request(injector: &Injector, info: &RequestInfo) -> InjectResult<Self> {
                let result = ($(injector.get_with::<$type_name>(info)?,)*);
                Ok(result)
            }
        }
    };
}

impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
