use crate::{InjectResult, Injector, Request, RequestInfo, Service};

/// A factory for creating instances of a service. All functions of arity 12 or
/// less are automatically service factories if the arguments to that function
/// are valid service requests and the return value is a valid service type.
///
/// ## Type parameters
/// * `D` - Tuple of this service's dependencies.
///
/// ## Example
///
/// ```
/// use scoped_injector::{Injector, RequestInfo, ServiceFactory, Svc};
///
/// struct Foo;
/// struct Bar;
///
/// # fn _no_run() {
/// fn factory(foo: Svc<Foo>) -> Bar {
///     todo!()
/// }
/// let injector: Injector = todo!();
/// factory.invoke(&injector, &RequestInfo::new());
/// # }
/// ```
pub trait ServiceFactory<D>: Service {
    /// The resulting service from invoking this service factory.
    type Result: Service;

    /// Invokes this service factory, creating an instance of the service.
    fn invoke(
        &self,
        injector: &Injector,
        request_info: &RequestInfo,
    ) -> InjectResult<Self::Result>;
}

macro_rules! impl_provider_function {
    () => {
        impl_provider_function!(@impl ());
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_provider_function!(@impl ($first $(, $rest)*));
        impl_provider_function!($($rest),*);
    };
    (@impl ($($type_name:ident),*)) => {
        impl<F, R $(, $type_name)*> ServiceFactory<($($type_name,)*)> for F
        where
            F: Service + Fn($($type_name),*) -> R,
            R: Service,
            $($type_name: Request,)*
        {
            type Result = R;

            #[allow(unused_variables, non_snake_case)]
            fn invoke(
                &self,
                injector: &Injector,
                request_info: &RequestInfo,
            ) -> InjectResult<Self::Result> {
                let result = self($(
                    match injector.get_with::<$type_name>(request_info) {
                        Ok(dependency) => dependency,
                        Err($crate::InjectError::MissingProvider { service_info }) => {
                            return Err($crate::InjectError::MissingDependency {
                                dependency_info: service_info,
                                service_info: $crate::ServiceInfo::of::<R>(),
                            })
                        },
                        Err(error) => return Err(error),
                    }
                ),*);
                Ok(result)
            }
        }
    };
}

impl_provider_function!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
