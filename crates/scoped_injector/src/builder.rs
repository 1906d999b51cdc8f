use crate::{
    constant, injector::ProviderMap, Injector, IntoSingleton, Provider,
    RequestInfo, RequestScope, RequestScopeFactory, RequestScopeOptions,
    ServiceInfo,
};

/// A builder for an [`Injector`].
#[derive(Default)]
pub struct InjectorBuilder {
    providers: ProviderMap,
    root_info: RequestInfo,
}

impl InjectorBuilder {
    /// Assigns the provider for a service type. Multiple providers can be
    /// registered for a service.
    pub fn provide<P: Provider>(&mut self, provider: P) {
        self.add_provider(Box::new(provider));
    }

    /// Adds a provider to the injector.
    pub fn add_provider(&mut self, provider: Box<dyn Provider>) {
        self.providers
            .entry(provider.result())
            .or_default()
            .push(provider);
    }

    /// Removes all providers for a service type.
    pub fn remove_providers(
        &mut self,
        service_info: ServiceInfo,
    ) -> Option<Vec<Box<dyn Provider>>> {
        self.providers.remove(&service_info)
    }

    /// Borrows the root [`RequestInfo`] that will be used by calls to
    /// [`Injector::get()`].
    #[must_use]
    pub fn root_info(&self) -> &RequestInfo {
        &self.root_info
    }

    /// Enables request-scoped services. This registers a [`RequestScope`]
    /// configured with `options` and a [`RequestScopeFactory`] for opening
    /// scopes. Attaching again replaces the previous request scope.
    pub fn attach_request_scope(&mut self, options: RequestScopeOptions) {
        drop(self.remove_providers(ServiceInfo::of::<RequestScope>()));
        drop(self.remove_providers(ServiceInfo::of::<RequestScopeFactory>()));

        self.provide(constant(RequestScope::new(options)));
        self.provide(RequestScopeFactory::new.singleton());
    }

    /// Builds the injector.
    #[must_use]
    pub fn build(self) -> Injector {
        Injector::new_from_parts(self.providers, self.root_info)
    }
}
