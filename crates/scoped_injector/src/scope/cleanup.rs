use crate::{
    AsyncBridge, ReleaseFailure, ScopeError, ScopeId, ScopedResource,
    ServiceInfo,
};
use dashmap::DashMap;
use tracing::{trace, warn};

#[derive(Clone)]
struct RegisteredResource {
    service_info: ServiceInfo,
    resource: ScopedResource,
}

/// Tracks the resources created in each scope so they can be released when
/// the scope closes.
///
/// Resources are released in the reverse of the order they were registered
/// in. A failing release never stops the remaining resources from being
/// released.
#[derive(Default)]
pub struct CleanupRegistry {
    resources: DashMap<ScopeId, Vec<RegisteredResource>>,
    bridge: AsyncBridge,
}

impl CleanupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        CleanupRegistry::default()
    }

    /// Gets the bridge used to run async resources from synchronous code.
    #[must_use]
    pub fn bridge(&self) -> &AsyncBridge {
        &self.bridge
    }

    /// Enters a resource. Async resources are run through the
    /// [`AsyncBridge`].
    pub fn enter(
        &self,
        service_info: ServiceInfo,
        resource: &ScopedResource,
    ) -> Result<(), ScopeError> {
        let result = match resource {
            ScopedResource::Sync(resource) => resource.enter(),
            ScopedResource::Async(resource) => {
                let resource = resource.clone();
                self.bridge.block_on(async move { resource.enter().await })?
            }
        };

        result.map_err(|error| ScopeError::EnterFailed {
            service_info,
            error,
        })
    }

    /// Registers a resource to be released when its scope closes.
    pub fn register(
        &self,
        id: ScopeId,
        service_info: ServiceInfo,
        resource: ScopedResource,
    ) {
        trace!(scope = %id, service = service_info.name(), "registered scoped resource");
        self.resources
            .entry(id)
            .or_default()
            .push(RegisteredResource {
                service_info,
                resource,
            });
    }

    /// Gets the number of resources waiting to be released in a scope.
    #[must_use]
    pub fn pending(&self, id: ScopeId) -> usize {
        self.resources.get(&id).map_or(0, |resources| resources.len())
    }

    /// Releases every resource registered in a scope, most recently
    /// registered first.
    ///
    /// Every resource is attempted. If any of them fail, the failures are
    /// returned together once all releases have been attempted. Flushing a
    /// scope with nothing registered does nothing.
    ///
    /// A resource stays registered until its release has finished, so if the
    /// returned future is dropped part way through, flushing the scope again
    /// picks up from the resource that was interrupted.
    pub async fn flush(&self, id: ScopeId) -> Result<(), ScopeError> {
        let mut failures = Vec::new();
        while let Some(registered) = self.last(id) {
            let service_info = registered.service_info;
            let result = registered.resource.release().await;
            if let Some(mut resources) = self.resources.get_mut(&id) {
                resources.pop();
            }

            match result {
                Ok(()) => {
                    trace!(scope = %id, service = service_info.name(), "released scoped resource");
                }
                Err(error) => {
                    warn!(
                        scope = %id,
                        service = service_info.name(),
                        %error,
                        "failed to release scoped resource"
                    );
                    failures.push(ReleaseFailure {
                        service_info,
                        error,
                    });
                }
            }
        }
        self.resources.remove_if(&id, |_, resources| resources.is_empty());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ScopeError::CleanupFailed { id, failures })
        }
    }

    /// Releases a resource which was never registered, such as one created
    /// after its scope had already closed. Failures are logged.
    pub fn release_now(
        &self,
        id: ScopeId,
        service_info: ServiceInfo,
        resource: &ScopedResource,
    ) {
        let result = match resource {
            ScopedResource::Sync(resource) => resource.release(),
            ScopedResource::Async(resource) => {
                let resource = resource.clone();
                self.bridge
                    .block_on(async move { resource.release().await })
                    .unwrap_or_else(|error| Err(error.into()))
            }
        };

        match result {
            Ok(()) => {
                trace!(scope = %id, service = service_info.name(), "released unregistered resource");
            }
            Err(error) => {
                warn!(
                    scope = %id,
                    service = service_info.name(),
                    %error,
                    "failed to release unregistered resource"
                );
            }
        }
    }

    /// Forgets every resource registered in a scope without releasing them,
    /// returning how many were dropped.
    pub fn discard(&self, id: ScopeId) -> usize {
        self.resources
            .remove(&id)
            .map_or(0, |(_, resources)| resources.len())
    }

    fn last(&self, id: ScopeId) -> Option<RegisteredResource> {
        self.resources.get(&id)?.last().cloned()
    }
}
