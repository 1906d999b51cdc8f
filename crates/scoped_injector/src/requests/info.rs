use crate::{InjectError, InjectResult, ServiceInfo};

/// Information about an active request to the injector.
///
/// This is not the same thing as an inbound web request. A [`RequestInfo`]
/// describes a single resolution through the injector, including the chain of
/// services that are currently being activated.
#[derive(Clone, Debug, Default)]
pub struct RequestInfo {
    service_path: Vec<ServiceInfo>,
}

impl RequestInfo {
    /// Creates a new, empty instance of [`RequestInfo`].
    #[must_use]
    pub fn new() -> Self {
        RequestInfo {
            service_path: Vec::new(),
        }
    }

    /// Creates a new child instance of [`RequestInfo`] with the given service
    /// appended to the end of the request path. If the service is already
    /// being activated further up the path, a cycle has been found and an
    /// error is returned instead.
    pub fn with_request(&self, service: ServiceInfo) -> InjectResult<Self> {
        if let Some(start) =
            self.service_path.iter().position(|info| *info == service)
        {
            let mut cycle = self.service_path[start..].to_vec();
            cycle.push(service);
            return Err(InjectError::CycleDetected {
                service_info: service,
                cycle,
            });
        }

        let mut child = self.clone();
        child.service_path.push(service);
        Ok(child)
    }

    /// Gets the current request path. This can be used to configure a service
    /// based on what it's being injected into.
    ///
    /// ## Example
    ///
    /// ```
    /// use scoped_injector::{
    ///     Injector, IntoTransient, RequestInfo, ServiceInfo, Svc,
    /// };
    ///
    /// struct Foo(pub Svc<Baz>);
    /// struct Baz(pub i32);
    ///
    /// impl Baz {
    ///     pub fn new(request_info: RequestInfo) -> Self {
    ///         let value = match request_info.service_path().first() {
    ///             Some(root) if *root == ServiceInfo::of::<Foo>() => 1,
    ///             _ => 0,
    ///         };
    ///
    ///         Baz(value)
    ///     }
    /// }
    ///
    /// let mut builder = Injector::builder();
    /// builder.provide(Foo.transient());
    /// builder.provide(Baz::new.transient());
    ///
    /// let injector = builder.build();
    /// let foo: Svc<Foo> = injector.get().unwrap();
    /// let baz: Svc<Baz> = injector.get().unwrap();
    /// assert_eq!(1, foo.0 .0);
    /// assert_eq!(0, baz.0);
    /// ```
    #[must_use]
    pub fn service_path(&self) -> &[ServiceInfo] {
        &self.service_path
    }
}
