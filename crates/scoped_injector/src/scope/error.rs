#![allow(clippy::used_underscore_binding)]

use crate::{ScopeId, ServiceInfo};
use derive_more::{Display, Error};

/// An error raised by a scoped resource while entering or releasing it.
pub type ResourceError = Box<dyn std::error::Error + Send + Sync>;

/// A single resource which failed to release while its scope was closing.
#[derive(Debug, Display, Error)]
#[display(fmt = "{}: {}", "service_info.name()", error)]
pub struct ReleaseFailure {
    /// The service whose resource failed to release.
    pub service_info: ServiceInfo,

    /// The error returned by the resource.
    pub error: ResourceError,
}

/// An error raised by the request scope.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ScopeError {
    /// A request-scoped service was requested while no request scope was
    /// published for the current task.
    #[display(fmt = "no request scope has been established for the current task")]
    ScopeNotEstablished,

    /// A scope with this identifier is already open.
    #[display(fmt = "request scope {} is already open", id)]
    DuplicateScope {
        /// The identifier of the scope.
        id: ScopeId,
    },

    /// No open scope has this identifier.
    #[display(fmt = "request scope {} is not open", id)]
    UnknownScope {
        /// The identifier of the scope.
        id: ScopeId,
    },

    /// A value of this type has already been stored in the scope.
    #[display(
        fmt = "request scope {} already holds a value for {}",
        id,
        "service_info.name()"
    )]
    AlreadySeeded {
        /// The identifier of the scope.
        id: ScopeId,

        /// The service that was seeded.
        service_info: ServiceInfo,
    },

    /// No value of this type was seeded into the scope.
    #[display(
        fmt = "request scope {} was not seeded with {}",
        id,
        "service_info.name()"
    )]
    NotSeeded {
        /// The identifier of the scope.
        id: ScopeId,

        /// The service that was requested.
        service_info: ServiceInfo,
    },

    /// A value was requested again by the producer creating it.
    #[display(
        fmt = "{} was requested while it was being created in request scope {}",
        "service_info.name()",
        id
    )]
    ReentrantCreation {
        /// The identifier of the scope.
        id: ScopeId,

        /// The service that was requested.
        service_info: ServiceInfo,
    },

    /// A resource failed to enter. The value was not cached.
    #[display(fmt = "failed to enter {}: {}", "service_info.name()", error)]
    EnterFailed {
        /// The service whose resource failed to enter.
        service_info: ServiceInfo,

        /// The error returned by the resource.
        error: ResourceError,
    },

    /// One or more resources failed to release. Every resource in the scope
    /// was still attempted.
    #[display(
        fmt = "cleanup of request scope {} failed [{}]",
        id,
        "fmt_failures(failures)"
    )]
    CleanupFailed {
        /// The identifier of the scope.
        id: ScopeId,

        /// Each failed release, in the order it was attempted.
        failures: Vec<ReleaseFailure>,
    },

    /// The background worker used to run async resources could not be
    /// reached.
    #[display(fmt = "the request scope worker is unavailable: {}", reason)]
    WorkerUnavailable {
        /// Why the worker is unavailable.
        reason: String,
    },
}

fn fmt_failures(failures: &[ReleaseFailure]) -> String {
    let mut joined = String::new();
    for failure in failures {
        if !joined.is_empty() {
            joined.push_str("; ");
        }
        joined.push_str(&failure.to_string());
    }
    joined
}
