use serde::{Deserialize, Serialize};

/// Configuration for the request scope. This is set once when the request
/// scope is attached to an [`InjectorBuilder`](crate::InjectorBuilder) and
/// cannot be changed afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestScopeOptions {
    /// Whether request-scoped values which declared a releasable capability
    /// are entered on creation and released when their scope closes.
    pub enable_cleanup: bool,
}

impl RequestScopeOptions {
    /// Creates the default options. Cleanup is disabled.
    #[must_use]
    pub fn new() -> Self {
        RequestScopeOptions::default()
    }

    /// Enables or disables cleanup of releasable values.
    #[must_use]
    pub fn with_cleanup(mut self, enable_cleanup: bool) -> Self {
        self.enable_cleanup = enable_cleanup;
        self
    }
}
