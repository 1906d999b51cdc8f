use derive_more::Display;
use uuid::Uuid;

/// Identifies a single request scope. A new random identifier is minted every
/// time a scope is opened and is never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[display(fmt = "{}", _0)]
pub struct ScopeId(Uuid);

impl ScopeId {
    /// Mints a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        ScopeId(Uuid::new_v4())
    }

    /// Gets the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        ScopeId::new()
    }
}

impl From<ScopeId> for Uuid {
    fn from(id: ScopeId) -> Self {
        id.0
    }
}
