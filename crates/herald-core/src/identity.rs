//! Caller identity as seen by the pipeline.
//!
//! Authentication happens outside the pipeline. When it succeeds, the
//! authentication layer inserts a [`Principal`] into the request's
//! extensions; the pipeline only reads it to derive a [`CorrelationId`].

use serde::{Deserialize, Serialize};

/// Correlation identity used when no principal is attached to the request.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// An authenticated caller.
///
/// # Example
///
/// ```
/// use herald_core::Principal;
///
/// let principal = Principal::new("user-42").with_name("Alice");
/// assert_eq!(principal.id(), "user-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: String,
    name: Option<String>,
    roles: Vec<String>,
}

impl Principal {
    /// Creates a principal from its stable identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            roles: Vec::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Returns the stable identifier (the name-identifier claim).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the caller's roles.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

/// The identity a request's log entries are attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Derives the correlation identity from an optional principal.
    ///
    /// Falls back to [`UNKNOWN_IDENTITY`] when there is no principal.
    #[must_use]
    pub fn from_principal(principal: Option<&Principal>) -> Self {
        principal.map_or_else(Self::unknown, |p| Self(p.id().to_string()))
    }

    /// The sentinel identity for unauthenticated requests.
    #[must_use]
    pub fn unknown() -> Self {
        Self(UNKNOWN_IDENTITY.to_string())
    }

    /// Returns `true` if this is the sentinel identity.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_IDENTITY
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::unknown()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
