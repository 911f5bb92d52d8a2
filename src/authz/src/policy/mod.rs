//! Permission policies
//!
//! A [`PermissionPolicy`] turns a claim set and a requested action into a
//! [`Decision`]. Two strategies exist, chosen once from configuration:
//!
//! - [`RoleObjectMatch`]: claims → roles (directory) → permission entries
//!   matched on object type, source and object name.
//! - [`ScopeSetMatch`]: claims → flat scopes, compared against the scopes an
//!   action requires with ANY/ALL semantics.

use crate::claims::ClaimSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod role;
pub mod scope;

pub use role::RoleObjectMatch;
pub use scope::{ScopeConfig, ScopeMode, ScopePermission, ScopeSetMatch};

/// Which policy strategy the engine runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Attribute → role → permission entry matching
    #[default]
    Role,
    /// Flat scope matching
    Scope,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role => f.write_str("role"),
            Self::Scope => f.write_str("scope"),
        }
    }
}

/// The protected action being requested
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Object type (e.g. `tools`)
    pub object_type: String,

    /// Source identifier (proxy name)
    pub source_id: String,

    /// Object name (tool name)
    pub object_name: String,
}

impl AuthorizationRequest {
    /// Create a new request
    pub fn new(
        object_type: impl Into<String>,
        source_id: impl Into<String>,
        object_name: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            source_id: source_id.into(),
            object_name: object_name.into(),
        }
    }

    /// Namespaced action identifier, `<source>:<object name>`
    pub fn action_id(&self) -> String {
        format!("{}:{}", self.source_id, self.object_name)
    }
}

impl fmt::Display for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.object_type, self.source_id, self.object_name)
    }
}

/// Outcome of one policy evaluation
///
/// Only [`Decision::is_allowed`] leaves the engine; the variants feed logs and
/// metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Access granted by the named role or scope
    Allowed {
        /// Role or scope that matched
        grant: String,
    },
    /// Claims resolved to no roles or scopes
    NoGrants,
    /// Nothing granted matched the request
    NoMatch,
    /// The directory could not produce a referenced role
    FetchFailed,
}

impl Decision {
    /// Whether access is granted
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Authorization strategy
#[async_trait]
pub trait PermissionPolicy: Send + Sync {
    /// Strategy name, for logs
    fn kind(&self) -> PolicyKind;

    /// Decide whether `claims` may perform `request`
    ///
    /// Must fail closed: any internal error yields a denying decision.
    async fn evaluate(&self, claims: &ClaimSet, request: &AuthorizationRequest) -> Decision;
}
