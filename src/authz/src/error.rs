//! Error types for the authorization engine

use thiserror::Error;

/// Authorization engine errors
///
/// None of these cross [`PermissionDecider::verify_permissions`](crate::engine::PermissionDecider::verify_permissions);
/// the decision path logs them and denies.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Directory entry not found
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Entry kind (role, proxy, attribute to roles)
        kind: &'static str,
        /// Entry key
        name: String,
    },

    /// Directory entry already exists
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// Entry kind (role, proxy, attribute to roles)
        kind: &'static str,
        /// Entry key
        name: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AuthzError {
    /// Shorthand for a [`AuthzError::NotFound`]
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound { kind, name: name.into() }
    }

    /// Shorthand for a [`AuthzError::AlreadyExists`]
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists { kind, name: name.into() }
    }

    /// Whether this error is a directory miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
