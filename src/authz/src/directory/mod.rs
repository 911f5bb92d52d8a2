//! Directory store: roles, attribute-to-role mappings and registered proxies
//!
//! The engine only reads from the directory through [`DirectoryStore`]. Writes
//! (and their validation) belong to the administrative side; see
//! [`InMemoryDirectoryStore`] for the reference implementation.

use crate::error::{AuthzError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod memory;

pub use memory::InMemoryDirectoryStore;

/// Kind of protected object a permission applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Any object type
    #[serde(rename = "*")]
    All,
    /// MCP tools
    #[serde(rename = "tools")]
    Tools,
}

impl ObjectType {
    /// Pattern text used for matching
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Tools => "tools",
        }
    }
}

impl FromStr for ObjectType {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "*" => Ok(Self::All),
            "tools" => Ok(Self::Tools),
            other => Err(AuthzError::InvalidInput(format!("invalid object type: {}", other))),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One grant: all three patterns must match the request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// Object type pattern
    pub object_type: ObjectType,

    /// Source (proxy) name, or `"*"`
    pub proxy: String,

    /// Object (tool) name, or `"*"`
    pub object_name: String,
}

impl PermissionEntry {
    /// Create a new permission entry
    pub fn new(object_type: ObjectType, proxy: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            object_type,
            proxy: proxy.into(),
            object_name: object_name.into(),
        }
    }

    /// Full wildcard grant (`*`, `*`, `*`)
    pub fn all() -> Self {
        Self::new(ObjectType::All, "*", "*")
    }
}

/// Named bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name
    pub name: String,

    /// Ordered permission entries
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

impl Role {
    /// Create a role without permissions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    /// Add a permission entry
    pub fn with_permission(mut self, permission: PermissionEntry) -> Self {
        self.permissions.push(permission);
        self
    }
}

/// Rule translating one `(claim key, claim value)` pair into roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeToRoles {
    /// Claim key (e.g. `groups`)
    pub attribute_key: String,

    /// Claim value (e.g. `Engineering`)
    pub attribute_value: String,

    /// Granted role names
    pub roles: Vec<String>,
}

impl AttributeToRoles {
    /// Create a new mapping
    pub fn new(
        attribute_key: impl Into<String>,
        attribute_value: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            attribute_key: attribute_key.into(),
            attribute_value: attribute_value.into(),
            roles,
        }
    }

    /// Storage key (`key:value`)
    pub fn key(&self) -> String {
        mapping_key(&self.attribute_key, &self.attribute_value)
    }
}

/// Registered backend tool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy name; used as the source identifier of requests
    pub name: String,

    /// Backend URL
    pub url: String,

    /// Backend timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ProxyConfig {
    /// Create a new proxy entry
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout: None,
        }
    }
}

pub(crate) fn mapping_key(attribute_key: &str, attribute_value: &str) -> String {
    format!("{}:{}", attribute_key, attribute_value)
}

/// Read side of the directory consumed by the engine
///
/// Implementations must be safe for concurrent reads and are expected to bound
/// their own latency. A miss is reported as [`AuthzError::NotFound`].
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Get the mapping for one claim pair
    async fn get_attribute_to_roles(
        &self,
        attribute_key: &str,
        attribute_value: &str,
    ) -> Result<AttributeToRoles>;

    /// Get a role by name
    async fn get_role(&self, name: &str) -> Result<Role>;
}
