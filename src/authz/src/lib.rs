//! # MCP Gateway Authorization Engine
//!
//! Attribute-driven authorization for tool calls proxied by the gateway.
//!
//! ## Features
//!
//! - **Claim resolution**: heterogeneous identity claims mapped to roles
//!   through attribute-to-role rules held in a directory store
//! - **Role/object matching**: permission entries matched on object type,
//!   source (proxy) and object name with a `*` wildcard
//! - **Concurrent role fan-out** with first-error cancellation
//! - **Scope mode**: flat ANY/ALL scope matching with glob action patterns
//! - **Fail-closed**: every error path denies
//!
//! ## Example
//!
//! ```rust
//! use mcpgate_authz::{
//!     AttributeToRoles, ClaimSet, EngineConfig, InMemoryDirectoryStore, PermissionDecider,
//!     PermissionEntry, Role,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryDirectoryStore::new();
//!     store.set_role(Role::new("Admin").with_permission(PermissionEntry::all())).await?;
//!     store
//!         .set_attribute_to_roles(AttributeToRoles::new("groups", "Base", vec!["Admin".into()]))
//!         .await?;
//!
//!     let decider = PermissionDecider::new(EngineConfig::default(), Arc::new(store))?;
//!     let claims = ClaimSet::new().with_claim("groups", vec!["Base"]);
//!
//!     if decider.verify_permissions(&claims, "tools", "github", "create_issue").await {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod claims;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod policy;
pub mod resolver;

// Re-export commonly used types
pub use claims::{ClaimSet, ClaimValue};
pub use config::AuthzConfig;
pub use directory::{
    AttributeToRoles, DirectoryStore, InMemoryDirectoryStore, ObjectType, PermissionEntry,
    ProxyConfig, Role,
};
pub use engine::{EngineConfig, PermissionDecider};
pub use error::{AuthzError, Result};
pub use policy::{AuthorizationRequest, Decision, PermissionPolicy, PolicyKind, ScopeMode};
pub use resolver::ClaimResolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
