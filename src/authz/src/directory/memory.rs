//! In-memory directory store

use super::{mapping_key, AttributeToRoles, DirectoryStore, ProxyConfig, Role};
use crate::error::{AuthzError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Directory {
    proxies: HashMap<String, ProxyConfig>,
    roles: HashMap<String, Role>,
    mappings: HashMap<(String, String), AttributeToRoles>,
}

/// In-memory directory with validating administrative writes
///
/// All three collections sit behind a single lock so cross-collection checks
/// (a role's proxies, a mapping's roles) see a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectoryStore {
    inner: Arc<RwLock<Directory>>,
}

impl InMemoryDirectoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Proxies
    // ------------------------------------------------------------------

    /// Register or replace a proxy
    pub async fn set_proxy(&self, proxy: ProxyConfig) -> Result<()> {
        if proxy.name.is_empty() {
            return Err(AuthzError::InvalidInput("proxy name cannot be empty".to_string()));
        }
        if proxy.name == "*" {
            return Err(AuthzError::InvalidInput("proxy name '*' is reserved".to_string()));
        }

        let mut dir = self.inner.write().await;
        dir.proxies.insert(proxy.name.clone(), proxy);
        Ok(())
    }

    /// Get a proxy by name
    pub async fn get_proxy(&self, name: &str) -> Result<ProxyConfig> {
        let dir = self.inner.read().await;
        dir.proxies
            .get(name)
            .cloned()
            .ok_or_else(|| AuthzError::not_found("proxy", name))
    }

    /// List proxies sorted by name
    pub async fn list_proxies(&self) -> Result<Vec<ProxyConfig>> {
        let dir = self.inner.read().await;
        let mut proxies: Vec<_> = dir.proxies.values().cloned().collect();
        proxies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(proxies)
    }

    /// Remove a proxy
    pub async fn delete_proxy(&self, name: &str) -> Result<()> {
        let mut dir = self.inner.write().await;
        dir.proxies.remove(name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    /// Create a role
    ///
    /// # Errors
    ///
    /// - [`AuthzError::InvalidInput`] for an empty name
    /// - [`AuthzError::AlreadyExists`] if the role is already defined
    /// - [`AuthzError::NotFound`] if a permission names an unregistered proxy
    pub async fn set_role(&self, role: Role) -> Result<()> {
        if role.name.is_empty() {
            return Err(AuthzError::InvalidInput("role name cannot be empty".to_string()));
        }

        let mut dir = self.inner.write().await;
        if dir.roles.contains_key(&role.name) {
            return Err(AuthzError::already_exists("role", role.name));
        }

        for permission in &role.permissions {
            if permission.proxy != "*" && !dir.proxies.contains_key(&permission.proxy) {
                return Err(AuthzError::not_found("proxy", permission.proxy.clone()));
            }
        }

        debug!(role = %role.name, permissions = role.permissions.len(), "role stored");
        dir.roles.insert(role.name.clone(), role);
        Ok(())
    }

    /// List roles sorted by name
    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        let dir = self.inner.read().await;
        let mut roles: Vec<_> = dir.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    /// Remove a role
    ///
    /// Mappings that reference it are left untouched.
    pub async fn delete_role(&self, name: &str) -> Result<()> {
        let mut dir = self.inner.write().await;
        dir.roles.remove(name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attribute to roles
    // ------------------------------------------------------------------

    /// Create an attribute-to-roles mapping
    ///
    /// # Errors
    ///
    /// - [`AuthzError::InvalidInput`] for an empty key or role set
    /// - [`AuthzError::AlreadyExists`] if the `(key, value)` pair is mapped
    /// - [`AuthzError::NotFound`] if a referenced role does not exist
    pub async fn set_attribute_to_roles(&self, mapping: AttributeToRoles) -> Result<()> {
        if mapping.attribute_key.is_empty() {
            return Err(AuthzError::InvalidInput("attribute key cannot be empty".to_string()));
        }
        if mapping.roles.is_empty() {
            return Err(AuthzError::InvalidInput(format!(
                "attribute to roles '{}' must grant at least one role",
                mapping.key()
            )));
        }

        let mut dir = self.inner.write().await;
        let key = (mapping.attribute_key.clone(), mapping.attribute_value.clone());
        if dir.mappings.contains_key(&key) {
            return Err(AuthzError::already_exists("attribute to roles", mapping.key()));
        }

        for role in &mapping.roles {
            if !dir.roles.contains_key(role) {
                return Err(AuthzError::not_found("role", role.clone()));
            }
        }

        dir.mappings.insert(key, mapping);
        Ok(())
    }

    /// List mappings sorted by key then value
    pub async fn list_attribute_to_roles(&self) -> Result<Vec<AttributeToRoles>> {
        let dir = self.inner.read().await;
        let mut mappings: Vec<_> = dir.mappings.values().cloned().collect();
        mappings.sort_by(|a, b| {
            (&a.attribute_key, &a.attribute_value).cmp(&(&b.attribute_key, &b.attribute_value))
        });
        Ok(mappings)
    }

    /// Remove a mapping
    pub async fn delete_attribute_to_roles(&self, attribute_key: &str, attribute_value: &str) -> Result<()> {
        let mut dir = self.inner.write().await;
        dir.mappings
            .remove(&(attribute_key.to_string(), attribute_value.to_string()));
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn get_attribute_to_roles(
        &self,
        attribute_key: &str,
        attribute_value: &str,
    ) -> Result<AttributeToRoles> {
        let dir = self.inner.read().await;
        dir.mappings
            .get(&(attribute_key.to_string(), attribute_value.to_string()))
            .cloned()
            .ok_or_else(|| {
                AuthzError::not_found("attribute to roles", mapping_key(attribute_key, attribute_value))
            })
    }

    async fn get_role(&self, name: &str) -> Result<Role> {
        let dir = self.inner.read().await;
        dir.roles
            .get(name)
            .cloned()
            .ok_or_else(|| AuthzError::not_found("role", name))
    }
}
