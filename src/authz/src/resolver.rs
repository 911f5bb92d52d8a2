//! Claim to role resolution
//!
//! Every `(claim key, claim value)` pair of a [`ClaimSet`] is looked up in the
//! directory; the union of the roles found is the principal's role set.

use crate::claims::ClaimSet;
use crate::directory::DirectoryStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves claims into a deduplicated role set
#[derive(Clone)]
pub struct ClaimResolver {
    store: Arc<dyn DirectoryStore>,
}

impl ClaimResolver {
    /// Create a resolver reading from `store`
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Resolve the roles granted by `claims`
    ///
    /// Never fails: misses, empty mappings, unsupported claim shapes and store
    /// errors all contribute nothing, so an unrecognized claim can only narrow
    /// access. Lookups run one after another; their number is bounded by the
    /// claim set.
    pub async fn resolve(&self, claims: &ClaimSet) -> BTreeSet<String> {
        let mut roles = BTreeSet::new();

        for (key, value) in claims.attribute_pairs() {
            match self.store.get_attribute_to_roles(key, &value).await {
                Ok(mapping) if mapping.roles.is_empty() => {
                    debug!(claim = key, value = %value, "mapping grants no roles");
                }
                Ok(mapping) => {
                    debug!(claim = key, value = %value, roles = ?mapping.roles, "claim mapped to roles");
                    roles.extend(mapping.roles);
                }
                Err(e) if e.is_not_found() => {
                    debug!(claim = key, value = %value, "no attribute to roles mapping");
                }
                Err(e) => {
                    warn!(claim = key, value = %value, error = %e, "attribute to roles lookup failed");
                }
            }
        }

        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{AttributeToRoles, DirectoryStore, InMemoryDirectoryStore, PermissionEntry, Role};
    use crate::error::{AuthzError, Result};
    use async_trait::async_trait;
    use serde_json::json;

    /// Fails every mapping lookup for one claim key
    struct FailingKeyStore {
        inner: Arc<InMemoryDirectoryStore>,
        failing_key: &'static str,
    }

    #[async_trait]
    impl DirectoryStore for FailingKeyStore {
        async fn get_attribute_to_roles(&self, key: &str, value: &str) -> Result<AttributeToRoles> {
            if key == self.failing_key {
                return Err(AuthzError::Storage("connection reset".to_string()));
            }
            self.inner.get_attribute_to_roles(key, value).await
        }

        async fn get_role(&self, name: &str) -> Result<Role> {
            self.inner.get_role(name).await
        }
    }

    /// Mappings are `(key, value, "RoleA,RoleB")`
    async fn store_with(mappings: &[(&str, &str, &str)]) -> Arc<InMemoryDirectoryStore> {
        let store = InMemoryDirectoryStore::new();
        for (key, value, roles) in mappings {
            let roles: Vec<String> = roles.split(',').map(str::to_string).collect();
            for role in &roles {
                if store.get_role(role).await.is_err() {
                    store
                        .set_role(Role::new(role.as_str()).with_permission(PermissionEntry::all()))
                        .await
                        .unwrap();
                }
            }
            store
                .set_attribute_to_roles(AttributeToRoles::new(*key, *value, roles))
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_one_of_several_list_entries_matches() {
        let store = store_with(&[("Groups", "group1", "R1")]).await;
        let resolver = ClaimResolver::new(store);

        let claims = ClaimSet::new().with_claim("Groups", vec!["group1", "group2"]);
        let roles = resolver.resolve(&claims).await;

        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["R1"]);
    }

    #[tokio::test]
    async fn test_roles_are_deduplicated() {
        let store = store_with(&[
            ("groups", "eng", "Dev,Reader"),
            ("groups", "ops", "Reader,Oncall"),
            ("email_verified", "true", "Reader"),
        ])
        .await;
        let resolver = ClaimResolver::new(store);

        let claims = ClaimSet::new()
            .with_claim("groups", vec!["eng", "ops"])
            .with_claim("email_verified", true);
        let roles = resolver.resolve(&claims).await;

        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["Dev", "Oncall", "Reader"]);
    }

    #[tokio::test]
    async fn test_mixed_list_elements_are_stringified() {
        let store = store_with(&[("levels", "3", "L3"), ("levels", "beta", "Beta")]).await;
        let resolver = ClaimResolver::new(store);

        let claims = ClaimSet::from_json(&json!({ "levels": [3, "beta", {"x": 1}] })).unwrap();
        let roles = resolver.resolve(&claims).await;

        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["Beta", "L3"]);
    }

    #[tokio::test]
    async fn test_store_error_on_one_claim_keeps_the_others() {
        let inner = store_with(&[("groups", "Base", "Admin"), ("broken", "x", "Ghost")]).await;
        let resolver = ClaimResolver::new(Arc::new(FailingKeyStore {
            inner,
            failing_key: "broken",
        }));

        let claims = ClaimSet::from_json(&json!({"broken": "x", "groups": ["Base"]})).unwrap();
        let roles = resolver.resolve(&claims).await;
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["Admin"]);

        let only_broken = ClaimSet::new().with_claim("broken", "x");
        assert!(resolver.resolve(&only_broken).await.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_and_unknown_claims_resolve_nothing() {
        let store = store_with(&[("groups", "Base", "Admin")]).await;
        let resolver = ClaimResolver::new(store);

        let claims = ClaimSet::from_json(&json!({
            "auth_time": 1717000000,
            "identities": {"google.com": "x"},
            "groups": ["Engineering"],
        }))
        .unwrap();

        assert!(resolver.resolve(&claims).await.is_empty());
        assert!(resolver.resolve(&ClaimSet::new()).await.is_empty());
    }
}
