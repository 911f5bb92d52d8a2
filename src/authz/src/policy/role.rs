//! Role/object matching policy

use super::{AuthorizationRequest, Decision, PermissionPolicy, PolicyKind};
use crate::claims::ClaimSet;
use crate::directory::{DirectoryStore, PermissionEntry, Role};
use crate::error::{AuthzError, Result};
use crate::matcher::matches;
use crate::resolver::ClaimResolver;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Claims → roles → permission entries
///
/// Authorized when any resolved role holds one entry whose object type,
/// source and object name all match the request.
#[derive(Clone)]
pub struct RoleObjectMatch {
    resolver: ClaimResolver,
    store: Arc<dyn DirectoryStore>,
}

impl RoleObjectMatch {
    /// Create a policy reading roles and mappings from `store`
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            resolver: ClaimResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Fetch every role concurrently
    ///
    /// The first failure aborts the remaining fetches and is returned; no
    /// partial result is ever produced.
    pub async fn fetch_roles(&self, names: &BTreeSet<String>) -> Result<Vec<Role>> {
        let collected = Arc::new(Mutex::new(Vec::with_capacity(names.len())));
        let mut tasks = JoinSet::new();

        for name in names {
            let name = name.clone();
            let store = Arc::clone(&self.store);
            let collected = Arc::clone(&collected);

            tasks.spawn(async move {
                let role = store.get_role(&name).await.map_err(|e| (name, e))?;
                collected.lock().push(role);
                Ok::<(), (String, AuthzError)>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err((role, e))) => {
                    tasks.abort_all();
                    error!(role = %role, error = %e, "role fetch failed");
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    error!(error = %e, "role fetch task failed");
                    return Err(AuthzError::Storage(format!("role fetch task failed: {}", e)));
                }
            }
        }

        let mut roles = std::mem::take(&mut *collected.lock());
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    /// Whether one entry covers all three dimensions of the request
    pub fn entry_matches(entry: &PermissionEntry, request: &AuthorizationRequest) -> bool {
        matches(entry.object_type.as_str(), &request.object_type)
            && matches(&entry.proxy, &request.source_id)
            && matches(&entry.object_name, &request.object_name)
    }
}

#[async_trait]
impl PermissionPolicy for RoleObjectMatch {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Role
    }

    async fn evaluate(&self, claims: &ClaimSet, request: &AuthorizationRequest) -> Decision {
        let role_names = self.resolver.resolve(claims).await;
        if role_names.is_empty() {
            debug!(request = %request, "no roles found for claims");
            return Decision::NoGrants;
        }

        debug!(request = %request, roles = ?role_names, "found roles for claims");

        let roles = match self.fetch_roles(&role_names).await {
            Ok(roles) => roles,
            Err(_) => return Decision::FetchFailed,
        };

        for role in &roles {
            if role.permissions.iter().any(|p| Self::entry_matches(p, request)) {
                debug!(role = %role.name, request = %request, "permission granted");
                return Decision::Allowed { grant: role.name.clone() };
            }
        }

        debug!(request = %request, "no permission entry matches");
        Decision::NoMatch
    }
}
