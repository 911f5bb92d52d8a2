//! Flat scope matching policy
//!
//! Claims are flattened to `<claim key>:<claim value>` strings and mapped to
//! scopes; the action identifier (`<source>:<object name>`) selects the
//! required scopes through exact or glob patterns.

use super::{AuthorizationRequest, Decision, PermissionPolicy, PolicyKind};
use crate::claims::ClaimSet;
use crate::error::{AuthzError, Result};
use crate::matcher::GlobPattern;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// How user scopes are combined against required scopes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// At least one required scope (OR)
    #[default]
    Any,
    /// Every required scope (AND)
    All,
}

/// Required scopes for actions matching `pattern`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePermission {
    /// Exact action identifier or glob (`github:*`, `*`)
    pub pattern: String,

    /// Scopes required by matching actions
    pub scopes: Vec<String>,
}

impl ScopePermission {
    /// Create a new permission rule
    pub fn new(pattern: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            pattern: pattern.into(),
            scopes,
        }
    }
}

/// Scope mode configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// ANY / ALL combination
    #[serde(default)]
    pub mode: ScopeMode,

    /// Grant for actions that require no scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<String>,

    /// Flattened claim (`key:value`) to scopes
    #[serde(default)]
    pub mappings: HashMap<String, Vec<String>>,

    /// Ordered action patterns
    #[serde(default)]
    pub permissions: Vec<ScopePermission>,
}

#[derive(Debug, Clone)]
struct CompiledPermission {
    pattern: String,
    glob: Option<GlobPattern>,
    scopes: Vec<String>,
}

/// Claims → scopes, compared against the scopes an action requires
#[derive(Debug, Clone)]
pub struct ScopeSetMatch {
    mode: ScopeMode,
    default_scope: Option<String>,
    mappings: HashMap<String, Vec<String>>,
    permissions: Vec<CompiledPermission>,
}

impl ScopeSetMatch {
    /// Build the policy, compiling permission globs
    ///
    /// An invalid glob is kept but never matches.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Config`] for an empty pattern or an empty mapping key.
    pub fn new(config: ScopeConfig) -> Result<Self> {
        if let Some(key) = config.mappings.keys().find(|k| k.is_empty()) {
            return Err(AuthzError::Config(format!("empty scope mapping key: {:?}", key)));
        }

        let mut permissions = Vec::with_capacity(config.permissions.len());
        for permission in config.permissions {
            if permission.pattern.is_empty() {
                return Err(AuthzError::Config("scope permission pattern cannot be empty".to_string()));
            }

            let glob = match GlobPattern::new(&permission.pattern) {
                Ok(glob) => Some(glob),
                Err(e) => {
                    warn!(pattern = %permission.pattern, error = %e, "invalid scope pattern, it will never match");
                    None
                }
            };

            permissions.push(CompiledPermission {
                pattern: permission.pattern,
                glob,
                scopes: permission.scopes,
            });
        }

        Ok(Self {
            mode: config.mode,
            default_scope: config.default_scope,
            mappings: config.mappings,
            permissions,
        })
    }

    /// Scopes required by `action_id`
    ///
    /// An exact pattern wins over any glob; among globs, the first declared
    /// match wins.
    pub fn required_scopes(&self, action_id: &str) -> &[String] {
        let direct = self.permissions.iter().find(|p| p.pattern == action_id);
        let found = direct.or_else(|| {
            self.permissions
                .iter()
                .find(|p| p.glob.as_ref().is_some_and(|g| g.is_match(action_id)))
        });

        found.map(|p| p.scopes.as_slice()).unwrap_or(&[])
    }

    /// Scopes granted by `claims`
    pub fn user_scopes(&self, claims: &ClaimSet) -> BTreeSet<String> {
        let mut scopes = BTreeSet::new();
        for (key, value) in claims.attribute_pairs() {
            let flattened = format!("{}:{}", key, value);
            if let Some(granted) = self.mappings.get(&flattened) {
                scopes.extend(granted.iter().cloned());
            }
        }
        scopes
    }

    fn combine(&self, user: &BTreeSet<String>, required: &[String]) -> Option<String> {
        match self.mode {
            ScopeMode::Any => required.iter().find(|s| user.contains(*s)).cloned(),
            ScopeMode::All => required
                .iter()
                .all(|s| user.contains(s))
                .then(|| required.join(",")),
        }
    }
}

#[async_trait]
impl PermissionPolicy for ScopeSetMatch {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Scope
    }

    async fn evaluate(&self, claims: &ClaimSet, request: &AuthorizationRequest) -> Decision {
        let action_id = request.action_id();
        let required = self.required_scopes(&action_id);

        if required.is_empty() {
            return match &self.default_scope {
                Some(default_scope) => {
                    debug!(action = %action_id, scope = %default_scope, "no required scopes, default scope applies");
                    Decision::Allowed { grant: default_scope.clone() }
                }
                None => {
                    debug!(action = %action_id, "no required scopes and no default scope");
                    Decision::NoMatch
                }
            };
        }

        let user = self.user_scopes(claims);
        if user.is_empty() {
            debug!(action = %action_id, "no scopes found for claims");
            return Decision::NoGrants;
        }

        debug!(action = %action_id, required = ?required, user = ?user, mode = ?self.mode, "checking scopes");

        match self.combine(&user, required) {
            Some(grant) => Decision::Allowed { grant },
            None => Decision::NoMatch,
        }
    }
}
