//! TOML configuration
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = false
//!
//! [authz]
//! policy = "role"            # or "scope"
//! enable_metrics = true
//!
//! [authz.scope]
//! mode = "any"               # or "all"
//! default_scope = "tools:basic"
//!
//! [authz.scope.mappings]
//! "groups:Engineering" = ["tools:read", "tools:write"]
//!
//! [[authz.scope.permissions]]
//! pattern = "github:*"
//! scopes = ["tools:read"]
//!
//! [[directory.proxies]]
//! name = "github"
//! url = "http://github-mcp:8080/mcp"
//!
//! [[directory.roles]]
//! name = "Admin"
//! permissions = [{ object_type = "*", proxy = "*", object_name = "*" }]
//!
//! [[directory.attribute_to_roles]]
//! attribute_key = "groups"
//! attribute_value = "Base"
//! roles = ["Admin"]
//! ```

use crate::directory::{AttributeToRoles, InMemoryDirectoryStore, ProxyConfig, Role};
use crate::engine::EngineConfig;
use crate::error::{AuthzError, Result};
use crate::policy::{PolicyKind, ScopeConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthzConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Policy settings
    #[serde(default)]
    pub authz: PolicyConfig,

    /// Directory seed data
    #[serde(default)]
    pub directory: DirectorySeed,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Policy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Strategy
    #[serde(default)]
    pub policy: PolicyKind,

    /// Scope strategy settings
    #[serde(default)]
    pub scope: ScopeConfig,

    /// Enable decision metrics
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            scope: ScopeConfig::default(),
            enable_metrics: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Entries loaded into the in-memory directory at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySeed {
    /// Registered proxies
    #[serde(default)]
    pub proxies: Vec<ProxyConfig>,

    /// Roles
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Attribute to roles mappings
    #[serde(default)]
    pub attribute_to_roles: Vec<AttributeToRoles>,
}

impl AuthzConfig {
    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| AuthzError::Config(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            policy = %config.authz.policy,
            roles = config.directory.roles.len(),
            mappings = config.directory.attribute_to_roles.len(),
            "Loaded authorization config"
        );

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(AuthzError::Config(format!(
                "unknown log level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Engine settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            policy: self.authz.policy,
            scope: self.authz.scope.clone(),
            enable_metrics: self.authz.enable_metrics,
        }
    }

    /// Seed an in-memory directory
    ///
    /// Proxies go in first, then roles, then mappings, so every write-time
    /// reference check sees its targets.
    pub async fn build_store(&self) -> Result<InMemoryDirectoryStore> {
        let store = InMemoryDirectoryStore::new();
        let seed = &self.directory;

        for proxy in &seed.proxies {
            store.set_proxy(proxy.clone()).await?;
        }
        for role in &seed.roles {
            store.set_role(role.clone()).await?;
        }
        for mapping in &seed.attribute_to_roles {
            store.set_attribute_to_roles(mapping.clone()).await?;
        }

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryStore, ObjectType};
    use crate::policy::ScopeMode;
    use std::io::Write;

    const SAMPLE: &str = r#"
[logging]
level = "debug"

[authz]
policy = "scope"

[authz.scope]
mode = "all"
default_scope = "tools:basic"

[authz.scope.mappings]
"groups:Engineering" = ["tools:read", "tools:write"]

[[authz.scope.permissions]]
pattern = "github:*"
scopes = ["tools:read"]

[[directory.proxies]]
name = "github"
url = "http://github-mcp:8080/mcp"
timeout = 30

[[directory.roles]]
name = "Admin"
permissions = [{ object_type = "*", proxy = "*", object_name = "*" }]

[[directory.roles]]
name = "GithubTools"
permissions = [{ object_type = "tools", proxy = "github", object_name = "*" }]

[[directory.attribute_to_roles]]
attribute_key = "groups"
attribute_value = "Base"
roles = ["Admin", "GithubTools"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = AuthzConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
        assert_eq!(config.authz.policy, PolicyKind::Scope);
        assert!(config.authz.enable_metrics);
        assert_eq!(config.authz.scope.mode, ScopeMode::All);
        assert_eq!(config.authz.scope.default_scope.as_deref(), Some("tools:basic"));
        assert_eq!(config.authz.scope.permissions[0].pattern, "github:*");
        assert_eq!(config.directory.proxies[0].timeout, Some(30));
        assert_eq!(config.directory.roles[1].permissions[0].object_type, ObjectType::Tools);

        let engine = config.engine_config();
        assert_eq!(engine.policy, PolicyKind::Scope);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AuthzConfig::from_toml_str("").unwrap();
        assert_eq!(config, AuthzConfig::default());
        assert_eq!(config.authz.policy, PolicyKind::Role);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AuthzConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(err, AuthzError::Config(_)));

        let err = AuthzConfig::from_toml_str("[authz]\npolicy = \"acl\"").unwrap_err();
        assert!(matches!(err, AuthzError::Toml(_)));

        let bad_role = r#"
[[directory.roles]]
name = "Bad"
permissions = [{ object_type = "prompts", proxy = "*", object_name = "*" }]
"#;
        assert!(AuthzConfig::from_toml_str(bad_role).is_err());
    }

    #[tokio::test]
    async fn test_build_store() {
        let config = AuthzConfig::from_toml_str(SAMPLE).unwrap();
        let store = config.build_store().await.unwrap();

        assert_eq!(store.list_roles().await.unwrap().len(), 2);
        let mapping = store.get_attribute_to_roles("groups", "Base").await.unwrap();
        assert_eq!(mapping.roles, vec!["Admin".to_string(), "GithubTools".to_string()]);
    }

    #[tokio::test]
    async fn test_build_store_reports_dangling_references() {
        let text = r#"
[[directory.attribute_to_roles]]
attribute_key = "groups"
attribute_value = "Base"
roles = ["Ghost"]
"#;
        let config = AuthzConfig::from_toml_str(text).unwrap();
        let err = config.build_store().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AuthzConfig::load(file.path()).unwrap();
        assert_eq!(config.directory.roles.len(), 2);

        assert!(matches!(
            AuthzConfig::load("/definitely/not/here.toml"),
            Err(AuthzError::Io(_))
        ));
    }
}
