//! Permission decider
//!
//! The single entry point the gateway calls once per protected action. The
//! configured [`PermissionPolicy`] is fixed at construction; every internal
//! failure collapses into a denial.

pub mod metrics;

pub use metrics::{EngineMetrics, MetricsCollector};

use crate::claims::ClaimSet;
use crate::directory::DirectoryStore;
use crate::error::Result;
use crate::policy::{
    AuthorizationRequest, PermissionPolicy, PolicyKind, RoleObjectMatch, ScopeConfig, ScopeSetMatch,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Decider configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Policy strategy
    pub policy: PolicyKind,

    /// Scope strategy settings (ignored in role mode)
    pub scope: ScopeConfig,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Role,
            scope: ScopeConfig::default(),
            enable_metrics: true,
        }
    }
}

/// Top-level authorization decision
///
/// Holds no per-call state and may be shared freely across concurrent
/// requests.
#[derive(Clone)]
pub struct PermissionDecider {
    policy: Arc<dyn PermissionPolicy>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl PermissionDecider {
    /// Build a decider for the configured strategy
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Config`](crate::AuthzError::Config) when the scope
    /// settings are invalid.
    pub fn new(config: EngineConfig, store: Arc<dyn DirectoryStore>) -> Result<Self> {
        let policy: Arc<dyn PermissionPolicy> = match config.policy {
            PolicyKind::Role => Arc::new(RoleObjectMatch::new(store)),
            PolicyKind::Scope => Arc::new(ScopeSetMatch::new(config.scope)?),
        };

        let metrics = config.enable_metrics.then(|| Arc::new(MetricsCollector::new()));

        info!(
            "PermissionDecider initialized with policy={}, metrics={}",
            config.policy, config.enable_metrics
        );

        Ok(Self { policy, metrics })
    }

    /// Strategy in use
    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Metrics collector, when enabled
    pub fn metrics(&self) -> Option<Arc<MetricsCollector>> {
        self.metrics.clone()
    }

    /// Whether `claims` may perform `object_type` on `object_name` behind `source_id`
    ///
    /// Denies when claims resolve to nothing, when any referenced role cannot
    /// be fetched, and when no permission matches. Callers cannot tell these
    /// cases apart; the cause is only logged.
    pub async fn verify_permissions(
        &self,
        claims: &ClaimSet,
        object_type: &str,
        source_id: &str,
        object_name: &str,
    ) -> bool {
        let request = AuthorizationRequest::new(object_type, source_id, object_name);
        self.verify_request(claims, &request).await
    }

    /// [`verify_permissions`](Self::verify_permissions) for a prebuilt request
    pub async fn verify_request(&self, claims: &ClaimSet, request: &AuthorizationRequest) -> bool {
        let start = Instant::now();

        debug!(request = %request, claims = claims.len(), "verifying permissions");
        let decision = self.policy.evaluate(claims, request).await;
        debug!(request = %request, decision = ?decision, "decision reached");

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(&decision, start.elapsed()).await;
        }

        decision.is_allowed()
    }
}
