//! Decision metrics with Prometheus text export

use crate::policy::Decision;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Engine decision counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineMetrics {
    /// Total number of authorization checks
    pub total_requests: u64,

    /// Number of allowed decisions
    pub allowed_decisions: u64,

    /// Number of denied decisions
    pub denied_decisions: u64,

    /// Denials because claims resolved to nothing
    pub no_grant_denials: u64,

    /// Denials because a referenced role could not be fetched
    pub role_fetch_failures: u64,

    /// Average latency
    pub avg_latency_ms: f64,
}

impl EngineMetrics {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}

/// Metrics collector shared across concurrent checks
pub struct MetricsCollector {
    metrics: Arc<RwLock<EngineMetrics>>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(EngineMetrics::default())),
        }
    }

    /// Record one decision and its latency
    pub async fn record_decision(&self, decision: &Decision, latency: Duration) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;

        match decision {
            Decision::Allowed { .. } => metrics.allowed_decisions += 1,
            Decision::NoGrants => {
                metrics.denied_decisions += 1;
                metrics.no_grant_denials += 1;
            }
            Decision::FetchFailed => {
                metrics.denied_decisions += 1;
                metrics.role_fetch_failures += 1;
            }
            Decision::NoMatch => metrics.denied_decisions += 1,
        }

        // running mean
        let latency_ms = latency.as_secs_f64() * 1000.0;
        let n = metrics.total_requests as f64;
        metrics.avg_latency_ms += (latency_ms - metrics.avg_latency_ms) / n;
    }

    /// Get current metrics snapshot
    pub async fn get_metrics(&self) -> EngineMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        let mut metrics = self.metrics.write().await;
        *metrics = EngineMetrics::default();
    }

    /// Export metrics in Prometheus format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read().await;

        format!(
            r#"# HELP mcp_gateway_authz_requests_total Total number of authorization checks
# TYPE mcp_gateway_authz_requests_total counter
mcp_gateway_authz_requests_total {}

# HELP mcp_gateway_authz_allowed_total Number of allowed decisions
# TYPE mcp_gateway_authz_allowed_total counter
mcp_gateway_authz_allowed_total {}

# HELP mcp_gateway_authz_denied_total Number of denied decisions
# TYPE mcp_gateway_authz_denied_total counter
mcp_gateway_authz_denied_total {}

# HELP mcp_gateway_authz_no_grant_total Denials with no resolved roles or scopes
# TYPE mcp_gateway_authz_no_grant_total counter
mcp_gateway_authz_no_grant_total {}

# HELP mcp_gateway_authz_role_fetch_failures_total Denials caused by role fetch failures
# TYPE mcp_gateway_authz_role_fetch_failures_total counter
mcp_gateway_authz_role_fetch_failures_total {}

# HELP mcp_gateway_authz_latency_seconds_avg Average decision latency
# TYPE mcp_gateway_authz_latency_seconds_avg gauge
mcp_gateway_authz_latency_seconds_avg {}
"#,
            metrics.total_requests,
            metrics.allowed_decisions,
            metrics.denied_decisions,
            metrics.no_grant_denials,
            metrics.role_fetch_failures,
            metrics.avg_latency_ms / 1000.0,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_decisions() {
        let collector = MetricsCollector::new();

        collector
            .record_decision(&Decision::Allowed { grant: "Admin".into() }, Duration::from_millis(2))
            .await;
        collector.record_decision(&Decision::NoGrants, Duration::from_millis(4)).await;
        collector.record_decision(&Decision::FetchFailed, Duration::from_millis(6)).await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.allowed_decisions, 1);
        assert_eq!(metrics.denied_decisions, 2);
        assert_eq!(metrics.no_grant_denials, 1);
        assert_eq!(metrics.role_fetch_failures, 1);
        assert!((metrics.avg_latency_ms - 4.0).abs() < 1e-9);
        assert!((metrics.allow_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_prometheus_export_and_reset() {
        let collector = MetricsCollector::new();
        collector.record_decision(&Decision::NoMatch, Duration::from_millis(1)).await;

        let text = collector.export_prometheus().await;
        assert!(text.contains("mcp_gateway_authz_requests_total 1"));
        assert!(text.contains("mcp_gateway_authz_denied_total 1"));

        collector.reset().await;
        assert_eq!(collector.get_metrics().await, EngineMetrics::default());
    }
}
