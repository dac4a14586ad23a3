pub mod analytics;
pub mod config;
pub mod engine;
pub mod notify;
pub mod store;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health state of a monitored service.
///
/// Derived exclusively by the metric recorder after each probe:
/// a 200 response is `Healthy`, any other received status is `Degraded`,
/// a transport failure is `Down`. Services start out `Unknown` until
/// their first check completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Down,
    Unknown,
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthState::Healthy)
    }

    /// Parse the stored string form, falling back to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "healthy" => HealthState::Healthy,
            "degraded" => HealthState::Degraded,
            "down" => HealthState::Down,
            _ => HealthState::Unknown,
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Degraded => write!(f, "degraded"),
            HealthState::Down => write!(f, "down"),
            HealthState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-service alert limits. Each dimension is independently optional;
/// an unset dimension disables that rule entirely (no default applied).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Seconds; exceeding it triggers a `high_response_time` alert.
    #[serde(default)]
    pub response_time: Option<f64>,

    /// Dollars per sample; exceeding it triggers a `high_cost` alert.
    #[serde(default)]
    pub cost: Option<f64>,

    /// Percentage (0-100); exceeding it triggers a `high_error_rate` alert.
    #[serde(default)]
    pub error_rate: Option<f64>,
}

/// A registered service under monitoring.
///
/// Rolling fields (`status`, `uptime`, `response_time`, `last_check` and the
/// two counters) are mutated in place by the metric recorder after every
/// probe. Everything else is configuration owned by the registration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub status: HealthState,
    pub last_check: Option<DateTime<Utc>>,
    pub uptime: f64,
    pub response_time: f64,
    pub error_count: u64,
    pub total_checks: u64,
    pub cost_per_request: f64,
    pub cost_per_gb_hour: f64,
    #[serde(default)]
    pub thresholds: AlertThresholds,
    pub maintenance_window: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Service {
    /// Error rate as a percentage of all checks performed so far.
    pub fn error_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            self.error_count as f64 / self.total_checks as f64 * 100.0
        }
    }
}

/// One immutable sample derived from a probe. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub service_id: i64,
    pub timestamp: DateTime<Utc>,
    pub response_time: f64,
    pub status_code: u16,
    pub error: bool,
    pub uptime: f64,
    pub cost: f64,
    pub request_size: u64,
    pub response_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighResponseTime,
    HighCost,
    HighErrorRate,
    ServiceDown,
}

impl AlertKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "high_response_time" => AlertKind::HighResponseTime,
            "high_cost" => AlertKind::HighCost,
            "high_error_rate" => AlertKind::HighErrorRate,
            _ => AlertKind::ServiceDown,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::HighResponseTime => write!(f, "high_response_time"),
            AlertKind::HighCost => write!(f, "high_cost"),
            AlertKind::HighErrorRate => write!(f, "high_error_rate"),
            AlertKind::ServiceDown => write!(f, "service_down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Severity::Low,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A threshold breach recorded by the alert evaluator.
///
/// `threshold` carries the configured limit that triggered the alert for
/// audit purposes; `service_down` alerts have none. Resolution is an
/// external operator action, so `resolved_at` starts out unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub service_id: i64,
    pub kind: AlertKind,
    pub message: String,
    pub threshold: Option<f64>,
    pub severity: Severity,
    pub triggered_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub escalation_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Resolved,
}

impl IncidentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "resolved" => IncidentStatus::Resolved,
            _ => IncidentStatus::Open,
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::Open => write!(f, "open"),
            IncidentStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// A tracked outage with an SLA target and a resolution lifecycle.
///
/// Opened by the incident manager when a service transitions into `Down`;
/// `resolved` is terminal. `actual_resolution_time` (hours) is set if and
/// only if the incident is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub service_id: i64,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sla_target: DateTime<Utc>,
    pub resolution_notes: Option<String>,
    pub actual_resolution_time: Option<f64>,
}
