use std::path::PathBuf;

use chrono::Utc;
use tracing::trace;

use crate::notify::WebhookConfig;
use crate::{AlertThresholds, HealthState, Service};

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,

        /// Retention period in days (metrics older than this are deleted)
        #[serde(default = "default_retention_days")]
        retention_days: u32,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./sentinel.db")
}

fn default_retention_days() -> u32 {
    30
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub services: Option<Vec<ServiceConfig>>,

    /// Scheduler tuning (optional - defaults apply)
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Storage configuration (optional - defaults to in-memory)
    pub storage: Option<StorageConfig>,

    /// Incident/SLA tuning (optional - defaults apply)
    #[serde(default)]
    pub incidents: IncidentConfig,

    /// Webhook receiving alert and incident creation events
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between check rounds
    #[serde(default = "crate::util::get_default_interval")]
    pub interval: u64,

    /// Per-probe timeout in seconds
    #[serde(default = "crate::util::get_default_timeout")]
    pub timeout: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: crate::util::get_default_interval(),
            timeout: crate::util::get_default_timeout(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct IncidentConfig {
    /// Hours granted to resolve an incident before its SLA target passes
    #[serde(default = "crate::util::get_default_sla_hours")]
    pub sla_hours: i64,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            sla_hours: crate::util::get_default_sla_hours(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub cost_per_request: f64,
    #[serde(default)]
    pub cost_per_gb_hour: f64,
    #[serde(default)]
    pub thresholds: AlertThresholds,
    pub maintenance_window: Option<String>,
}

impl ServiceConfig {
    /// Turn a config entry into an unregistered service record.
    ///
    /// The id is assigned by the store on registration.
    pub fn into_service(self) -> Service {
        Service {
            id: 0,
            name: self.name,
            url: self.url,
            status: HealthState::Unknown,
            last_check: None,
            uptime: 0.0,
            response_time: 0.0,
            error_count: 0,
            total_checks: 0,
            cost_per_request: self.cost_per_request,
            cost_per_gb_hour: self.cost_per_gb_hour,
            thresholds: self.thresholds,
            maintenance_window: self.maintenance_window,
            created_at: Utc::now(),
        }
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config: &Config| trace!("loaded config: {config:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let raw = serde_json::json!({
            "services": [
                {
                    "name": "auth-api",
                    "url": "https://auth.example.com/health",
                    "cost_per_request": 0.0001,
                    "cost_per_gb_hour": 0.15,
                    "thresholds": { "response_time": 2.0, "cost": 0.001, "error_rate": 5.0 },
                    "maintenance_window": "Sun 2:00-4:00 UTC"
                }
            ],
            "scheduler": { "interval": 15, "timeout": 5 },
            "storage": { "backend": "sqlite", "path": "./test.db", "retention_days": 7 },
            "incidents": { "sla_hours": 2 },
            "webhook": { "url": "https://hooks.example.com/sentinel" }
        });

        let config: Config = serde_json::from_value(raw).unwrap();

        let services = config.services.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].thresholds.response_time, Some(2.0));
        assert_eq!(config.scheduler.interval, 15);
        assert_eq!(config.incidents.sla_hours, 2);
        assert!(matches!(
            config.storage,
            Some(StorageConfig::Sqlite { retention_days: 7, .. })
        ));
        assert!(config.webhook.is_some());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert!(config.services.is_none());
        assert_eq!(config.scheduler.interval, 30);
        assert_eq!(config.scheduler.timeout, 10);
        assert_eq!(config.incidents.sla_hours, 4);
        assert!(config.webhook.is_none());
    }

    #[test]
    fn test_service_config_into_service() {
        let service_config = ServiceConfig {
            name: "payments".to_string(),
            url: "https://pay.example.com/health".to_string(),
            cost_per_request: 0.0005,
            cost_per_gb_hour: 0.2,
            thresholds: AlertThresholds {
                response_time: Some(3.0),
                ..Default::default()
            },
            maintenance_window: None,
        };

        let service = service_config.into_service();

        assert_eq!(service.status, HealthState::Unknown);
        assert_eq!(service.total_checks, 0);
        assert_eq!(service.error_count, 0);
        assert!(service.last_check.is_none());
        assert_eq!(service.thresholds.response_time, Some(3.0));
        assert_eq!(service.thresholds.cost, None);
    }
}
