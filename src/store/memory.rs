//! In-memory store (no persistence)
//!
//! Keeps every record in maps behind a `tokio::sync::RwLock`. Useful for:
//! - Testing without database dependencies
//! - Deployments that don't configure storage
//!
//! ## Limitations
//!
//! - **No persistence**: all data lost on restart
//! - **Unbounded metrics**: rely on `prune_metrics` for retention

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Alert, Incident, IncidentStatus, Metric, Service};

use super::backend::{MetricQuery, MonitorStore, SortOrder};
use super::error::{StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    services: HashMap<i64, Service>,
    next_service_id: i64,

    metrics: Vec<Metric>,

    alerts: Vec<Alert>,
    next_alert_id: i64,

    incidents: HashMap<i64, Incident>,
    next_incident_id: i64,
}

/// In-memory store
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn create_service(&self, mut service: Service) -> StoreResult<Service> {
        let mut inner = self.inner.write().await;
        inner.next_service_id += 1;
        service.id = inner.next_service_id;
        inner.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        let inner = self.inner.read().await;
        let mut services: Vec<Service> = inner.services.values().cloned().collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn get_service(&self, id: i64) -> StoreResult<Service> {
        let inner = self.inner.read().await;
        inner
            .services
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("service {id}")))
    }

    async fn update_service(&self, service: &Service) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.services.contains_key(&service.id) {
            return Err(StoreError::NotFound(format!("service {}", service.id)));
        }
        inner.services.insert(service.id, service.clone());
        Ok(())
    }

    async fn append_metric(&self, metric: Metric) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.metrics.push(metric);
        Ok(())
    }

    async fn query_metrics(&self, query: MetricQuery) -> StoreResult<Vec<Metric>> {
        let inner = self.inner.read().await;

        let mut metrics: Vec<Metric> = inner
            .metrics
            .iter()
            .filter(|m| {
                m.service_id == query.service_id
                    && m.timestamp >= query.start
                    && m.timestamp <= query.end
            })
            .cloned()
            .collect();

        metrics.sort_by_key(|m| m.timestamp);
        if query.order == SortOrder::Descending {
            metrics.reverse();
        }
        if let Some(limit) = query.limit {
            metrics.truncate(limit);
        }

        Ok(metrics)
    }

    async fn prune_metrics(&self, before: DateTime<Utc>) -> StoreResult<usize> {
        let mut inner = self.inner.write().await;
        let before_len = inner.metrics.len();
        inner.metrics.retain(|m| m.timestamp >= before);
        let deleted = before_len - inner.metrics.len();
        debug!("pruned {} metrics older than {}", deleted, before);
        Ok(deleted)
    }

    async fn append_alert(&self, mut alert: Alert) -> StoreResult<Alert> {
        let mut inner = self.inner.write().await;
        inner.next_alert_id += 1;
        alert.id = inner.next_alert_id;
        inner.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn list_alerts(&self, service_id: Option<i64>) -> StoreResult<Vec<Alert>> {
        let inner = self.inner.read().await;
        let mut alerts: Vec<Alert> = inner
            .alerts
            .iter()
            .filter(|a| service_id.is_none_or(|id| a.service_id == id))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| std::cmp::Reverse(a.triggered_at));
        Ok(alerts)
    }

    async fn create_incident(&self, mut incident: Incident) -> StoreResult<Incident> {
        let mut inner = self.inner.write().await;
        inner.next_incident_id += 1;
        incident.id = inner.next_incident_id;
        inner.incidents.insert(incident.id, incident.clone());
        Ok(incident)
    }

    async fn get_incident(&self, id: i64) -> StoreResult<Incident> {
        let inner = self.inner.read().await;
        inner
            .incidents
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("incident {id}")))
    }

    async fn find_open_incident(&self, service_id: i64) -> StoreResult<Option<Incident>> {
        let inner = self.inner.read().await;
        Ok(inner
            .incidents
            .values()
            .find(|i| i.service_id == service_id && i.status == IncidentStatus::Open)
            .cloned())
    }

    async fn update_incident(&self, incident: &Incident) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.incidents.contains_key(&incident.id) {
            return Err(StoreError::NotFound(format!("incident {}", incident.id)));
        }
        inner.incidents.insert(incident.id, incident.clone());
        Ok(())
    }

    async fn list_incidents(&self) -> StoreResult<Vec<Incident>> {
        let inner = self.inner.read().await;
        let mut incidents: Vec<Incident> = inner.incidents.values().cloned().collect();
        incidents.sort_by_key(|i| std::cmp::Reverse(i.created_at));
        Ok(incidents)
    }

    async fn count_open_incidents(&self) -> StoreResult<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .incidents
            .values()
            .filter(|i| i.status == IncidentStatus::Open)
            .count())
    }

    async fn close(&self) -> StoreResult<()> {
        debug!("closing in-memory store (no-op)");
        Ok(())
    }
}
