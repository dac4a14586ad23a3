//! IncidentManager - outage tracking with SLA targets
//!
//! State machine per service: `none -> open -> resolved`. An incident opens
//! when a service transitions into `Down` and no incident is already open
//! for it; repeat down observations are evidence of the same outage, not new
//! incidents. Resolution is an externally triggered action and `resolved` is
//! terminal.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::store::{MonitorStore, StoreResult};
use crate::{Incident, IncidentStatus, Service, Severity};

/// Opens and resolves incidents against the store
pub struct IncidentManager {
    store: Arc<dyn MonitorStore>,

    /// Hours granted to resolve before the SLA target passes
    sla_hours: i64,
}

impl IncidentManager {
    pub fn new(store: Arc<dyn MonitorStore>, sla_hours: i64) -> Self {
        Self { store, sla_hours }
    }

    /// React to a down observation.
    ///
    /// Opens an incident if none is open for this service yet and returns
    /// it; returns `None` when the outage is already tracked.
    pub async fn observe_down(&self, service: &Service) -> StoreResult<Option<Incident>> {
        if let Some(existing) = self.store.find_open_incident(service.id).await? {
            debug!(
                "{}: still down, incident #{} already open",
                service.name, existing.id
            );
            return Ok(None);
        }

        let now = Utc::now();
        let incident = Incident {
            id: 0,
            service_id: service.id,
            title: format!("Service {} is down", service.name),
            description: format!(
                "Service {} at {} is not responding to health checks",
                service.name, service.url
            ),
            severity: Severity::High,
            status: IncidentStatus::Open,
            created_at: now,
            resolved_at: None,
            sla_target: now + Duration::hours(self.sla_hours),
            resolution_notes: None,
            actual_resolution_time: None,
        };

        let incident = self.store.create_incident(incident).await?;
        info!(
            "{}: opened incident #{} (SLA target {})",
            service.name, incident.id, incident.sla_target
        );

        Ok(Some(incident))
    }

    /// Resolve an incident, computing the actual resolution time in hours.
    ///
    /// Idempotent: resolving an already-resolved incident returns it
    /// unchanged. Unknown ids surface `StoreError::NotFound`.
    pub async fn resolve(&self, incident_id: i64, notes: Option<String>) -> StoreResult<Incident> {
        let mut incident = self.store.get_incident(incident_id).await?;

        if incident.status == IncidentStatus::Resolved {
            debug!("incident #{} already resolved", incident.id);
            return Ok(incident);
        }

        let now = Utc::now();
        incident.status = IncidentStatus::Resolved;
        incident.resolved_at = Some(now);
        incident.actual_resolution_time =
            Some((now - incident.created_at).num_seconds() as f64 / 3600.0);
        incident.resolution_notes = notes;

        self.store.update_incident(&incident).await?;
        info!(
            "incident #{} resolved after {:.2}h",
            incident.id,
            incident.actual_resolution_time.unwrap_or_default()
        );

        Ok(incident)
    }
}
