//! Fleet-wide dashboard statistics

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::HealthState;
use crate::store::{MetricQuery, MonitorStore, StoreResult};

/// Point-in-time overview of the whole fleet
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_services: usize,
    pub healthy_services: usize,
    pub degraded_services: usize,
    pub down_services: usize,
    pub open_incidents: usize,
    /// Mean response time over the trailing hour, rounded to milliseconds
    pub avg_response_time: f64,
    pub timestamp: DateTime<Utc>,
}

/// Compute current fleet statistics.
///
/// Counts services per state, open incidents, and the mean response time of
/// every sample recorded in the trailing hour across all services.
pub async fn dashboard_stats(store: &dyn MonitorStore) -> StoreResult<DashboardStats> {
    let services = store.list_services().await?;
    let one_hour_ago = Utc::now() - Duration::hours(1);

    let mut sum = 0.0;
    let mut count = 0usize;
    for service in &services {
        let metrics = store
            .query_metrics(MetricQuery::since(service.id, one_hour_ago))
            .await?;
        sum += metrics.iter().map(|m| m.response_time).sum::<f64>();
        count += metrics.len();
    }

    let avg_response_time = if count == 0 { 0.0 } else { sum / count as f64 };

    Ok(DashboardStats {
        total_services: services.len(),
        healthy_services: count_state(&services, HealthState::Healthy),
        degraded_services: count_state(&services, HealthState::Degraded),
        down_services: count_state(&services, HealthState::Down),
        open_incidents: store.count_open_incidents().await?,
        avg_response_time: (avg_response_time * 1000.0).round() / 1000.0,
        timestamp: Utc::now(),
    })
}

fn count_state(services: &[crate::Service], state: HealthState) -> usize {
    services.iter().filter(|s| s.status == state).count()
}
