//! Helper functions for integration tests

use chrono::Utc;
use sentinel::store::{MemoryStore, MonitorStore};
use sentinel::{AlertThresholds, HealthState, Service};
use std::sync::Arc;

pub fn create_test_service(name: &str, url: &str) -> Service {
    Service {
        id: 0,
        name: name.to_string(),
        url: url.to_string(),
        status: HealthState::Unknown,
        last_check: None,
        uptime: 0.0,
        response_time: 0.0,
        error_count: 0,
        total_checks: 0,
        cost_per_request: 0.0001,
        cost_per_gb_hour: 0.10,
        thresholds: AlertThresholds::default(),
        maintenance_window: None,
        created_at: Utc::now(),
    }
}

pub fn create_test_service_with_thresholds(
    name: &str,
    url: &str,
    thresholds: AlertThresholds,
) -> Service {
    let mut service = create_test_service(name, url);
    service.thresholds = thresholds;
    service
}

/// Register a service in a fresh in-memory store.
pub async fn register(store: &Arc<MemoryStore>, service: Service) -> Service {
    store.create_service(service).await.unwrap()
}
