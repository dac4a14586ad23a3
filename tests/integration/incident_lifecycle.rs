//! Integration tests for the incident lifecycle
//!
//! A service transitioning into `down` opens exactly one incident; repeat
//! down observations attach to the open incident instead of duplicating it;
//! resolution is external and terminal.

use std::sync::Arc;
use std::time::Duration;

use sentinel::engine::incident::IncidentManager;
use sentinel::engine::probe::Prober;
use sentinel::engine::recorder::MetricRecorder;
use sentinel::store::{MemoryStore, MonitorStore};
use sentinel::{HealthState, IncidentStatus};
use tokio::sync::broadcast;

use crate::helpers::{create_test_service, register};

#[tokio::test]
async fn test_healthy_to_down_opens_exactly_one_incident() {
    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service("flaky", "http://127.0.0.1:1/health"),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(1));
    let (signal_tx, _) = broadcast::channel(16);
    let recorder = MetricRecorder::new(store.clone(), signal_tx);
    let incidents = IncidentManager::new(store.clone(), 4);

    // Two consecutive failing checks
    for _ in 0..2 {
        let outcome = prober.probe(&service.url).await;
        recorder.record(&mut service, &outcome).await.unwrap();

        if service.status == HealthState::Down {
            incidents.observe_down(&service).await.unwrap();
        }
    }

    let open = store.find_open_incident(service.id).await.unwrap();
    let incident = open.expect("one incident should be open");
    assert_eq!(incident.status, IncidentStatus::Open);
    assert!(incident.sla_target > incident.created_at);

    // De-duplication: the second observation did not create another one
    assert_eq!(store.list_incidents().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_external_resolution_completes_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service("flaky", "http://127.0.0.1:1/health"),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(1));
    let (signal_tx, _) = broadcast::channel(16);
    let recorder = MetricRecorder::new(store.clone(), signal_tx);
    let incidents = IncidentManager::new(store.clone(), 4);

    let outcome = prober.probe(&service.url).await;
    recorder.record(&mut service, &outcome).await.unwrap();
    let incident = incidents
        .observe_down(&service)
        .await
        .unwrap()
        .expect("incident opens on first down");

    let resolved = incidents
        .resolve(incident.id, Some("network fixed".to_string()))
        .await
        .unwrap();

    assert_eq!(resolved.status, IncidentStatus::Resolved);
    assert!(resolved.resolved_at.is_some());
    assert!(resolved.actual_resolution_time.unwrap() >= 0.0);

    // Nothing open anymore; the next outage would start a new incident
    assert!(store.find_open_incident(service.id).await.unwrap().is_none());
}
