//! Integration tests for the scheduler-driven check rounds
//!
//! These tests drive full rounds through `SchedulerHandle` and verify
//! per-service independence, alert persistence, incident de-duplication and
//! health-signal emission end to end.

use std::sync::Arc;

use chrono::Utc;
use sentinel::config::{IncidentConfig, SchedulerConfig};
use sentinel::engine::scheduler::SchedulerHandle;
use sentinel::notify::Notifier;
use sentinel::store::{MemoryStore, MetricQuery, MonitorStore};
use sentinel::{AlertKind, AlertThresholds, HealthState};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{create_test_service, create_test_service_with_thresholds, register};

fn spawn(store: Arc<MemoryStore>) -> (SchedulerHandle, broadcast::Receiver<sentinel::engine::messages::HealthSignal>) {
    let (signal_tx, signal_rx) = broadcast::channel(64);
    let handle = SchedulerHandle::spawn(
        store,
        SchedulerConfig {
            interval: 3600, // ticks only on demand in tests
            timeout: 2,
        },
        IncidentConfig { sla_hours: 4 },
        Notifier::disabled(),
        signal_tx,
    );
    (handle, signal_rx)
}

#[tokio::test]
async fn test_round_emits_health_signals() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    register(
        &store,
        create_test_service("api", &format!("{}/health", mock_server.uri())),
    )
    .await;

    let (handle, mut signal_rx) = spawn(store.clone());
    handle.tick_now().await.unwrap();

    let signal = signal_rx.recv().await.unwrap();
    assert_eq!(signal.service_name, "api");
    assert!(signal.healthy);
    assert!(signal.cost > 0.0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_mixed_fleet_checked_independently() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let healthy = register(
        &store,
        create_test_service("healthy", &format!("{}/ok", mock_server.uri())),
    )
    .await;
    let degraded = register(
        &store,
        create_test_service("degraded", &format!("{}/broken", mock_server.uri())),
    )
    .await;
    let unreachable = register(
        &store,
        create_test_service("unreachable", "http://127.0.0.1:1/health"),
    )
    .await;

    let (handle, _signal_rx) = spawn(store.clone());
    handle.tick_now().await.unwrap();

    assert_eq!(
        store.get_service(healthy.id).await.unwrap().status,
        HealthState::Healthy
    );
    assert_eq!(
        store.get_service(degraded.id).await.unwrap().status,
        HealthState::Degraded
    );
    assert_eq!(
        store.get_service(unreachable.id).await.unwrap().status,
        HealthState::Down
    );

    // Every service got exactly one sample this round
    for id in [healthy.id, degraded.id, unreachable.id] {
        let metrics = store
            .query_metrics(MetricQuery::since(
                id,
                Utc::now() - chrono::Duration::minutes(5),
            ))
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
    }

    handle.shutdown().await;
}

#[tokio::test]
async fn test_down_service_gets_alert_and_incident_once() {
    let store = Arc::new(MemoryStore::new());
    let service = register(
        &store,
        create_test_service("dead", "http://127.0.0.1:1/health"),
    )
    .await;

    let (handle, _signal_rx) = spawn(store.clone());

    // Three consecutive rounds against a dead endpoint
    for _ in 0..3 {
        handle.tick_now().await.unwrap();
    }

    let stored = store.get_service(service.id).await.unwrap();
    assert_eq!(stored.status, HealthState::Down);
    assert_eq!(stored.error_count, 3);
    assert_eq!(stored.total_checks, 3);

    // One open incident despite three down observations
    assert_eq!(store.count_open_incidents().await.unwrap(), 1);

    // The outage marker alert was recorded exactly once, alongside opening
    let alerts = store.list_alerts(Some(service.id)).await.unwrap();
    let down_alerts: Vec<_> = alerts
        .iter()
        .filter(|a| a.kind == AlertKind::ServiceDown)
        .collect();
    assert_eq!(down_alerts.len(), 1);
    assert_eq!(down_alerts[0].threshold, None);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_threshold_alerts_are_persisted() {
    let mock_server = MockServer::start().await;
    // Big body pushes the derived cost over the configured limit
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let mut service = create_test_service_with_thresholds(
        "pricy",
        &format!("{}/health", mock_server.uri()),
        AlertThresholds {
            cost: Some(0.00005),
            ..Default::default()
        },
    );
    service.cost_per_request = 0.0001;
    let service = register(&store, service).await;

    let (handle, _signal_rx) = spawn(store.clone());
    handle.tick_now().await.unwrap();

    let alerts = store.list_alerts(Some(service.id)).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::HighCost);
    assert_eq!(alerts[0].threshold, Some(0.00005));

    handle.shutdown().await;
}
