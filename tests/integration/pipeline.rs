//! Integration tests for the probe -> record -> evaluate pipeline stages
//!
//! These tests verify that:
//! - Probe outcomes are classified into the right service states
//! - Samples and rolling counters stay consistent over repeated checks
//! - Threshold breaches produce the expected alerts

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sentinel::engine::evaluator;
use sentinel::engine::probe::Prober;
use sentinel::engine::recorder::MetricRecorder;
use sentinel::store::{MemoryStore, MetricQuery, MonitorStore};
use sentinel::{AlertKind, AlertThresholds, HealthState};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{create_test_service, create_test_service_with_thresholds, register};

fn recorder_for(store: &Arc<MemoryStore>) -> MetricRecorder {
    let (signal_tx, _) = broadcast::channel(16);
    MetricRecorder::new(store.clone(), signal_tx)
}

#[tokio::test]
async fn test_successful_probes_accumulate_healthy_state() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service("api", &format!("{}/health", mock_server.uri())),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(5));
    let recorder = recorder_for(&store);

    let n = 4;
    for _ in 0..n {
        let outcome = prober.probe(&service.url).await;
        recorder.record(&mut service, &outcome).await.unwrap();
    }

    assert_eq!(service.status, HealthState::Healthy);
    assert_eq!(service.error_count, 0);
    assert_eq!(service.total_checks, n);
    assert_eq!(service.uptime, 100.0);

    let metrics = store
        .query_metrics(MetricQuery::since(
            service.id,
            Utc::now() - chrono::Duration::minutes(5),
        ))
        .await
        .unwrap();
    assert_eq!(metrics.len(), n as usize);
    assert!(metrics.iter().all(|m| m.uptime == 100.0 && !m.error));
}

#[tokio::test]
async fn test_http_error_status_degrades_service() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service("api", &format!("{}/health", mock_server.uri())),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(5));
    let recorder = recorder_for(&store);

    let outcome = prober.probe(&service.url).await;
    let metric = recorder.record(&mut service, &outcome).await.unwrap();

    // A received non-200 response degrades the service but is not an error
    assert_eq!(service.status, HealthState::Degraded);
    assert_eq!(service.error_count, 0);
    assert_eq!(metric.status_code, 500);
    assert_eq!(metric.uptime, 50.0);
    assert!(!metric.error);
}

#[tokio::test]
async fn test_transport_failure_records_error_sample() {
    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service("api", "http://127.0.0.1:1/health"),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(1));
    let recorder = recorder_for(&store);

    let outcome = prober.probe(&service.url).await;
    recorder.record(&mut service, &outcome).await.unwrap();

    assert_eq!(service.status, HealthState::Down);
    assert_eq!(service.error_count, 1);
    assert_eq!(service.total_checks, 1);

    let metrics = store
        .query_metrics(MetricQuery::since(
            service.id,
            Utc::now() - chrono::Duration::minutes(5),
        ))
        .await
        .unwrap();
    assert_eq!(metrics.len(), 1);
    assert!(metrics[0].error);
    assert_eq!(metrics[0].uptime, 0.0);
    assert_eq!(metrics[0].cost, 0.0);
}

#[tokio::test]
async fn test_slow_response_triggers_response_time_alert() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_string("slow"),
        )
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service_with_thresholds(
            "api",
            &format!("{}/health", mock_server.uri()),
            AlertThresholds {
                response_time: Some(0.1),
                ..Default::default()
            },
        ),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(5));
    let recorder = recorder_for(&store);

    let outcome = prober.probe(&service.url).await;
    let metric = recorder.record(&mut service, &outcome).await.unwrap();

    let alerts = evaluator::evaluate(&service, &outcome, metric.cost);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::HighResponseTime);
    assert_eq!(alerts[0].threshold, Some(0.1));
}

#[tokio::test]
async fn test_cost_derivation_from_response_size() {
    let mock_server = MockServer::start().await;
    // 1 KiB body
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1024]))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let mut service = register(
        &store,
        create_test_service("api", &format!("{}/health", mock_server.uri())),
    )
    .await;

    let prober = Prober::new(Duration::from_secs(5));
    let recorder = recorder_for(&store);

    let outcome = prober.probe(&service.url).await;
    let metric = recorder.record(&mut service, &outcome).await.unwrap();

    assert_eq!(metric.response_size, 1024);
    let expected = 0.0001 + (1024.0 / 1_073_741_824.0) * 0.10;
    assert!((metric.cost - expected).abs() < 1e-12);
}
