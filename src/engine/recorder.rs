//! MetricRecorder - turns probe outcomes into samples and service state
//!
//! This is the single place service state transitions happen; no other
//! component mutates `Service.status` or the rolling counters.
//!
//! Per probe it:
//! 1. derives the new health state and uptime class from the outcome
//! 2. computes the derived cost of the sample
//! 3. updates the service's rolling fields and counters in place
//! 4. appends the immutable `Metric` and persists the service
//! 5. publishes a `HealthSignal` for external observability sinks

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::store::MonitorStore;
use crate::{HealthState, Metric, Service};

use super::messages::{HealthSignal, ProbeOutcome};

/// Bytes per gigabyte for the data-transfer cost term
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Derive health state and uptime class from a probe outcome.
///
/// - transport error -> `Down`, 0.0
/// - status 200 -> `Healthy`, 100.0
/// - any other received status -> `Degraded`, 50.0
pub fn classify_outcome(outcome: &ProbeOutcome) -> (HealthState, f64) {
    if outcome.error {
        (HealthState::Down, 0.0)
    } else if outcome.status_code == 200 {
        (HealthState::Healthy, 100.0)
    } else {
        (HealthState::Degraded, 50.0)
    }
}

/// Derived cost of one sample.
///
/// `cost_per_request` plus the data-transfer term; a failed probe received
/// no response and costs nothing.
pub fn sample_cost(service: &Service, outcome: &ProbeOutcome) -> f64 {
    if outcome.error {
        0.0
    } else {
        service.cost_per_request
            + (outcome.response_size as f64 / BYTES_PER_GB) * service.cost_per_gb_hour
    }
}

/// Records probe outcomes against the store
pub struct MetricRecorder {
    store: Arc<dyn MonitorStore>,
    signal_tx: broadcast::Sender<HealthSignal>,
}

impl MetricRecorder {
    pub fn new(store: Arc<dyn MonitorStore>, signal_tx: broadcast::Sender<HealthSignal>) -> Self {
        Self { store, signal_tx }
    }

    /// Record one outcome: mutate the service in place, persist the sample
    /// and the service, and emit the health signal.
    pub async fn record(&self, service: &mut Service, outcome: &ProbeOutcome) -> Result<Metric> {
        let now = Utc::now();
        let (state, uptime) = classify_outcome(outcome);
        let cost = sample_cost(service, outcome);

        if outcome.error {
            service.error_count += 1;
        }
        service.total_checks += 1;
        service.status = state;
        service.uptime = uptime;
        service.response_time = outcome.elapsed;
        service.last_check = Some(now);

        trace!(
            "{}: state={} uptime={} cost={:.6}",
            service.name, state, uptime, cost
        );

        let metric = Metric {
            service_id: service.id,
            timestamp: now,
            response_time: outcome.elapsed,
            status_code: outcome.status_code,
            error: outcome.error,
            uptime,
            cost,
            request_size: 0,
            response_size: outcome.response_size,
        };

        self.store
            .append_metric(metric.clone())
            .await
            .with_context(|| format!("failed to append metric for {}", service.name))?;

        self.store
            .update_service(service)
            .await
            .with_context(|| format!("failed to update service {}", service.name))?;

        // Nobody listening is fine; signals are re-emitted on every check.
        let _ = self.signal_tx.send(HealthSignal {
            service_id: service.id,
            service_name: service.name.clone(),
            healthy: state.is_healthy(),
            state,
            cost,
            timestamp: now,
        });

        Ok(metric)
    }
}
