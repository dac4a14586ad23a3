//! Alert evaluation - compares a fresh sample against configured thresholds
//!
//! Evaluation is a pure function of the service's thresholds and the
//! just-recorded sample; it never reads history and keeps no state, so
//! evaluating the same inputs twice yields the same alert set. Each rule is
//! independently triggerable - a single check can emit up to three alerts.
//! A dimension with no configured threshold is skipped entirely.

use chrono::Utc;

use crate::{Alert, AlertKind, Service, Severity};

use super::messages::ProbeOutcome;

/// Evaluate a recorded sample against the service's thresholds.
///
/// Expects the service's counters to be updated for this sample already
/// (the error-rate rule uses them). Every returned alert carries the
/// triggering threshold for audit purposes.
pub fn evaluate(service: &Service, outcome: &ProbeOutcome, cost: f64) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(limit) = service.thresholds.response_time
        && outcome.elapsed > limit
    {
        alerts.push(new_alert(
            service,
            AlertKind::HighResponseTime,
            Severity::Medium,
            Some(limit),
            format!(
                "Response time {:.1}s exceeded threshold {:.1}s",
                outcome.elapsed, limit
            ),
        ));
    }

    if let Some(limit) = service.thresholds.cost
        && cost > limit
    {
        alerts.push(new_alert(
            service,
            AlertKind::HighCost,
            Severity::High,
            Some(limit),
            format!("Cost ${:.4} exceeded threshold ${:.4}", cost, limit),
        ));
    }

    if let Some(limit) = service.thresholds.error_rate {
        let rate = service.error_rate();
        if rate > limit {
            alerts.push(new_alert(
                service,
                AlertKind::HighErrorRate,
                Severity::High,
                Some(limit),
                format!("Error rate {:.1}% exceeded threshold {:.1}%", rate, limit),
            ));
        }
    }

    alerts
}

/// The alert recorded when an incident is opened for a down service.
pub fn service_down_alert(service: &Service) -> Alert {
    new_alert(
        service,
        AlertKind::ServiceDown,
        Severity::High,
        None,
        "Service is not responding to health checks".to_string(),
    )
}

fn new_alert(
    service: &Service,
    kind: AlertKind,
    severity: Severity,
    threshold: Option<f64>,
    message: String,
) -> Alert {
    Alert {
        id: 0,
        service_id: service.id,
        kind,
        message,
        threshold,
        severity,
        triggered_at: Utc::now(),
        resolved_at: None,
        escalation_level: 0,
    }
}
