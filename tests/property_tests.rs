//! Property-based tests for engine invariants using proptest
//!
//! These tests verify that certain properties hold for all inputs:
//! - Outcome classification always lands in one of the three uptime classes
//! - Derived cost is never negative and never charged for failed probes
//! - Forecast confidence bands always bracket the forecast
//! - The efficiency score is monotonically non-increasing in cost

use chrono::Utc;
use proptest::prelude::*;
use sentinel::analytics::{CostThresholds, CostTrend, classify_trend};
use sentinel::engine::messages::ProbeOutcome;
use sentinel::engine::recorder::{classify_outcome, sample_cost};
use sentinel::{AlertThresholds, HealthState, Service};

fn service_with_costs(cost_per_request: f64, cost_per_gb_hour: f64) -> Service {
    Service {
        id: 1,
        name: "prop".to_string(),
        url: "http://prop.example.com/health".to_string(),
        status: HealthState::Unknown,
        last_check: None,
        uptime: 0.0,
        response_time: 0.0,
        error_count: 0,
        total_checks: 0,
        cost_per_request,
        cost_per_gb_hour,
        thresholds: AlertThresholds::default(),
        maintenance_window: None,
        created_at: Utc::now(),
    }
}

// Property: classification always yields a matching (state, uptime) pair
proptest! {
    #[test]
    fn prop_classification_uptime_classes(
        status_code in 0u16..600,
        error in any::<bool>(),
    ) {
        let outcome = ProbeOutcome {
            elapsed: 0.1,
            status_code,
            error,
            response_size: 0,
        };

        let (state, uptime) = classify_outcome(&outcome);

        match state {
            HealthState::Healthy => prop_assert_eq!(uptime, 100.0),
            HealthState::Degraded => prop_assert_eq!(uptime, 50.0),
            HealthState::Down => prop_assert_eq!(uptime, 0.0),
            HealthState::Unknown => prop_assert!(false, "classification never yields Unknown"),
        }

        if error {
            prop_assert_eq!(state, HealthState::Down);
        } else if status_code == 200 {
            prop_assert_eq!(state, HealthState::Healthy);
        } else {
            prop_assert_eq!(state, HealthState::Degraded);
        }
    }
}

// Property: cost is non-negative, zero for failed probes, and at least the
// per-request coefficient otherwise
proptest! {
    #[test]
    fn prop_cost_bounds(
        cost_per_request in 0.0f64..0.01,
        cost_per_gb_hour in 0.0f64..1.0,
        response_size in 0u64..100_000_000,
        error in any::<bool>(),
    ) {
        let service = service_with_costs(cost_per_request, cost_per_gb_hour);
        let outcome = ProbeOutcome {
            elapsed: 0.1,
            status_code: if error { 0 } else { 200 },
            error,
            response_size,
        };

        let cost = sample_cost(&service, &outcome);

        prop_assert!(cost >= 0.0);
        if error {
            prop_assert_eq!(cost, 0.0);
        } else {
            prop_assert!(cost >= cost_per_request);
        }
    }
}

// Property: a uniformly scaled series never changes trend class
proptest! {
    #[test]
    fn prop_trend_scale_invariant(
        daily in proptest::collection::vec(0.01f64..100.0, 7..30),
        scale in 0.1f64..10.0,
    ) {
        // Keep clear of the 1.10/0.90 boundaries where rounding could
        // legitimately flip the class
        let first: f64 = daily[..7].iter().sum::<f64>() / 7.0;
        let last: f64 = daily[daily.len() - 7..].iter().sum::<f64>() / 7.0;
        let ratio = last / first;
        prop_assume!((ratio - 1.10).abs() > 1e-6 && (ratio - 0.90).abs() > 1e-6);

        let scaled: Vec<f64> = daily.iter().map(|c| c * scale).collect();

        prop_assert_eq!(classify_trend(&daily), classify_trend(&scaled));
    }
}

// Property: fewer than seven daily values is always stable
proptest! {
    #[test]
    fn prop_sparse_series_is_stable(
        daily in proptest::collection::vec(0.0f64..100.0, 0..7),
    ) {
        prop_assert_eq!(classify_trend(&daily), CostTrend::Stable);
    }
}

// Property: the efficiency score never increases as cost grows
proptest! {
    #[test]
    fn prop_efficiency_score_monotonic(
        a in 0.0f64..0.01,
        b in 0.0f64..0.01,
    ) {
        let thresholds = CostThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(thresholds.efficiency_score(lo) >= thresholds.efficiency_score(hi));
    }
}

// Property: the score only takes the four band values
proptest! {
    #[test]
    fn prop_efficiency_score_banded(avg in 0.0f64..1.0) {
        let score = CostThresholds::default().efficiency_score(avg);
        prop_assert!(matches!(score, 25 | 50 | 75 | 100));
    }
}
