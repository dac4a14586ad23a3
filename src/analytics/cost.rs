//! Cost analysis over persisted metrics
//!
//! Provides per-service cost summaries, trend classification, rule-based
//! optimization recommendations and a simple linear forecast with a
//! confidence band. All of it operates on whatever samples the store has
//! accumulated; a service with little history gets conservative answers
//! rather than errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{MetricQuery, MonitorStore, StoreResult};
use crate::{Metric, Severity};

/// Recommendation fires when the average request payload exceeds this (bytes)
const LARGE_REQUEST_BYTES: f64 = 1_000.0;

/// Recommendation fires when the average response payload exceeds this (bytes)
const LARGE_RESPONSE_BYTES: f64 = 5_000.0;

/// Error-rate percentage above which reliability work is recommended
const ERROR_RATE_LIMIT: f64 = 5.0;

/// Days of history consulted for recommendations
const RECOMMENDATION_LOOKBACK_DAYS: i64 = 7;

/// Days of history consulted for forecasting
const FORECAST_LOOKBACK_DAYS: i64 = 90;

/// Minimum distinct days of data required for a forecast
const FORECAST_MIN_DAYS: usize = 7;

/// Per-request cost bands driving the efficiency score and the pricing
/// recommendation
#[derive(Debug, Clone, Copy)]
pub struct CostThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for CostThresholds {
    fn default() -> Self {
        Self {
            high: 0.001,
            medium: 0.0005,
            low: 0.0001,
        }
    }
}

impl CostThresholds {
    /// Banded efficiency score: 100/75/50/25 against the low/medium/high
    /// bands. Deterministic step function, nothing learned.
    pub fn efficiency_score(&self, avg_cost_per_request: f64) -> u8 {
        if avg_cost_per_request <= self.low {
            100
        } else if avg_cost_per_request <= self.medium {
            75
        } else if avg_cost_per_request <= self.high {
            50
        } else {
            25
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for CostTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostTrend::Increasing => write!(f, "increasing"),
            CostTrend::Decreasing => write!(f, "decreasing"),
            CostTrend::Stable => write!(f, "stable"),
        }
    }
}

/// Classify the trend of a daily cost series (values in date order).
///
/// Compares the mean of the first seven daily values with the mean of the
/// last seven: `increasing` at >= 1.10x, `decreasing` at <= 0.90x. Fewer
/// than seven days of data (including fewer than two) is `stable` by
/// definition.
pub fn classify_trend(daily_costs: &[f64]) -> CostTrend {
    if daily_costs.len() < 7 {
        return CostTrend::Stable;
    }

    let first_week: f64 = daily_costs[..7].iter().sum::<f64>() / 7.0;
    let last_week: f64 = daily_costs[daily_costs.len() - 7..].iter().sum::<f64>() / 7.0;

    if last_week >= first_week * 1.10 {
        CostTrend::Increasing
    } else if last_week <= first_week * 0.90 {
        CostTrend::Decreasing
    } else {
        CostTrend::Stable
    }
}

/// Cost roll-up for one service over a query window
#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub service_name: String,
    pub period_days: i64,
    pub total_cost: f64,
    pub total_samples: usize,
    pub avg_cost_per_request: f64,
    pub daily_costs: BTreeMap<NaiveDate, f64>,
    pub trend: CostTrend,
    pub efficiency_score: u8,
}

/// Cost roll-up across every registered service
#[derive(Debug, Clone, Serialize)]
pub struct FleetCostSummary {
    pub period_days: i64,
    pub total_cost_across_services: f64,
    /// Per-service summaries, highest total cost first
    pub services: Vec<CostSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    RequestOptimization,
    ResponseOptimization,
    PricingOptimization,
    ReliabilityImprovement,
    MaintenanceOptimization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

/// One cost-optimization suggestion
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Severity,
    pub title: String,
    pub description: String,
    pub potential_savings: String,
    pub effort: Effort,
}

/// Linear cost forecast with a confidence band
#[derive(Debug, Clone, Serialize)]
pub struct CostForecast {
    pub service_name: String,
    pub forecast_period_days: i64,
    pub forecasted_cost: f64,
    pub avg_daily_cost: f64,
    /// Lower bound, clamped at zero
    pub confidence_low: f64,
    pub confidence_high: f64,
}

/// Analyzes service costs from the metric store
pub struct CostAnalyzer {
    store: Arc<dyn MonitorStore>,
    thresholds: CostThresholds,
}

impl CostAnalyzer {
    pub fn new(store: Arc<dyn MonitorStore>) -> Self {
        Self {
            store,
            thresholds: CostThresholds::default(),
        }
    }

    pub fn with_thresholds(store: Arc<dyn MonitorStore>, thresholds: CostThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Cost summary for one service over the trailing `days`.
    pub async fn service_summary(&self, service_id: i64, days: i64) -> StoreResult<CostSummary> {
        let service = self.store.get_service(service_id).await?;
        let metrics = self
            .store
            .query_metrics(MetricQuery::since(
                service_id,
                Utc::now() - Duration::days(days),
            ))
            .await?;

        let total_cost: f64 = metrics.iter().map(|m| m.cost).sum();
        let avg_cost_per_request = if metrics.is_empty() {
            0.0
        } else {
            total_cost / metrics.len() as f64
        };

        let daily_costs = daily_totals(&metrics);
        let daily_values: Vec<f64> = daily_costs.values().copied().collect();

        Ok(CostSummary {
            service_name: service.name,
            period_days: days,
            total_cost,
            total_samples: metrics.len(),
            avg_cost_per_request,
            trend: classify_trend(&daily_values),
            efficiency_score: self.thresholds.efficiency_score(avg_cost_per_request),
            daily_costs,
        })
    }

    /// Summaries for every service, highest total cost first, plus the
    /// cross-service total.
    pub async fn fleet_summary(&self, days: i64) -> StoreResult<FleetCostSummary> {
        let services = self.store.list_services().await?;

        let mut summaries = Vec::with_capacity(services.len());
        for service in &services {
            summaries.push(self.service_summary(service.id, days).await?);
        }

        summaries.sort_by(|a, b| {
            b.total_cost
                .partial_cmp(&a.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(FleetCostSummary {
            period_days: days,
            total_cost_across_services: summaries.iter().map(|s| s.total_cost).sum(),
            services: summaries,
        })
    }

    /// Rule-based optimization recommendations over the last week of
    /// samples. Each rule is independent and additive; no recent data means
    /// no recommendations.
    pub async fn recommendations(&self, service_id: i64) -> StoreResult<Vec<Recommendation>> {
        let service = self.store.get_service(service_id).await?;
        let metrics = self
            .store
            .query_metrics(MetricQuery::since(
                service_id,
                Utc::now() - Duration::days(RECOMMENDATION_LOOKBACK_DAYS),
            ))
            .await?;

        if metrics.is_empty() {
            return Ok(Vec::new());
        }

        let count = metrics.len() as f64;
        let avg_request_size = metrics.iter().map(|m| m.request_size as f64).sum::<f64>() / count;
        let avg_response_size =
            metrics.iter().map(|m| m.response_size as f64).sum::<f64>() / count;
        let error_rate = metrics.iter().filter(|m| m.error).count() as f64 / count * 100.0;

        let mut recommendations = Vec::new();

        if avg_request_size > LARGE_REQUEST_BYTES {
            recommendations.push(Recommendation {
                kind: RecommendationKind::RequestOptimization,
                priority: Severity::Medium,
                title: "Optimize Request Payloads".to_string(),
                description: format!(
                    "Average request size is {avg_request_size:.0} bytes. Consider compressing or reducing payload size."
                ),
                potential_savings: "10-20% reduction in data transfer costs".to_string(),
                effort: Effort::Medium,
            });
        }

        if avg_response_size > LARGE_RESPONSE_BYTES {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ResponseOptimization,
                priority: Severity::High,
                title: "Optimize Response Payloads".to_string(),
                description: format!(
                    "Average response size is {avg_response_size:.0} bytes. Implement response compression and pagination."
                ),
                potential_savings: "15-30% reduction in data transfer costs".to_string(),
                effort: Effort::Medium,
            });
        }

        if service.cost_per_request > self.thresholds.high {
            recommendations.push(Recommendation {
                kind: RecommendationKind::PricingOptimization,
                priority: Severity::High,
                title: "Review Service Pricing".to_string(),
                description: format!(
                    "Cost per request (${:.6}) is above recommended threshold.",
                    service.cost_per_request
                ),
                potential_savings: "20-40% reduction in per-request costs".to_string(),
                effort: Effort::Low,
            });
        }

        if error_rate > ERROR_RATE_LIMIT {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ReliabilityImprovement,
                priority: Severity::High,
                title: "Reduce Error Rates".to_string(),
                description: format!(
                    "Error rate is {error_rate:.1}%. Failed requests still incur costs."
                ),
                potential_savings: format!("{error_rate:.1}% reduction in wasted costs"),
                effort: Effort::High,
            });
        }

        if let Some(window) = &service.maintenance_window {
            recommendations.push(Recommendation {
                kind: RecommendationKind::MaintenanceOptimization,
                priority: Severity::Medium,
                title: "Optimize Maintenance Windows".to_string(),
                description: format!(
                    "Current maintenance window: {window}. Consider off-peak hours for better cost efficiency."
                ),
                potential_savings: "5-15% reduction in maintenance costs".to_string(),
                effort: Effort::Low,
            });
        }

        Ok(recommendations)
    }

    /// Linear cost forecast over the next `days_ahead` days.
    ///
    /// Extrapolates the average daily cost of a 90-day lookback; the
    /// confidence band is +-0.5 * sigma * days_ahead using the population
    /// standard deviation of the daily totals. Returns `None` with fewer
    /// than seven days of data - explicitly no result, not zero.
    pub async fn forecast(
        &self,
        service_id: i64,
        days_ahead: i64,
    ) -> StoreResult<Option<CostForecast>> {
        let service = self.store.get_service(service_id).await?;
        let metrics = self
            .store
            .query_metrics(MetricQuery::since(
                service_id,
                Utc::now() - Duration::days(FORECAST_LOOKBACK_DAYS),
            ))
            .await?;

        let daily = daily_totals(&metrics);
        if daily.len() < FORECAST_MIN_DAYS {
            return Ok(None);
        }

        let daily_values: Vec<f64> = daily.values().copied().collect();
        let avg_daily_cost = daily_values.iter().sum::<f64>() / daily_values.len() as f64;
        let forecasted_cost = avg_daily_cost * days_ahead as f64;

        let variance = daily_values
            .iter()
            .map(|cost| (cost - avg_daily_cost).powi(2))
            .sum::<f64>()
            / daily_values.len() as f64;
        let std_dev = variance.sqrt();
        let spread = std_dev * days_ahead as f64 * 0.5;

        Ok(Some(CostForecast {
            service_name: service.name,
            forecast_period_days: days_ahead,
            forecasted_cost,
            avg_daily_cost,
            confidence_low: (forecasted_cost - spread).max(0.0),
            confidence_high: forecasted_cost + spread,
        }))
    }
}

/// Sum costs per calendar date, oldest date first.
fn daily_totals(metrics: &[Metric]) -> BTreeMap<NaiveDate, f64> {
    let mut daily = BTreeMap::new();
    for metric in metrics {
        *daily.entry(metric.timestamp.date_naive()).or_insert(0.0) += metric.cost;
    }
    daily
}
