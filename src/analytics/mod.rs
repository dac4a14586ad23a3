//! Read-side analytics over the accumulated metric history
//!
//! Everything in here is pure read-side work, independent of the polling
//! pipeline: it queries persisted metrics and services and never blocks or
//! mutates them. Insufficient data is a normal result (`stable` trends,
//! `None` forecasts, empty recommendation lists), not an error.

pub mod cost;
pub mod stats;

pub use cost::{
    CostAnalyzer, CostForecast, CostSummary, CostThresholds, CostTrend, Effort, FleetCostSummary,
    Recommendation, RecommendationKind, classify_trend,
};
pub use stats::{DashboardStats, dashboard_stats};
