//! Store trait definition
//!
//! This module defines the `MonitorStore` trait that all store
//! implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Alert, Incident, Metric, Service};

use super::error::StoreResult;

/// Sort direction for metric queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    Descending,
}

/// Query parameters for fetching metrics within a time range
#[derive(Debug, Clone)]
pub struct MetricQuery {
    /// Service to query
    pub service_id: i64,

    /// Start of time range (inclusive)
    pub start: DateTime<Utc>,

    /// End of time range (inclusive)
    pub end: DateTime<Utc>,

    /// Result ordering by timestamp
    pub order: SortOrder,

    /// Maximum number of results to return
    pub limit: Option<usize>,
}

impl MetricQuery {
    /// Query everything for a service since `start`, oldest first.
    pub fn since(service_id: i64, start: DateTime<Utc>) -> Self {
        Self {
            service_id,
            start,
            end: Utc::now(),
            order: SortOrder::Ascending,
            limit: None,
        }
    }
}

/// Trait for monitoring stores
///
/// Covers the four record kinds the engine touches. Implementations must be
/// `Send + Sync` as they are shared across async tasks behind an `Arc`.
///
/// ## Mutation rules
///
/// - Services are created by the registration layer and mutated only by the
///   metric recorder (`update_service`).
/// - Metrics are append-only; no operation updates a sample after insert.
/// - Incidents move `open -> resolved` via `update_incident`; alerts are
///   appended by the evaluator and resolved externally.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    // ========================================================================
    // Services
    // ========================================================================

    /// Register a service, assigning its id. Returns the stored record.
    async fn create_service(&self, service: Service) -> StoreResult<Service>;

    /// All registered services.
    async fn list_services(&self) -> StoreResult<Vec<Service>>;

    /// Fetch one service; `StoreError::NotFound` for unknown ids.
    async fn get_service(&self, id: i64) -> StoreResult<Service>;

    /// Persist the rolling fields of a service after a check.
    async fn update_service(&self, service: &Service) -> StoreResult<()>;

    // ========================================================================
    // Metrics
    // ========================================================================

    /// Append one immutable sample.
    async fn append_metric(&self, metric: Metric) -> StoreResult<()>;

    /// Query samples for a service, ordered by timestamp per the query.
    async fn query_metrics(&self, query: MetricQuery) -> StoreResult<Vec<Metric>>;

    /// Delete samples older than `before`, returning how many were removed.
    ///
    /// Used for retention policy enforcement.
    async fn prune_metrics(&self, before: DateTime<Utc>) -> StoreResult<usize>;

    // ========================================================================
    // Alerts
    // ========================================================================

    /// Append an alert, assigning its id. Returns the stored record.
    async fn append_alert(&self, alert: Alert) -> StoreResult<Alert>;

    /// Alerts, newest first, optionally limited to one service.
    async fn list_alerts(&self, service_id: Option<i64>) -> StoreResult<Vec<Alert>>;

    // ========================================================================
    // Incidents
    // ========================================================================

    /// Create an incident, assigning its id. Returns the stored record.
    async fn create_incident(&self, incident: Incident) -> StoreResult<Incident>;

    /// Fetch one incident; `StoreError::NotFound` for unknown ids.
    async fn get_incident(&self, id: i64) -> StoreResult<Incident>;

    /// The open incident for a service, if any.
    ///
    /// The incident manager guarantees at most one exists per service.
    async fn find_open_incident(&self, service_id: i64) -> StoreResult<Option<Incident>>;

    /// Persist an incident transition (resolution).
    async fn update_incident(&self, incident: &Incident) -> StoreResult<()>;

    /// All incidents, newest first.
    async fn list_incidents(&self) -> StoreResult<Vec<Incident>>;

    /// Number of incidents currently open.
    async fn count_open_incidents(&self) -> StoreResult<usize>;

    /// Close the store and release resources.
    async fn close(&self) -> StoreResult<()>;
}
