//! SQLite store implementation
//!
//! This module provides a SQLite-based implementation of the `MonitorStore`
//! trait.
//!
//! ## Features
//!
//! - **Embedded**: no separate database server required
//! - **WAL mode**: readers (the cost analyzer) don't block the polling
//!   pipeline's writers
//! - **Connection pooling**: one pool shared by all pipeline tasks
//! - **Migrations**: automatic schema versioning with sqlx
//!
//! ## Limitations
//!
//! - **Concurrency**: limited concurrent writes; fine for the fleet sizes
//!   a single poller can cover
//! - **Distributed**: single-machine only

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use crate::{
    Alert, AlertKind, AlertThresholds, HealthState, Incident, IncidentStatus, Metric, Service,
    Severity,
};

use super::backend::{MetricQuery, MonitorStore, SortOrder};
use super::error::{StoreError, StoreResult};

/// SQLite-backed monitor store
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run migrations.
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn row_to_service(row: &SqliteRow) -> StoreResult<Service> {
        let thresholds_json: String = row.get("thresholds");
        let thresholds: AlertThresholds = serde_json::from_str(&thresholds_json)
            .map_err(|e| StoreError::SerializationError(format!("thresholds: {e}")))?;

        let status: String = row.get("status");

        Ok(Service {
            id: row.get("id"),
            name: row.get("name"),
            url: row.get("url"),
            status: HealthState::parse(&status),
            last_check: row
                .get::<Option<i64>, _>("last_check")
                .map(Self::millis_to_timestamp),
            uptime: row.get("uptime"),
            response_time: row.get("response_time"),
            error_count: row.get::<i64, _>("error_count") as u64,
            total_checks: row.get::<i64, _>("total_checks") as u64,
            cost_per_request: row.get("cost_per_request"),
            cost_per_gb_hour: row.get("cost_per_gb_hour"),
            thresholds,
            maintenance_window: row.get("maintenance_window"),
            created_at: Self::millis_to_timestamp(row.get("created_at")),
        })
    }

    fn row_to_metric(row: &SqliteRow) -> Metric {
        Metric {
            service_id: row.get("service_id"),
            timestamp: Self::millis_to_timestamp(row.get("timestamp")),
            response_time: row.get("response_time"),
            status_code: row.get::<i64, _>("status_code") as u16,
            error: row.get::<i64, _>("error") != 0,
            uptime: row.get("uptime"),
            cost: row.get("cost"),
            request_size: row.get::<i64, _>("request_size") as u64,
            response_size: row.get::<i64, _>("response_size") as u64,
        }
    }

    fn row_to_alert(row: &SqliteRow) -> Alert {
        let kind: String = row.get("type");
        let severity: String = row.get("severity");

        Alert {
            id: row.get("id"),
            service_id: row.get("service_id"),
            kind: AlertKind::parse(&kind),
            message: row.get("message"),
            threshold: row.get("threshold"),
            severity: Severity::parse(&severity),
            triggered_at: Self::millis_to_timestamp(row.get("triggered_at")),
            resolved_at: row
                .get::<Option<i64>, _>("resolved_at")
                .map(Self::millis_to_timestamp),
            escalation_level: row.get::<i64, _>("escalation_level") as u32,
        }
    }

    fn row_to_incident(row: &SqliteRow) -> Incident {
        let severity: String = row.get("severity");
        let status: String = row.get("status");

        Incident {
            id: row.get("id"),
            service_id: row.get("service_id"),
            title: row.get("title"),
            description: row.get("description"),
            severity: Severity::parse(&severity),
            status: IncidentStatus::parse(&status),
            created_at: Self::millis_to_timestamp(row.get("created_at")),
            resolved_at: row
                .get::<Option<i64>, _>("resolved_at")
                .map(Self::millis_to_timestamp),
            sla_target: Self::millis_to_timestamp(row.get("sla_target")),
            resolution_notes: row.get("resolution_notes"),
            actual_resolution_time: row.get("actual_resolution_time"),
        }
    }

    fn thresholds_json(thresholds: &AlertThresholds) -> StoreResult<String> {
        serde_json::to_string(thresholds)
            .map_err(|e| StoreError::SerializationError(format!("thresholds: {e}")))
    }
}

#[async_trait]
impl MonitorStore for SqliteStore {
    #[instrument(skip(self, service), fields(name = %service.name))]
    async fn create_service(&self, mut service: Service) -> StoreResult<Service> {
        let thresholds = Self::thresholds_json(&service.thresholds)?;

        let result = sqlx::query(
            r#"
            INSERT INTO services (
                name, url, status, last_check, uptime, response_time,
                error_count, total_checks, cost_per_request, cost_per_gb_hour,
                thresholds, maintenance_window, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.name)
        .bind(&service.url)
        .bind(service.status.to_string())
        .bind(service.last_check.as_ref().map(Self::timestamp_to_millis))
        .bind(service.uptime)
        .bind(service.response_time)
        .bind(service.error_count as i64)
        .bind(service.total_checks as i64)
        .bind(service.cost_per_request)
        .bind(service.cost_per_gb_hour)
        .bind(thresholds)
        .bind(&service.maintenance_window)
        .bind(Self::timestamp_to_millis(&service.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        service.id = result.last_insert_rowid();
        Ok(service)
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        let rows = sqlx::query("SELECT * FROM services ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_service).collect()
    }

    async fn get_service(&self, id: i64) -> StoreResult<Service> {
        let row = sqlx::query("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => Self::row_to_service(&row),
            None => Err(StoreError::NotFound(format!("service {id}"))),
        }
    }

    async fn update_service(&self, service: &Service) -> StoreResult<()> {
        let thresholds = Self::thresholds_json(&service.thresholds)?;

        let result = sqlx::query(
            r#"
            UPDATE services SET
                name = ?, url = ?, status = ?, last_check = ?, uptime = ?,
                response_time = ?, error_count = ?, total_checks = ?,
                cost_per_request = ?, cost_per_gb_hour = ?, thresholds = ?,
                maintenance_window = ?
            WHERE id = ?
            "#,
        )
        .bind(&service.name)
        .bind(&service.url)
        .bind(service.status.to_string())
        .bind(service.last_check.as_ref().map(Self::timestamp_to_millis))
        .bind(service.uptime)
        .bind(service.response_time)
        .bind(service.error_count as i64)
        .bind(service.total_checks as i64)
        .bind(service.cost_per_request)
        .bind(service.cost_per_gb_hour)
        .bind(thresholds)
        .bind(&service.maintenance_window)
        .bind(service.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("service {}", service.id)));
        }
        Ok(())
    }

    async fn append_metric(&self, metric: Metric) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO metrics (
                service_id, timestamp, response_time, status_code, error,
                uptime, cost, request_size, response_size
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(metric.service_id)
        .bind(Self::timestamp_to_millis(&metric.timestamp))
        .bind(metric.response_time)
        .bind(metric.status_code as i64)
        .bind(metric.error as i64)
        .bind(metric.uptime)
        .bind(metric.cost)
        .bind(metric.request_size as i64)
        .bind(metric.response_size as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(service_id = query.service_id))]
    async fn query_metrics(&self, query: MetricQuery) -> StoreResult<Vec<Metric>> {
        let order = match query.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let limit_clause = query
            .limit
            .map(|l| format!("LIMIT {}", l))
            .unwrap_or_default();

        let sql = format!(
            r#"
            SELECT * FROM metrics
            WHERE service_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp {}
            {}
            "#,
            order, limit_clause
        );

        let rows = sqlx::query(&sql)
            .bind(query.service_id)
            .bind(Self::timestamp_to_millis(&query.start))
            .bind(Self::timestamp_to_millis(&query.end))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_metric).collect())
    }

    #[instrument(skip(self), fields(before = %before))]
    async fn prune_metrics(&self, before: DateTime<Utc>) -> StoreResult<usize> {
        let result = sqlx::query("DELETE FROM metrics WHERE timestamp < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let deleted = result.rows_affected() as usize;
        info!("deleted {} old metrics", deleted);
        Ok(deleted)
    }

    async fn append_alert(&self, mut alert: Alert) -> StoreResult<Alert> {
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (
                service_id, type, message, threshold, severity,
                triggered_at, resolved_at, escalation_level
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.service_id)
        .bind(alert.kind.to_string())
        .bind(&alert.message)
        .bind(alert.threshold)
        .bind(alert.severity.to_string())
        .bind(Self::timestamp_to_millis(&alert.triggered_at))
        .bind(alert.resolved_at.as_ref().map(Self::timestamp_to_millis))
        .bind(alert.escalation_level as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        alert.id = result.last_insert_rowid();
        Ok(alert)
    }

    async fn list_alerts(&self, service_id: Option<i64>) -> StoreResult<Vec<Alert>> {
        let rows = match service_id {
            Some(id) => {
                sqlx::query(
                    "SELECT * FROM alerts WHERE service_id = ? ORDER BY triggered_at DESC",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM alerts ORDER BY triggered_at DESC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_alert).collect())
    }

    #[instrument(skip(self, incident), fields(service_id = incident.service_id))]
    async fn create_incident(&self, mut incident: Incident) -> StoreResult<Incident> {
        let result = sqlx::query(
            r#"
            INSERT INTO incidents (
                service_id, title, description, severity, status, created_at,
                resolved_at, sla_target, resolution_notes, actual_resolution_time
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(incident.service_id)
        .bind(&incident.title)
        .bind(&incident.description)
        .bind(incident.severity.to_string())
        .bind(incident.status.to_string())
        .bind(Self::timestamp_to_millis(&incident.created_at))
        .bind(incident.resolved_at.as_ref().map(Self::timestamp_to_millis))
        .bind(Self::timestamp_to_millis(&incident.sla_target))
        .bind(&incident.resolution_notes)
        .bind(incident.actual_resolution_time)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        incident.id = result.last_insert_rowid();
        Ok(incident)
    }

    async fn get_incident(&self, id: i64) -> StoreResult<Incident> {
        let row = sqlx::query("SELECT * FROM incidents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => Ok(Self::row_to_incident(&row)),
            None => Err(StoreError::NotFound(format!("incident {id}"))),
        }
    }

    async fn find_open_incident(&self, service_id: i64) -> StoreResult<Option<Incident>> {
        let row = sqlx::query(
            "SELECT * FROM incidents WHERE service_id = ? AND status = 'open' LIMIT 1",
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_incident))
    }

    async fn update_incident(&self, incident: &Incident) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE incidents SET
                status = ?, resolved_at = ?, resolution_notes = ?,
                actual_resolution_time = ?
            WHERE id = ?
            "#,
        )
        .bind(incident.status.to_string())
        .bind(incident.resolved_at.as_ref().map(Self::timestamp_to_millis))
        .bind(&incident.resolution_notes)
        .bind(incident.actual_resolution_time)
        .bind(incident.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("incident {}", incident.id)));
        }
        Ok(())
    }

    async fn list_incidents(&self) -> StoreResult<Vec<Incident>> {
        let rows = sqlx::query("SELECT * FROM incidents ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_incident).collect())
    }

    async fn count_open_incidents(&self) -> StoreResult<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM incidents WHERE status = 'open'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(row.0 as usize)
    }

    async fn close(&self) -> StoreResult<()> {
        info!("closing SQLite store");
        self.pool.close().await;
        Ok(())
    }
}
