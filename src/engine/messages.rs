//! Message types for the monitoring engine
//!
//! ## Design Principles
//!
//! 1. **Commands**: request/response messages sent to the scheduler via mpsc
//! 2. **Events**: broadcast notifications published to multiple subscribers
//! 3. **Results as values**: a failed probe is an outcome, not an exception

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::HealthState;

/// Result of one outbound health check.
///
/// `error` is set only on transport failure (timeout, connection refused,
/// DNS). A received response always has `error == false`, whatever its
/// status code; non-200 statuses are classified downstream as degraded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    /// Seconds spent on the request, including reading the body
    pub elapsed: f64,

    /// HTTP status code; 0 when the request never completed
    pub status_code: u16,

    /// Transport failure flag
    pub error: bool,

    /// Size of the received body in bytes; 0 when the request failed
    pub response_size: u64,
}

/// Event published after every metric recorder run
///
/// External observability sinks (metric exporters, dashboards) subscribe to
/// this channel. The broadcast may lag or drop events for slow subscribers -
/// acceptable, since signals are re-emitted on every check.
#[derive(Debug, Clone)]
pub struct HealthSignal {
    /// Service identifier
    pub service_id: i64,

    /// Service name (for label-based exporters)
    pub service_name: String,

    /// Whether the service is currently healthy
    pub healthy: bool,

    /// The freshly derived state
    pub state: HealthState,

    /// Derived cost of the sample
    pub cost: f64,

    /// When the sample was recorded
    pub timestamp: DateTime<Utc>,
}

/// Commands that can be sent to the SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run a full check round immediately and wait for every pipeline
    ///
    /// Used for testing and manual refresh operations.
    TickNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Update the tick interval
    ///
    /// The new interval takes effect immediately.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the scheduler
    ///
    /// In-flight pipelines are left to run to completion.
    Shutdown,
}
