//! Monitoring and alerting engine
//!
//! The engine drives the probe -> record -> evaluate -> incident pipeline for
//! every registered service on a fixed cadence.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌─────────────────────┐
//!                  │   SchedulerActor    │ interval tick
//!                  └──────────┬──────────┘
//!                             │ one task per service
//!              ┌──────────────┼──────────────┐
//!              │              │              │
//!      ┌───────▼──────┐       │      ┌───────▼──────┐
//!      │ pipeline (A) │      ...     │ pipeline (N) │
//!      └───────┬──────┘              └───────┬──────┘
//!              │  Probe → MetricRecorder → AlertEvaluator → IncidentManager
//!              │
//!    ┌─────────▼──────────┐
//!    │ broadcast channel  │ HealthSignal (per-service up/down + cost)
//!    └────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Steps within one service's pipeline run strictly in order.
//! - Services are checked independently; a slow or failing service never
//!   delays or aborts the others in the same tick.
//! - Transport failures are data (`ProbeOutcome.error`), not errors; nothing
//!   in the pipeline terminates the scheduler loop.

pub mod evaluator;
pub mod incident;
pub mod messages;
pub mod probe;
pub mod recorder;
pub mod scheduler;
