//! Persistence for services, metrics, alerts and incidents
//!
//! This module provides a trait-based abstraction over the stores the
//! monitoring engine reads and writes.
//!
//! ## Design
//!
//! - **Trait-based**: `MonitorStore` allows swapping implementations
//! - **Async**: all operations are async for compatibility with Tokio
//! - **Append-only metrics**: samples are inserted once and never updated,
//!   so concurrent pipelines only need insert-safety
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database behind the `storage-sqlite`
//!   feature
//! - **In-Memory**: no persistence, for tests or storage-less deployments

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{MetricQuery, MonitorStore, SortOrder};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
#[cfg(feature = "storage-sqlite")]
pub use sqlite::SqliteStore;
