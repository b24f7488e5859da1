//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the domain repository
//! ports backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain records. Merging, grading and deduplication live in the domain.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: every Diesel or pool failure is mapped onto
//!   the port's `Connection`/`Query` error.
//!
//! # Example
//!
//! ```no_run
//! use collar_gateway::outbound::persistence::{
//!     DbPool, DieselDeviceStatusRepository, PoolConfig,
//! };
//!
//! # async fn build() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/collar")).await?;
//! let repo = DieselDeviceStatusRepository::new(pool);
//! # let _ = repo;
//! # Ok(())
//! # }
//! ```

mod diesel_anomaly_log_repository;
mod diesel_device_status_repository;
mod diesel_telemetry_history_repository;
mod diesel_walk_session_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_anomaly_log_repository::DieselAnomalyLogRepository;
pub use diesel_device_status_repository::DieselDeviceStatusRepository;
pub use diesel_telemetry_history_repository::DieselTelemetryHistoryRepository;
pub use diesel_walk_session_repository::DieselWalkSessionRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
