//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by the Diesel adapters in
//! `outbound::persistence`; driving ports (`TelemetryIngest`,
//! `WalkSessionCommand`, `DeviceQuery`) are implemented by domain services
//! and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod anomaly_log_repository;
mod device_query;
mod device_status_repository;
mod ingest_metrics;
mod store_not_configured;
mod telemetry_history_repository;
mod telemetry_ingest;
mod walk_session_command;
mod walk_session_repository;

#[cfg(test)]
pub use anomaly_log_repository::MockAnomalyLogRepository;
pub use anomaly_log_repository::{
    AnomalyLogRepository, AnomalyLogRepositoryError, FixtureAnomalyLogRepository,
};
#[cfg(test)]
pub use device_query::MockDeviceQuery;
pub use device_query::{
    DeviceQuery, FixtureDeviceQuery, LocationHistory, ScratchHistory, SleepHistory, WalkHistory,
};
#[cfg(test)]
pub use device_status_repository::MockDeviceStatusRepository;
pub use device_status_repository::{
    DeviceStatusRepository, DeviceStatusRepositoryError, FixtureDeviceStatusRepository,
};
#[cfg(test)]
pub use ingest_metrics::MockIngestMetrics;
pub use ingest_metrics::{IngestMetrics, IngestMetricsError, NoOpIngestMetrics};
pub use store_not_configured::StoreNotConfigured;
#[cfg(test)]
pub use telemetry_history_repository::MockTelemetryHistoryRepository;
pub use telemetry_history_repository::{
    FixtureTelemetryHistoryRepository, TelemetryHistoryRepository,
    TelemetryHistoryRepositoryError,
};
#[cfg(test)]
pub use telemetry_ingest::MockTelemetryIngest;
pub use telemetry_ingest::{
    FixtureTelemetryIngest, IngestTelemetryRequest, IngestTelemetryResponse, TelemetryIngest,
};
#[cfg(test)]
pub use walk_session_command::MockWalkSessionCommand;
pub use walk_session_command::{
    EndWalkRequest, EndWalkResponse, FixtureWalkSessionCommand, StartWalkRequest,
    StartWalkResponse, WalkEndCounters, WalkSessionCommand,
};
#[cfg(test)]
pub use walk_session_repository::MockWalkSessionRepository;
pub use walk_session_repository::{
    FixtureWalkSessionRepository, WalkSessionRepository, WalkSessionRepositoryError,
};
