//! Domain primitives, services and ports.
//!
//! Purpose: turn raw collar reports into canonical records and derived walk
//! metrics, and define the ports through which those records reach the
//! store. Nothing here knows about HTTP or Diesel.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - DeviceId: validated collar identifier.
//! - TelemetryIngestionService, WalkSessionService, DeviceQueryService:
//!   implementations of the driving ports in [`ports`].

pub mod anomaly;
pub mod anti_cheat;
mod device;
mod device_query_service;
pub mod error;
mod persist_report;
pub mod ports;
mod query_window;
mod records;
mod rollups;
pub mod signature;
pub mod telemetry;
mod telemetry_ingestion_service;
mod trace_id;
mod walk_session;
mod walk_session_service;

pub use self::anomaly::AnomalyDeduplicator;
pub use self::anti_cheat::{CheatFlag, GradeLetter, ParseGradeLetterError, WalkGrade, WalkMetrics};
pub use self::device::{DEVICE_ID_MAX, DeviceId, DeviceIdValidationError};
pub use self::device_query_service::DeviceQueryService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::persist_report::{PersistReport, StepOutcome};
pub use self::query_window::{
    DEFAULT_DAYS, DEFAULT_STATS_DAYS, DayWindow, LocationWindow, MAX_DAYS, walk_limit,
};
pub use self::records::{
    AnomalyEntry, DeviceStatusSnapshot, LocationRecord, ScratchDaily, ScratchEvent, SleepSession,
};
pub use self::rollups::{
    GradeCounts, ScratchSummary, SleepSummary, StatsSource, WalkSummary, WalkerStats,
    WalkerStatsTotals,
};
pub use self::signature::{SignatureCheck, SignatureVerifier};
pub use self::telemetry_ingestion_service::TelemetryIngestionService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::walk_session::{
    ParseWalkSourceError, WalkSession, WalkSessionError, WalkSource, WalkState,
};
pub use self::walk_session_service::WalkSessionService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use collar_gateway::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such collar"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
