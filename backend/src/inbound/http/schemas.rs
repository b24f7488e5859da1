//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the structure of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

#![expect(
    dead_code,
    reason = "Schema mirrors are only read by utoipa during OpenAPI generation"
)]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The telemetry signature is missing or does not match.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The requested device record or walk does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The walk has already ended.
    #[schema(rename = "conflict")]
    Conflict,
    /// The telemetry store is not configured or cannot be reached.
    #[schema(rename = "dependency_unavailable")]
    DependencyUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "device_id is required")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::GradeLetter`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GradeLetter)]
pub enum GradeLetterSchema {
    A,
    B,
    C,
    F,
}

/// OpenAPI schema for [`crate::domain::WalkSource`].
#[derive(ToSchema)]
#[schema(as = crate::domain::WalkSource)]
pub enum WalkSourceSchema {
    #[schema(rename = "client")]
    Client,
    #[schema(rename = "device")]
    Device,
}

/// OpenAPI schema for [`crate::domain::StatsSource`].
#[derive(ToSchema)]
#[schema(as = crate::domain::StatsSource)]
pub enum StatsSourceSchema {
    #[schema(rename = "server")]
    Server,
    #[schema(rename = "client")]
    Client,
}

/// OpenAPI schema for [`crate::domain::DeviceStatusSnapshot`].
///
/// Latest report for one collar; readings the last report omitted keep their
/// previous value.
#[derive(ToSchema)]
#[schema(as = crate::domain::DeviceStatusSnapshot)]
pub struct DeviceStatusSnapshotSchema {
    #[schema(example = "collar-01")]
    device_id: String,
    #[schema(example = "2.1.0")]
    firmware_version: Option<String>,
    #[schema(format = "date-time")]
    reported_at: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude_m: Option<f64>,
    speed_mps: Option<f64>,
    heading_deg: Option<f64>,
    hdop: Option<f64>,
    satellites: Option<i32>,
    gps_valid: bool,
    #[schema(example = "walking")]
    activity: Option<String>,
    step_count: i64,
    battery_percent: Option<i32>,
    battery_voltage: Option<f64>,
    charging: bool,
    rssi_dbm: Option<i32>,
    #[schema(example = "lte-m")]
    network_type: Option<String>,
    is_home: bool,
    is_escaped: bool,
    is_sleeping: bool,
    sleep_minutes_today: i32,
    walk_active: bool,
    walk_duration_s: i64,
    walk_distance_m: f64,
    walk_stop_count: i32,
    carried_seconds: i64,
    vehicle_seconds: i64,
    actual_walk_seconds: i64,
    cheat_flags: i32,
    scratch_count_today: i32,
    scratch_peak_frequency: Option<f64>,
    walk_grade: Option<GradeLetterSchema>,
    walk_grade_score: Option<i32>,
    #[schema(format = "date-time")]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::LocationRecord`].
#[derive(ToSchema)]
#[schema(as = crate::domain::LocationRecord)]
pub struct LocationRecordSchema {
    device_id: String,
    #[schema(format = "date-time")]
    recorded_at: String,
    latitude: f64,
    longitude: f64,
    altitude_m: Option<f64>,
    speed_mps: Option<f64>,
    heading_deg: Option<f64>,
    hdop: Option<f64>,
    satellites: Option<i32>,
    activity: Option<String>,
}

/// OpenAPI schema for [`crate::domain::ports::LocationHistory`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::LocationHistory)]
pub struct LocationHistorySchema {
    device_id: String,
    count: usize,
    locations: Vec<LocationRecordSchema>,
}

/// OpenAPI schema for [`crate::domain::SleepSession`].
#[derive(ToSchema)]
#[schema(as = crate::domain::SleepSession)]
pub struct SleepSessionSchema {
    device_id: String,
    #[schema(format = "date-time")]
    started_at: String,
    #[schema(format = "date-time")]
    ended_at: String,
    minutes: i32,
    quality: Option<i32>,
}

/// OpenAPI schema for [`crate::domain::SleepSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::SleepSummary)]
pub struct SleepSummarySchema {
    session_count: usize,
    total_minutes: i64,
    average_minutes: Option<f64>,
    average_quality: Option<f64>,
}

/// OpenAPI schema for [`crate::domain::ports::SleepHistory`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::SleepHistory)]
pub struct SleepHistorySchema {
    device_id: String,
    sessions: Vec<SleepSessionSchema>,
    summary: SleepSummarySchema,
}

/// OpenAPI schema for [`crate::domain::ScratchDaily`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ScratchDaily)]
pub struct ScratchDailySchema {
    device_id: String,
    #[schema(format = "date", example = "2026-05-04")]
    day: String,
    scratch_count: i32,
    peak_frequency_hz: Option<f64>,
    #[schema(format = "date-time")]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::ScratchSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ScratchSummary)]
pub struct ScratchSummarySchema {
    days_recorded: usize,
    total_scratches: i64,
    average_per_day: Option<f64>,
    peak_frequency_hz: Option<f64>,
}

/// OpenAPI schema for [`crate::domain::ports::ScratchHistory`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::ScratchHistory)]
pub struct ScratchHistorySchema {
    device_id: String,
    daily: Vec<ScratchDailySchema>,
    summary: ScratchSummarySchema,
}

/// OpenAPI schema for [`crate::domain::GradeCounts`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GradeCounts)]
pub struct GradeCountsSchema {
    a: i64,
    b: i64,
    c: i64,
    f: i64,
}

/// OpenAPI schema for [`crate::domain::WalkSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::WalkSummary)]
pub struct WalkSummarySchema {
    walk_count: usize,
    completed_count: usize,
    total_duration_s: i64,
    total_distance_m: f64,
    average_score: Option<f64>,
    grade_counts: GradeCountsSchema,
}

/// OpenAPI schema for [`crate::domain::WalkerStats`].
///
/// The totals are flattened into the top-level object.
#[derive(ToSchema)]
#[schema(as = crate::domain::WalkerStats)]
pub struct WalkerStatsSchema {
    device_id: String,
    days: u32,
    total_walks: i64,
    grade_counts: GradeCountsSchema,
    average_score: Option<f64>,
    average_carried_percent: Option<f64>,
    average_actual_walk_percent: Option<f64>,
    carried_incidents: i64,
    vehicle_incidents: i64,
    excessive_stop_incidents: i64,
    leash_only_incidents: i64,
    source: StatsSourceSchema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_schema_has_expected_name() {
        let schema_json = schema_to_json::<ErrorSchema>();
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert!(schema_json.contains("message"));
        assert!(
            schema_json.contains("traceId"),
            "schema should follow the camelCase wire name"
        );
    }

    #[test]
    fn error_code_schema_variants_match_domain() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        for code in [
            "invalid_request",
            "unauthorized",
            "not_found",
            "conflict",
            "dependency_unavailable",
            "internal_error",
        ] {
            assert!(schema_json.contains(code), "missing {code}");
        }
    }

    #[test]
    fn walker_stats_schema_flattens_totals() {
        let schema_json = schema_to_json::<WalkerStatsSchema>();
        assert_eq!(WalkerStatsSchema::name(), "crate.domain.WalkerStats");
        assert!(schema_json.contains("carried_incidents"));
        assert!(!schema_json.contains("totals"));
    }

    #[test]
    fn device_status_schema_lists_walk_grade() {
        let schema_json = schema_to_json::<DeviceStatusSnapshotSchema>();
        assert!(schema_json.contains("walk_grade_score"));
        assert!(schema_json.contains("scratch_peak_frequency"));
    }
}
