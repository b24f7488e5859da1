//! Internal Diesel row types.
//!
//! `*Row` structs are read with `as_select()`, `New*Row` structs are
//! inserted, and `*Update` structs are changesets. None of them leave the
//! persistence module.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    anomaly_log, device_status, location_history, scratch_daily, scratch_events, sleep_sessions,
    walk_sessions,
};

// ---------------------------------------------------------------------------
// Device status
// ---------------------------------------------------------------------------

/// Row struct for reading from the device_status table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = device_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeviceStatusRow {
    pub device_id: String,
    pub firmware_version: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub gps_valid: bool,
    pub activity: Option<String>,
    pub step_count: i64,
    pub battery_percent: Option<i32>,
    pub battery_voltage: Option<f64>,
    pub charging: bool,
    pub rssi_dbm: Option<i32>,
    pub network_type: Option<String>,
    pub is_home: bool,
    pub is_escaped: bool,
    pub is_sleeping: bool,
    pub sleep_minutes_today: i32,
    pub walk_active: bool,
    pub walk_duration_s: i64,
    pub walk_distance_m: f64,
    pub walk_stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
    pub scratch_count_today: i32,
    pub scratch_peak_frequency: Option<f64>,
    pub walk_grade: Option<String>,
    pub walk_grade_score: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

/// Insert and changeset for device_status upserts.
///
/// As a changeset, `None` fields are skipped, so readings the report omits
/// keep their stored value.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = device_status)]
pub(crate) struct DeviceStatusWrite<'a> {
    pub device_id: &'a str,
    pub firmware_version: Option<&'a str>,
    pub reported_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub gps_valid: bool,
    pub activity: Option<&'a str>,
    pub step_count: i64,
    pub battery_percent: Option<i32>,
    pub battery_voltage: Option<f64>,
    pub charging: bool,
    pub rssi_dbm: Option<i32>,
    pub network_type: Option<&'a str>,
    pub is_home: bool,
    pub is_escaped: bool,
    pub is_sleeping: bool,
    pub sleep_minutes_today: i32,
    pub walk_active: bool,
    pub walk_duration_s: i64,
    pub walk_distance_m: f64,
    pub walk_stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
    pub scratch_count_today: i32,
    pub scratch_peak_frequency: Option<f64>,
    pub walk_grade: Option<&'a str>,
    pub walk_grade_score: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Telemetry history
// ---------------------------------------------------------------------------

/// Row struct for reading from the location_history table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = location_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LocationRow {
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub activity: Option<String>,
}

/// Insertable struct for location fixes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = location_history)]
pub(crate) struct NewLocationRow<'a> {
    pub device_id: &'a str,
    pub recorded_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub activity: Option<&'a str>,
}

/// Insertable struct for scratch detections.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scratch_events)]
pub(crate) struct NewScratchEventRow<'a> {
    pub device_id: &'a str,
    pub detected_at: DateTime<Utc>,
    pub intensity: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub duration_ms: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Row, insert and changeset struct for daily scratch totals.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = scratch_daily)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ScratchDailyRow {
    pub device_id: String,
    pub day: NaiveDate,
    pub scratch_count: i32,
    pub peak_frequency_hz: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied when a day already has a total.
///
/// `peak_frequency_hz` is written even when null so the row mirrors the
/// device's running value.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = scratch_daily)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ScratchDailyUpdate {
    pub scratch_count: i32,
    pub peak_frequency_hz: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the sleep_sessions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sleep_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SleepSessionRow {
    pub device_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub minutes: i32,
    pub quality: Option<i32>,
}

/// Insertable struct for sleep sessions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sleep_sessions)]
pub(crate) struct NewSleepSessionRow<'a> {
    pub device_id: &'a str,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub minutes: i32,
    pub quality: Option<i32>,
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

/// Insertable struct for anomaly alerts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = anomaly_log)]
pub(crate) struct NewAnomalyRow<'a> {
    pub device_id: &'a str,
    pub anomaly_type: &'a str,
    pub severity: Option<&'a str>,
    pub details: Option<&'a serde_json::Value>,
    pub detected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Walk sessions
// ---------------------------------------------------------------------------

/// Row and insert struct for the walk_sessions table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = walk_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WalkSessionRow {
    pub id: Uuid,
    pub device_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub duration_s: i64,
    pub distance_m: f64,
    pub stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
    pub grade: Option<String>,
    pub grade_score: Option<i32>,
    pub carried_percent: Option<f64>,
    pub actual_walk_percent: Option<f64>,
    pub vehicle_detected: Option<bool>,
    pub cheat_summary: Option<String>,
    pub source: String,
}

/// Changeset written when a walk is finalised.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = walk_sessions)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct WalkSessionFinish<'a> {
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_s: i64,
    pub distance_m: f64,
    pub stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
    pub grade: Option<&'a str>,
    pub grade_score: Option<i32>,
    pub carried_percent: Option<f64>,
    pub actual_walk_percent: Option<f64>,
    pub vehicle_detected: Option<bool>,
    pub cheat_summary: Option<&'a str>,
}

/// Aggregate row produced by the walker-stats query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct WalkerStatsRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub total_walks: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub grade_a: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub grade_b: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub grade_c: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub grade_f: i64,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub average_score: Option<f64>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub average_carried_percent: Option<f64>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub average_actual_walk_percent: Option<f64>,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub carried_incidents: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub vehicle_incidents: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub excessive_stop_incidents: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub leash_only_incidents: i64,
}
