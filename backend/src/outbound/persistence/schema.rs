//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. The `diesel
//! print-schema` command can regenerate them from a live database.

diesel::table! {
    /// Latest snapshot per collar, keyed by device id.
    device_status (device_id) {
        device_id -> Varchar,
        firmware_version -> Nullable<Text>,
        reported_at -> Timestamptz,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        altitude_m -> Nullable<Float8>,
        speed_mps -> Nullable<Float8>,
        heading_deg -> Nullable<Float8>,
        hdop -> Nullable<Float8>,
        satellites -> Nullable<Int4>,
        gps_valid -> Bool,
        activity -> Nullable<Text>,
        step_count -> Int8,
        battery_percent -> Nullable<Int4>,
        battery_voltage -> Nullable<Float8>,
        charging -> Bool,
        rssi_dbm -> Nullable<Int4>,
        network_type -> Nullable<Text>,
        is_home -> Bool,
        is_escaped -> Bool,
        is_sleeping -> Bool,
        sleep_minutes_today -> Int4,
        walk_active -> Bool,
        walk_duration_s -> Int8,
        walk_distance_m -> Float8,
        walk_stop_count -> Int4,
        carried_seconds -> Int8,
        vehicle_seconds -> Int8,
        actual_walk_seconds -> Int8,
        cheat_flags -> Int4,
        scratch_count_today -> Int4,
        scratch_peak_frequency -> Nullable<Float8>,
        walk_grade -> Nullable<Varchar>,
        walk_grade_score -> Nullable<Int4>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only valid fixes.
    location_history (id) {
        id -> Int8,
        device_id -> Varchar,
        recorded_at -> Timestamptz,
        latitude -> Float8,
        longitude -> Float8,
        altitude_m -> Nullable<Float8>,
        speed_mps -> Nullable<Float8>,
        heading_deg -> Nullable<Float8>,
        hdop -> Nullable<Float8>,
        satellites -> Nullable<Int4>,
        activity -> Nullable<Text>,
    }
}

diesel::table! {
    /// Append-only scratch detections.
    scratch_events (id) {
        id -> Int8,
        device_id -> Varchar,
        detected_at -> Timestamptz,
        intensity -> Nullable<Float8>,
        frequency_hz -> Nullable<Float8>,
        duration_ms -> Nullable<Int8>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
    }
}

diesel::table! {
    /// Device-reported daily scratch totals.
    scratch_daily (device_id, day) {
        device_id -> Varchar,
        day -> Date,
        scratch_count -> Int4,
        peak_frequency_hz -> Nullable<Float8>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Deduplicated anomaly alerts.
    anomaly_log (id) {
        id -> Int8,
        device_id -> Varchar,
        anomaly_type -> Text,
        severity -> Nullable<Text>,
        details -> Nullable<Jsonb>,
        detected_at -> Timestamptz,
    }
}

diesel::table! {
    /// Walks opened by clients or synthesised from device reports.
    walk_sessions (id) {
        id -> Uuid,
        device_id -> Varchar,
        started_at -> Timestamptz,
        ended_at -> Nullable<Timestamptz>,
        start_latitude -> Nullable<Float8>,
        start_longitude -> Nullable<Float8>,
        duration_s -> Int8,
        distance_m -> Float8,
        stop_count -> Int4,
        carried_seconds -> Int8,
        vehicle_seconds -> Int8,
        actual_walk_seconds -> Int8,
        cheat_flags -> Int4,
        grade -> Nullable<Varchar>,
        grade_score -> Nullable<Int4>,
        carried_percent -> Nullable<Float8>,
        actual_walk_percent -> Nullable<Float8>,
        vehicle_detected -> Nullable<Bool>,
        cheat_summary -> Nullable<Text>,
        source -> Varchar,
    }
}

diesel::table! {
    /// Completed sleep sessions.
    sleep_sessions (id) {
        id -> Int8,
        device_id -> Varchar,
        started_at -> Timestamptz,
        ended_at -> Timestamptz,
        minutes -> Int4,
        quality -> Nullable<Int4>,
    }
}
