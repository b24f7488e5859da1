//! PostgreSQL-backed `DeviceStatusRepository` implementation using Diesel ORM.
//!
//! One row per collar. The upsert writes a changeset whose absent optional
//! readings are skipped, so the stored row keeps the last known position,
//! battery and grade.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DeviceStatusRepository, DeviceStatusRepositoryError};
use crate::domain::telemetry::CanonicalStatus;
use crate::domain::{DeviceId, DeviceStatusSnapshot, GradeLetter, WalkGrade};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{DeviceStatusRow, DeviceStatusWrite};
use super::pool::DbPool;
use super::schema::device_status;

/// Diesel-backed implementation of the device status port.
#[derive(Clone)]
pub struct DieselDeviceStatusRepository {
    pool: DbPool,
}

impl DieselDeviceStatusRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn write_from_snapshot(snapshot: &DeviceStatusSnapshot) -> DeviceStatusWrite<'_> {
    DeviceStatusWrite {
        device_id: snapshot.device_id.as_ref(),
        firmware_version: snapshot.firmware_version.as_deref(),
        reported_at: snapshot.reported_at,
        latitude: snapshot.latitude,
        longitude: snapshot.longitude,
        altitude_m: snapshot.altitude_m,
        speed_mps: snapshot.speed_mps,
        heading_deg: snapshot.heading_deg,
        hdop: snapshot.hdop,
        satellites: snapshot.satellites,
        gps_valid: snapshot.gps_valid,
        activity: snapshot.activity.as_deref(),
        step_count: snapshot.step_count,
        battery_percent: snapshot.battery_percent,
        battery_voltage: snapshot.battery_voltage,
        charging: snapshot.charging,
        rssi_dbm: snapshot.rssi_dbm,
        network_type: snapshot.network_type.as_deref(),
        is_home: snapshot.is_home,
        is_escaped: snapshot.is_escaped,
        is_sleeping: snapshot.is_sleeping,
        sleep_minutes_today: snapshot.sleep_minutes_today,
        walk_active: snapshot.walk_active,
        walk_duration_s: snapshot.walk_duration_s,
        walk_distance_m: snapshot.walk_distance_m,
        walk_stop_count: snapshot.walk_stop_count,
        carried_seconds: snapshot.carried_seconds,
        vehicle_seconds: snapshot.vehicle_seconds,
        actual_walk_seconds: snapshot.actual_walk_seconds,
        cheat_flags: snapshot.cheat_flags,
        scratch_count_today: snapshot.scratch_count_today,
        scratch_peak_frequency: snapshot.scratch_peak_frequency,
        walk_grade: snapshot.walk_grade.map(GradeLetter::as_str),
        walk_grade_score: snapshot.walk_grade_score,
        updated_at: snapshot.updated_at,
    }
}

/// Convert a database row into a domain snapshot.
fn row_to_snapshot(row: DeviceStatusRow) -> Result<DeviceStatusSnapshot, DeviceStatusRepositoryError> {
    let device_id = DeviceId::new(&row.device_id)
        .map_err(|err| DeviceStatusRepositoryError::query(format!("stored device id: {err}")))?;
    let walk_grade = row
        .walk_grade
        .as_deref()
        .map(GradeLetter::from_str)
        .transpose()
        .map_err(|err| DeviceStatusRepositoryError::query(err.to_string()))?;

    Ok(DeviceStatusSnapshot {
        device_id,
        firmware_version: row.firmware_version,
        reported_at: row.reported_at,
        latitude: row.latitude,
        longitude: row.longitude,
        altitude_m: row.altitude_m,
        speed_mps: row.speed_mps,
        heading_deg: row.heading_deg,
        hdop: row.hdop,
        satellites: row.satellites,
        gps_valid: row.gps_valid,
        activity: row.activity,
        step_count: row.step_count,
        battery_percent: row.battery_percent,
        battery_voltage: row.battery_voltage,
        charging: row.charging,
        rssi_dbm: row.rssi_dbm,
        network_type: row.network_type,
        is_home: row.is_home,
        is_escaped: row.is_escaped,
        is_sleeping: row.is_sleeping,
        sleep_minutes_today: row.sleep_minutes_today,
        walk_active: row.walk_active,
        walk_duration_s: row.walk_duration_s,
        walk_distance_m: row.walk_distance_m,
        walk_stop_count: row.walk_stop_count,
        carried_seconds: row.carried_seconds,
        vehicle_seconds: row.vehicle_seconds,
        actual_walk_seconds: row.actual_walk_seconds,
        cheat_flags: row.cheat_flags,
        scratch_count_today: row.scratch_count_today,
        scratch_peak_frequency: row.scratch_peak_frequency,
        walk_grade,
        walk_grade_score: row.walk_grade_score,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl DeviceStatusRepository for DieselDeviceStatusRepository {
    async fn upsert(
        &self,
        status: &CanonicalStatus,
        grade: Option<WalkGrade>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DeviceStatusRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, DeviceStatusRepositoryError::connection))?;

        // Built without a previous snapshot: the changeset skips `None`, so
        // the database keeps the previous values instead.
        let snapshot = DeviceStatusSnapshot::upserted(None, status, grade.as_ref(), updated_at);
        let write = write_from_snapshot(&snapshot);

        diesel::insert_into(device_status::table)
            .values(&write)
            .on_conflict(device_status::device_id)
            .do_update()
            .set(&write)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_diesel_error(
                    err,
                    "upsert device status",
                    DeviceStatusRepositoryError::query,
                    DeviceStatusRepositoryError::connection,
                )
            })
    }

    async fn find(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceStatusSnapshot>, DeviceStatusRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, DeviceStatusRepositoryError::connection))?;

        let row = device_status::table
            .filter(device_status::device_id.eq(device_id.as_ref()))
            .select(DeviceStatusRow::as_select())
            .first::<DeviceStatusRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(
                    err,
                    "find device status",
                    DeviceStatusRepositoryError::query,
                    DeviceStatusRepositoryError::connection,
                )
            })?;

        row.map(row_to_snapshot).transpose()
    }
}
