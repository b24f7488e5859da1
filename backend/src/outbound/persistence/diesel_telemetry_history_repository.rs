//! PostgreSQL-backed `TelemetryHistoryRepository` implementation.
//!
//! Location, scratch and sleep history are append-only except for the daily
//! scratch totals, which are keyed by `(device_id, day)` and overwritten with
//! the collar's running values.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{TelemetryHistoryRepository, TelemetryHistoryRepositoryError};
use crate::domain::{DeviceId, LocationRecord, ScratchDaily, ScratchEvent, SleepSession};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    LocationRow, NewLocationRow, NewScratchEventRow, NewSleepSessionRow, ScratchDailyRow,
    ScratchDailyUpdate, SleepSessionRow,
};
use super::pool::DbPool;
use super::schema::{location_history, scratch_daily, scratch_events, sleep_sessions};

/// Diesel-backed implementation of the telemetry history port.
#[derive(Clone)]
pub struct DieselTelemetryHistoryRepository {
    pool: DbPool,
}

impl DieselTelemetryHistoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, AsyncPgConnection>, TelemetryHistoryRepositoryError> {
        self.pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, TelemetryHistoryRepositoryError::connection))
    }
}

fn diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> TelemetryHistoryRepositoryError {
    move |err| {
        map_diesel_error(
            err,
            operation,
            TelemetryHistoryRepositoryError::query,
            TelemetryHistoryRepositoryError::connection,
        )
    }
}

fn stored_device_id(raw: &str) -> Result<DeviceId, TelemetryHistoryRepositoryError> {
    DeviceId::new(raw)
        .map_err(|err| TelemetryHistoryRepositoryError::query(format!("stored device id: {err}")))
}

fn row_to_location(row: LocationRow) -> Result<LocationRecord, TelemetryHistoryRepositoryError> {
    Ok(LocationRecord {
        device_id: stored_device_id(&row.device_id)?,
        recorded_at: row.recorded_at,
        latitude: row.latitude,
        longitude: row.longitude,
        altitude_m: row.altitude_m,
        speed_mps: row.speed_mps,
        heading_deg: row.heading_deg,
        hdop: row.hdop,
        satellites: row.satellites,
        activity: row.activity,
    })
}

fn row_to_sleep_session(
    row: SleepSessionRow,
) -> Result<SleepSession, TelemetryHistoryRepositoryError> {
    Ok(SleepSession {
        device_id: stored_device_id(&row.device_id)?,
        started_at: row.started_at,
        ended_at: row.ended_at,
        minutes: row.minutes,
        quality: row.quality,
    })
}

fn row_to_scratch_daily(
    row: ScratchDailyRow,
) -> Result<ScratchDaily, TelemetryHistoryRepositoryError> {
    Ok(ScratchDaily {
        device_id: stored_device_id(&row.device_id)?,
        day: row.day,
        scratch_count: row.scratch_count,
        peak_frequency_hz: row.peak_frequency_hz,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl TelemetryHistoryRepository for DieselTelemetryHistoryRepository {
    async fn insert_location(
        &self,
        record: &LocationRecord,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;
        let row = NewLocationRow {
            device_id: record.device_id.as_ref(),
            recorded_at: record.recorded_at,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude_m: record.altitude_m,
            speed_mps: record.speed_mps,
            heading_deg: record.heading_deg,
            hdop: record.hdop,
            satellites: record.satellites,
            activity: record.activity.as_deref(),
        };

        diesel::insert_into(location_history::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("insert location"))
    }

    async fn insert_scratch_event(
        &self,
        event: &ScratchEvent,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;
        let row = NewScratchEventRow {
            device_id: event.device_id.as_ref(),
            detected_at: event.detected_at,
            intensity: event.intensity,
            frequency_hz: event.frequency_hz,
            duration_ms: event.duration_ms,
            latitude: event.latitude,
            longitude: event.longitude,
        };

        diesel::insert_into(scratch_events::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("insert scratch event"))
    }

    async fn upsert_scratch_daily(
        &self,
        daily: &ScratchDaily,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;
        let row = ScratchDailyRow {
            device_id: daily.device_id.to_string(),
            day: daily.day,
            scratch_count: daily.scratch_count,
            peak_frequency_hz: daily.peak_frequency_hz,
            updated_at: daily.updated_at,
        };
        let update = ScratchDailyUpdate {
            scratch_count: daily.scratch_count,
            peak_frequency_hz: daily.peak_frequency_hz,
            updated_at: daily.updated_at,
        };

        diesel::insert_into(scratch_daily::table)
            .values(&row)
            .on_conflict((scratch_daily::device_id, scratch_daily::day))
            .do_update()
            .set(&update)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("upsert scratch daily"))
    }

    async fn insert_sleep_session(
        &self,
        session: &SleepSession,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;
        let row = NewSleepSessionRow {
            device_id: session.device_id.as_ref(),
            started_at: session.started_at,
            ended_at: session.ended_at,
            minutes: session.minutes,
            quality: session.quality,
        };

        diesel::insert_into(sleep_sessions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error("insert sleep session"))
    }

    async fn list_locations(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LocationRecord>, TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;

        let rows: Vec<LocationRow> = location_history::table
            .filter(location_history::device_id.eq(device_id.as_ref()))
            .filter(location_history::recorded_at.ge(since))
            .order(location_history::recorded_at.desc())
            .limit(limit)
            .select(LocationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list locations"))?;

        rows.into_iter().map(row_to_location).collect()
    }

    async fn list_sleep_sessions(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;

        let rows: Vec<SleepSessionRow> = sleep_sessions::table
            .filter(sleep_sessions::device_id.eq(device_id.as_ref()))
            .filter(sleep_sessions::started_at.ge(since))
            .order(sleep_sessions::started_at.desc())
            .select(SleepSessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list sleep sessions"))?;

        rows.into_iter().map(row_to_sleep_session).collect()
    }

    async fn list_scratch_daily(
        &self,
        device_id: &DeviceId,
        since_day: NaiveDate,
    ) -> Result<Vec<ScratchDaily>, TelemetryHistoryRepositoryError> {
        let mut conn = self.connection().await?;

        let rows: Vec<ScratchDailyRow> = scratch_daily::table
            .filter(scratch_daily::device_id.eq(device_id.as_ref()))
            .filter(scratch_daily::day.ge(since_day))
            .order(scratch_daily::day.desc())
            .select(ScratchDailyRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list scratch daily"))?;

        rows.into_iter().map(row_to_scratch_daily).collect()
    }
}
