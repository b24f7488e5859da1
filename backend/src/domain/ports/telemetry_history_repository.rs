//! Port for append-only telemetry history and daily aggregates.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{DeviceId, LocationRecord, ScratchDaily, ScratchEvent, SleepSession};

use super::define_port_error;

define_port_error! {
    /// Errors raised by telemetry history adapters.
    pub enum TelemetryHistoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "telemetry history connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "telemetry history query failed: {message}",
    }
}

/// Port for location, scratch and sleep history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryHistoryRepository: Send + Sync {
    /// Append a location point.
    async fn insert_location(
        &self,
        record: &LocationRecord,
    ) -> Result<(), TelemetryHistoryRepositoryError>;

    /// Append a scratch detection.
    async fn insert_scratch_event(
        &self,
        event: &ScratchEvent,
    ) -> Result<(), TelemetryHistoryRepositoryError>;

    /// Insert or overwrite the `(device_id, day)` scratch row.
    async fn upsert_scratch_daily(
        &self,
        daily: &ScratchDaily,
    ) -> Result<(), TelemetryHistoryRepositoryError>;

    /// Append a finished sleep session.
    async fn insert_sleep_session(
        &self,
        session: &SleepSession,
    ) -> Result<(), TelemetryHistoryRepositoryError>;

    /// Locations recorded at or after `since`, newest first.
    async fn list_locations(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LocationRecord>, TelemetryHistoryRepositoryError>;

    /// Sleep sessions that started at or after `since`, newest first.
    async fn list_sleep_sessions(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, TelemetryHistoryRepositoryError>;

    /// Daily scratch rows from `since_day` onwards, newest first.
    async fn list_scratch_daily(
        &self,
        device_id: &DeviceId,
        since_day: NaiveDate,
    ) -> Result<Vec<ScratchDaily>, TelemetryHistoryRepositoryError>;
}

/// Fixture implementation that accepts writes and returns empty history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTelemetryHistoryRepository;

#[async_trait]
impl TelemetryHistoryRepository for FixtureTelemetryHistoryRepository {
    async fn insert_location(
        &self,
        _record: &LocationRecord,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        Ok(())
    }

    async fn insert_scratch_event(
        &self,
        _event: &ScratchEvent,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        Ok(())
    }

    async fn upsert_scratch_daily(
        &self,
        _daily: &ScratchDaily,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        Ok(())
    }

    async fn insert_sleep_session(
        &self,
        _session: &SleepSession,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        Ok(())
    }

    async fn list_locations(
        &self,
        _device_id: &DeviceId,
        _since: DateTime<Utc>,
        _limit: i64,
    ) -> Result<Vec<LocationRecord>, TelemetryHistoryRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_sleep_sessions(
        &self,
        _device_id: &DeviceId,
        _since: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, TelemetryHistoryRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_scratch_daily(
        &self,
        _device_id: &DeviceId,
        _since_day: NaiveDate,
    ) -> Result<Vec<ScratchDaily>, TelemetryHistoryRepositoryError> {
        Ok(Vec::new())
    }
}
