//! Port for the anomaly log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AnomalyEntry, DeviceId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by anomaly log adapters.
    pub enum AnomalyLogRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "anomaly log connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "anomaly log query failed: {message}",
    }
}

/// Port for counting and appending anomaly entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnomalyLogRepository: Send + Sync {
    /// Count entries for a device and type detected in `[from, to)`.
    async fn count_in_window(
        &self,
        device_id: &DeviceId,
        anomaly_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AnomalyLogRepositoryError>;

    /// Append an entry.
    async fn insert(&self, entry: &AnomalyEntry) -> Result<(), AnomalyLogRepositoryError>;
}

/// Fixture implementation with an always-empty log.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAnomalyLogRepository;

#[async_trait]
impl AnomalyLogRepository for FixtureAnomalyLogRepository {
    async fn count_in_window(
        &self,
        _device_id: &DeviceId,
        _anomaly_type: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<i64, AnomalyLogRepositoryError> {
        Ok(0)
    }

    async fn insert(&self, _entry: &AnomalyEntry) -> Result<(), AnomalyLogRepositoryError> {
        Ok(())
    }
}
