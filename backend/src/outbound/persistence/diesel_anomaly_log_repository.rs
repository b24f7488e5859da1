//! PostgreSQL-backed `AnomalyLogRepository` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AnomalyLogRepository, AnomalyLogRepositoryError};
use crate::domain::{AnomalyEntry, DeviceId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewAnomalyRow;
use super::pool::DbPool;
use super::schema::anomaly_log;

/// Diesel-backed implementation of the anomaly log port.
#[derive(Clone)]
pub struct DieselAnomalyLogRepository {
    pool: DbPool,
}

impl DieselAnomalyLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(operation: &'static str) -> impl FnOnce(diesel::result::Error) -> AnomalyLogRepositoryError {
    move |err| {
        map_diesel_error(
            err,
            operation,
            AnomalyLogRepositoryError::query,
            AnomalyLogRepositoryError::connection,
        )
    }
}

#[async_trait]
impl AnomalyLogRepository for DieselAnomalyLogRepository {
    async fn count_in_window(
        &self,
        device_id: &DeviceId,
        anomaly_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AnomalyLogRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AnomalyLogRepositoryError::connection))?;

        anomaly_log::table
            .filter(anomaly_log::device_id.eq(device_id.as_ref()))
            .filter(anomaly_log::anomaly_type.eq(anomaly_type))
            .filter(anomaly_log::detected_at.ge(from))
            .filter(anomaly_log::detected_at.lt(to))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_error("count anomalies"))
    }

    async fn insert(&self, entry: &AnomalyEntry) -> Result<(), AnomalyLogRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AnomalyLogRepositoryError::connection))?;
        let row = NewAnomalyRow {
            device_id: entry.device_id.as_ref(),
            anomaly_type: &entry.anomaly_type,
            severity: entry.severity.as_deref(),
            details: entry.details.as_ref(),
            detected_at: entry.detected_at,
        };

        diesel::insert_into(anomaly_log::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error("insert anomaly"))
    }
}
