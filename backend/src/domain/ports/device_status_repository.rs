//! Port for the one-row-per-device status snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::telemetry::CanonicalStatus;
use crate::domain::{DeviceId, DeviceStatusSnapshot, WalkGrade};

use super::define_port_error;

define_port_error! {
    /// Errors raised by device status repository adapters.
    pub enum DeviceStatusRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "device status repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "device status repository query failed: {message}",
    }
}

/// Port for writing and reading device snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceStatusRepository: Send + Sync {
    /// Insert or overwrite the snapshot keyed by the status' device id.
    ///
    /// Optional readings absent from `status` keep their stored value.
    async fn upsert(
        &self,
        status: &CanonicalStatus,
        grade: Option<WalkGrade>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DeviceStatusRepositoryError>;

    /// Read the latest snapshot for a device.
    async fn find(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceStatusSnapshot>, DeviceStatusRepositoryError>;
}

/// Fixture implementation for tests that do not exercise status persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDeviceStatusRepository;

#[async_trait]
impl DeviceStatusRepository for FixtureDeviceStatusRepository {
    async fn upsert(
        &self,
        _status: &CanonicalStatus,
        _grade: Option<WalkGrade>,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), DeviceStatusRepositoryError> {
        Ok(())
    }

    async fn find(
        &self,
        _device_id: &DeviceId,
    ) -> Result<Option<DeviceStatusSnapshot>, DeviceStatusRepositoryError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_find_returns_none() {
        let repo = FixtureDeviceStatusRepository;
        let id = DeviceId::new("collar-01").expect("valid id");
        let found = repo.find(&id).await.expect("fixture lookup succeeds");
        assert!(found.is_none());
    }

    #[rstest]
    fn connection_error_formats_message() {
        let err = DeviceStatusRepositoryError::connection("pool timed out");
        assert!(err.to_string().contains("pool timed out"));
    }
}
