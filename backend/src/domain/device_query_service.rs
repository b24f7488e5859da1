//! Device read service: snapshot, history and inline rollups.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::warn;

use crate::domain::ports::{
    DeviceQuery, DeviceStatusRepository, DeviceStatusRepositoryError, LocationHistory,
    ScratchHistory, SleepHistory, TelemetryHistoryRepository, TelemetryHistoryRepositoryError,
    WalkHistory, WalkSessionRepository,
};
use crate::domain::walk_session_service::map_walk_repository_error;
use crate::domain::{
    DayWindow, DeviceId, DeviceStatusSnapshot, Error, LocationWindow, ScratchSummary,
    SleepSummary, StatsSource, WalkSummary, WalkerStats, WalkerStatsTotals,
};

/// Upper bound on walks folded by the client-side stats fallback.
const STATS_FALLBACK_LIMIT: i64 = 10_000;

fn map_status_error(error: DeviceStatusRepositoryError) -> Error {
    match error {
        DeviceStatusRepositoryError::Connection { message } => {
            Error::dependency_unavailable(format!("device status unavailable: {message}"))
        }
        DeviceStatusRepositoryError::Query { message } => {
            Error::internal(format!("device status error: {message}"))
        }
    }
}

fn map_history_error(error: TelemetryHistoryRepositoryError) -> Error {
    match error {
        TelemetryHistoryRepositoryError::Connection { message } => {
            Error::dependency_unavailable(format!("telemetry history unavailable: {message}"))
        }
        TelemetryHistoryRepositoryError::Query { message } => {
            Error::internal(format!("telemetry history error: {message}"))
        }
    }
}

/// Service implementing [`DeviceQuery`].
#[derive(Clone)]
pub struct DeviceQueryService<S, H, W> {
    status_repo: Arc<S>,
    history_repo: Arc<H>,
    walk_repo: Arc<W>,
    clock: Arc<dyn Clock>,
}

impl<S, H, W> DeviceQueryService<S, H, W> {
    pub fn new(
        status_repo: Arc<S>,
        history_repo: Arc<H>,
        walk_repo: Arc<W>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_repo,
            history_repo,
            walk_repo,
            clock,
        }
    }
}

#[async_trait]
impl<S, H, W> DeviceQuery for DeviceQueryService<S, H, W>
where
    S: DeviceStatusRepository,
    H: TelemetryHistoryRepository,
    W: WalkSessionRepository,
{
    async fn status(&self, device_id: &DeviceId) -> Result<DeviceStatusSnapshot, Error> {
        self.status_repo
            .find(device_id)
            .await
            .map_err(map_status_error)?
            .ok_or_else(|| Error::not_found(format!("device {device_id} not found")))
    }

    async fn locations(
        &self,
        device_id: &DeviceId,
        window: LocationWindow,
    ) -> Result<LocationHistory, Error> {
        let locations = self
            .history_repo
            .list_locations(
                device_id,
                window.since(self.clock.utc()),
                i64::from(window.limit),
            )
            .await
            .map_err(map_history_error)?;
        Ok(LocationHistory {
            device_id: device_id.clone(),
            count: locations.len(),
            locations,
        })
    }

    async fn sleep(&self, device_id: &DeviceId, window: DayWindow) -> Result<SleepHistory, Error> {
        let sessions = self
            .history_repo
            .list_sleep_sessions(device_id, window.since(self.clock.utc()))
            .await
            .map_err(map_history_error)?;
        Ok(SleepHistory {
            device_id: device_id.clone(),
            summary: SleepSummary::from_sessions(&sessions),
            sessions,
        })
    }

    async fn scratches(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
    ) -> Result<ScratchHistory, Error> {
        let daily = self
            .history_repo
            .list_scratch_daily(device_id, window.since_day(self.clock.utc()))
            .await
            .map_err(map_history_error)?;
        Ok(ScratchHistory {
            device_id: device_id.clone(),
            summary: ScratchSummary::from_days(&daily),
            daily,
        })
    }

    async fn walks(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
        limit: u32,
    ) -> Result<WalkHistory, Error> {
        let walks = self
            .walk_repo
            .list_for_device(device_id, window.since(self.clock.utc()), i64::from(limit))
            .await
            .map_err(map_walk_repository_error)?;
        Ok(WalkHistory {
            device_id: device_id.clone(),
            summary: WalkSummary::from_walks(&walks),
            walks,
        })
    }

    async fn walker_stats(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
    ) -> Result<WalkerStats, Error> {
        let since = window.since(self.clock.utc());
        let (totals, source) = match self.walk_repo.walker_stats(device_id, since).await {
            Ok(totals) => (totals, StatsSource::Server),
            Err(error) => {
                warn!(
                    device_id = %device_id,
                    error = %error,
                    "walker stats aggregate failed; folding walks in the gateway"
                );
                let walks = self
                    .walk_repo
                    .list_for_device(device_id, since, STATS_FALLBACK_LIMIT)
                    .await
                    .map_err(map_walk_repository_error)?;
                (WalkerStatsTotals::from_walks(&walks), StatsSource::Client)
            }
        };
        Ok(WalkerStats {
            device_id: device_id.to_string(),
            days: window.days(),
            totals,
            source,
        })
    }
}
