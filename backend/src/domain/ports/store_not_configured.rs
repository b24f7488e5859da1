//! Driving port implementations used when no store is configured.
//!
//! The gateway still starts and answers `/health`, but every store-backed
//! route reports the missing dependency instead of pretending to succeed.

use async_trait::async_trait;

use super::{
    DeviceQuery, EndWalkRequest, EndWalkResponse, IngestTelemetryRequest, IngestTelemetryResponse,
    LocationHistory, ScratchHistory, SleepHistory, StartWalkRequest, StartWalkResponse,
    TelemetryIngest, WalkHistory, WalkSessionCommand,
};
use crate::domain::{
    DayWindow, DeviceId, DeviceStatusSnapshot, Error, LocationWindow, WalkerStats,
};

const MESSAGE: &str = "telemetry store is not configured";

fn unavailable() -> Error {
    Error::dependency_unavailable(MESSAGE)
}

/// Stands in for every store-backed driving port.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreNotConfigured;

#[async_trait]
impl TelemetryIngest for StoreNotConfigured {
    async fn ingest(
        &self,
        _request: IngestTelemetryRequest,
    ) -> Result<IngestTelemetryResponse, Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl WalkSessionCommand for StoreNotConfigured {
    async fn start_walk(&self, _request: StartWalkRequest) -> Result<StartWalkResponse, Error> {
        Err(unavailable())
    }

    async fn end_walk(&self, _request: EndWalkRequest) -> Result<EndWalkResponse, Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl DeviceQuery for StoreNotConfigured {
    async fn status(&self, _device_id: &DeviceId) -> Result<DeviceStatusSnapshot, Error> {
        Err(unavailable())
    }

    async fn locations(
        &self,
        _device_id: &DeviceId,
        _window: LocationWindow,
    ) -> Result<LocationHistory, Error> {
        Err(unavailable())
    }

    async fn sleep(&self, _device_id: &DeviceId, _window: DayWindow) -> Result<SleepHistory, Error> {
        Err(unavailable())
    }

    async fn scratches(
        &self,
        _device_id: &DeviceId,
        _window: DayWindow,
    ) -> Result<ScratchHistory, Error> {
        Err(unavailable())
    }

    async fn walks(
        &self,
        _device_id: &DeviceId,
        _window: DayWindow,
        _limit: u32,
    ) -> Result<WalkHistory, Error> {
        Err(unavailable())
    }

    async fn walker_stats(
        &self,
        _device_id: &DeviceId,
        _window: DayWindow,
    ) -> Result<WalkerStats, Error> {
        Err(unavailable())
    }
}
