//! Driving port for device read endpoints.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{
    DayWindow, DeviceId, DeviceStatusSnapshot, Error, LocationRecord, LocationWindow,
    ScratchDaily, ScratchSummary, SleepSession, SleepSummary, WalkSession, WalkSummary,
    WalkerStats,
};

/// Recent location points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationHistory {
    pub device_id: DeviceId,
    pub count: usize,
    pub locations: Vec<LocationRecord>,
}

/// Sleep sessions with a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepHistory {
    pub device_id: DeviceId,
    pub sessions: Vec<SleepSession>,
    pub summary: SleepSummary,
}

/// Daily scratch rows with a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScratchHistory {
    pub device_id: DeviceId,
    pub daily: Vec<ScratchDaily>,
    pub summary: ScratchSummary,
}

/// Walks with a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkHistory {
    pub device_id: DeviceId,
    pub walks: Vec<WalkSession>,
    pub summary: WalkSummary,
}

/// Read access to a device's snapshot and history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceQuery: Send + Sync {
    /// Latest snapshot; `NotFound` when the device never reported.
    async fn status(&self, device_id: &DeviceId) -> Result<DeviceStatusSnapshot, Error>;

    async fn locations(
        &self,
        device_id: &DeviceId,
        window: LocationWindow,
    ) -> Result<LocationHistory, Error>;

    async fn sleep(&self, device_id: &DeviceId, window: DayWindow) -> Result<SleepHistory, Error>;

    async fn scratches(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
    ) -> Result<ScratchHistory, Error>;

    async fn walks(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
        limit: u32,
    ) -> Result<WalkHistory, Error>;

    /// Anti-cheat aggregate, computed by the store when possible.
    async fn walker_stats(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
    ) -> Result<WalkerStats, Error>;
}

/// Fixture implementation with no devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDeviceQuery;

#[async_trait]
impl DeviceQuery for FixtureDeviceQuery {
    async fn status(&self, device_id: &DeviceId) -> Result<DeviceStatusSnapshot, Error> {
        Err(Error::not_found(format!("device {device_id} not found")))
    }

    async fn locations(
        &self,
        device_id: &DeviceId,
        _window: LocationWindow,
    ) -> Result<LocationHistory, Error> {
        Ok(LocationHistory {
            device_id: device_id.clone(),
            count: 0,
            locations: Vec::new(),
        })
    }

    async fn sleep(&self, device_id: &DeviceId, _window: DayWindow) -> Result<SleepHistory, Error> {
        Ok(SleepHistory {
            device_id: device_id.clone(),
            sessions: Vec::new(),
            summary: SleepSummary::default(),
        })
    }

    async fn scratches(
        &self,
        device_id: &DeviceId,
        _window: DayWindow,
    ) -> Result<ScratchHistory, Error> {
        Ok(ScratchHistory {
            device_id: device_id.clone(),
            daily: Vec::new(),
            summary: ScratchSummary::default(),
        })
    }

    async fn walks(
        &self,
        device_id: &DeviceId,
        _window: DayWindow,
        _limit: u32,
    ) -> Result<WalkHistory, Error> {
        Ok(WalkHistory {
            device_id: device_id.clone(),
            walks: Vec::new(),
            summary: WalkSummary::default(),
        })
    }

    async fn walker_stats(
        &self,
        device_id: &DeviceId,
        window: DayWindow,
    ) -> Result<WalkerStats, Error> {
        Ok(WalkerStats {
            device_id: device_id.to_string(),
            days: window.days(),
            totals: Default::default(),
            source: crate::domain::StatsSource::Server,
        })
    }
}
