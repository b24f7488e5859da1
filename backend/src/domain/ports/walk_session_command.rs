//! Driving port for walk start and walk end.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DeviceId, Error, WalkGrade, WalkMetrics, WalkSession};

/// Request to open a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct StartWalkRequest {
    pub device_id: DeviceId,
}

/// Identifier and start time of a new walk.
#[derive(Debug, Clone, PartialEq)]
pub struct StartWalkResponse {
    pub walk_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Counters a client may send when ending a walk.
///
/// Each absent counter falls back to the device's last reported value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkEndCounters {
    pub duration_s: Option<i64>,
    pub distance_m: Option<f64>,
    pub stops: Option<i32>,
    pub carried_s: Option<i64>,
    pub vehicle_s: Option<i64>,
    pub actual_walk_s: Option<i64>,
    pub cheat_flags: Option<i32>,
}

impl WalkEndCounters {
    /// Merge supplied counters over `fallback`, then bound the result.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::WalkMetrics;
    /// use collar_gateway::domain::ports::WalkEndCounters;
    ///
    /// let device = WalkMetrics { duration_seconds: 600, stop_count: 4, ..WalkMetrics::default() };
    /// let merged = WalkEndCounters { stops: Some(1), ..WalkEndCounters::default() }.resolve(device);
    /// assert_eq!(merged.stop_count, 1);
    /// assert_eq!(merged.duration_seconds, 600);
    /// ```
    pub fn resolve(&self, fallback: WalkMetrics) -> WalkMetrics {
        WalkMetrics {
            duration_seconds: self.duration_s.unwrap_or(fallback.duration_seconds),
            distance_metres: self.distance_m.unwrap_or(fallback.distance_metres),
            stop_count: self.stops.unwrap_or(fallback.stop_count),
            carried_seconds: self.carried_s.unwrap_or(fallback.carried_seconds),
            vehicle_seconds: self.vehicle_s.unwrap_or(fallback.vehicle_seconds),
            actual_walk_seconds: self.actual_walk_s.unwrap_or(fallback.actual_walk_seconds),
            cheat_flags: self.cheat_flags.unwrap_or(fallback.cheat_flags),
        }
        .bounded()
    }
}

/// Request to finalise a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct EndWalkRequest {
    pub device_id: DeviceId,
    pub walk_id: Uuid,
    pub counters: WalkEndCounters,
}

/// The finalised walk and its grade.
#[derive(Debug, Clone, PartialEq)]
pub struct EndWalkResponse {
    pub session: WalkSession,
    pub grade: WalkGrade,
}

/// Opens and finalises walk sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalkSessionCommand: Send + Sync {
    /// Open a walk at the current time.
    async fn start_walk(&self, request: StartWalkRequest) -> Result<StartWalkResponse, Error>;

    /// Finalise an open walk exactly once.
    async fn end_walk(&self, request: EndWalkRequest) -> Result<EndWalkResponse, Error>;
}

/// Fixture implementation that opens walks without storing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWalkSessionCommand;

#[async_trait]
impl WalkSessionCommand for FixtureWalkSessionCommand {
    async fn start_walk(&self, _request: StartWalkRequest) -> Result<StartWalkResponse, Error> {
        Ok(StartWalkResponse {
            walk_id: Uuid::new_v4(),
            started_at: Utc::now(),
        })
    }

    async fn end_walk(&self, request: EndWalkRequest) -> Result<EndWalkResponse, Error> {
        Err(Error::not_found(format!(
            "walk session {} not found",
            request.walk_id
        )))
    }
}
