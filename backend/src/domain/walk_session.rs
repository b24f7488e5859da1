//! Walk session lifecycle.
//!
//! A session moves through one transition, `Open -> Ended`. Finalisation
//! grades the walk and happens exactly once; ending an ended session is an
//! error rather than a silent re-grade.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::anti_cheat::{self, MAX_WALK_SECONDS};
use crate::domain::{DeviceId, WalkGrade, WalkMetrics};

/// Who opened the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkSource {
    /// Started and ended through the walk endpoints.
    Client,
    /// Synthesised from a device report that closed a walk.
    Device,
}

impl WalkSource {
    /// Stored text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for WalkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored walk source is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown walk source: {0}")]
pub struct ParseWalkSourceError(pub String);

impl FromStr for WalkSource {
    type Err = ParseWalkSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "device" => Ok(Self::Device),
            other => Err(ParseWalkSourceError(other.to_owned())),
        }
    }
}

/// Lifecycle state derived from `ended_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Open,
    Ended,
}

/// Errors raised by lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkSessionError {
    #[error("walk session {id} already ended at {ended_at}")]
    AlreadyEnded { id: Uuid, ended_at: DateTime<Utc> },
}

/// A walk, open or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSession {
    pub id: Uuid,
    pub device_id: DeviceId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub metrics: WalkMetrics,
    pub grade: Option<WalkGrade>,
    pub source: WalkSource,
}

impl WalkSession {
    /// Open a client session at `started_at`, starting from the device's last
    /// known position when one is available.
    pub fn open(
        id: Uuid,
        device_id: DeviceId,
        started_at: DateTime<Utc>,
        start_position: Option<(f64, f64)>,
    ) -> Self {
        Self {
            id,
            device_id,
            started_at,
            ended_at: None,
            start_latitude: start_position.map(|(lat, _)| lat),
            start_longitude: start_position.map(|(_, lng)| lng),
            metrics: WalkMetrics::default(),
            grade: None,
            source: WalkSource::Client,
        }
    }

    /// Build an already finalised session from a device-reported walk.
    ///
    /// When the device omits the start time it is reconstructed from the
    /// reported duration.
    pub fn completed_by_device(
        id: Uuid,
        device_id: DeviceId,
        started_at: Option<DateTime<Utc>>,
        ended_at: DateTime<Utc>,
        metrics: WalkMetrics,
    ) -> Self {
        let metrics = metrics.bounded();
        let started_at = started_at.unwrap_or_else(|| {
            TimeDelta::try_seconds(metrics.duration_seconds)
                .and_then(|elapsed| ended_at.checked_sub_signed(elapsed))
                .unwrap_or(ended_at)
        });
        let metrics = with_elapsed_fallback(metrics, started_at, ended_at);
        Self {
            id,
            device_id,
            started_at,
            ended_at: Some(ended_at),
            start_latitude: None,
            start_longitude: None,
            grade: Some(anti_cheat::grade(&metrics)),
            metrics,
            source: WalkSource::Device,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WalkState {
        if self.ended_at.is_some() {
            WalkState::Ended
        } else {
            WalkState::Open
        }
    }

    /// Finalise an open session and grade it.
    ///
    /// A zero or negative duration falls back to the elapsed wall time.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, Utc};
    /// use collar_gateway::domain::{DeviceId, WalkMetrics, WalkSession, WalkState};
    /// use uuid::Uuid;
    ///
    /// let started = Utc::now();
    /// let device = DeviceId::new("collar-01").expect("valid id");
    /// let mut walk = WalkSession::open(Uuid::new_v4(), device, started, None);
    /// let grade = walk
    ///     .finish(started + Duration::minutes(20), WalkMetrics { distance_metres: 1_500.0, ..WalkMetrics::default() })
    ///     .expect("open walk");
    /// assert_eq!(walk.state(), WalkState::Ended);
    /// assert_eq!(walk.metrics.duration_seconds, 1_200);
    /// assert_eq!(grade.score, 100);
    /// assert!(walk.finish(Utc::now(), WalkMetrics::default()).is_err());
    /// ```
    pub fn finish(
        &mut self,
        ended_at: DateTime<Utc>,
        metrics: WalkMetrics,
    ) -> Result<WalkGrade, WalkSessionError> {
        if let Some(previous) = self.ended_at {
            return Err(WalkSessionError::AlreadyEnded {
                id: self.id,
                ended_at: previous,
            });
        }
        let metrics = with_elapsed_fallback(metrics, self.started_at, ended_at);
        let grade = anti_cheat::grade(&metrics);
        self.ended_at = Some(ended_at);
        self.metrics = metrics;
        self.grade = Some(grade.clone());
        Ok(grade)
    }
}

fn with_elapsed_fallback(
    metrics: WalkMetrics,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> WalkMetrics {
    let mut metrics = metrics.bounded();
    if metrics.duration_seconds <= 0 {
        metrics.duration_seconds = ended_at
            .signed_duration_since(started_at)
            .num_seconds()
            .clamp(0, MAX_WALK_SECONDS);
    }
    metrics
}

#[cfg(test)]
mod tests {
    //! State machine coverage.

    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    #[fixture]
    fn open_walk(started_at: DateTime<Utc>) -> WalkSession {
        WalkSession::open(
            Uuid::new_v4(),
            DeviceId::new("collar-01").expect("valid id"),
            started_at,
            Some((51.5, -0.12)),
        )
    }

    #[rstest]
    fn open_session_records_start_position(open_walk: WalkSession) {
        assert_eq!(open_walk.state(), WalkState::Open);
        assert_eq!(open_walk.start_latitude, Some(51.5));
        assert_eq!(open_walk.start_longitude, Some(-0.12));
        assert_eq!(open_walk.source, WalkSource::Client);
        assert!(open_walk.grade.is_none());
    }

    #[rstest]
    fn finishing_keeps_reported_duration(mut open_walk: WalkSession, started_at: DateTime<Utc>) {
        let grade = open_walk
            .finish(
                started_at + Duration::minutes(30),
                WalkMetrics {
                    duration_seconds: 800,
                    distance_metres: 600.0,
                    stop_count: 2,
                    ..WalkMetrics::default()
                },
            )
            .expect("open walk finishes");

        assert_eq!(grade.score, 70);
        assert_eq!(open_walk.metrics.duration_seconds, 800);
        assert_eq!(open_walk.grade, Some(grade));
    }

    #[rstest]
    fn second_finish_is_rejected_without_changes(
        mut open_walk: WalkSession,
        started_at: DateTime<Utc>,
    ) {
        let first_end = started_at + Duration::minutes(10);
        open_walk
            .finish(first_end, WalkMetrics::default())
            .expect("first finish");
        let snapshot = open_walk.clone();

        let error = open_walk
            .finish(first_end + Duration::minutes(5), WalkMetrics::default())
            .expect_err("second finish rejected");

        assert_eq!(
            error,
            WalkSessionError::AlreadyEnded {
                id: open_walk.id,
                ended_at: first_end
            }
        );
        assert_eq!(open_walk, snapshot);
    }

    #[rstest]
    fn device_walk_reconstructs_start_from_duration(started_at: DateTime<Utc>) {
        let ended_at = started_at + Duration::minutes(25);
        let walk = WalkSession::completed_by_device(
            Uuid::new_v4(),
            DeviceId::new("collar-01").expect("valid id"),
            None,
            ended_at,
            WalkMetrics {
                duration_seconds: 1_500,
                distance_metres: 2_000.0,
                ..WalkMetrics::default()
            },
        );
        assert_eq!(walk.started_at, started_at);
        assert_eq!(walk.state(), WalkState::Ended);
        assert_eq!(walk.source, WalkSource::Device);
        assert_eq!(walk.grade.map(|g| g.score), Some(100));
    }

    #[rstest]
    #[case(10_000_000_000_000)]
    #[case(i64::MAX)]
    fn device_walk_with_huge_duration_is_bounded(
        started_at: DateTime<Utc>,
        #[case] duration: i64,
    ) {
        let ended_at = started_at + Duration::hours(1);
        let walk = WalkSession::completed_by_device(
            Uuid::new_v4(),
            DeviceId::new("collar-01").expect("valid id"),
            None,
            ended_at,
            WalkMetrics {
                duration_seconds: duration,
                stop_count: i32::MAX,
                ..WalkMetrics::default()
            },
        );
        assert_eq!(walk.metrics.duration_seconds, MAX_WALK_SECONDS);
        assert_eq!(walk.metrics.stop_count, anti_cheat::MAX_WALK_STOPS);
        assert_eq!(walk.started_at, ended_at - Duration::seconds(MAX_WALK_SECONDS));
        assert_eq!(walk.grade.map(|g| g.score), Some(0));
    }

    #[rstest]
    fn device_walk_start_falls_back_to_end_at_the_calendar_floor() {
        let ended_at = DateTime::<Utc>::MIN_UTC;
        let walk = WalkSession::completed_by_device(
            Uuid::new_v4(),
            DeviceId::new("collar-01").expect("valid id"),
            None,
            ended_at,
            WalkMetrics {
                duration_seconds: 600,
                ..WalkMetrics::default()
            },
        );
        assert_eq!(walk.started_at, ended_at);
        assert_eq!(walk.metrics.duration_seconds, 600);
    }

    #[rstest]
    fn negative_counters_fall_back_to_elapsed_time(
        mut open_walk: WalkSession,
        started_at: DateTime<Utc>,
    ) {
        open_walk
            .finish(
                started_at + Duration::minutes(20),
                WalkMetrics {
                    duration_seconds: -50,
                    stop_count: -3,
                    carried_seconds: -10,
                    ..WalkMetrics::default()
                },
            )
            .expect("open walk finishes");

        assert_eq!(open_walk.metrics.duration_seconds, 1_200);
        assert_eq!(open_walk.metrics.stop_count, 0);
        assert_eq!(open_walk.metrics.carried_seconds, 0);
    }

    #[rstest]
    fn elapsed_fallback_is_bounded(mut open_walk: WalkSession, started_at: DateTime<Utc>) {
        open_walk
            .finish(started_at + Duration::days(30), WalkMetrics::default())
            .expect("open walk finishes");

        assert_eq!(open_walk.metrics.duration_seconds, MAX_WALK_SECONDS);
    }

    #[rstest]
    #[case("client", Ok(WalkSource::Client))]
    #[case("device", Ok(WalkSource::Device))]
    #[case("robot", Err(ParseWalkSourceError("robot".to_owned())))]
    fn sources_parse_from_storage(
        #[case] raw: &str,
        #[case] expected: Result<WalkSource, ParseWalkSourceError>,
    ) {
        assert_eq!(raw.parse::<WalkSource>(), expected);
    }
}
