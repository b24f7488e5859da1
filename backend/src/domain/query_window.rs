//! Clamped time windows for history reads.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Longest history window in days.
pub const MAX_DAYS: u32 = 90;
/// Default window for sleep, scratch and walk history.
pub const DEFAULT_DAYS: u32 = 7;
/// Default window for walker stats.
pub const DEFAULT_STATS_DAYS: u32 = 30;
/// Default location window in hours.
pub const DEFAULT_HOURS: u32 = 24;
/// Longest location window in hours.
pub const MAX_HOURS: u32 = 168;
/// Default number of location points.
pub const DEFAULT_LOCATION_LIMIT: u32 = 100;
/// Largest number of location points.
pub const MAX_LOCATION_LIMIT: u32 = 1_000;
/// Default number of walks.
pub const DEFAULT_WALK_LIMIT: u32 = 50;
/// Largest number of walks.
pub const MAX_WALK_LIMIT: u32 = 500;

fn clamp_param(raw: Option<i64>, default: u32, max: u32) -> u32 {
    raw.map_or(default, |value| {
        u32::try_from(value.clamp(1, i64::from(max))).unwrap_or(default)
    })
}

/// Whole-day window ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow(u32);

impl DayWindow {
    /// Clamp a requested day count into `1..=MAX_DAYS`.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::DayWindow;
    ///
    /// assert_eq!(DayWindow::from_param(None, 7).days(), 7);
    /// assert_eq!(DayWindow::from_param(Some(0), 7).days(), 1);
    /// assert_eq!(DayWindow::from_param(Some(365), 7).days(), 90);
    /// ```
    pub fn from_param(raw: Option<i64>, default: u32) -> Self {
        Self(clamp_param(raw, default, MAX_DAYS))
    }

    pub fn days(self) -> u32 {
        self.0
    }

    /// Earliest instant inside the window.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.0))
    }

    /// Earliest UTC day inside the window.
    pub fn since_day(self, now: DateTime<Utc>) -> NaiveDate {
        self.since(now).date_naive()
    }
}

/// Hour window and row cap for location history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationWindow {
    pub hours: u32,
    pub limit: u32,
}

impl LocationWindow {
    pub fn from_params(hours: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            hours: clamp_param(hours, DEFAULT_HOURS, MAX_HOURS),
            limit: clamp_param(limit, DEFAULT_LOCATION_LIMIT, MAX_LOCATION_LIMIT),
        }
    }

    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(i64::from(self.hours))
    }
}

/// Row cap for walk history.
pub fn walk_limit(raw: Option<i64>) -> u32 {
    clamp_param(raw, DEFAULT_WALK_LIMIT, MAX_WALK_LIMIT)
}
