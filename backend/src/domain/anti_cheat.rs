//! Walk-quality grading and anti-cheat summaries.
//!
//! The gateway computes the grade score with a penalty policy: every walk
//! starts at 100 and loses points for stops, short duration, and short
//! distance. Devices must not send their own scores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Points removed per recorded stop.
pub const STOP_PENALTY: i64 = 5;
/// Points removed when the walk lasted less than [`MIN_DURATION_SECONDS`].
pub const SHORT_DURATION_PENALTY: i64 = 20;
/// Points removed when the walk covered less than [`MIN_DISTANCE_METRES`].
pub const SHORT_DISTANCE_PENALTY: i64 = 15;
/// Duration below which a walk counts as short.
pub const MIN_DURATION_SECONDS: i64 = 900;
/// Distance below which a walk counts as short.
pub const MIN_DISTANCE_METRES: f64 = 500.0;
/// Longest walk, in seconds, the gateway accepts from a client or device.
pub const MAX_WALK_SECONDS: i64 = 3 * 24 * 60 * 60;
/// Longest walk distance the gateway accepts.
pub const MAX_WALK_METRES: f64 = 500_000.0;
/// Most stops a single walk may record.
pub const MAX_WALK_STOPS: i32 = 10_000;

/// Letter grade for a finished walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeLetter {
    A,
    B,
    C,
    F,
}

impl GradeLetter {
    /// Map a 0-100 score to a letter with non-strict descending thresholds.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::GradeLetter;
    ///
    /// assert_eq!(GradeLetter::from_score(90), GradeLetter::A);
    /// assert_eq!(GradeLetter::from_score(49), GradeLetter::F);
    /// ```
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 90 => Self::A,
            s if s >= 70 => Self::B,
            s if s >= 50 => Self::C,
            _ => Self::F,
        }
    }

    /// Single-letter form stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::F => "F",
        }
    }
}

impl fmt::Display for GradeLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored grade letter is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grade letter: {0}")]
pub struct ParseGradeLetterError(pub String);

impl FromStr for GradeLetter {
    type Err = ParseGradeLetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            "F" | "f" => Ok(Self::F),
            other => Err(ParseGradeLetterError(other.to_owned())),
        }
    }
}

/// Anti-cheat conditions encoded in the device's cheat bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheatFlag {
    /// Bit 0: the dog was carried.
    Carried,
    /// Bit 1: movement matched a vehicle.
    Vehicle,
    /// Bit 2: too many stops.
    ExcessiveStops,
    /// Bit 3: only the leash moved.
    LeashOnly,
}

impl CheatFlag {
    /// All flags in bit order.
    pub const ALL: [Self; 4] = [
        Self::Carried,
        Self::Vehicle,
        Self::ExcessiveStops,
        Self::LeashOnly,
    ];

    /// Bit mask for this flag.
    pub fn mask(self) -> i32 {
        match self {
            Self::Carried => 1,
            Self::Vehicle => 1 << 1,
            Self::ExcessiveStops => 1 << 2,
            Self::LeashOnly => 1 << 3,
        }
    }

    /// Human-readable label used in cheat summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Carried => "carried",
            Self::Vehicle => "vehicle",
            Self::ExcessiveStops => "excessive_stops",
            Self::LeashOnly => "leash_only",
        }
    }

    /// Whether `flags` has this bit set.
    pub fn is_set(self, flags: i32) -> bool {
        flags & self.mask() != 0
    }
}

/// Comma-joined labels for the set bits, or `None` when no known bit is set.
///
/// # Examples
/// ```
/// use collar_gateway::domain::anti_cheat::cheat_summary;
///
/// assert_eq!(cheat_summary(0b0011).as_deref(), Some("carried, vehicle"));
/// assert_eq!(cheat_summary(0), None);
/// ```
pub fn cheat_summary(flags: i32) -> Option<String> {
    let labels: Vec<&str> = CheatFlag::ALL
        .iter()
        .filter(|flag| flag.is_set(flags))
        .map(|flag| flag.label())
        .collect();
    (!labels.is_empty()).then(|| labels.join(", "))
}

/// Raw walk counters fed into the grader.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WalkMetrics {
    pub duration_seconds: i64,
    pub distance_metres: f64,
    pub stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
}

impl WalkMetrics {
    /// Counters pulled into their plausible ranges.
    ///
    /// Durations land in `0..=MAX_WALK_SECONDS`, stops in
    /// `0..=MAX_WALK_STOPS`, and a non-finite distance counts as zero.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::WalkMetrics;
    ///
    /// let hostile = WalkMetrics {
    ///     duration_seconds: i64::MAX,
    ///     stop_count: -4,
    ///     ..WalkMetrics::default()
    /// };
    /// let bounded = hostile.bounded();
    /// assert_eq!(bounded.duration_seconds, 259_200);
    /// assert_eq!(bounded.stop_count, 0);
    /// ```
    #[must_use]
    pub fn bounded(self) -> Self {
        let seconds = |value: i64| value.clamp(0, MAX_WALK_SECONDS);
        let distance_metres = if self.distance_metres.is_finite() {
            self.distance_metres.clamp(0.0, MAX_WALK_METRES)
        } else {
            0.0
        };
        Self {
            duration_seconds: seconds(self.duration_seconds),
            distance_metres,
            stop_count: self.stop_count.clamp(0, MAX_WALK_STOPS),
            carried_seconds: seconds(self.carried_seconds),
            vehicle_seconds: seconds(self.vehicle_seconds),
            actual_walk_seconds: seconds(self.actual_walk_seconds),
            cheat_flags: self.cheat_flags,
        }
    }
}

/// Derived walk quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkGrade {
    pub grade: GradeLetter,
    pub score: i32,
    pub carried_percent: f64,
    pub actual_walk_percent: f64,
    pub vehicle_detected: bool,
    pub cheat_summary: Option<String>,
}

/// Penalty score clamped to `0..=100`.
///
/// # Examples
/// ```
/// use collar_gateway::domain::anti_cheat::penalty_score;
///
/// assert_eq!(penalty_score(800, 600.0, 2), 70);
/// assert_eq!(penalty_score(3_600, 2_000.0, 30), 0);
/// ```
pub fn penalty_score(duration_seconds: i64, distance_metres: f64, stop_count: i32) -> i32 {
    let mut score = 100_i64 - STOP_PENALTY * i64::from(stop_count.max(0));
    if duration_seconds < MIN_DURATION_SECONDS {
        score -= SHORT_DURATION_PENALTY;
    }
    if distance_metres < MIN_DISTANCE_METRES {
        score -= SHORT_DISTANCE_PENALTY;
    }
    i32::try_from(score.clamp(0, 100)).unwrap_or(0)
}

/// Share of the walk spent in a given state, against a one-second floor.
///
/// The value is rounded to one decimal place and deliberately not capped:
/// counters that exceed the total duration surface as values above 100.
///
/// # Examples
/// ```
/// use collar_gateway::domain::anti_cheat::percent_of;
///
/// assert_eq!(percent_of(30, 0), 3000.0);
/// assert_eq!(percent_of(1, 3), 33.3);
/// ```
pub fn percent_of(part_seconds: i64, total_seconds: i64) -> f64 {
    let total = total_seconds.max(1) as f64;
    let raw = 100.0 * part_seconds as f64 / total;
    (raw * 10.0).round() / 10.0
}

/// Grade a walk from its counters.
pub fn grade(metrics: &WalkMetrics) -> WalkGrade {
    let score = penalty_score(
        metrics.duration_seconds,
        metrics.distance_metres,
        metrics.stop_count,
    );
    WalkGrade {
        grade: GradeLetter::from_score(score),
        score,
        carried_percent: percent_of(metrics.carried_seconds, metrics.duration_seconds),
        actual_walk_percent: percent_of(metrics.actual_walk_seconds, metrics.duration_seconds),
        vehicle_detected: CheatFlag::Vehicle.is_set(metrics.cheat_flags),
        cheat_summary: cheat_summary(metrics.cheat_flags),
    }
}
