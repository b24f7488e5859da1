//! Inline rollups served alongside history reads.

use serde::{Deserialize, Serialize};

use crate::domain::{CheatFlag, GradeLetter, ScratchDaily, SleepSession, WalkSession};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| round1(sum / f64::from(count)))
}

/// Sleep totals over a window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SleepSummary {
    pub session_count: usize,
    pub total_minutes: i64,
    pub average_minutes: Option<f64>,
    pub average_quality: Option<f64>,
}

impl SleepSummary {
    pub fn from_sessions(sessions: &[SleepSession]) -> Self {
        Self {
            session_count: sessions.len(),
            total_minutes: sessions.iter().map(|s| i64::from(s.minutes)).sum(),
            average_minutes: mean(sessions.iter().map(|s| f64::from(s.minutes))),
            average_quality: mean(sessions.iter().filter_map(|s| s.quality.map(f64::from))),
        }
    }
}

/// Scratch totals over a window of daily rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScratchSummary {
    pub days_recorded: usize,
    pub total_scratches: i64,
    pub average_per_day: Option<f64>,
    pub peak_frequency_hz: Option<f64>,
}

impl ScratchSummary {
    pub fn from_days(days: &[ScratchDaily]) -> Self {
        Self {
            days_recorded: days.len(),
            total_scratches: days.iter().map(|d| i64::from(d.scratch_count)).sum(),
            average_per_day: mean(days.iter().map(|d| f64::from(d.scratch_count))),
            peak_frequency_hz: days
                .iter()
                .filter_map(|d| d.peak_frequency_hz)
                .reduce(f64::max),
        }
    }
}

/// Walks per grade letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradeCounts {
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub f: i64,
}

impl GradeCounts {
    fn record(&mut self, letter: GradeLetter) {
        match letter {
            GradeLetter::A => self.a += 1,
            GradeLetter::B => self.b += 1,
            GradeLetter::C => self.c += 1,
            GradeLetter::F => self.f += 1,
        }
    }
}

/// Walk totals over a window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalkSummary {
    pub walk_count: usize,
    pub completed_count: usize,
    pub total_duration_s: i64,
    pub total_distance_m: f64,
    pub average_score: Option<f64>,
    pub grade_counts: GradeCounts,
}

impl WalkSummary {
    pub fn from_walks(walks: &[WalkSession]) -> Self {
        let completed: Vec<&WalkSession> = walks.iter().filter(|w| w.ended_at.is_some()).collect();
        let mut grade_counts = GradeCounts::default();
        for grade in completed.iter().filter_map(|w| w.grade.as_ref()) {
            grade_counts.record(grade.grade);
        }
        Self {
            walk_count: walks.len(),
            completed_count: completed.len(),
            total_duration_s: completed
                .iter()
                .fold(0_i64, |total, w| total.saturating_add(w.metrics.duration_seconds)),
            total_distance_m: round1(completed.iter().map(|w| w.metrics.distance_metres).sum()),
            average_score: mean(
                completed
                    .iter()
                    .filter_map(|w| w.grade.as_ref().map(|g| f64::from(g.score))),
            ),
            grade_counts,
        }
    }
}

/// Where a walker-stats aggregate was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    /// The store ran the aggregate query.
    Server,
    /// The aggregate query failed and the gateway folded the raw walks.
    Client,
}

/// Anti-cheat aggregate over graded walks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalkerStatsTotals {
    pub total_walks: i64,
    pub grade_counts: GradeCounts,
    pub average_score: Option<f64>,
    pub average_carried_percent: Option<f64>,
    pub average_actual_walk_percent: Option<f64>,
    pub carried_incidents: i64,
    pub vehicle_incidents: i64,
    pub excessive_stop_incidents: i64,
    pub leash_only_incidents: i64,
}

impl WalkerStatsTotals {
    /// Fold graded walks; open or ungraded walks are ignored.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::WalkerStatsTotals;
    ///
    /// let totals = WalkerStatsTotals::from_walks(&[]);
    /// assert_eq!(totals.total_walks, 0);
    /// assert_eq!(totals.average_score, None);
    /// ```
    pub fn from_walks(walks: &[WalkSession]) -> Self {
        let graded: Vec<_> = walks
            .iter()
            .filter(|w| w.ended_at.is_some())
            .filter_map(|w| w.grade.as_ref().map(|g| (w, g)))
            .collect();
        let mut totals = Self {
            total_walks: i64::try_from(graded.len()).unwrap_or(i64::MAX),
            average_score: mean(graded.iter().map(|(_, g)| f64::from(g.score))),
            average_carried_percent: mean(graded.iter().map(|(_, g)| g.carried_percent)),
            average_actual_walk_percent: mean(graded.iter().map(|(_, g)| g.actual_walk_percent)),
            ..Self::default()
        };
        for (walk, grade) in &graded {
            totals.grade_counts.record(grade.grade);
            let flags = walk.metrics.cheat_flags;
            let incidents = [
                (CheatFlag::Carried, &mut totals.carried_incidents),
                (CheatFlag::Vehicle, &mut totals.vehicle_incidents),
                (CheatFlag::ExcessiveStops, &mut totals.excessive_stop_incidents),
                (CheatFlag::LeashOnly, &mut totals.leash_only_incidents),
            ];
            for (flag, counter) in incidents {
                if flag.is_set(flags) {
                    *counter += 1;
                }
            }
        }
        totals
    }
}

/// Walker stats response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerStats {
    pub device_id: String,
    pub days: u32,
    #[serde(flatten)]
    pub totals: WalkerStatsTotals,
    pub source: StatsSource,
}
