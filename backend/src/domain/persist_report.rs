//! Per-step outcome of the telemetry write sequence.

use serde::Serialize;

/// What happened to one write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The write succeeded.
    Applied,
    /// The report did not call for this write.
    #[default]
    Skipped,
    /// The write was deliberately withheld (duplicate anomaly).
    Suppressed,
    /// The write was attempted and failed; later steps still ran.
    Failed { message: String },
}

impl StepOutcome {
    /// Map a store result onto an outcome.
    pub fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Applied,
            Err(error) => Self::Failed {
                message: error.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Stable label used by metrics exporters.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Skipped => "skipped",
            Self::Suppressed => "suppressed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Outcome of every write in one ingestion, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PersistReport {
    pub device_status: StepOutcome,
    pub location: StepOutcome,
    pub scratch_event: StepOutcome,
    pub scratch_daily: StepOutcome,
    pub anomaly: StepOutcome,
    pub walk_session: StepOutcome,
    pub sleep_session: StepOutcome,
}

impl PersistReport {
    /// Steps with their names, in execution order.
    pub fn steps(&self) -> [(&'static str, &StepOutcome); 7] {
        [
            ("device_status", &self.device_status),
            ("location", &self.location),
            ("scratch_event", &self.scratch_event),
            ("scratch_daily", &self.scratch_daily),
            ("anomaly", &self.anomaly),
            ("walk_session", &self.walk_session),
            ("sleep_session", &self.sleep_session),
        ]
    }

    /// Names of the steps that failed.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::{PersistReport, StepOutcome};
    ///
    /// let report = PersistReport {
    ///     device_status: StepOutcome::Applied,
    ///     location: StepOutcome::Failed { message: "timeout".into() },
    ///     ..PersistReport::default()
    /// };
    /// assert_eq!(report.failed_steps(), vec!["location"]);
    /// ```
    pub fn failed_steps(&self) -> Vec<&'static str> {
        self.steps()
            .into_iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(name, _)| name)
            .collect()
    }

    /// Whether every attempted write succeeded.
    pub fn is_clean(&self) -> bool {
        self.steps().iter().all(|(_, outcome)| !outcome.is_failed())
    }
}
