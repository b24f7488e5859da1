//! Telemetry ingestion pipeline.
//!
//! A report is verified, normalised and graded, then fanned out into the
//! store one write at a time. Only the checks in front of the writes can
//! fail a request: every write records its own outcome in a
//! [`PersistReport`] and never stops the writes after it, so a lost location
//! point cannot make a collar retry the whole report.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::anomaly::AnomalyDeduplicator;
use crate::domain::ports::{
    AnomalyLogRepository, DeviceStatusRepository, IngestMetrics, IngestTelemetryRequest,
    IngestTelemetryResponse, NoOpIngestMetrics, TelemetryHistoryRepository, TelemetryIngest,
    WalkSessionRepository,
};
use crate::domain::telemetry::{CanonicalStatus, normalize};
use crate::domain::{
    AnomalyEntry, Error, LocationRecord, PersistReport, ScratchDaily, ScratchEvent,
    SignatureCheck, SignatureVerifier, SleepSession, StepOutcome, WalkGrade, WalkSession,
    anti_cheat,
};

/// Grade the walk counters when the report carries a walk.
fn walk_grade(status: &CanonicalStatus) -> Option<WalkGrade> {
    (status.walk.active || status.walk.completed).then(|| anti_cheat::grade(&status.walk.metrics))
}

fn record<E: Display>(
    device_id: &crate::domain::DeviceId,
    step: &'static str,
    result: Result<(), E>,
) -> StepOutcome {
    if let Err(error) = &result {
        warn!(device_id = %device_id, step, error = %error, "telemetry write failed");
    }
    StepOutcome::from_result(result)
}

/// Ingestion service implementing [`TelemetryIngest`].
pub struct TelemetryIngestionService<S, H, A, W> {
    status_repo: Arc<S>,
    history_repo: Arc<H>,
    anomaly_log: Arc<A>,
    walk_repo: Arc<W>,
    dedup: AnomalyDeduplicator<A>,
    verifier: SignatureVerifier,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn IngestMetrics>,
}

impl<S, H, A, W> TelemetryIngestionService<S, H, A, W>
where
    A: AnomalyLogRepository,
{
    /// Create the service over its store ports.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// use collar_gateway::domain::SignatureVerifier;
    /// use collar_gateway::domain::TelemetryIngestionService;
    /// use collar_gateway::domain::ports::{
    ///     FixtureAnomalyLogRepository, FixtureDeviceStatusRepository,
    ///     FixtureTelemetryHistoryRepository, FixtureWalkSessionRepository,
    /// };
    ///
    /// let service = TelemetryIngestionService::new(
    ///     Arc::new(FixtureDeviceStatusRepository),
    ///     Arc::new(FixtureTelemetryHistoryRepository),
    ///     Arc::new(FixtureAnomalyLogRepository),
    ///     Arc::new(FixtureWalkSessionRepository),
    ///     SignatureVerifier::disabled(),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(
        status_repo: Arc<S>,
        history_repo: Arc<H>,
        anomaly_log: Arc<A>,
        walk_repo: Arc<W>,
        verifier: SignatureVerifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_repo,
            history_repo,
            dedup: AnomalyDeduplicator::new(Arc::clone(&anomaly_log)),
            anomaly_log,
            walk_repo,
            verifier,
            clock,
            metrics: Arc::new(NoOpIngestMetrics),
        }
    }

    /// Export write outcomes through `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn IngestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl<S, H, A, W> TelemetryIngestionService<S, H, A, W>
where
    S: DeviceStatusRepository,
    H: TelemetryHistoryRepository,
    A: AnomalyLogRepository,
    W: WalkSessionRepository,
{
    /// Run the write sequence for a normalised report.
    pub async fn persist(
        &self,
        status: &CanonicalStatus,
        grade: Option<WalkGrade>,
        now: DateTime<Utc>,
    ) -> PersistReport {
        let device_id = &status.device_id;
        let mut report = PersistReport {
            device_status: record(
                device_id,
                "device_status",
                self.status_repo.upsert(status, grade, now).await,
            ),
            ..PersistReport::default()
        };

        if let Some(location) = LocationRecord::from_status(status) {
            report.location = record(
                device_id,
                "location",
                self.history_repo.insert_location(&location).await,
            );
        }

        if let Some(event) = ScratchEvent::from_status(status) {
            report.scratch_event = record(
                device_id,
                "scratch_event",
                self.history_repo.insert_scratch_event(&event).await,
            );
            let daily = ScratchDaily::from_status(status, now);
            report.scratch_daily = record(
                device_id,
                "scratch_daily",
                self.history_repo.upsert_scratch_daily(&daily).await,
            );
        }

        if let Some(entry) = AnomalyEntry::from_status(status, now) {
            report.anomaly = if self
                .dedup
                .should_record(device_id, &entry.anomaly_type, now)
                .await
            {
                record(device_id, "anomaly", self.anomaly_log.insert(&entry).await)
            } else {
                debug!(
                    device_id = %device_id,
                    anomaly_type = %entry.anomaly_type,
                    "duplicate anomaly suppressed"
                );
                StepOutcome::Suppressed
            };
        }

        if status.walk.completed {
            let walk = WalkSession::completed_by_device(
                Uuid::new_v4(),
                device_id.clone(),
                status.walk.started_at,
                status.reported_at,
                status.walk.metrics,
            );
            report.walk_session = record(
                device_id,
                "walk_session",
                self.walk_repo.insert(&walk).await,
            );
        }

        if let Some(session) = SleepSession::from_status(status) {
            report.sleep_session = record(
                device_id,
                "sleep_session",
                self.history_repo.insert_sleep_session(&session).await,
            );
        }

        report
    }
}

#[async_trait]
impl<S, H, A, W> TelemetryIngest for TelemetryIngestionService<S, H, A, W>
where
    S: DeviceStatusRepository,
    H: TelemetryHistoryRepository,
    A: AnomalyLogRepository,
    W: WalkSessionRepository,
{
    async fn ingest(
        &self,
        request: IngestTelemetryRequest,
    ) -> Result<IngestTelemetryResponse, Error> {
        let check = self.verifier.verify(&request.payload);
        if !check.is_accepted() {
            warn!(?check, "telemetry rejected by signature check");
            let message = match check {
                SignatureCheck::Missing => "signature required",
                _ => "invalid signature",
            };
            return Err(Error::unauthorized(message));
        }

        let received_at = self.clock.utc();
        let status = normalize(&request.payload, received_at)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let grade = walk_grade(&status);
        let report = self.persist(&status, grade, received_at).await;

        if report.is_clean() {
            info!(device_id = %status.device_id, "telemetry ingested");
        } else {
            warn!(
                device_id = %status.device_id,
                failed_steps = ?report.failed_steps(),
                "telemetry ingested with failed writes"
            );
        }
        if let Err(error) = self.metrics.record(&report).await {
            warn!(error = %error, "ingest metrics not recorded");
        }

        Ok(IngestTelemetryResponse {
            device_id: status.device_id,
            reported_at: status.reported_at,
            report,
        })
    }
}

#[cfg(test)]
#[path = "telemetry_ingestion_service_tests.rs"]
mod tests;
