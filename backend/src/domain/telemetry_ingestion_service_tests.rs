//! Tests for the telemetry ingestion pipeline.

use std::sync::Arc;

use chrono::TimeZone;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    AnomalyLogRepositoryError, DeviceStatusRepositoryError, IngestMetricsError,
    MockAnomalyLogRepository, MockDeviceStatusRepository, MockIngestMetrics,
    MockTelemetryHistoryRepository, MockWalkSessionRepository, TelemetryHistoryRepositoryError,
};
use crate::domain::signature::{SIGNATURE_FIELD, compute_signature, encode_signature};
use crate::domain::{GradeLetter, WalkSource};
use crate::test_support::FixtureClock;

type Service = TelemetryIngestionService<
    MockDeviceStatusRepository,
    MockTelemetryHistoryRepository,
    MockAnomalyLogRepository,
    MockWalkSessionRepository,
>;

struct Mocks {
    status: MockDeviceStatusRepository,
    history: MockTelemetryHistoryRepository,
    anomaly: MockAnomalyLogRepository,
    walks: MockWalkSessionRepository,
}

impl Mocks {
    fn into_service(self, verifier: SignatureVerifier) -> Service {
        TelemetryIngestionService::new(
            Arc::new(self.status),
            Arc::new(self.history),
            Arc::new(self.anomaly),
            Arc::new(self.walks),
            verifier,
            Arc::new(FixtureClock::at(now())),
        )
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 20, 18, 45, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        status: MockDeviceStatusRepository::new(),
        history: MockTelemetryHistoryRepository::new(),
        anomaly: MockAnomalyLogRepository::new(),
        walks: MockWalkSessionRepository::new(),
    }
}

fn request(payload: Value) -> IngestTelemetryRequest {
    IngestTelemetryRequest { payload }
}

#[rstest]
#[tokio::test]
async fn rejects_bad_signature_before_any_write(mut mocks: Mocks) {
    mocks.status.expect_upsert().times(0);
    let service = mocks.into_service(SignatureVerifier::new(Some("secret".to_owned())));

    let error = service
        .ingest(request(json!({ "device_id": "collar-01", "signature": "deadbeef" })))
        .await
        .expect_err("signature mismatch");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "invalid signature");
}

#[rstest]
#[tokio::test]
async fn missing_signature_is_unauthorized_when_key_set(mut mocks: Mocks) {
    mocks.status.expect_upsert().times(0);
    let service = mocks.into_service(SignatureVerifier::new(Some("secret".to_owned())));

    let error = service
        .ingest(request(json!({ "device_id": "collar-01" })))
        .await
        .expect_err("signature missing");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "signature required");
}

#[rstest]
#[tokio::test]
async fn accepts_correctly_signed_report(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .times(1)
        .return_once(|_, _, _| Ok(()));
    let service = mocks.into_service(SignatureVerifier::new(Some("secret".to_owned())));
    let mut payload = json!({ "device_id": "collar-01", "battery": 55 });
    let signature = encode_signature(compute_signature(&payload, "secret"));
    payload[SIGNATURE_FIELD] = json!(signature);

    let response = service.ingest(request(payload)).await.expect("accepted");

    assert_eq!(response.device_id.as_ref(), "collar-01");
    assert_eq!(response.report.device_status, StepOutcome::Applied);
}

#[rstest]
#[tokio::test]
async fn missing_device_id_is_invalid_request(mut mocks: Mocks) {
    mocks.status.expect_upsert().times(0);
    let service = mocks.into_service(SignatureVerifier::disabled());

    let error = service
        .ingest(request(json!({ "lat": 1.0 })))
        .await
        .expect_err("device id required");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn location_failure_does_not_fail_the_report(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .times(1)
        .return_once(|_, _, _| Ok(()));
    mocks
        .history
        .expect_insert_location()
        .times(1)
        .return_once(|_| Err(TelemetryHistoryRepositoryError::query("disk full")));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({
            "device_id": "collar-01", "lat": 51.5, "lng": -0.12, "gps_valid": true
        })))
        .await
        .expect("report still accepted");

    assert_eq!(response.report.device_status, StepOutcome::Applied);
    assert!(response.report.location.is_failed());
    assert_eq!(response.report.failed_steps(), vec!["location"]);
}

#[rstest]
#[tokio::test]
async fn status_failure_does_not_abort_later_writes(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .times(1)
        .return_once(|_, _, _| Err(DeviceStatusRepositoryError::connection("refused")));
    mocks
        .history
        .expect_insert_scratch_event()
        .times(1)
        .return_once(|_| Ok(()));
    mocks
        .history
        .expect_upsert_scratch_daily()
        .withf(|daily| daily.scratch_count == 6)
        .times(1)
        .return_once(|_| Ok(()));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({
            "device_id": "collar-01", "scratch_detected": true, "scratch_count": 6
        })))
        .await
        .expect("report still accepted");

    assert!(response.report.device_status.is_failed());
    assert_eq!(response.report.scratch_event, StepOutcome::Applied);
    assert_eq!(response.report.scratch_daily, StepOutcome::Applied);
    assert_eq!(response.report.location, StepOutcome::Skipped);
}

#[rstest]
#[case(0, StepOutcome::Applied, 1)]
#[case(1, StepOutcome::Suppressed, 0)]
#[tokio::test]
async fn anomalies_are_deduplicated_per_day(
    mut mocks: Mocks,
    #[case] existing: i64,
    #[case] expected: StepOutcome,
    #[case] inserts: usize,
) {
    mocks
        .status
        .expect_upsert()
        .return_once(|_, _, _| Ok(()));
    mocks
        .anomaly
        .expect_count_in_window()
        .times(1)
        .return_once(move |_, _, _, _| Ok(existing));
    mocks
        .anomaly
        .expect_insert()
        .withf(|entry| entry.anomaly_type == "escape" && entry.detected_at == now())
        .times(inserts)
        .returning(|_| Ok(()));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({ "device_id": "collar-01", "anomaly_type": "escape" })))
        .await
        .expect("accepted");

    assert_eq!(response.report.anomaly, expected);
}

#[rstest]
#[tokio::test]
async fn anomaly_insert_failure_is_recorded(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .return_once(|_, _, _| Ok(()));
    mocks
        .anomaly
        .expect_count_in_window()
        .return_once(|_, _, _, _| Ok(0));
    mocks
        .anomaly
        .expect_insert()
        .return_once(|_| Err(AnomalyLogRepositoryError::query("constraint")));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({ "device_id": "collar-01", "anomaly": { "type": "fall" } })))
        .await
        .expect("accepted");

    assert!(response.report.anomaly.is_failed());
}

#[rstest]
#[tokio::test]
async fn active_walk_grade_reaches_status_upsert(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .withf(|_, grade, updated_at| {
            grade.as_ref().map(|g| (g.grade, g.score)) == Some((GradeLetter::B, 70))
                && *updated_at == now()
        })
        .times(1)
        .return_once(|_, _, _| Ok(()));
    let service = mocks.into_service(SignatureVerifier::disabled());

    service
        .ingest(request(json!({
            "device_id": "collar-01",
            "walk": { "active": true, "duration_s": 800, "distance_m": 600.0, "stops": 2 }
        })))
        .await
        .expect("accepted");
}

#[rstest]
#[tokio::test]
async fn completed_walk_is_stored_as_device_session(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .return_once(|_, _, _| Ok(()));
    mocks
        .walks
        .expect_insert()
        .withf(|walk| {
            walk.source == WalkSource::Device
                && walk.ended_at.is_some()
                && walk.grade.as_ref().map(|g| g.score) == Some(100)
        })
        .times(1)
        .return_once(|_| Ok(()));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({
            "device_id": "collar-01",
            "walk_completed": true, "walk_duration": 1800, "walk_distance": 2400.0
        })))
        .await
        .expect("accepted");

    assert_eq!(response.report.walk_session, StepOutcome::Applied);
}

#[rstest]
#[tokio::test]
async fn completed_sleep_session_is_stored(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .return_once(|_, _, _| Ok(()));
    mocks
        .history
        .expect_insert_sleep_session()
        .withf(|session| session.minutes == 90)
        .times(1)
        .return_once(|_| Ok(()));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({
            "device_id": "collar-01",
            "sleep_session_start": "2026-08-20T12:00:00Z",
            "sleep_session_end": "2026-08-20T13:30:00Z"
        })))
        .await
        .expect("accepted");

    assert_eq!(response.report.sleep_session, StepOutcome::Applied);
    assert!(response.report.is_clean());
}

#[rstest]
#[tokio::test]
async fn report_timestamp_defaults_to_receive_time(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .return_once(|_, _, _| Ok(()));
    let service = mocks.into_service(SignatureVerifier::disabled());

    let response = service
        .ingest(request(json!({ "device_id": "collar-01" })))
        .await
        .expect("accepted");

    assert_eq!(response.reported_at, now());
}

#[rstest]
#[tokio::test]
async fn write_outcomes_reach_metrics(mut mocks: Mocks) {
    mocks
        .status
        .expect_upsert()
        .return_once(|_, _, _| Err(DeviceStatusRepositoryError::connection("reset")));
    let mut metrics = MockIngestMetrics::new();
    metrics
        .expect_record()
        .withf(|report| report.failed_steps() == vec!["device_status"])
        .times(1)
        .return_once(|_| Ok(()));
    let service = mocks
        .into_service(SignatureVerifier::disabled())
        .with_metrics(Arc::new(metrics));

    service
        .ingest(request(json!({ "device_id": "collar-01" })))
        .await
        .expect("accepted");
}

#[rstest]
#[tokio::test]
async fn metrics_failure_does_not_fail_the_report(mut mocks: Mocks) {
    mocks.status.expect_upsert().return_once(|_, _, _| Ok(()));
    let mut metrics = MockIngestMetrics::new();
    metrics
        .expect_record()
        .return_once(|_| Err(IngestMetricsError::export("registry gone")));
    let service = mocks
        .into_service(SignatureVerifier::disabled())
        .with_metrics(Arc::new(metrics));

    let response = service
        .ingest(request(json!({ "device_id": "collar-01" })))
        .await
        .expect("accepted");

    assert!(response.report.is_clean());
}
