//! End-to-end ingestion through `POST /telemetry` over the in-memory store.

mod support;

use actix_web::test;
use chrono::Duration;
use collar_gateway::domain::anti_cheat::{MAX_WALK_SECONDS, MAX_WALK_STOPS};
use collar_gateway::domain::signature::{compute_signature, encode_signature};
use collar_gateway::domain::{DeviceId, SignatureVerifier};
use collar_gateway::test_support::StoreOp;
use rstest::rstest;
use serde_json::{Value, json};
use support::{Gateway, call_json, init_app};

const KEY: &str = "collar-shared-secret";

fn collar() -> DeviceId {
    DeviceId::new("collar-07").expect("valid id")
}

fn post(body: &Value) -> test::TestRequest {
    test::TestRequest::post().uri("/telemetry").set_json(body)
}

fn escape_report() -> Value {
    json!({
        "device_id": "collar-07",
        "anomaly": { "type": "escape", "severity": "high" }
    })
}

fn sign(mut payload: Value) -> Value {
    let signature = encode_signature(compute_signature(&payload, KEY));
    if let Value::Object(map) = &mut payload {
        map.insert("signature".to_owned(), Value::String(signature));
    }
    payload
}

#[actix_web::test]
async fn anomaly_is_logged_once_per_utc_day() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    for _ in 0..2 {
        let (status, body) = call_json(&app, post(&escape_report())).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
    }
    assert_eq!(gateway.store.anomalies().len(), 1);

    gateway.clock.set(support::morning() + Duration::days(1));
    let (status, _) = call_json(&app, post(&escape_report())).await;
    assert_eq!(status, 200);
    assert_eq!(gateway.store.anomalies().len(), 2);
}

#[actix_web::test]
async fn secondary_write_failure_still_acknowledges() {
    let gateway = Gateway::unsigned();
    gateway.store.fail(StoreOp::InsertLocation);
    let app = init_app(gateway.state.clone()).await;

    let (status, body) = call_json(
        &app,
        post(&json!({
            "device_id": "collar-07",
            "gps": { "lat": 51.5, "lng": -0.12, "valid": true }
        })),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["device_id"], "collar-07");
    assert!(gateway.store.locations().is_empty());
    let snapshot = gateway.store.status(&collar()).expect("status upserted");
    assert_eq!(snapshot.latitude, Some(51.5));
}

#[rstest]
#[case::flat(json!({
    "device_id": "collar-07",
    "lat": 51.5, "lng": -0.12, "gps_valid": true,
    "activity": "walking",
    "scratch_detected": true, "scratch_count": 3
}))]
#[case::nested(json!({
    "device_id": "collar-07",
    "gps": { "lat": 51.5, "lng": -0.12, "valid": true },
    "motion": { "activity": "walking" },
    "scratch": { "detected": true, "count_today": 3 }
}))]
#[actix_web::test]
async fn both_payload_shapes_land_in_the_same_records(#[case] payload: Value) {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, _) = call_json(&app, post(&payload)).await;
    assert_eq!(status, 200);

    let (status, snapshot) = call_json(
        &app,
        test::TestRequest::get().uri("/device/collar-07/status"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(snapshot["latitude"], 51.5);
    assert_eq!(snapshot["activity"], "walking");
    assert_eq!(snapshot["scratch_count_today"], 3);

    assert_eq!(gateway.store.locations().len(), 1);
    assert_eq!(gateway.store.scratch_events().len(), 1);
    let daily = gateway.store.scratch_daily();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].scratch_count, 3);
}

#[actix_web::test]
async fn device_completed_walk_feeds_walk_history() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, _) = call_json(
        &app,
        post(&json!({
            "device_id": "collar-07",
            "walk": {
                "active": false, "completed": true,
                "duration_s": 1800, "distance_m": 2500.0, "stops": 1, "cheat_flags": 0
            }
        })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, history) =
        call_json(&app, test::TestRequest::get().uri("/device/collar-07/walks")).await;
    assert_eq!(status, 200);
    let walks = history["walks"].as_array().expect("walk list");
    assert_eq!(walks.len(), 1);
    assert_eq!(walks[0]["source"], "device");
    assert!(walks[0]["grade"].is_string());

    let (status, stats) = call_json(
        &app,
        test::TestRequest::get().uri("/device/collar-07/walker-stats"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(stats["total_walks"], 1);
    assert_eq!(stats["days"], 30);
    assert_eq!(stats["source"], "server");
}

#[actix_web::test]
async fn huge_walk_duration_is_bounded() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, body) = call_json(
        &app,
        post(&json!({
            "device_id": "collar-07",
            "walk_completed": true,
            "walk_duration": 10_000_000_000_000_i64
        })),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    let walks = gateway.store.walks();
    assert_eq!(walks.len(), 1);
    assert_eq!(walks[0].metrics.duration_seconds, MAX_WALK_SECONDS);
    assert_eq!(
        walks[0].started_at,
        support::morning() - Duration::seconds(MAX_WALK_SECONDS)
    );
}

#[rstest]
#[case::negative(
    json!({ "walk_duration": -600, "walk_stops": -4, "carried_seconds": -1 }),
    3_600,
    0,
    0
)]
#[case::huge(
    json!({ "walk_duration": i64::MAX, "walk_stops": i64::MAX, "carried_seconds": i64::MAX }),
    MAX_WALK_SECONDS,
    MAX_WALK_STOPS,
    MAX_WALK_SECONDS
)]
#[actix_web::test]
async fn hostile_walk_counters_are_stored_bounded(
    #[case] counters: Value,
    #[case] duration: i64,
    #[case] stops: i32,
    #[case] carried: i64,
) {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;
    let mut payload = json!({
        "device_id": "collar-07",
        "walk_completed": true,
        "walk_started_at": "2026-05-04T07:00:00Z"
    });
    if let (Value::Object(target), Value::Object(extra)) = (&mut payload, counters) {
        target.extend(extra);
    }

    let (status, _) = call_json(&app, post(&payload)).await;

    assert_eq!(status, 200);
    let walks = gateway.store.walks();
    assert_eq!(walks.len(), 1);
    assert_eq!(walks[0].metrics.duration_seconds, duration);
    assert_eq!(walks[0].metrics.stop_count, stops);
    assert_eq!(walks[0].metrics.carried_seconds, carried);
}

#[actix_web::test]
async fn walk_history_totals_survive_maximal_durations() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;
    let report = json!({
        "device_id": "collar-07",
        "walk_completed": true,
        "walk_started_at": "2026-05-04T07:00:00Z",
        "walk_duration": i64::MAX
    });

    for _ in 0..2 {
        let (status, _) = call_json(&app, post(&report)).await;
        assert_eq!(status, 200);
    }
    let (status, history) =
        call_json(&app, test::TestRequest::get().uri("/device/collar-07/walks")).await;

    assert_eq!(status, 200);
    assert_eq!(history["walks"].as_array().map(Vec::len), Some(2));
    assert_eq!(history["summary"]["total_duration_s"], 2 * MAX_WALK_SECONDS);
}

#[actix_web::test]
async fn walker_stats_fall_back_when_the_aggregate_fails() {
    let gateway = Gateway::unsigned();
    gateway.store.fail(StoreOp::WalkerStats);
    let app = init_app(gateway.state.clone()).await;

    let (status, stats) = call_json(
        &app,
        test::TestRequest::get().uri("/device/collar-07/walker-stats?days=7"),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(stats["source"], "client");
    assert_eq!(stats["days"], 7);
    assert_eq!(stats["total_walks"], 0);
}

#[actix_web::test]
async fn signed_report_is_accepted() {
    let gateway = Gateway::new(SignatureVerifier::new(Some(KEY.to_owned())));
    let app = init_app(gateway.state.clone()).await;

    let (status, _) = call_json(&app, post(&sign(escape_report()))).await;

    assert_eq!(status, 200);
    assert!(gateway.store.status(&collar()).is_some());
}

#[rstest]
#[case::missing(escape_report(), "signature required")]
#[case::mismatch(
    {
        let mut payload = sign(escape_report());
        payload["device_id"] = json!("collar-08");
        payload
    },
    "invalid signature"
)]
#[actix_web::test]
async fn unsigned_or_tampered_report_is_rejected(#[case] payload: Value, #[case] message: &str) {
    let gateway = Gateway::new(SignatureVerifier::new(Some(KEY.to_owned())));
    let app = init_app(gateway.state.clone()).await;

    let (status, body) = call_json(&app, post(&payload)).await;

    assert_eq!(status, 401);
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["message"], message);
    assert_eq!(gateway.store.write_count(), 0);
}

#[actix_web::test]
async fn report_without_device_id_is_rejected() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, body) = call_json(&app, post(&json!({ "lat": 1.0 }))).await;

    assert_eq!(status, 400);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(gateway.store.write_count(), 0);
}
