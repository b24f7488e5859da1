//! Tests for device read HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use chrono::{TimeZone, Utc};
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::ports::{
    FixtureTelemetryIngest, FixtureWalkSessionCommand, MockDeviceQuery, WalkHistory,
};
use crate::domain::telemetry::normalize;
use crate::domain::{
    DayWindow, DeviceId, DeviceStatusSnapshot, Error, LocationWindow, StatsSource, WalkMetrics,
    WalkSession, WalkSummary, WalkerStats, WalkerStatsTotals,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::test_utils::test_app;

fn state_with(devices: MockDeviceQuery) -> HttpState {
    HttpState::new(
        Arc::new(FixtureTelemetryIngest),
        Arc::new(FixtureWalkSessionCommand),
        Arc::new(devices),
    )
}

fn collar() -> DeviceId {
    DeviceId::new("collar-01").expect("valid id")
}

async fn get_json(devices: MockDeviceQuery, uri: &str) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(state_with(devices))).await;
    let request = actix_test::TestRequest::get().uri(uri).to_request();
    let response = actix_test::call_service(&app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

#[actix_web::test]
async fn status_returns_snapshot() {
    let now = Utc
        .with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let status = normalize(&json!({"device_id": "collar-01", "battery": 64}), now)
        .expect("valid report");
    let snapshot = DeviceStatusSnapshot::upserted(None, &status, None, now);
    let mut devices = MockDeviceQuery::new();
    devices
        .expect_status()
        .with(eq(collar()))
        .times(1)
        .return_once(move |_| Ok(snapshot));

    let (code, body) = get_json(devices, "/device/collar-01/status").await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["device_id"], "collar-01");
    assert_eq!(body["battery_percent"], 64);
    assert_eq!(body["is_home"], true);
}

#[actix_web::test]
async fn unknown_device_is_not_found() {
    let mut devices = MockDeviceQuery::new();
    devices
        .expect_status()
        .return_once(|_| Err(Error::not_found("device collar-01 not found")));

    let (code, body) = get_json(devices, "/device/collar-01/status").await;

    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[actix_web::test]
async fn oversized_device_id_is_rejected_before_the_port() {
    let mut devices = MockDeviceQuery::new();
    devices.expect_status().times(0);

    let uri = format!("/device/{}/status", "x".repeat(65));
    let (code, body) = get_json(devices, &uri).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[case("/device/collar-01/locations", 24, 100)]
#[case("/device/collar-01/locations?hours=500&limit=5000", 168, 1_000)]
#[case("/device/collar-01/locations?hours=abc&limit=-3", 24, 1)]
#[actix_web::test]
async fn location_window_is_clamped(
    #[case] uri: &str,
    #[case] hours: u32,
    #[case] limit: u32,
) {
    let mut devices = MockDeviceQuery::new();
    devices
        .expect_locations()
        .withf(move |_, window| *window == LocationWindow { hours, limit })
        .times(1)
        .return_once(|device_id, _| {
            Ok(crate::domain::ports::LocationHistory {
                device_id: device_id.clone(),
                count: 0,
                locations: Vec::new(),
            })
        });

    let (code, body) = get_json(devices, uri).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[rstest]
#[case("/device/collar-01/walker-stats", 30)]
#[case("/device/collar-01/walker-stats?days=365", 90)]
#[case("/device/collar-01/walker-stats?days=0", 1)]
#[actix_web::test]
async fn walker_stats_window_defaults_to_thirty_days(#[case] uri: &str, #[case] days: u32) {
    let mut devices = MockDeviceQuery::new();
    devices
        .expect_walker_stats()
        .withf(move |_, window| window.days() == days)
        .times(1)
        .return_once(move |device_id, window| {
            Ok(WalkerStats {
                device_id: device_id.to_string(),
                days: window.days(),
                totals: WalkerStatsTotals {
                    total_walks: 3,
                    ..WalkerStatsTotals::default()
                },
                source: StatsSource::Server,
            })
        });

    let (code, body) = get_json(devices, uri).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["days"], days);
    assert_eq!(body["total_walks"], 3);
    assert_eq!(body["source"], "server");
}

#[actix_web::test]
async fn walks_are_listed_in_flat_form() {
    let ended_at = Utc
        .with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let walk = WalkSession::completed_by_device(
        Uuid::nil(),
        collar(),
        None,
        ended_at,
        WalkMetrics {
            duration_seconds: 1_800,
            distance_metres: 2_000.0,
            ..WalkMetrics::default()
        },
    );
    let mut devices = MockDeviceQuery::new();
    devices
        .expect_walks()
        .withf(|_, window, limit| *window == DayWindow::from_param(None, 7) && *limit == 50)
        .return_once(move |device_id, _, _| {
            let walks = vec![walk];
            Ok(WalkHistory {
                device_id: device_id.clone(),
                summary: WalkSummary::from_walks(&walks),
                walks,
            })
        });

    let (code, body) = get_json(devices, "/device/collar-01/walks").await;

    assert_eq!(code, StatusCode::OK);
    let first = &body["walks"][0];
    assert_eq!(first["walk_id"], Uuid::nil().to_string());
    assert_eq!(first["grade"], "A");
    assert_eq!(first["source"], "device");
    assert_eq!(body["summary"]["walk_count"], 1);
}

#[actix_web::test]
async fn store_not_configured_answers_500_with_message() {
    let app = actix_test::init_service(test_app(HttpState::store_not_configured())).await;

    let request = actix_test::TestRequest::get()
        .uri("/device/collar-01/sleep")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "dependency_unavailable");
    assert_eq!(body["message"], "telemetry store is not configured");
}
