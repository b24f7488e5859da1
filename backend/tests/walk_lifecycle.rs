//! Client-driven walk sessions over the HTTP surface.

mod support;

use actix_web::test;
use chrono::Duration;
use collar_gateway::domain::anti_cheat::MAX_WALK_SECONDS;
use collar_gateway::inbound::http::state::HttpState;
use collar_gateway::test_support::StoreOp;
use serde_json::{Value, json};
use support::{Gateway, call_json, init_app, morning};
use uuid::Uuid;

fn start() -> test::TestRequest {
    test::TestRequest::post().uri("/device/collar-07/walk/start")
}

fn end(body: &Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/device/collar-07/walk/end")
        .set_json(body)
}

#[actix_web::test]
async fn start_then_end_grades_the_walk() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, started) = call_json(&app, start()).await;
    assert_eq!(status, 200);
    assert_eq!(started["status"], "ok");
    let walk_id = started["walk_id"].as_str().expect("walk id").to_owned();

    gateway.clock.set(morning() + Duration::minutes(20));
    let (status, ended) = call_json(&app, end(&json!({ "walk_id": walk_id }))).await;

    assert_eq!(status, 200);
    assert_eq!(ended["walk_id"], walk_id.as_str());
    assert_eq!(ended["duration_s"], 1_200);
    assert_eq!(ended["grade_score"], 85);
    assert_eq!(ended["grade"], "B");

    let walks = gateway.store.walks();
    assert_eq!(walks.len(), 1);
    assert!(walks[0].ended_at.is_some());
}

#[actix_web::test]
async fn end_bounds_hostile_counters() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;
    let (_, started) = call_json(&app, start()).await;

    gateway.clock.set(morning() + Duration::minutes(20));
    let (status, ended) = call_json(
        &app,
        end(&json!({
            "walk_id": started["walk_id"],
            "duration_s": i64::MAX,
            "stops": i32::MIN,
            "carried_s": -30,
            "distance_m": -1.0
        })),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(ended["duration_s"], MAX_WALK_SECONDS);
    let walks = gateway.store.walks();
    assert_eq!(walks[0].metrics.stop_count, 0);
    assert_eq!(walks[0].metrics.carried_seconds, 0);
    assert_eq!(walks[0].metrics.distance_metres, 0.0);
}

#[actix_web::test]
async fn start_records_the_last_known_position() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;
    let (status, _) = call_json(
        &app,
        test::TestRequest::post().uri("/telemetry").set_json(json!({
            "device_id": "collar-07",
            "gps": { "lat": 48.85, "lng": 2.35, "valid": true }
        })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = call_json(&app, start()).await;

    assert_eq!(status, 200);
    let walks = gateway.store.walks();
    assert_eq!(walks[0].start_latitude, Some(48.85));
    assert_eq!(walks[0].start_longitude, Some(2.35));
}

#[actix_web::test]
async fn second_end_is_a_conflict() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;
    let (_, started) = call_json(&app, start()).await;
    let body = json!({ "walk_id": started["walk_id"] });

    let (first, _) = call_json(&app, end(&body)).await;
    let writes = gateway.store.write_count();
    let (second, error) = call_json(&app, end(&body)).await;

    assert_eq!(first, 200);
    assert_eq!(second, 409);
    assert_eq!(error["code"], "conflict");
    assert_eq!(gateway.store.write_count(), writes);
}

#[actix_web::test]
async fn unknown_walk_is_not_found_without_writes() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, error) = call_json(
        &app,
        end(&json!({ "walk_id": Uuid::new_v4().to_string() })),
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(error["code"], "not_found");
    assert_eq!(gateway.store.write_count(), 0);
}

#[actix_web::test]
async fn end_without_walk_id_is_invalid() {
    let gateway = Gateway::unsigned();
    let app = init_app(gateway.state.clone()).await;

    let (status, error) = call_json(&app, end(&json!({ "stops": 2 }))).await;

    assert_eq!(status, 400);
    assert_eq!(error["code"], "invalid_request");
}

#[actix_web::test]
async fn start_fails_when_the_store_is_down() {
    let gateway = Gateway::unsigned();
    gateway.store.fail(StoreOp::InsertWalk);
    let app = init_app(gateway.state.clone()).await;

    let (status, error) = call_json(&app, start()).await;

    assert_eq!(status, 500);
    assert_eq!(error["code"], "dependency_unavailable");
}

#[actix_web::test]
async fn unconfigured_store_answers_dependency_unavailable() {
    let app = init_app(HttpState::store_not_configured()).await;

    for req in [
        start(),
        test::TestRequest::get().uri("/device/collar-07/status"),
        test::TestRequest::post()
            .uri("/telemetry")
            .set_json(json!({ "device_id": "collar-07" })),
    ] {
        let (status, error) = call_json(&app, req).await;
        assert_eq!(status, 500);
        assert_eq!(error["code"], "dependency_unavailable");
        assert_eq!(error["message"], "telemetry store is not configured");
    }
}
