//! Walk lifecycle HTTP handlers.
//!
//! ```text
//! POST /device/{id}/walk/start
//! POST /device/{id}/walk/end
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    EndWalkRequest, EndWalkResponse, StartWalkRequest, StartWalkResponse, WalkEndCounters,
};
use crate::domain::{GradeLetter, WalkSession, WalkSource};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, GradeLetterSchema, WalkSourceSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_device_id, parse_uuid};

/// Response for a newly opened walk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartWalkResponseBody {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(format = "uuid")]
    pub walk_id: String,
    #[schema(format = "date-time")]
    pub started_at: String,
}

impl From<StartWalkResponse> for StartWalkResponseBody {
    fn from(value: StartWalkResponse) -> Self {
        Self {
            status: "ok".to_owned(),
            walk_id: value.walk_id.to_string(),
            started_at: value.started_at.to_rfc3339(),
        }
    }
}

/// Request payload for ending a walk.
///
/// Counters left out fall back to the device's last reported values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EndWalkRequestBody {
    #[schema(format = "uuid")]
    pub walk_id: Option<String>,
    pub duration_s: Option<i64>,
    pub distance_m: Option<f64>,
    pub stops: Option<i32>,
    pub carried_s: Option<i64>,
    pub vehicle_s: Option<i64>,
    pub actual_walk_s: Option<i64>,
    pub cheat_flags: Option<i32>,
}

impl EndWalkRequestBody {
    fn counters(&self) -> WalkEndCounters {
        WalkEndCounters {
            duration_s: self.duration_s,
            distance_m: self.distance_m,
            stops: self.stops,
            carried_s: self.carried_s,
            vehicle_s: self.vehicle_s,
            actual_walk_s: self.actual_walk_s,
            cheat_flags: self.cheat_flags,
        }
    }
}

/// Graded result of ending a walk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndWalkResponseBody {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(format = "uuid")]
    pub walk_id: String,
    #[schema(value_type = GradeLetterSchema)]
    pub grade: GradeLetter,
    pub grade_score: i32,
    pub carried_percent: f64,
    pub actual_walk_percent: f64,
    pub vehicle_detected: bool,
    #[schema(example = "carried, vehicle")]
    pub cheat_summary: Option<String>,
    pub duration_s: i64,
    pub distance_m: f64,
    pub stop_count: i32,
    #[schema(format = "date-time")]
    pub ended_at: Option<String>,
}

impl From<EndWalkResponse> for EndWalkResponseBody {
    fn from(value: EndWalkResponse) -> Self {
        let EndWalkResponse { session, grade } = value;
        Self {
            status: "ok".to_owned(),
            walk_id: session.id.to_string(),
            grade: grade.grade,
            grade_score: grade.score,
            carried_percent: grade.carried_percent,
            actual_walk_percent: grade.actual_walk_percent,
            vehicle_detected: grade.vehicle_detected,
            cheat_summary: grade.cheat_summary,
            duration_s: session.metrics.duration_seconds,
            distance_m: session.metrics.distance_metres,
            stop_count: session.metrics.stop_count,
            ended_at: session.ended_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Flat wire form of a stored walk, as listed by the walk history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalkSessionBody {
    #[schema(format = "uuid")]
    pub walk_id: String,
    pub device_id: String,
    #[schema(format = "date-time")]
    pub started_at: String,
    #[schema(format = "date-time")]
    pub ended_at: Option<String>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub duration_s: i64,
    pub distance_m: f64,
    pub stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
    #[schema(value_type = Option<GradeLetterSchema>)]
    pub grade: Option<GradeLetter>,
    pub grade_score: Option<i32>,
    pub carried_percent: Option<f64>,
    pub actual_walk_percent: Option<f64>,
    pub vehicle_detected: Option<bool>,
    pub cheat_summary: Option<String>,
    #[schema(value_type = WalkSourceSchema)]
    pub source: WalkSource,
}

impl From<WalkSession> for WalkSessionBody {
    fn from(value: WalkSession) -> Self {
        let grade = value.grade;
        Self {
            walk_id: value.id.to_string(),
            device_id: value.device_id.to_string(),
            started_at: value.started_at.to_rfc3339(),
            ended_at: value.ended_at.map(|at| at.to_rfc3339()),
            start_latitude: value.start_latitude,
            start_longitude: value.start_longitude,
            duration_s: value.metrics.duration_seconds,
            distance_m: value.metrics.distance_metres,
            stop_count: value.metrics.stop_count,
            carried_seconds: value.metrics.carried_seconds,
            vehicle_seconds: value.metrics.vehicle_seconds,
            actual_walk_seconds: value.metrics.actual_walk_seconds,
            cheat_flags: value.metrics.cheat_flags,
            grade: grade.as_ref().map(|g| g.grade),
            grade_score: grade.as_ref().map(|g| g.score),
            carried_percent: grade.as_ref().map(|g| g.carried_percent),
            actual_walk_percent: grade.as_ref().map(|g| g.actual_walk_percent),
            vehicle_detected: grade.as_ref().map(|g| g.vehicle_detected),
            cheat_summary: grade.and_then(|g| g.cheat_summary),
            source: value.source,
        }
    }
}

/// Open a walk for the collar, starting at its last known position.
#[utoipa::path(
    post,
    path = "/device/{id}/walk/start",
    params(("id" = String, Path, description = "Collar identifier")),
    responses(
        (status = 200, description = "Walk opened", body = StartWalkResponseBody),
        (status = 400, description = "Invalid device id", body = ErrorSchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["walks"],
    operation_id = "startWalk"
)]
#[post("/device/{id}/walk/start")]
pub async fn start_walk(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<StartWalkResponseBody>> {
    let device_id = parse_device_id(path.into_inner())?;
    let response = state.walks.start_walk(StartWalkRequest { device_id }).await?;
    Ok(web::Json(StartWalkResponseBody::from(response)))
}

/// End a walk and grade it.
///
/// Ending a walk twice is rejected with `409 conflict`.
#[utoipa::path(
    post,
    path = "/device/{id}/walk/end",
    params(("id" = String, Path, description = "Collar identifier")),
    request_body = EndWalkRequestBody,
    responses(
        (status = 200, description = "Walk ended and graded", body = EndWalkResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown walk", body = ErrorSchema),
        (status = 409, description = "Walk already ended", body = ErrorSchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["walks"],
    operation_id = "endWalk"
)]
#[post("/device/{id}/walk/end")]
pub async fn end_walk(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<EndWalkRequestBody>,
) -> ApiResult<web::Json<EndWalkResponseBody>> {
    let device_id = parse_device_id(path.into_inner())?;
    let body = payload.into_inner();
    let counters = body.counters();
    let walk_id = parse_uuid(body.walk_id, FieldName::new("walk_id"))?;
    let response = state
        .walks
        .end_walk(EndWalkRequest {
            device_id,
            walk_id,
            counters,
        })
        .await?;
    Ok(web::Json(EndWalkResponseBody::from(response)))
}

#[cfg(test)]
#[path = "walks_tests.rs"]
mod tests;
