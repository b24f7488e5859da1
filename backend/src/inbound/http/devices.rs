//! Device read HTTP handlers.
//!
//! ```text
//! GET /device/{id}/status
//! GET /device/{id}/locations?hours=&limit=
//! GET /device/{id}/sleep?days=
//! GET /device/{id}/scratches?days=
//! GET /device/{id}/walks?days=&limit=
//! GET /device/{id}/walker-stats?days=
//! ```
//!
//! Numeric query parameters are read leniently and clamped by the domain
//! windows, so `?days=abc` behaves like an absent parameter.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{LocationHistory, ScratchHistory, SleepHistory, WalkHistory};
use crate::domain::{
    DEFAULT_DAYS, DEFAULT_STATS_DAYS, DayWindow, DeviceStatusSnapshot, LocationWindow,
    WalkSummary, WalkerStats, walk_limit,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    DeviceStatusSnapshotSchema, ErrorSchema, LocationHistorySchema, ScratchHistorySchema,
    SleepHistorySchema, WalkSummarySchema, WalkerStatsSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{lenient_int, parse_device_id};
use crate::inbound::http::walks::WalkSessionBody;

/// `?days=` query.
#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<String>,
}

/// `?hours=&limit=` query for location history.
#[derive(Debug, Default, Deserialize)]
pub struct LocationsQuery {
    pub hours: Option<String>,
    pub limit: Option<String>,
}

/// `?days=&limit=` query for walk history.
#[derive(Debug, Default, Deserialize)]
pub struct WalksQuery {
    pub days: Option<String>,
    pub limit: Option<String>,
}

/// Walk history with walks in their flat wire form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalkHistoryBody {
    pub device_id: String,
    pub walks: Vec<WalkSessionBody>,
    #[schema(value_type = WalkSummarySchema)]
    pub summary: WalkSummary,
}

impl From<WalkHistory> for WalkHistoryBody {
    fn from(value: WalkHistory) -> Self {
        Self {
            device_id: value.device_id.to_string(),
            walks: value.walks.into_iter().map(WalkSessionBody::from).collect(),
            summary: value.summary,
        }
    }
}

/// Latest snapshot for one collar.
#[utoipa::path(
    get,
    path = "/device/{id}/status",
    params(("id" = String, Path, description = "Collar identifier")),
    responses(
        (status = 200, description = "Latest status", body = DeviceStatusSnapshotSchema),
        (status = 400, description = "Invalid device id", body = ErrorSchema),
        (status = 404, description = "Device has never reported", body = ErrorSchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "getDeviceStatus"
)]
#[get("/device/{id}/status")]
pub async fn device_status(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeviceStatusSnapshot>> {
    let device_id = parse_device_id(path.into_inner())?;
    let snapshot = state.devices.status(&device_id).await?;
    Ok(web::Json(snapshot))
}

/// Recent valid fixes, newest first.
#[utoipa::path(
    get,
    path = "/device/{id}/locations",
    params(
        ("id" = String, Path, description = "Collar identifier"),
        ("hours" = Option<i64>, Query, description = "Window in hours, default 24, max 168"),
        ("limit" = Option<i64>, Query, description = "Number of points, default 100, max 1000")
    ),
    responses(
        (status = 200, description = "Location history", body = LocationHistorySchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "listDeviceLocations"
)]
#[get("/device/{id}/locations")]
pub async fn device_locations(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<LocationsQuery>,
) -> ApiResult<web::Json<LocationHistory>> {
    let device_id = parse_device_id(path.into_inner())?;
    let window = LocationWindow::from_params(
        lenient_int(query.hours.as_deref()),
        lenient_int(query.limit.as_deref()),
    );
    let history = state.devices.locations(&device_id, window).await?;
    Ok(web::Json(history))
}

/// Completed sleep sessions with a summary.
#[utoipa::path(
    get,
    path = "/device/{id}/sleep",
    params(
        ("id" = String, Path, description = "Collar identifier"),
        ("days" = Option<i64>, Query, description = "Window in days, default 7, max 90")
    ),
    responses(
        (status = 200, description = "Sleep history", body = SleepHistorySchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "listDeviceSleep"
)]
#[get("/device/{id}/sleep")]
pub async fn device_sleep(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<DaysQuery>,
) -> ApiResult<web::Json<SleepHistory>> {
    let device_id = parse_device_id(path.into_inner())?;
    let window = DayWindow::from_param(lenient_int(query.days.as_deref()), DEFAULT_DAYS);
    let history = state.devices.sleep(&device_id, window).await?;
    Ok(web::Json(history))
}

/// Daily scratch totals with a summary.
#[utoipa::path(
    get,
    path = "/device/{id}/scratches",
    params(
        ("id" = String, Path, description = "Collar identifier"),
        ("days" = Option<i64>, Query, description = "Window in days, default 7, max 90")
    ),
    responses(
        (status = 200, description = "Scratch history", body = ScratchHistorySchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "listDeviceScratches"
)]
#[get("/device/{id}/scratches")]
pub async fn device_scratches(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<DaysQuery>,
) -> ApiResult<web::Json<ScratchHistory>> {
    let device_id = parse_device_id(path.into_inner())?;
    let window = DayWindow::from_param(lenient_int(query.days.as_deref()), DEFAULT_DAYS);
    let history = state.devices.scratches(&device_id, window).await?;
    Ok(web::Json(history))
}

/// Walks started in the window, newest first.
#[utoipa::path(
    get,
    path = "/device/{id}/walks",
    params(
        ("id" = String, Path, description = "Collar identifier"),
        ("days" = Option<i64>, Query, description = "Window in days, default 7, max 90"),
        ("limit" = Option<i64>, Query, description = "Number of walks, default 50, max 500")
    ),
    responses(
        (status = 200, description = "Walk history", body = WalkHistoryBody),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "listDeviceWalks"
)]
#[get("/device/{id}/walks")]
pub async fn device_walks(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<WalksQuery>,
) -> ApiResult<web::Json<WalkHistoryBody>> {
    let device_id = parse_device_id(path.into_inner())?;
    let window = DayWindow::from_param(lenient_int(query.days.as_deref()), DEFAULT_DAYS);
    let limit = walk_limit(lenient_int(query.limit.as_deref()));
    let history = state.devices.walks(&device_id, window, limit).await?;
    Ok(web::Json(WalkHistoryBody::from(history)))
}

/// Anti-cheat aggregate over graded walks.
///
/// `source` reports whether the store computed the aggregate or the gateway
/// folded the raw walks after the aggregate query failed.
#[utoipa::path(
    get,
    path = "/device/{id}/walker-stats",
    params(
        ("id" = String, Path, description = "Collar identifier"),
        ("days" = Option<i64>, Query, description = "Window in days, default 30, max 90")
    ),
    responses(
        (status = 200, description = "Walker stats", body = WalkerStatsSchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["devices"],
    operation_id = "getWalkerStats"
)]
#[get("/device/{id}/walker-stats")]
pub async fn walker_stats(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<DaysQuery>,
) -> ApiResult<web::Json<WalkerStats>> {
    let device_id = parse_device_id(path.into_inner())?;
    let window = DayWindow::from_param(lenient_int(query.days.as_deref()), DEFAULT_STATS_DAYS);
    let stats = state.devices.walker_stats(&device_id, window).await?;
    Ok(web::Json(stats))
}

#[cfg(test)]
#[path = "devices_tests.rs"]
mod tests;
