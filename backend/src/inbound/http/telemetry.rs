//! Telemetry ingestion HTTP handler.
//!
//! ```text
//! POST /telemetry
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::ports::{IngestTelemetryRequest, IngestTelemetryResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Acknowledgement returned to the collar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TelemetryAcceptedBody {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "collar-01")]
    pub device_id: String,
    /// Report timestamp after normalisation.
    #[schema(format = "date-time")]
    pub timestamp: String,
}

impl From<IngestTelemetryResponse> for TelemetryAcceptedBody {
    fn from(value: IngestTelemetryResponse) -> Self {
        Self {
            status: "ok".to_owned(),
            device_id: value.device_id.to_string(),
            timestamp: value.reported_at.to_rfc3339(),
        }
    }
}

/// Accept one collar report.
///
/// The report is persisted best-effort: secondary write failures are logged
/// and do not change the response.
#[utoipa::path(
    post,
    path = "/telemetry",
    request_body(content = Object, description = "Flat (firmware 1.x) or nested (firmware 2.x) collar report"),
    responses(
        (status = 200, description = "Report accepted", body = TelemetryAcceptedBody),
        (status = 400, description = "Invalid report", body = ErrorSchema),
        (status = 401, description = "Missing or invalid signature", body = ErrorSchema),
        (status = 500, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["telemetry"],
    operation_id = "ingestTelemetry"
)]
#[post("/telemetry")]
pub async fn ingest_telemetry(
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<TelemetryAcceptedBody>> {
    let response = state
        .telemetry
        .ingest(IngestTelemetryRequest {
            payload: payload.into_inner(),
        })
        .await?;
    Ok(web::Json(TelemetryAcceptedBody::from(response)))
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
