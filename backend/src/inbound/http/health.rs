//! Health endpoints: a descriptive status report plus liveness and readiness
//! probes for orchestration and load balancers.
//! Document endpoints in OpenAPI via Utoipa.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Service name reported by `GET /health`.
pub const SERVICE_NAME: &str = "collar-gateway";

/// Whether a telemetry store is wired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Configured,
    Missing,
}

/// Whether telemetry signatures are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Configured,
    Disabled,
}

/// Shared health state for readiness and liveness checks.
///
/// Also records the configuration facts echoed by `GET /health`. The signing
/// key itself never reaches this type.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    store: StoreStatus,
    signature: SignatureStatus,
}

impl HealthState {
    /// Create a health state starting as not ready but live.
    pub fn new(store: StoreStatus, signature: SignatureStatus) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            store,
            signature,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness probes emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Build the body served by `GET /health`.
    pub fn report(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_owned(),
            service: SERVICE_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            store: self.store,
            signature: self.signature,
        }
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "collar-gateway")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    pub store: StoreStatus,
    pub signature: SignatureStatus,
}

/// Describe the running gateway: version, store wiring and signature mode.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses((status = 200, description = "Gateway status", body = HealthReport))
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(state.report())
}

/// Readiness probe. Return 200 when dependencies are initialised and the server can handle traffic; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
/// Call `HealthState::mark_unhealthy` before graceful shutdown to surface the drain early.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}
