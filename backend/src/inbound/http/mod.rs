//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod devices;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;
pub mod walks;

pub use error::ApiResult;

/// JSON extractor settings shared by every handler.
///
/// Collars do not always send a `Content-Type`, so any body is parsed as JSON;
/// parse failures become `400 invalid_request` envelopes.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(error::json_error_handler)
}

/// Register the telemetry, device and walk routes.
///
/// Health routes are registered separately because they read
/// [`health::HealthState`] rather than [`state::HttpState`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(telemetry::ingest_telemetry)
        .service(devices::device_status)
        .service(devices::device_locations)
        .service(devices::device_sleep)
        .service(devices::device_scratches)
        .service(devices::device_walks)
        .service(devices::walker_stats)
        .service(walks::start_walk)
        .service(walks::end_walk);
}
