//! Builders wiring the store adapters into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use collar_gateway::domain::{
    DeviceQueryService, SignatureVerifier, TelemetryIngestionService, WalkSessionService,
};
use collar_gateway::inbound::http::state::HttpState;
use collar_gateway::outbound::persistence::{
    DbPool, DieselAnomalyLogRepository, DieselDeviceStatusRepository,
    DieselTelemetryHistoryRepository, DieselWalkSessionRepository,
};

#[cfg(feature = "metrics")]
use collar_gateway::outbound::metrics::PrometheusIngestMetrics;

use super::ServerConfig;

/// Repositories sharing one pool.
struct Repositories {
    status: Arc<DieselDeviceStatusRepository>,
    history: Arc<DieselTelemetryHistoryRepository>,
    anomalies: Arc<DieselAnomalyLogRepository>,
    walks: Arc<DieselWalkSessionRepository>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            status: Arc::new(DieselDeviceStatusRepository::new(pool.clone())),
            history: Arc::new(DieselTelemetryHistoryRepository::new(pool.clone())),
            anomalies: Arc::new(DieselAnomalyLogRepository::new(pool.clone())),
            walks: Arc::new(DieselWalkSessionRepository::new(pool.clone())),
        }
    }
}

type Ingestion = TelemetryIngestionService<
    DieselDeviceStatusRepository,
    DieselTelemetryHistoryRepository,
    DieselAnomalyLogRepository,
    DieselWalkSessionRepository,
>;

fn build_ingestion(
    repos: &Repositories,
    verifier: SignatureVerifier,
    clock: Arc<dyn Clock>,
) -> Ingestion {
    TelemetryIngestionService::new(
        Arc::clone(&repos.status),
        Arc::clone(&repos.history),
        Arc::clone(&repos.anomalies),
        Arc::clone(&repos.walks),
        verifier,
        clock,
    )
}

/// Attach Prometheus ingest metrics when a registry is configured.
///
/// # Errors
/// Returns [`std::io::Error`] if metric registration fails.
#[cfg(feature = "metrics")]
fn with_ingest_metrics(ingestion: Ingestion, config: &ServerConfig) -> std::io::Result<Ingestion> {
    match &config.prometheus {
        Some(prom) => {
            let metrics = PrometheusIngestMetrics::new(&prom.registry).map_err(|e| {
                std::io::Error::other(format!("ingest metrics registration failed: {e}"))
            })?;
            Ok(ingestion.with_metrics(Arc::new(metrics)))
        }
        None => Ok(ingestion),
    }
}

#[cfg(not(feature = "metrics"))]
fn with_ingest_metrics(ingestion: Ingestion, _config: &ServerConfig) -> std::io::Result<Ingestion> {
    Ok(ingestion)
}

/// Build the HTTP state from the configured pool.
///
/// Without a pool every store-backed port answers with a dependency error,
/// so the gateway still serves health probes.
///
/// # Errors
/// Returns [`std::io::Error`] if metric registration fails.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let Some(pool) = &config.db_pool else {
        return Ok(web::Data::new(HttpState::store_not_configured()));
    };

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repos = Repositories::new(pool);
    let ingestion = with_ingest_metrics(
        build_ingestion(&repos, config.verifier.clone(), Arc::clone(&clock)),
        config,
    )?;
    let walks = WalkSessionService::new(
        Arc::clone(&repos.walks),
        Arc::clone(&repos.status),
        Arc::clone(&clock),
    );
    let devices = DeviceQueryService::new(
        Arc::clone(&repos.status),
        Arc::clone(&repos.history),
        Arc::clone(&repos.walks),
        clock,
    );

    Ok(web::Data::new(HttpState::new(
        Arc::new(ingestion),
        Arc::new(walks),
        Arc::new(devices),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use collar_gateway::inbound::http::configure;
    use rstest::rstest;

    #[rstest]
    #[actix_web::test]
    async fn missing_pool_reports_store_not_configured() {
        let config = ServerConfig::new(
            "127.0.0.1:0".parse().expect("addr"),
            SignatureVerifier::disabled(),
        );
        let state = build_http_state(&config).expect("state builds");
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/device/collar-01/status")
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["code"], "dependency_unavailable");
    }
}
