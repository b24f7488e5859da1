//! Gateway entry-point: loads settings, prepares the store and serves HTTP.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use color_eyre::eyre::{WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use collar_gateway::inbound::http::health::{HealthState, SignatureStatus};
use collar_gateway::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use collar_gateway::settings::GatewaySettings;
use server::{ServerConfig, create_server};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

async fn apply_migrations(database_url: &str) -> color_eyre::Result<()> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .wrap_err("migration task panicked")?
        .wrap_err("apply database migrations")?;
    info!(applied, "database schema up to date");
    Ok(())
}

#[cfg(feature = "metrics")]
fn with_metrics(config: ServerConfig) -> color_eyre::Result<ServerConfig> {
    let prometheus = PrometheusMetricsBuilder::new("collar_gateway")
        .endpoint("/metrics")
        .build()
        .map_err(|e| eyre!("configure Prometheus metrics: {e}"))?;
    Ok(config.with_metrics(prometheus))
}

#[cfg(not(feature = "metrics"))]
fn with_metrics(config: ServerConfig) -> color_eyre::Result<ServerConfig> {
    Ok(config)
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = GatewaySettings::load().map_err(|e| eyre!("load gateway settings: {e}"))?;
    info!(?settings, "starting collar gateway");
    if settings.signature_status() == SignatureStatus::Disabled {
        warn!("no signing key configured; telemetry signatures are not verified");
    }

    let health_state = web::Data::new(HealthState::new(
        settings.store_status(),
        settings.signature_status(),
    ));
    let mut config = ServerConfig::new(settings.bind_addr(), settings.signature_verifier());

    match settings.database_url() {
        Some(url) => {
            if settings.run_migrations {
                apply_migrations(url).await?;
            }
            let pool = DbPool::new(
                PoolConfig::new(url).with_max_size(settings.db_max_connections()),
            )
            .await
            .wrap_err("build database pool")?;
            config = config.with_db_pool(pool);
        }
        None => warn!("no database configured; store-backed routes will answer 500"),
    }

    let config = with_metrics(config)?;
    let bind_addr = settings.bind_addr();
    drop(settings);

    let server = create_server(health_state, config).wrap_err("start HTTP server")?;
    info!(%bind_addr, "collar gateway listening");
    server.await.wrap_err("HTTP server failed")
}
