//! Gateway configuration loaded via OrthoConfig.
//!
//! Values come from `GATEWAY_*` environment variables, an optional config
//! file and CLI flags, in OrthoConfig's usual precedence.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::SignatureVerifier;
use crate::inbound::http::health::{SignatureStatus, StoreStatus};
use crate::outbound::persistence::DEFAULT_MAX_CONNECTIONS;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;

/// Configuration values for the gateway process.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GATEWAY")]
pub struct GatewaySettings {
    /// Address to bind. Defaults to all interfaces.
    pub host: Option<IpAddr>,
    /// Port to bind. Defaults to 8080.
    pub port: Option<u16>,
    /// PostgreSQL URL. Without it the store-backed routes answer 500.
    pub database_url: Option<String>,
    /// Shared collar signing key. Without it signatures are not checked.
    pub signing_key: Option<String>,
    /// Upper bound on pooled store connections.
    pub db_max_connections: Option<u32>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

impl GatewaySettings {
    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn store_status(&self) -> StoreStatus {
        if self.database_url().is_some() {
            StoreStatus::Configured
        } else {
            StoreStatus::Missing
        }
    }

    /// Verifier holding a zeroizing copy of the signing key.
    pub fn signature_verifier(&self) -> SignatureVerifier {
        SignatureVerifier::new(self.signing_key.clone())
    }

    pub fn signature_status(&self) -> SignatureStatus {
        if self.signature_verifier().is_enabled() {
            SignatureStatus::Configured
        } else {
            SignatureStatus::Disabled
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("bind_addr", &self.bind_addr())
            .field("store", &self.store_status())
            .field("signature", &self.signature_status())
            .field("db_max_connections", &self.db_max_connections())
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}
