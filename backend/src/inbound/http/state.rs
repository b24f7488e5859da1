//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    DeviceQuery, FixtureDeviceQuery, FixtureTelemetryIngest, FixtureWalkSessionCommand,
    StoreNotConfigured, TelemetryIngest, WalkSessionCommand,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub telemetry: Arc<dyn TelemetryIngest>,
    pub walks: Arc<dyn WalkSessionCommand>,
    pub devices: Arc<dyn DeviceQuery>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use collar_gateway::domain::ports::{
    ///     FixtureDeviceQuery, FixtureTelemetryIngest, FixtureWalkSessionCommand,
    /// };
    /// use collar_gateway::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(
    ///     Arc::new(FixtureTelemetryIngest),
    ///     Arc::new(FixtureWalkSessionCommand),
    ///     Arc::new(FixtureDeviceQuery),
    /// );
    /// let _clone = state.clone();
    /// ```
    pub fn new(
        telemetry: Arc<dyn TelemetryIngest>,
        walks: Arc<dyn WalkSessionCommand>,
        devices: Arc<dyn DeviceQuery>,
    ) -> Self {
        Self {
            telemetry,
            walks,
            devices,
        }
    }

    /// State used when no database URL is configured.
    ///
    /// Every store-backed route answers `dependency_unavailable`.
    pub fn store_not_configured() -> Self {
        let store = Arc::new(StoreNotConfigured);
        Self::new(store.clone(), store.clone(), store)
    }

    /// State wired to canned fixture ports.
    pub fn fixtures() -> Self {
        Self::new(
            Arc::new(FixtureTelemetryIngest),
            Arc::new(FixtureWalkSessionCommand),
            Arc::new(FixtureDeviceQuery),
        )
    }
}
