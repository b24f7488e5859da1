//! Driving port for telemetry ingestion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::telemetry::normalize;
use crate::domain::{DeviceId, Error, PersistReport};

/// A raw collar report as received over HTTP.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestTelemetryRequest {
    pub payload: Value,
}

/// Accepted report and the outcome of each write.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestTelemetryResponse {
    pub device_id: DeviceId,
    pub reported_at: DateTime<Utc>,
    pub report: PersistReport,
}

/// Accepts collar reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryIngest: Send + Sync {
    /// Verify, normalise and persist a report.
    ///
    /// Secondary write failures are recorded in the response; only signature,
    /// validation and store availability failures are errors.
    async fn ingest(
        &self,
        request: IngestTelemetryRequest,
    ) -> Result<IngestTelemetryResponse, Error>;
}

/// Fixture implementation that normalises and persists nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTelemetryIngest;

#[async_trait]
impl TelemetryIngest for FixtureTelemetryIngest {
    async fn ingest(
        &self,
        request: IngestTelemetryRequest,
    ) -> Result<IngestTelemetryResponse, Error> {
        let status = normalize(&request.payload, Utc::now())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        Ok(IngestTelemetryResponse {
            device_id: status.device_id,
            reported_at: status.reported_at,
            report: PersistReport::default(),
        })
    }
}
