//! Prometheus adapter for telemetry write outcomes.
//!
//! # Metrics
//!
//! - **Name**: `collar_gateway_telemetry_writes_total`
//! - **Type**: Counter
//! - **Labels**:
//!   - `step`: `device_status`, `location`, `scratch_event`, `scratch_daily`,
//!     `anomaly`, `walk_session` or `sleep_session`
//!   - `outcome`: `applied`, `suppressed` or `failed`
//!
//! Skipped steps are not counted.

use async_trait::async_trait;
use prometheus::{CounterVec, Opts, Registry};

use crate::domain::PersistReport;
use crate::domain::ports::{IngestMetrics, IngestMetricsError};

/// Prometheus-backed ingestion metrics recorder.
pub struct PrometheusIngestMetrics {
    writes_total: CounterVec,
}

impl PrometheusIngestMetrics {
    /// Create and register metrics with the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the metric cannot be registered, for example when
    /// the name is already taken in `registry`.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let writes_total = CounterVec::new(
            Opts::new(
                "collar_gateway_telemetry_writes_total",
                "Telemetry store writes by step and outcome",
            ),
            &["step", "outcome"],
        )?;
        registry.register(Box::new(writes_total.clone()))?;
        Ok(Self { writes_total })
    }
}

#[async_trait]
impl IngestMetrics for PrometheusIngestMetrics {
    async fn record(&self, report: &PersistReport) -> Result<(), IngestMetricsError> {
        for (step, outcome) in report.steps() {
            if outcome.label() == "skipped" {
                continue;
            }
            self.writes_total
                .get_metric_with_label_values(&[step, outcome.label()])
                .map_err(|err| IngestMetricsError::export(err.to_string()))?
                .inc();
        }
        Ok(())
    }
}
