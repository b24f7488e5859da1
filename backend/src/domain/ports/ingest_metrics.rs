//! Port for exporting per-step ingestion outcomes.
//!
//! Metrics are best effort: the ingestion service logs and drops recorder
//! errors, so a broken exporter never fails a collar report.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::PersistReport;

define_port_error! {
    /// Errors exposed when recording ingestion metrics.
    pub enum IngestMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "ingest metrics exporter failed: {message}",
    }
}

/// Records the outcome of every write in an ingestion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IngestMetrics: Send + Sync {
    /// Record one ingestion's write outcomes.
    async fn record(&self, report: &PersistReport) -> Result<(), IngestMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpIngestMetrics;

#[async_trait]
impl IngestMetrics for NoOpIngestMetrics {
    async fn record(&self, _report: &PersistReport) -> Result<(), IngestMetricsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_record_returns_ok() {
        assert!(NoOpIngestMetrics.record(&PersistReport::default()).await.is_ok());
    }

    #[test]
    fn error_constructor_accepts_str() {
        let err = IngestMetricsError::export("registry closed");
        assert_eq!(err.to_string(), "ingest metrics exporter failed: registry closed");
    }
}
