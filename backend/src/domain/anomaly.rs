//! Daily de-duplication of anomaly alerts.
//!
//! At most one entry per `(device, anomaly type, UTC day)` is wanted. The
//! check reads before the caller writes and is not atomic; two reports racing
//! within the same instant may both be recorded.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::warn;

use crate::domain::DeviceId;
use crate::domain::ports::AnomalyLogRepository;

/// `[midnight, next midnight)` of the UTC day containing `now`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use collar_gateway::domain::anomaly::utc_day_window;
///
/// let now = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap();
/// let (start, end) = utc_day_window(now);
/// assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap());
/// assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
/// ```
pub fn utc_day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Decides whether an anomaly should be logged.
pub struct AnomalyDeduplicator<A> {
    anomaly_log: Arc<A>,
}

impl<A> Clone for AnomalyDeduplicator<A> {
    fn clone(&self) -> Self {
        Self {
            anomaly_log: Arc::clone(&self.anomaly_log),
        }
    }
}

impl<A: AnomalyLogRepository> AnomalyDeduplicator<A> {
    pub fn new(anomaly_log: Arc<A>) -> Self {
        Self { anomaly_log }
    }

    /// `false` when the device already logged this type today.
    ///
    /// A failed lookup answers `true`: logging a duplicate beats losing the
    /// alert.
    pub async fn should_record(
        &self,
        device_id: &DeviceId,
        anomaly_type: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let (from, to) = utc_day_window(now);
        match self
            .anomaly_log
            .count_in_window(device_id, anomaly_type, from, to)
            .await
        {
            Ok(existing) => existing == 0,
            Err(error) => {
                warn!(
                    device_id = %device_id,
                    anomaly_type,
                    error = %error,
                    "anomaly lookup failed; recording without de-duplication"
                );
                true
            }
        }
    }
}
