//! Canonical, firmware-independent status record.
//!
//! Every payload adapter produces one [`CanonicalStatus`]; nothing downstream
//! of normalisation looks at raw device JSON again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{DeviceId, WalkMetrics};

/// One GPS reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GpsFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub valid: bool,
}

impl GpsFix {
    /// Coordinates of a geometrically valid fix.
    ///
    /// A fix qualifies when the device flagged it valid and both coordinates
    /// are present, finite, and inside WGS84 bounds.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::domain::telemetry::GpsFix;
    ///
    /// let fix = GpsFix { latitude: Some(51.5), longitude: Some(-0.12), valid: true, ..GpsFix::default() };
    /// assert_eq!(fix.position(), Some((51.5, -0.12)));
    /// let stale = GpsFix { valid: false, ..fix };
    /// assert_eq!(stale.position(), None);
    /// ```
    pub fn position(&self) -> Option<(f64, f64)> {
        if !self.valid {
            return None;
        }
        let (lat, lng) = (self.latitude?, self.longitude?);
        let in_range = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        in_range.then_some((lat, lng))
    }
}

/// Battery state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BatteryReading {
    pub percent: Option<i32>,
    pub voltage: Option<f64>,
    pub charging: bool,
}

/// Cellular or Wi-Fi link state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NetworkReading {
    pub rssi_dbm: Option<i32>,
    pub network_type: Option<String>,
}

/// A sleep session the collar has closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepSessionReading {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub quality: Option<i32>,
}

impl SleepSessionReading {
    /// Whole minutes between start and end.
    pub fn minutes(&self) -> i32 {
        let minutes = (self.ended_at - self.started_at).num_minutes();
        i32::try_from(minutes.max(0)).unwrap_or(i32::MAX)
    }
}

/// Sleep state and the optional session that just finished.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SleepReading {
    pub is_sleeping: bool,
    pub minutes_today: i32,
    pub completed_session: Option<SleepSessionReading>,
}

/// Running walk counters as tracked on the collar.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WalkReading {
    pub active: bool,
    /// The collar closed a walk in this report.
    pub completed: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub metrics: WalkMetrics,
}

/// Scratch detector output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScratchReading {
    pub detected: bool,
    pub intensity: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub duration_ms: Option<i64>,
    pub count_today: i32,
    pub peak_frequency_hz: Option<f64>,
}

/// Anomaly raised by the collar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReading {
    pub anomaly_type: String,
    pub severity: Option<String>,
    pub details: Option<Value>,
}

/// Normalised device report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalStatus {
    pub device_id: DeviceId,
    pub firmware_version: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub fix: GpsFix,
    pub activity: Option<String>,
    pub step_count: i64,
    pub battery: BatteryReading,
    pub network: NetworkReading,
    pub is_home: bool,
    pub is_escaped: bool,
    pub sleep: SleepReading,
    pub walk: WalkReading,
    pub scratch: ScratchReading,
    pub anomaly: Option<AnomalyReading>,
}

impl CanonicalStatus {
    /// Status with every optional field at its default.
    ///
    /// `is_home` starts true: a collar is assumed home until it says otherwise.
    pub fn with_defaults(device_id: DeviceId, reported_at: DateTime<Utc>) -> Self {
        Self {
            device_id,
            firmware_version: None,
            reported_at,
            fix: GpsFix::default(),
            activity: None,
            step_count: 0,
            battery: BatteryReading::default(),
            network: NetworkReading::default(),
            is_home: true,
            is_escaped: false,
            sleep: SleepReading::default(),
            walk: WalkReading::default(),
            scratch: ScratchReading::default(),
            anomaly: None,
        }
    }
}
