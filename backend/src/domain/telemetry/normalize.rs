//! Adapters from each firmware shape into [`CanonicalStatus`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::canonical::{
    AnomalyReading, BatteryReading, CanonicalStatus, GpsFix, NetworkReading, ScratchReading,
    SleepReading, SleepSessionReading, WalkReading,
};
use super::payload::{FlatReport, NestedReport, PayloadError, TelemetryReport};
use crate::domain::{DeviceId, DeviceIdValidationError, WalkMetrics};

/// Epoch values below this are uptime counters, not wall-clock times.
const MIN_EPOCH_SECONDS: i64 = 1_000_000_000;
/// Epoch values at or above this are milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Errors raised while normalising a report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The envelope could not be decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// The device identifier was missing or invalid.
    #[error(transparent)]
    DeviceId(#[from] DeviceIdValidationError),
}

/// Normalise a raw report.
///
/// Pure: `received_at` stands in for the report timestamp when the collar
/// sends none or sends a value that is not a wall-clock time.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use collar_gateway::domain::telemetry::normalize;
/// use serde_json::json;
///
/// let status = normalize(&json!({ "device_id": "collar-01" }), Utc::now()).expect("valid");
/// assert!(status.is_home);
/// assert!(!status.fix.valid);
/// assert_eq!(status.battery.percent, None);
/// ```
pub fn normalize(
    raw: &Value,
    received_at: DateTime<Utc>,
) -> Result<CanonicalStatus, NormalizeError> {
    match TelemetryReport::from_value(raw)? {
        TelemetryReport::Flat(report) => from_flat(*report, received_at),
        TelemetryReport::Nested(report) => from_nested(*report, received_at),
    }
}

fn from_flat(
    report: FlatReport,
    received_at: DateTime<Utc>,
) -> Result<CanonicalStatus, NormalizeError> {
    let device_id = DeviceId::new(report.device_id.unwrap_or_default())?;
    let reported_at = parse_timestamp(report.timestamp.as_ref()).unwrap_or(received_at);
    let mut status = CanonicalStatus::with_defaults(device_id, reported_at);

    status.firmware_version = non_blank(report.firmware);
    status.fix = GpsFix {
        latitude: report.lat,
        longitude: report.lng,
        altitude_m: report.alt,
        speed_mps: report.speed,
        heading_deg: report.heading,
        hdop: report.hdop,
        satellites: report.satellites.map(saturate),
        valid: report.gps_valid.unwrap_or(false),
    };
    status.activity = non_blank(report.activity);
    status.step_count = report.steps.unwrap_or(0);
    status.battery = BatteryReading {
        percent: report.battery.map(battery_percent),
        voltage: report.battery_voltage,
        charging: report.charging.unwrap_or(false),
    };
    status.network = NetworkReading {
        rssi_dbm: report.rssi.map(saturate),
        network_type: non_blank(report.network_type),
    };
    status.is_home = report.is_home.unwrap_or(true);
    status.is_escaped = report.is_escaped.unwrap_or(false);
    status.sleep = SleepReading {
        is_sleeping: report.is_sleeping.unwrap_or(false),
        minutes_today: report.sleep_minutes.map_or(0, saturate),
        completed_session: sleep_session(
            report.sleep_session_start.as_ref(),
            report.sleep_session_end.as_ref(),
            report.sleep_quality,
        ),
    };
    status.walk = WalkReading {
        active: report.walk_active.unwrap_or(false),
        completed: report.walk_completed.unwrap_or(false),
        started_at: parse_timestamp(report.walk_started_at.as_ref()),
        metrics: WalkMetrics {
            duration_seconds: report.walk_duration.unwrap_or(0),
            distance_metres: report.walk_distance.unwrap_or(0.0),
            stop_count: report.walk_stops.map_or(0, saturate),
            carried_seconds: report.carried_seconds.unwrap_or(0),
            vehicle_seconds: report.vehicle_seconds.unwrap_or(0),
            actual_walk_seconds: report.actual_walk_seconds.unwrap_or(0),
            cheat_flags: report.cheat_flags.map_or(0, saturate),
        }
        .bounded(),
    };
    status.scratch = ScratchReading {
        detected: report.scratch_detected.unwrap_or(false),
        intensity: report.scratch_intensity,
        frequency_hz: report.scratch_frequency,
        duration_ms: report.scratch_duration_ms,
        count_today: report.scratch_count.map_or(0, saturate),
        peak_frequency_hz: report.scratch_peak_frequency,
    };
    status.anomaly = anomaly(
        report.anomaly_type,
        report.anomaly_severity,
        report.anomaly_details,
    );
    Ok(status)
}

fn from_nested(
    report: NestedReport,
    received_at: DateTime<Utc>,
) -> Result<CanonicalStatus, NormalizeError> {
    let device_id = DeviceId::new(report.device_id.unwrap_or_default())?;
    let reported_at = parse_timestamp(report.timestamp.as_ref()).unwrap_or(received_at);
    let mut status = CanonicalStatus::with_defaults(device_id, reported_at);
    status.firmware_version = non_blank(report.firmware);

    if let Some(gps) = report.gps {
        status.fix = GpsFix {
            latitude: gps.lat,
            longitude: gps.lng,
            altitude_m: gps.alt,
            speed_mps: gps.speed,
            heading_deg: gps.heading,
            hdop: gps.hdop,
            satellites: gps.satellites.map(saturate),
            valid: gps.valid.unwrap_or(false),
        };
    }
    if let Some(motion) = report.motion {
        status.activity = non_blank(motion.activity);
        status.step_count = motion.steps.unwrap_or(0);
    }
    if let Some(battery) = report.battery {
        status.battery = BatteryReading {
            percent: battery.percent.map(battery_percent),
            voltage: battery.voltage,
            charging: battery.charging.unwrap_or(false),
        };
    }
    if let Some(network) = report.network {
        status.network = NetworkReading {
            rssi_dbm: network.rssi.map(saturate),
            network_type: non_blank(network.network_type),
        };
    }
    if let Some(state) = report.status {
        status.is_home = state.is_home.unwrap_or(true);
        status.is_escaped = state.is_escaped.unwrap_or(false);
    }
    if let Some(sleep) = report.sleep {
        let session = sleep.session.unwrap_or_default();
        status.sleep = SleepReading {
            is_sleeping: sleep.is_sleeping.unwrap_or(false),
            minutes_today: sleep.minutes_today.map_or(0, saturate),
            completed_session: sleep_session(
                session.start.as_ref(),
                session.end.as_ref(),
                session.quality,
            ),
        };
    }
    if let Some(walk) = report.walk {
        status.walk = WalkReading {
            active: walk.active.unwrap_or(false),
            completed: walk.completed.unwrap_or(false),
            started_at: parse_timestamp(walk.started_at.as_ref()),
            metrics: WalkMetrics {
                duration_seconds: walk.duration_s.unwrap_or(0),
                distance_metres: walk.distance_m.unwrap_or(0.0),
                stop_count: walk.stops.map_or(0, saturate),
                carried_seconds: walk.carried_s.unwrap_or(0),
                vehicle_seconds: walk.vehicle_s.unwrap_or(0),
                actual_walk_seconds: walk.actual_walk_s.unwrap_or(0),
                cheat_flags: walk.cheat_flags.map_or(0, saturate),
            }
            .bounded(),
        };
    }
    if let Some(scratch) = report.scratch {
        status.scratch = ScratchReading {
            detected: scratch.detected.unwrap_or(false),
            intensity: scratch.intensity,
            frequency_hz: scratch.frequency,
            duration_ms: scratch.duration_ms,
            count_today: scratch.count_today.map_or(0, saturate),
            peak_frequency_hz: scratch.peak_frequency,
        };
    }
    if let Some(section) = report.anomaly {
        status.anomaly = anomaly(section.anomaly_type, section.severity, section.details);
    }
    Ok(status)
}

/// Parse an RFC 3339 string or a Unix epoch in seconds or milliseconds.
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Value::Number(number) => {
            let epoch = number.as_i64()?;
            if epoch < MIN_EPOCH_SECONDS {
                None
            } else if epoch >= EPOCH_MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(epoch).single()
            } else {
                Utc.timestamp_opt(epoch, 0).single()
            }
        }
        _ => None,
    }
}

fn sleep_session(
    start: Option<&Value>,
    end: Option<&Value>,
    quality: Option<i64>,
) -> Option<SleepSessionReading> {
    let started_at = parse_timestamp(start)?;
    let ended_at = parse_timestamp(end)?;
    (ended_at > started_at).then(|| SleepSessionReading {
        started_at,
        ended_at,
        quality: quality.map(|q| saturate(q.clamp(0, 100))),
    })
}

fn anomaly(
    anomaly_type: Option<String>,
    severity: Option<String>,
    details: Option<Value>,
) -> Option<AnomalyReading> {
    let anomaly_type = non_blank(anomaly_type)?;
    Some(AnomalyReading {
        anomaly_type,
        severity: non_blank(severity),
        details: details.filter(|value| !value.is_null()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn battery_percent(raw: f64) -> i32 {
    if raw.is_nan() {
        return 0;
    }
    // Clamped to 0..=100 first, so the cast is exact.
    raw.round().clamp(0.0, 100.0) as i32
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
