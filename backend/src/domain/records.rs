//! Persistent records derived from a canonical status.
//!
//! Each constructor decides whether a report produces the record at all, so
//! the ingestion pipeline only sequences writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::telemetry::CanonicalStatus;
use crate::domain::{DeviceId, GradeLetter, WalkGrade, WalkMetrics};

/// Latest snapshot for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatusSnapshot {
    pub device_id: DeviceId,
    pub firmware_version: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub gps_valid: bool,
    pub activity: Option<String>,
    pub step_count: i64,
    pub battery_percent: Option<i32>,
    pub battery_voltage: Option<f64>,
    pub charging: bool,
    pub rssi_dbm: Option<i32>,
    pub network_type: Option<String>,
    pub is_home: bool,
    pub is_escaped: bool,
    pub is_sleeping: bool,
    pub sleep_minutes_today: i32,
    pub walk_active: bool,
    pub walk_duration_s: i64,
    pub walk_distance_m: f64,
    pub walk_stop_count: i32,
    pub carried_seconds: i64,
    pub vehicle_seconds: i64,
    pub actual_walk_seconds: i64,
    pub cheat_flags: i32,
    pub scratch_count_today: i32,
    pub scratch_peak_frequency: Option<f64>,
    pub walk_grade: Option<GradeLetter>,
    pub walk_grade_score: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceStatusSnapshot {
    /// Apply a report on top of the previous snapshot.
    ///
    /// Counters and flags always take the reported value. Optional readings
    /// the report omits keep their previous value, so the snapshot holds the
    /// last known position, battery and grade.
    pub fn upserted(
        previous: Option<&Self>,
        status: &CanonicalStatus,
        grade: Option<&WalkGrade>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let keep = |next: Option<f64>, prev: fn(&Self) -> Option<f64>| {
            next.or_else(|| previous.and_then(prev))
        };
        let walk = &status.walk.metrics;
        Self {
            device_id: status.device_id.clone(),
            firmware_version: status
                .firmware_version
                .clone()
                .or_else(|| previous.and_then(|p| p.firmware_version.clone())),
            reported_at: status.reported_at,
            latitude: keep(status.fix.latitude, |p| p.latitude),
            longitude: keep(status.fix.longitude, |p| p.longitude),
            altitude_m: keep(status.fix.altitude_m, |p| p.altitude_m),
            speed_mps: keep(status.fix.speed_mps, |p| p.speed_mps),
            heading_deg: keep(status.fix.heading_deg, |p| p.heading_deg),
            hdop: keep(status.fix.hdop, |p| p.hdop),
            satellites: status
                .fix
                .satellites
                .or_else(|| previous.and_then(|p| p.satellites)),
            gps_valid: status.fix.valid,
            activity: status
                .activity
                .clone()
                .or_else(|| previous.and_then(|p| p.activity.clone())),
            step_count: status.step_count,
            battery_percent: status
                .battery
                .percent
                .or_else(|| previous.and_then(|p| p.battery_percent)),
            battery_voltage: keep(status.battery.voltage, |p| p.battery_voltage),
            charging: status.battery.charging,
            rssi_dbm: status
                .network
                .rssi_dbm
                .or_else(|| previous.and_then(|p| p.rssi_dbm)),
            network_type: status
                .network
                .network_type
                .clone()
                .or_else(|| previous.and_then(|p| p.network_type.clone())),
            is_home: status.is_home,
            is_escaped: status.is_escaped,
            is_sleeping: status.sleep.is_sleeping,
            sleep_minutes_today: status.sleep.minutes_today,
            walk_active: status.walk.active,
            walk_duration_s: walk.duration_seconds,
            walk_distance_m: walk.distance_metres,
            walk_stop_count: walk.stop_count,
            carried_seconds: walk.carried_seconds,
            vehicle_seconds: walk.vehicle_seconds,
            actual_walk_seconds: walk.actual_walk_seconds,
            cheat_flags: walk.cheat_flags,
            scratch_count_today: status.scratch.count_today,
            scratch_peak_frequency: keep(status.scratch.peak_frequency_hz, |p| {
                p.scratch_peak_frequency
            }),
            walk_grade: grade
                .map(|g| g.grade)
                .or_else(|| previous.and_then(|p| p.walk_grade)),
            walk_grade_score: grade
                .map(|g| g.score)
                .or_else(|| previous.and_then(|p| p.walk_grade_score)),
            updated_at,
        }
    }

    /// Last known coordinates, when they are inside WGS84 bounds.
    pub fn last_position(&self) -> Option<(f64, f64)> {
        let (lat, lng) = (self.latitude?, self.longitude?);
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some((lat, lng))
    }

    /// Walk counters accumulated on the collar.
    pub fn walk_metrics(&self) -> WalkMetrics {
        WalkMetrics {
            duration_seconds: self.walk_duration_s,
            distance_metres: self.walk_distance_m,
            stop_count: self.walk_stop_count,
            carried_seconds: self.carried_seconds,
            vehicle_seconds: self.vehicle_seconds,
            actual_walk_seconds: self.actual_walk_seconds,
            cheat_flags: self.cheat_flags,
        }
    }
}

/// One point of location history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub device_id: DeviceId,
    pub recorded_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<i32>,
    pub activity: Option<String>,
}

impl LocationRecord {
    /// History point for a report carrying a valid fix.
    pub fn from_status(status: &CanonicalStatus) -> Option<Self> {
        let (latitude, longitude) = status.fix.position()?;
        Some(Self {
            device_id: status.device_id.clone(),
            recorded_at: status.reported_at,
            latitude,
            longitude,
            altitude_m: status.fix.altitude_m,
            speed_mps: status.fix.speed_mps,
            heading_deg: status.fix.heading_deg,
            hdop: status.fix.hdop,
            satellites: status.fix.satellites,
            activity: status.activity.clone(),
        })
    }
}

/// A single scratch detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScratchEvent {
    pub device_id: DeviceId,
    pub detected_at: DateTime<Utc>,
    pub intensity: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub duration_ms: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ScratchEvent {
    /// Event for a report whose detector fired.
    pub fn from_status(status: &CanonicalStatus) -> Option<Self> {
        if !status.scratch.detected {
            return None;
        }
        let position = status.fix.position();
        Some(Self {
            device_id: status.device_id.clone(),
            detected_at: status.reported_at,
            intensity: status.scratch.intensity,
            frequency_hz: status.scratch.frequency_hz,
            duration_ms: status.scratch.duration_ms,
            latitude: position.map(|(lat, _)| lat),
            longitude: position.map(|(_, lng)| lng),
        })
    }
}

/// Device-maintained scratch totals for one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScratchDaily {
    pub device_id: DeviceId,
    pub day: NaiveDate,
    pub scratch_count: i32,
    pub peak_frequency_hz: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl ScratchDaily {
    /// Daily row carrying the collar's running totals.
    pub fn from_status(status: &CanonicalStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            device_id: status.device_id.clone(),
            day: status.reported_at.date_naive(),
            scratch_count: status.scratch.count_today,
            peak_frequency_hz: status.scratch.peak_frequency_hz,
            updated_at,
        }
    }
}

/// Logged anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub device_id: DeviceId,
    pub anomaly_type: String,
    pub severity: Option<String>,
    pub details: Option<Value>,
    pub detected_at: DateTime<Utc>,
}

impl AnomalyEntry {
    /// Entry for a report that raised an anomaly, stamped at `detected_at`.
    pub fn from_status(status: &CanonicalStatus, detected_at: DateTime<Utc>) -> Option<Self> {
        let anomaly = status.anomaly.as_ref()?;
        Some(Self {
            device_id: status.device_id.clone(),
            anomaly_type: anomaly.anomaly_type.clone(),
            severity: anomaly.severity.clone(),
            details: anomaly.details.clone(),
            detected_at,
        })
    }
}

/// A finished sleep session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSession {
    pub device_id: DeviceId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub minutes: i32,
    pub quality: Option<i32>,
}

impl SleepSession {
    /// Session for a report that closed one.
    pub fn from_status(status: &CanonicalStatus) -> Option<Self> {
        let session = status.sleep.completed_session.as_ref()?;
        Some(Self {
            device_id: status.device_id.clone(),
            started_at: session.started_at,
            ended_at: session.ended_at,
            minutes: session.minutes(),
            quality: session.quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::normalize;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    fn status(raw: Value, now: DateTime<Utc>) -> CanonicalStatus {
        normalize(&raw, now).expect("valid payload")
    }

    #[rstest]
    fn upsert_keeps_last_known_optional_readings(now: DateTime<Utc>) {
        let first = status(
            json!({ "device_id": "c1", "lat": 10.0, "lng": 20.0, "gps_valid": true, "battery": 90 }),
            now,
        );
        let second = status(json!({ "device_id": "c1", "steps": 12 }), now);

        let snapshot = DeviceStatusSnapshot::upserted(None, &first, None, now);
        let snapshot = DeviceStatusSnapshot::upserted(Some(&snapshot), &second, None, now);

        assert_eq!(snapshot.last_position(), Some((10.0, 20.0)));
        assert!(!snapshot.gps_valid);
        assert_eq!(snapshot.battery_percent, Some(90));
        assert_eq!(snapshot.step_count, 12);
    }

    #[rstest]
    fn location_requires_valid_fix(now: DateTime<Utc>) {
        let invalid = status(json!({ "device_id": "c1", "lat": 10.0, "lng": 20.0 }), now);
        assert!(LocationRecord::from_status(&invalid).is_none());

        let valid = status(
            json!({ "device_id": "c1", "lat": 10.0, "lng": 20.0, "gps_valid": true }),
            now,
        );
        let record = LocationRecord::from_status(&valid).expect("location");
        assert_eq!((record.latitude, record.longitude), (10.0, 20.0));
    }

    #[rstest]
    fn scratch_event_carries_fix_when_valid(now: DateTime<Utc>) {
        let report = status(
            json!({
                "device_id": "c1",
                "scratch": { "detected": true, "intensity": 0.4, "count_today": 3 },
                "gps": { "lat": 1.0, "lng": 2.0, "valid": true }
            }),
            now,
        );
        let event = ScratchEvent::from_status(&report).expect("event");
        assert_eq!(event.latitude, Some(1.0));
        let daily = ScratchDaily::from_status(&report, now);
        assert_eq!(daily.scratch_count, 3);
        assert_eq!(daily.day, now.date_naive());
    }
}
