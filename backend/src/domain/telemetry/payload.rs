//! Versioned wire shapes for collar reports.
//!
//! Firmware 1.x posts a flat object; firmware 2.x groups fields into nested
//! sections. A report may pin its shape with a numeric `schema` field;
//! otherwise the shape is inferred from whether any known section is an
//! object. Field decoding is best-effort: a value of the wrong type is read as
//! absent rather than failing the report.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Field pinning the payload shape.
pub const SCHEMA_FIELD: &str = "schema";

const NESTED_SECTIONS: [&str; 9] = [
    "gps", "motion", "battery", "network", "status", "sleep", "walk", "scratch", "anomaly",
];

/// Known payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Firmware 1.x: every field at the top level.
    Flat,
    /// Firmware 2.x: fields grouped by subsystem.
    Nested,
}

impl PayloadShape {
    /// Work out the shape of a raw report.
    pub fn detect(raw: &Value) -> Result<Self, PayloadError> {
        let Value::Object(map) = raw else {
            return Err(PayloadError::NotAnObject);
        };
        if let Some(version) = map.get(SCHEMA_FIELD).filter(|value| !value.is_null()) {
            return match version.as_u64() {
                Some(1) => Ok(Self::Flat),
                Some(2) => Ok(Self::Nested),
                _ => Err(PayloadError::UnsupportedSchema {
                    version: version.to_string(),
                }),
            };
        }
        let nested = NESTED_SECTIONS
            .iter()
            .any(|section| map.get(*section).is_some_and(Value::is_object));
        Ok(if nested { Self::Nested } else { Self::Flat })
    }
}

/// Errors raised while decoding the report envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The body was valid JSON but not an object.
    #[error("telemetry payload must be a JSON object")]
    NotAnObject,
    /// The `schema` field named an unknown version.
    #[error("unsupported telemetry schema version {version}")]
    UnsupportedSchema { version: String },
}

/// A report decoded into its firmware-specific shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryReport {
    Flat(Box<FlatReport>),
    Nested(Box<NestedReport>),
}

impl TelemetryReport {
    /// Decode a raw report.
    pub fn from_value(raw: &Value) -> Result<Self, PayloadError> {
        let report = match PayloadShape::detect(raw)? {
            PayloadShape::Flat => Self::Flat(Box::new(decode(raw)?)),
            PayloadShape::Nested => Self::Nested(Box::new(decode(raw)?)),
        };
        Ok(report)
    }

    /// Shape the report was decoded as.
    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::Flat(_) => PayloadShape::Flat,
            Self::Nested(_) => PayloadShape::Nested,
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, PayloadError> {
    // Every field is lenient, so only a non-object can fail here.
    T::deserialize(raw).map_err(|_| PayloadError::NotAnObject)
}

/// Firmware 1.x report.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FlatReport {
    #[serde(default, deserialize_with = "text")]
    pub device_id: Option<String>,
    #[serde(default, alias = "fw_version", deserialize_with = "text")]
    pub firmware: Option<String>,
    #[serde(default, alias = "ts")]
    pub timestamp: Option<Value>,
    #[serde(default, alias = "latitude", deserialize_with = "lenient")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", alias = "longitude", deserialize_with = "lenient")]
    pub lng: Option<f64>,
    #[serde(default, alias = "altitude", deserialize_with = "lenient")]
    pub alt: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub hdop: Option<f64>,
    #[serde(default, deserialize_with = "integer")]
    pub satellites: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub gps_valid: Option<bool>,
    #[serde(default, deserialize_with = "text")]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "integer")]
    pub steps: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub battery: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub battery_voltage: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    pub charging: Option<bool>,
    #[serde(default, deserialize_with = "integer")]
    pub rssi: Option<i64>,
    #[serde(default, deserialize_with = "text")]
    pub network_type: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_home: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub is_escaped: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub is_sleeping: Option<bool>,
    #[serde(default, deserialize_with = "integer")]
    pub sleep_minutes: Option<i64>,
    #[serde(default)]
    pub sleep_session_start: Option<Value>,
    #[serde(default)]
    pub sleep_session_end: Option<Value>,
    #[serde(default, deserialize_with = "integer")]
    pub sleep_quality: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub walk_active: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub walk_completed: Option<bool>,
    #[serde(default)]
    pub walk_started_at: Option<Value>,
    #[serde(default, deserialize_with = "integer")]
    pub walk_duration: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub walk_distance: Option<f64>,
    #[serde(default, deserialize_with = "integer")]
    pub walk_stops: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    pub carried_seconds: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    pub vehicle_seconds: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    pub actual_walk_seconds: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    pub cheat_flags: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub scratch_detected: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub scratch_intensity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub scratch_frequency: Option<f64>,
    #[serde(default, deserialize_with = "integer")]
    pub scratch_duration_ms: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    pub scratch_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub scratch_peak_frequency: Option<f64>,
    #[serde(default, deserialize_with = "text")]
    pub anomaly_type: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub anomaly_severity: Option<String>,
    #[serde(default)]
    pub anomaly_details: Option<Value>,
}

/// Firmware 2.x report.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NestedReport {
    #[serde(default, deserialize_with = "text")]
    pub device_id: Option<String>,
    #[serde(default, alias = "fw_version", deserialize_with = "text")]
    pub firmware: Option<String>,
    #[serde(default, alias = "ts")]
    pub timestamp: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub gps: Option<GpsSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub motion: Option<MotionSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub battery: Option<BatterySection>,
    #[serde(default, deserialize_with = "lenient")]
    pub network: Option<NetworkSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<StateSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub sleep: Option<SleepSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub walk: Option<WalkSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub scratch: Option<ScratchSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub anomaly: Option<AnomalySection>,
}

/// `gps` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GpsSection {
    #[serde(default, alias = "latitude", deserialize_with = "lenient")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", alias = "longitude", deserialize_with = "lenient")]
    pub lng: Option<f64>,
    #[serde(default, alias = "altitude", deserialize_with = "lenient")]
    pub alt: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub hdop: Option<f64>,
    #[serde(default, alias = "sats", deserialize_with = "integer")]
    pub satellites: Option<i64>,
    #[serde(default, alias = "fix", deserialize_with = "flag")]
    pub valid: Option<bool>,
}

/// `motion` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MotionSection {
    #[serde(default, deserialize_with = "text")]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "integer")]
    pub steps: Option<i64>,
}

/// `battery` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BatterySection {
    #[serde(default, alias = "level", deserialize_with = "lenient")]
    pub percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub voltage: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    pub charging: Option<bool>,
}

/// `network` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NetworkSection {
    #[serde(default, deserialize_with = "integer")]
    pub rssi: Option<i64>,
    #[serde(default, rename = "type", deserialize_with = "text")]
    pub network_type: Option<String>,
}

/// `status` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StateSection {
    #[serde(default, deserialize_with = "flag")]
    pub is_home: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub is_escaped: Option<bool>,
}

/// `sleep` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SleepSection {
    #[serde(default, deserialize_with = "flag")]
    pub is_sleeping: Option<bool>,
    #[serde(default, deserialize_with = "integer")]
    pub minutes_today: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub session: Option<SleepSessionSection>,
}

/// `sleep.session` sub-section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SleepSessionSection {
    #[serde(default)]
    pub start: Option<Value>,
    #[serde(default)]
    pub end: Option<Value>,
    #[serde(default, deserialize_with = "integer")]
    pub quality: Option<i64>,
}

/// `walk` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WalkSection {
    #[serde(default, deserialize_with = "flag")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub completed: Option<bool>,
    #[serde(default)]
    pub started_at: Option<Value>,
    #[serde(default, alias = "duration", deserialize_with = "integer")]
    pub duration_s: Option<i64>,
    #[serde(default, alias = "distance", deserialize_with = "lenient")]
    pub distance_m: Option<f64>,
    #[serde(default, alias = "stop_count", deserialize_with = "integer")]
    pub stops: Option<i64>,
    #[serde(default, alias = "carried_seconds", deserialize_with = "integer")]
    pub carried_s: Option<i64>,
    #[serde(default, alias = "vehicle_seconds", deserialize_with = "integer")]
    pub vehicle_s: Option<i64>,
    #[serde(default, alias = "actual_walk_seconds", deserialize_with = "integer")]
    pub actual_walk_s: Option<i64>,
    #[serde(default, deserialize_with = "integer")]
    pub cheat_flags: Option<i64>,
}

/// `scratch` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ScratchSection {
    #[serde(default, deserialize_with = "flag")]
    pub detected: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub intensity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub frequency: Option<f64>,
    #[serde(default, deserialize_with = "integer")]
    pub duration_ms: Option<i64>,
    #[serde(default, alias = "daily_count", deserialize_with = "integer")]
    pub count_today: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub peak_frequency: Option<f64>,
}

/// `anomaly` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AnomalySection {
    #[serde(default, rename = "type", deserialize_with = "text")]
    pub anomaly_type: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub severity: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Decode any type, treating a mismatched value as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| serde_json::from_value(raw).ok()))
}

/// Integers, also accepting whole-valued floats such as `12.0`.
fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integer_from_value))
}

fn integer_from_value(value: &Value) -> Option<i64> {
    if let Some(exact) = value.as_i64() {
        return Some(exact);
    }
    let float = value.as_f64()?;
    // Whole values well inside the i64 range convert exactly.
    let whole = float.is_finite() && float.fract() == 0.0 && float.abs() < 9.0e15;
    whole.then_some(float as i64)
}

/// Booleans, also accepting the `0`/`1` integers older firmware sends.
fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    })
}

/// Strings, also accepting numbers (some firmware sends numeric device ids).
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    //! Shape detection and lenient field decoding.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({ "device_id": "a", "lat": 1.0 }), PayloadShape::Flat)]
    #[case(json!({ "device_id": "a", "battery": 80 }), PayloadShape::Flat)]
    #[case(json!({ "device_id": "a", "battery": { "percent": 80 } }), PayloadShape::Nested)]
    #[case(json!({ "device_id": "a", "gps": { "lat": 1.0 } }), PayloadShape::Nested)]
    #[case(json!({ "device_id": "a", "schema": 1, "gps": { "lat": 1.0 } }), PayloadShape::Flat)]
    #[case(json!({ "device_id": "a", "schema": 2 }), PayloadShape::Nested)]
    fn detects_shape(#[case] raw: Value, #[case] expected: PayloadShape) {
        assert_eq!(PayloadShape::detect(&raw), Ok(expected));
    }

    #[rstest]
    #[case(json!([1, 2, 3]))]
    #[case(json!("device"))]
    #[case(json!(null))]
    fn rejects_non_objects(#[case] raw: Value) {
        assert_eq!(
            TelemetryReport::from_value(&raw),
            Err(PayloadError::NotAnObject)
        );
    }

    #[rstest]
    fn rejects_unknown_schema_versions() {
        let raw = json!({ "device_id": "a", "schema": 7 });
        assert!(matches!(
            PayloadShape::detect(&raw),
            Err(PayloadError::UnsupportedSchema { .. })
        ));
    }

    #[rstest]
    fn mistyped_fields_are_read_as_absent() {
        let raw = json!({
            "device_id": 1234,
            "lat": "north",
            "steps": 12.0,
            "satellites": 7.5,
            "gps_valid": 1,
            "charging": "yes"
        });
        let TelemetryReport::Flat(report) = TelemetryReport::from_value(&raw).expect("decodes")
        else {
            panic!("expected flat report");
        };
        assert_eq!(report.device_id.as_deref(), Some("1234"));
        assert_eq!(report.lat, None);
        assert_eq!(report.steps, Some(12));
        assert_eq!(report.satellites, None);
        assert_eq!(report.gps_valid, Some(true));
        assert_eq!(report.charging, None);
    }

    #[rstest]
    fn mistyped_sections_are_read_as_absent() {
        let raw = json!({
            "device_id": "a",
            "gps": "unavailable",
            "walk": { "active": true, "stops": 3 }
        });
        let TelemetryReport::Nested(report) = TelemetryReport::from_value(&raw).expect("decodes")
        else {
            panic!("expected nested report");
        };
        assert!(report.gps.is_none());
        let walk = report.walk.expect("walk section");
        assert_eq!(walk.active, Some(true));
        assert_eq!(walk.stops, Some(3));
    }
}
