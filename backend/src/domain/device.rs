//! Collar device identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted device identifier length.
pub const DEVICE_ID_MAX: usize = 64;

/// Validation errors returned by [`DeviceId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceIdValidationError {
    /// The identifier was absent or blank.
    #[error("device_id is required")]
    Missing,
    /// The identifier exceeded [`DEVICE_ID_MAX`] characters.
    #[error("device_id must be at most {max} characters")]
    TooLong { max: usize },
}

/// Opaque device identifier supplied by the collar firmware.
///
/// The gateway never generates identifiers; it only trims surrounding
/// whitespace and rejects blank or oversized values.
///
/// # Examples
/// ```
/// use collar_gateway::domain::DeviceId;
///
/// let id = DeviceId::new("  collar-01 ").expect("valid id");
/// assert_eq!(id.as_ref(), "collar-01");
/// assert!(DeviceId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate and construct a [`DeviceId`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DeviceIdValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DeviceIdValidationError::Missing);
        }
        if trimmed.chars().count() > DEVICE_ID_MAX {
            return Err(DeviceIdValidationError::TooLong { max: DEVICE_ID_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DeviceIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_identifiers_are_missing(#[case] raw: &str) {
        assert_eq!(DeviceId::new(raw), Err(DeviceIdValidationError::Missing));
    }

    #[rstest]
    fn oversized_identifiers_are_rejected() {
        let raw = "x".repeat(DEVICE_ID_MAX + 1);
        assert_eq!(
            DeviceId::new(raw),
            Err(DeviceIdValidationError::TooLong { max: DEVICE_ID_MAX })
        );
    }

    #[rstest]
    fn serde_round_trips_as_plain_string() {
        let id = DeviceId::new("collar-7").expect("valid id");
        let value = serde_json::to_value(&id).expect("serialize");
        assert_eq!(value, serde_json::json!("collar-7"));
        let back: DeviceId = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, id);
    }
}
