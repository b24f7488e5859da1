//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{DeviceId, DeviceIdValidationError, Error};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidDeviceId,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidDeviceId => "invalid_device_id",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("{} is required", field.as_str()),
    )
}

/// Parse the `{id}` path segment into a [`DeviceId`].
pub(crate) fn parse_device_id(raw: String) -> Result<DeviceId, Error> {
    DeviceId::new(raw).map_err(|err| match err {
        DeviceIdValidationError::Missing => missing_field_error(FieldName::new("device_id")),
        other @ DeviceIdValidationError::TooLong { .. } => field_error(
            FieldName::new("device_id"),
            ErrorCode::InvalidDeviceId,
            other.to_string(),
        ),
    })
}

/// Parse a required UUID field.
pub(crate) fn parse_uuid(value: Option<String>, field: FieldName) -> Result<Uuid, Error> {
    let raw = value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(field))?;
    Uuid::parse_str(raw.trim()).map_err(|_| {
        field_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
        )
    })
}

/// Read an integer query parameter leniently.
///
/// Non-numeric values read as absent so the endpoint default applies.
pub(crate) fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(Some("14"), Some(14))]
    #[case(Some(" 3 "), Some(3))]
    #[case(Some("abc"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn lenient_int_ignores_garbage(#[case] raw: Option<&str>, #[case] expected: Option<i64>) {
        assert_eq!(lenient_int(raw), expected);
    }

    #[rstest]
    fn device_id_over_limit_is_invalid_request() {
        let err = parse_device_id("x".repeat(65)).expect_err("too long");

        assert_eq!(err.code(), DomainErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
            Some("invalid_device_id")
        );
    }

    #[rstest]
    #[case(None, "missing_field")]
    #[case(Some("  "), "missing_field")]
    #[case(Some("not-a-uuid"), "invalid_uuid")]
    fn uuid_errors_carry_codes(#[case] raw: Option<&str>, #[case] code: &str) {
        let err = parse_uuid(raw.map(str::to_owned), FieldName::new("walk_id"))
            .expect_err("invalid uuid");

        assert_eq!(
            err.details().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
            Some(code)
        );
    }
}
