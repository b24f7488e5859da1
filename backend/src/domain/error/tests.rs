//! Tests for the domain error payload and its serde contract.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
#[case(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("x"), ErrorCode::Unauthorized)]
#[case(Error::not_found("x"), ErrorCode::NotFound)]
#[case(Error::conflict("x"), ErrorCode::Conflict)]
#[case(Error::dependency_unavailable("x"), ErrorCode::DependencyUnavailable)]
#[case(Error::internal("x"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn with_trace_id_keeps_previous_value_on_blank(base_error: Error) {
    let err = base_error.with_trace_id(TRACE_ID).with_trace_id(" ");
    assert_eq!(err.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn trace_id_is_captured_from_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("valid uuid");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let err = runtime.block_on(TraceId::scope(trace_id, async { Error::internal("boom") }));
    assert_eq!(err.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serializes_with_camel_case_and_skips_empty_fields(base_error: Error) {
    let value = serde_json::to_value(&base_error).expect("serialize error");
    assert_eq!(value, json!({ "code": "invalid_request", "message": "bad" }));
}

#[rstest]
fn deserialization_accepts_snake_case_trace_id() {
    let payload = json!({
        "code": "not_found",
        "message": "missing",
        "trace_id": TRACE_ID,
        "details": { "walk_id": "abc" }
    });
    let err: Error = serde_json::from_value(payload).expect("deserialize error");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.trace_id(), Some(TRACE_ID));
    assert!(err.details().is_some());
}

#[rstest]
fn deserialization_rejects_blank_messages() {
    let payload = json!({ "code": "internal_error", "message": "" });
    let result = serde_json::from_value::<Error>(payload);
    assert!(result.is_err());
}
