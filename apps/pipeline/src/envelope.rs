// [apps/pipeline/src/envelope.rs]
//! Wire-shape helpers for the four stage endpoints (§6): an ingress body
//! that may be wrapped in a web-trigger envelope, and an egress body that
//! always mirrors `{statusCode, headers, body}` with `body` JSON-encoded
//! as a string.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::error::PipelineError;

/// Unwraps the three accepted ingress shapes into the actual request
/// object: `{body: "<json-string>"}`, `{body: {...}}`, or the raw object
/// itself at the top level.
pub fn unwrap_envelope(raw: Value) -> Result<Value, PipelineError> {
    match raw.get("body") {
        Some(Value::String(encoded)) => serde_json::from_str(encoded)
            .map_err(|err| PipelineError::Validation(format!("body is not valid JSON: {err}"))),
        Some(inner) => Ok(inner.clone()),
        None => Ok(raw),
    }
}

/// Builds the `{statusCode, headers, body}` response envelope every stage
/// returns, regardless of success or failure.
pub fn stage_response(status: StatusCode, body: Value) -> Response {
    let envelope = json!({
        "statusCode": status.as_u16(),
        "headers": { "Content-Type": "application/json" },
        "body": body.to_string(),
    });
    (status, Json(envelope)).into_response()
}

/// Reads a required string field from an unwrapped payload.
pub fn require_str(payload: &Value, field: &str) -> Result<String, PipelineError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Validation(format!("missing required field {field}")))
}

/// Reads an optional string field, treating an absent or non-string value
/// as `None` rather than an error.
pub fn optional_str(payload: &Value, field: &str) -> Option<String> {
    payload.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Sanitizes a caller-supplied filename prefix (§8): keeps only
/// `[A-Za-z0-9_-]`, truncates to 50 characters, and trims leading or
/// trailing underscores left behind by stripping.
pub fn sanitize_filename_prefix(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .take(50)
        .collect();
    filtered.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_stringified_body() {
        let raw = json!({ "body": "{\"listing_id\":\"L1\"}" });
        let unwrapped = unwrap_envelope(raw).unwrap();
        assert_eq!(unwrapped["listing_id"], "L1");
    }

    #[test]
    fn unwraps_object_body() {
        let raw = json!({ "body": { "listing_id": "L2" } });
        let unwrapped = unwrap_envelope(raw).unwrap();
        assert_eq!(unwrapped["listing_id"], "L2");
    }

    #[test]
    fn passes_through_raw_top_level_payload() {
        let raw = json!({ "listing_id": "L3" });
        let unwrapped = unwrap_envelope(raw).unwrap();
        assert_eq!(unwrapped["listing_id"], "L3");
    }

    #[test]
    fn sanitize_strips_disallowed_characters_and_trims_underscores() {
        assert_eq!(sanitize_filename_prefix("_hello-world!_"), "hello-world");
    }

    #[test]
    fn sanitize_truncates_to_fifty_characters() {
        let long = "a".repeat(80);
        assert_eq!(sanitize_filename_prefix(&long).len(), 50);
    }
}
