//! REST endpoint handlers for the Lookback API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service descriptor |
//! | `POST` | `/event` | Record one timestamped value |
//! | `GET` | `/statistics` | Rolling one-hour aggregates |
//! | `GET` | `/health` | Liveness probe |
//!
//! `POST /event` validates its body field by field instead of
//! deserializing into a typed struct, so clients get a specific reason
//! (missing field, bad timestamp, non-numeric value) rather than a
//! generic deserialization failure.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::info;

use lookback_core::event::WindowSummary;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /event -- record one event
// ---------------------------------------------------------------------------

/// Record a single timestamped value.
///
/// Expects a JSON body with a `timestamp` string (ISO-8601; a zoneless
/// datetime is read as UTC) and a numeric `value` (numeric strings are
/// coerced). Responds `201 Created` once the event is stored.
///
/// # Errors
///
/// Returns [`ApiError::InvalidBody`] for a malformed or non-JSON body,
/// [`ApiError::MissingField`] when either field is absent,
/// [`ApiError::UnparseableTimestamp`] for a timestamp that is not an
/// ISO-8601 string, and [`ApiError::NonNumericValue`] for a value that
/// is not a finite number.
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let timestamp = parse_timestamp_field(&body)?;
    let value = parse_value_field(&body)?;

    state.store.record(timestamp, value);
    info!(%timestamp, value, "Event recorded");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "event recorded" })),
    ))
}

// ---------------------------------------------------------------------------
// GET /statistics -- rolling aggregates
// ---------------------------------------------------------------------------

/// Return count, min, max, and mean over the trailing window.
///
/// The reference instant is the injected clock's current time, so a test
/// harness driving a manual clock gets deterministic output. Absent
/// statistics (an empty window) serialize as `null`.
pub async fn get_statistics(State(state): State<Arc<AppState>>) -> Json<WindowSummary> {
    let now = state.clock.now();
    let summary = state.store.summary(now);
    info!(count = summary.count, "Statistics computed");
    Json(summary)
}

// ---------------------------------------------------------------------------
// GET /health -- liveness probe
// ---------------------------------------------------------------------------

/// Liveness probe.
///
/// Always `200 OK` while the process can serve requests; deliberately
/// independent of the store's contents.
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ---------------------------------------------------------------------------
// GET / -- service descriptor
// ---------------------------------------------------------------------------

/// Describe the service and its endpoint map.
pub async fn index(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "service": "lookback",
        "description": "Rolling one-hour event statistics",
        "server_time": state.clock.now().to_rfc3339(),
        "endpoints": {
            "record": "POST /event",
            "statistics": "GET /statistics",
            "health": "GET /health",
        },
    }))
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

/// JSON error body for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not found",
            "status": 404,
        })),
    )
}

/// JSON error body for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({
            "error": "method not allowed",
            "status": 405,
        })),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract and parse the `timestamp` field from an event body.
fn parse_timestamp_field(body: &Value) -> Result<DateTime<Utc>, ApiError> {
    let raw = body
        .get("timestamp")
        .ok_or(ApiError::MissingField("timestamp"))?;

    let text = raw
        .as_str()
        .ok_or_else(|| ApiError::UnparseableTimestamp(raw.to_string()))?;

    parse_timestamp(text)
}

/// Parse an ISO-8601 timestamp, reading zoneless datetimes as UTC.
fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }

    // Inputs like "2024-06-01T12:00:00" carry no offset, so the RFC 3339
    // parser rejects them; they are read as UTC.
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_e| ApiError::UnparseableTimestamp(text.to_owned()))?;
    Ok(naive.and_utc())
}

/// Extract and parse the `value` field from an event body.
///
/// Accepts JSON numbers and numeric strings; rejects everything else,
/// including values that parse to a non-finite float such as `"NaN"`.
fn parse_value_field(body: &Value) -> Result<f64, ApiError> {
    let raw = body.get("value").ok_or(ApiError::MissingField("value"))?;

    let value = match raw {
        Value::Number(num) => num
            .as_f64()
            .ok_or_else(|| ApiError::NonNumericValue(raw.to_string()))?,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_e| ApiError::NonNumericValue(text.clone()))?,
        other => return Err(ApiError::NonNumericValue(other.to_string())),
    };

    if !value.is_finite() {
        return Err(ApiError::NonNumericValue(raw.to_string()));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-06-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-06-01T10:00:00+00:00");
    }

    #[test]
    fn parses_utc_suffix() {
        let ts = parse_timestamp("2024-06-01T12:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn parses_zoneless_as_utc() {
        let ts = parse_timestamp("2024-06-01T12:00:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn parses_fractional_seconds() {
        let ts = parse_timestamp("2024-06-01T12:00:00.250").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("not-a-timestamp").is_err());
        assert!(parse_timestamp("2024-13-40T99:00:00Z").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn timestamp_must_be_a_string() {
        let body = serde_json::json!({ "timestamp": 1_717_243_200 });
        assert!(matches!(
            parse_timestamp_field(&body),
            Err(ApiError::UnparseableTimestamp(_))
        ));
    }

    #[test]
    fn value_accepts_numbers_and_numeric_strings() {
        let body = serde_json::json!({ "value": 12.5 });
        assert_eq!(parse_value_field(&body).unwrap(), 12.5);

        let body = serde_json::json!({ "value": -3 });
        assert_eq!(parse_value_field(&body).unwrap(), -3.0);

        let body = serde_json::json!({ "value": "12.5" });
        assert_eq!(parse_value_field(&body).unwrap(), 12.5);

        let body = serde_json::json!({ "value": " 7 " });
        assert_eq!(parse_value_field(&body).unwrap(), 7.0);
    }

    #[test]
    fn value_rejects_non_numeric_inputs() {
        for body in [
            serde_json::json!({ "value": "abc" }),
            serde_json::json!({ "value": "NaN" }),
            serde_json::json!({ "value": "inf" }),
            serde_json::json!({ "value": true }),
            serde_json::json!({ "value": null }),
            serde_json::json!({ "value": [1.0] }),
        ] {
            assert!(matches!(
                parse_value_field(&body),
                Err(ApiError::NonNumericValue(_))
            ));
        }
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let body = serde_json::json!({ "value": 1.0 });
        assert!(matches!(
            parse_timestamp_field(&body),
            Err(ApiError::MissingField("timestamp"))
        ));

        let body = serde_json::json!({ "timestamp": "2024-06-01T12:00:00Z" });
        assert!(matches!(
            parse_value_field(&body),
            Err(ApiError::MissingField("value"))
        ));
    }
}
