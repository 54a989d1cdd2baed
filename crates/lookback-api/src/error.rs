//! Error types for the Lookback API layer.
//!
//! [`ApiError`] unifies every client-visible failure into a single enum
//! that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation, so all
//! error responses share one JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the Lookback API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required body field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The timestamp field was not a parseable ISO-8601 datetime.
    #[error("unparseable timestamp: {0}")]
    UnparseableTimestamp(String),

    /// The value field was not a finite number.
    #[error("non-numeric value: {0}")]
    NonNumericValue(String),

    /// The request body was missing or not valid JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    ///
    /// Every validation failure is the client's fault (400); only
    /// [`Internal`](Self::Internal) reports a server fault (500).
    const fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::UnparseableTimestamp(_)
            | Self::NonNumericValue(_)
            | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
