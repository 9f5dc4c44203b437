//! Controller error types with HTTP status code mapping.
//!
//! [`ControllerError`] is the central error type for the gateway. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Link-level failures (robot unreachable, malformed telemetry)
//! are never surfaced here: they are logged and absorbed by the
//! reconnect loop.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "invalid LED color: #zz0000",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Gateway error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 3000–3999 | Server     | 500 Internal Server Error |
/// | 4000–4999 | Cooldown   | 429 Too Many Requests     |
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// LED color string is not a `#rrggbb` hex triplet.
    #[error("invalid LED color: {0}")]
    InvalidColor(String),

    /// Joystick widget geometry leaves no room for the knob to move.
    #[error("invalid joystick geometry: {0}")]
    InvalidGeometry(String),

    /// Unknown control mode identifier.
    #[error("unknown control mode: {0}")]
    UnknownMode(String),

    /// Unknown keyboard key identifier.
    #[error("unbound key: {0}")]
    UnboundKey(String),

    /// Kick was requested before the cooldown elapsed.
    #[error("kick cooling down; retry in {remaining_secs} s")]
    KickCoolingDown {
        /// Whole seconds until the next kick is accepted.
        remaining_secs: u64,
    },

    /// Configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ControllerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidColor(_) => 1002,
            Self::InvalidGeometry(_) => 1003,
            Self::UnknownMode(_) => 1004,
            Self::UnboundKey(_) => 1005,
            Self::Config(_) => 3001,
            Self::KickCoolingDown { .. } => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidColor(_)
            | Self::InvalidGeometry(_)
            | Self::UnknownMode(_)
            | Self::UnboundKey(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::KickCoolingDown { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
