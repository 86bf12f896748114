//! Privileged request guard
//!
//! Performer-dashboard endpoints take a [`Privileged`] argument. Extraction
//! checks the timestamp and hash headers against the shared secret; a
//! secret of 0 lets every request through.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use encore_common::api::auth::{
    validate_hash, validate_timestamp, ApiAuthError, HASH_HEADER, TIMESTAMP_HEADER,
};
use encore_common::time;
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Marker proving the caller passed privileged authentication
#[derive(Debug, Clone, Copy)]
pub struct Privileged;

#[axum::async_trait]
impl FromRequestParts<AppState> for Privileged {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let secret = state.queue.settings().api_shared_secret;
        if secret == 0 {
            return Ok(Privileged);
        }

        let timestamp = parts
            .headers
            .get(TIMESTAMP_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(AuthError::MissingTimestamp)?;
        let hash = parts
            .headers
            .get(HASH_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingHash)?;

        validate_timestamp(timestamp, time::now_millis()).map_err(|e| match e {
            ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
            other => AuthError::Other(other.to_string()),
        })?;

        validate_hash(hash, parts.method.as_str(), parts.uri.path(), timestamp, secret).map_err(
            |e| match e {
                ApiAuthError::InvalidHash {
                    provided,
                    calculated,
                } => {
                    warn!(
                        "Hash validation failed for {} {}: provided={}, calculated={}",
                        parts.method,
                        parts.uri.path(),
                        provided,
                        calculated
                    );
                    AuthError::InvalidHash
                }
                other => AuthError::Other(other.to_string()),
            },
        )?;

        Ok(Privileged)
    }
}

/// Authentication failures
#[derive(Debug)]
pub enum AuthError {
    MissingTimestamp,
    MissingHash,
    InvalidTimestamp(String),
    InvalidHash,
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingTimestamp => (
                StatusCode::UNAUTHORIZED,
                format!("Missing or invalid {} header", TIMESTAMP_HEADER),
            ),
            AuthError::MissingHash => (
                StatusCode::UNAUTHORIZED,
                format!("Missing {} header", HASH_HEADER),
            ),
            AuthError::InvalidTimestamp(reason) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid timestamp: {}", reason))
            }
            AuthError::InvalidHash => (StatusCode::UNAUTHORIZED, "Invalid hash".to_string()),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Authentication error: {}", msg),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
