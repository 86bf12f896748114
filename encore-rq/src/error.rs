//! Error types for encore-rq
//!
//! Domain errors map onto HTTP status codes in [`IntoResponse`]; everything
//! else is reported as 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Main error type for encore-rq
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input, rejected before anything is persisted
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Show is not currently open for requests
    #[error("Show {0} is not accepting requests")]
    NotAccepting(Uuid),

    /// Unknown show or request id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal status change; the record is left unchanged
    #[error("Illegal status transition: {0}")]
    StateTransition(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors surfaced by the shared library
    #[error(transparent)]
    Common(#[from] encore_common::Error),

    /// Runtime settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn show_not_found(id: Uuid) -> Self {
        Error::NotFound(format!("show {}", id))
    }

    pub fn request_not_found(id: Uuid) -> Self {
        Error::NotFound(format!("request {}", id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::NotAccepting(_) | Error::StateTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Common(encore_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Common(encore_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("JSON encoding error: {}", e))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match &self {
            Error::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            Error::NotAccepting(_) => json!({
                "error": self.to_string(),
                "code": "not_accepting",
            }),
            Error::StateTransition(_) => json!({
                "error": self.to_string(),
                "code": "illegal_transition",
            }),
            _ if status.is_server_error() => json!({ "error": "internal server error" }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience Result type using encore-rq Error
pub type Result<T> = std::result::Result<T, Error>;
