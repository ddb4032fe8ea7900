//! Error taxonomy and HTTP response mapping.
//!
//! Every failure a handler can surface maps to exactly one variant here, and
//! every variant maps to one HTTP status with a flat `{"error": ...}` JSON
//! body. Store and serialization internals are logged, never exposed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed role/identity header.
    #[error("{0}")]
    Unauthenticated(String),

    /// RBAC policy denial.
    #[error("{0}")]
    Forbidden(String),

    /// Body or query validation failure.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown route or malformed path segment.
    #[error("{0}")]
    NotFound(String),

    /// A foreign key on create did not resolve to an existing row.
    #[error("invalid patient_id, physician_id, or drug_id")]
    InvalidReference,

    /// Raw database failure. Mapped to a generic 500, detail stays in logs.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::InvalidInput(_) | Error::InvalidReference => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::Database(e) => {
                tracing::error!(error = %e, "database operation failed");
                "internal server error".to_string()
            }
            Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
