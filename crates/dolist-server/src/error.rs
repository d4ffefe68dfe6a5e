//! HTTP error types for `dolist-sync` server.
//!
//! Maps errors from `dolist-core` into HTTP responses. Every variant
//! produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`, and is logged when the response is built.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use dolist_core::error::{DocumentError, GateError, KeyStoreError};

/// Application-level error returned from HTTP handlers and middleware.
#[derive(Debug)]
pub enum AppError {
    /// No credential, or a malformed one.
    Unauthenticated(String),
    /// A credential was presented but is not valid.
    Forbidden(String),
    /// Client sent an unusable body.
    BadRequest(String),
    /// Storage or parse failure on the server side.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::MissingCredential | GateError::MalformedCredential => {
                Self::Unauthenticated(err.to_string())
            }
            GateError::InvalidApiKey | GateError::InvalidAdminToken => {
                Self::Forbidden(err.to_string())
            }
            GateError::KeyStore(inner) => inner.into(),
        }
    }
}

impl From<KeyStoreError> for AppError {
    fn from(err: KeyStoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InvalidUpdate { .. } => Self::BadRequest(err.to_string()),
            DocumentError::Read { .. }
            | DocumentError::Corrupt { .. }
            | DocumentError::Write { .. }
            | DocumentError::DataDir { .. } => Self::Internal(err.to_string()),
        }
    }
}
