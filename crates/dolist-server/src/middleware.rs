//! Authentication middleware for `dolist-sync`.
//!
//! Two independent gates, each attached to its own routes:
//!
//! - [`api_key_middleware`] checks `Authorization: Bearer <key>` against the
//!   key store and injects the verified [`ApiKey`] into request extensions.
//! - [`admin_token_middleware`] checks the `Admin-Token` header against the
//!   configured secret.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use dolist_core::gate;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the admin secret.
pub const ADMIN_TOKEN_HEADER: HeaderName = HeaderName::from_static("admin-token");

/// The verified API key of the caller; also its storage identity.
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

/// Middleware that validates the bearer API key.
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // A header that is not visible ASCII is treated like a malformed one.
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    let verified = gate::validate_api_key(state.key_store.as_ref(), authorization).await;

    match verified {
        Ok(key) => {
            req.extensions_mut().insert(ApiKey(key));
            next.run(req).await
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Middleware that validates the `Admin-Token` header.
pub async fn admin_token_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(&ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.admin_token.validate(presented) {
        Ok(()) => next.run(req).await,
        Err(e) => AppError::from(e).into_response(),
    }
}
