//! HTTP routes for `dolist-sync`.
//!
//! - `data`: read and overwrite the caller's document (API key auth)
//! - `keys`: mint new API keys (admin token auth)

pub mod data;
pub mod keys;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware as axum_mw;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{admin_token_middleware, api_key_middleware, ADMIN_TOKEN_HEADER};
use crate::state::AppState;

/// Build the full application router with middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let user_routes = data::router().route_layer(axum_mw::from_fn_with_state(
        Arc::clone(&state),
        api_key_middleware,
    ));

    let admin_routes = keys::router().route_layer(axum_mw::from_fn_with_state(
        Arc::clone(&state),
        admin_token_middleware,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, ADMIN_TOKEN_HEADER]);

    Router::new()
        .nest("/api", user_routes.merge(admin_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
