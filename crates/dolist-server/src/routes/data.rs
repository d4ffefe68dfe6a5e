//! User document routes: `/api/data`
//!
//! Both handlers run behind the API key middleware and use the verified key
//! as the storage identity. A save body is only read when it is declared as
//! JSON; any other body saves two empty lists.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;
use serde_json::Value;

use dolist_core::document::DocumentUpdate;

use crate::error::AppError;
use crate::middleware::ApiKey;
use crate::state::AppState;

/// Build the `/data` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/data", get(get_data).post(save_data))
}

#[derive(Debug, Serialize)]
pub struct SaveDataResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Return the caller's document, or the empty document if none was written.
async fn get_data(
    State(state): State<Arc<AppState>>,
    Extension(ApiKey(key)): Extension<ApiKey>,
) -> Result<Json<Value>, AppError> {
    let document = state.documents.read(&key).await?;
    Ok(Json(document))
}

/// Overwrite the caller's document with the submitted lists.
async fn save_data(
    State(state): State<Arc<AppState>>,
    Extension(ApiKey(key)): Extension<ApiKey>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SaveDataResponse>, AppError> {
    let update = if is_json_content(&headers) {
        DocumentUpdate::from_json_body(&body)?
    } else {
        DocumentUpdate::default()
    };
    let updated_at = state.documents.write(&key, update).await?;

    Ok(Json(SaveDataResponse {
        success: true,
        message: "data saved",
        updated_at,
    }))
}

/// `application/json` or any `+json` media type, parameters ignored.
fn is_json_content(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
