//! Admin key minting: `/api/generate-key`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use dolist_core::keys::mint_api_key;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/generate-key` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/generate-key", post(generate_key))
}

#[derive(Debug, Serialize)]
pub struct GenerateKeyResponse {
    pub success: bool,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

/// Mint a new API key and append it to the key collection.
async fn generate_key(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenerateKeyResponse>, AppError> {
    let api_key = mint_api_key(state.key_store.as_ref()).await?;

    Ok(Json(GenerateKeyResponse {
        success: true,
        api_key,
    }))
}
