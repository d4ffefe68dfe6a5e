//! Shared application state for `dolist-sync` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers and middleware via `Arc`.

use std::sync::Arc;

use dolist_core::document::DocumentStore;
use dolist_core::gate::AdminToken;
use dolist_core::keys::KeyStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Collection of valid API keys.
    pub key_store: Arc<dyn KeyStore>,
    /// Per-user document files.
    pub documents: DocumentStore,
    /// Secret that authorizes key minting.
    pub admin_token: AdminToken,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("data_dir", &self.documents.data_dir())
            .finish_non_exhaustive()
    }
}
