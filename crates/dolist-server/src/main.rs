//! `dolist-sync` server entry point.
//!
//! Loads configuration, prepares the data directory and API key file, then
//! starts the Axum HTTP server with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use dolist_core::document::DocumentStore;
use dolist_core::keys::FileKeyStore;

use dolist_server::config::ServerConfig;
use dolist_server::routes;
use dolist_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("dolist-sync starting");

    let state = build_app_state(&config).await?;
    let app = routes::router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "dolist-sync listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("dolist-sync stopped");
    Ok(())
}

/// Create the storage locations if needed and build the shared state.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let documents = DocumentStore::initialize(&config.data_dir)
        .await
        .context("failed to prepare data directory")?;

    let key_store = FileKeyStore::initialize(&config.keys_file)
        .await
        .context("failed to prepare API key file")?;
    info!(keys_file = %key_store.path().display(), "API key file ready");

    Ok(Arc::new(AppState {
        key_store: Arc::new(key_store),
        documents,
        admin_token: config.admin_token.clone(),
    }))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
