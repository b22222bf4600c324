pub mod analysis;
pub mod api;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod models;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use db::SqliteStore;
use indicators::registry::PairRegistry;

/// Boots the HTTP service and serves until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::from_env();

    let pool = db::init(&cfg.database_url, cfg.db_max_connections).await?;
    let registry = PairRegistry::load(cfg.pair_registry_file.as_deref())?;
    tracing::info!("Combined pairs registered: {}", registry.pairs().len());

    let state = api::AppState::new(Arc::new(SqliteStore::new(pool)), Arc::new(registry), cfg.defaults);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr.as_str()).await?;
    tracing::info!("Risk monitor listening on http://{}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping");
}
