use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use homeserve_api::config;
use homeserve_api::database::DatabaseManager;
use homeserve_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("homeserve_api=info,tower_http=info")),
        )
        .init();

    let config = Arc::new(config::config().clone());
    config.validate().context("invalid configuration")?;
    tracing::info!(
        "Starting HomeServe API in {:?} mode with {:?} storage",
        config.environment,
        config.storage.backend
    );

    let repo = DatabaseManager::connect(&config)
        .await
        .context("failed to open storage")?;
    let state = AppState::new(repo, config.clone());

    state
        .services
        .accounts
        .ensure_bootstrap_admin(config.security.bootstrap_admin.as_ref())
        .await
        .context("failed to create bootstrap admin")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("HomeServe API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
