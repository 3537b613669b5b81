use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use platewise_server::{app, AppState, Config, SqliteRepository};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting platewise {}", platewise_server::get_version());

    let config = Config::from_env().context("Failed to load configuration")?;

    let db_path = config.database_path();
    info!("Using database: {}", db_path.display());
    let repository = SqliteRepository::new(&db_path).context("Failed to open SQLite database")?;

    info!("Review delete policy: {}", config.delete_policy);
    let state = Arc::new(AppState::new(Arc::new(repository), config.delete_policy));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
