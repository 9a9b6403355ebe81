//! The main function for the Librarian REST server
use anyhow::{Context as _, anyhow};
use librarian_server::config::ServerConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|error| anyhow!(error))?;
    if let Err(error) = dotenv {
        tracing::info!("No .env file loaded: {error}");
    }

    let config = ServerConfig::from_env()?;
    let state = librarian_server::bootstrap(&config).await?;
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    tracing::info!("Librarian listening on {}", config.addr);

    axum::serve(listener, librarian_server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {error}");
        core::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
