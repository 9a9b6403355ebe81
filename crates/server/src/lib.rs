//! `librarian_server`
//!
//! The REST surface of Librarian: an axum router translating requests into calls on one shared
//! [`librarian_core::Catalog`], plus the configuration and bootstrap code used by the binary.
use crate::auth::{AllowAll, Authorizer, ReadOnly};
use crate::config::ServerConfig;
use crate::state::AppState;
use anyhow::Context as _;
use librarian_core::Catalog;
use librarian_core::lookup::GoogleBooksClient;
use librarian_core::seed::Seed;
use std::sync::Arc;

/// Authorization hook consulted by every handler
pub mod auth;
/// Settings read from the environment
pub mod config;
/// Mapping of failures onto HTTP responses
pub mod error;
/// Handlers and the router tying them together
pub mod routes;
/// Shared application state
pub mod state;
#[cfg(test)]
mod testing;

pub use routes::router;

/// Builds the application state described by `config`, loading its seed document if one is set
/// # Errors
/// Fails if the seed document cannot be read, parsed or loaded
pub async fn bootstrap(config: &ServerConfig) -> anyhow::Result<AppState> {
    let mut catalog = Catalog::new();
    if let Some(path) = &config.seed_path {
        let document = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed document {}", path.display()))?;
        let seed = Seed::from_json(&document)
            .with_context(|| format!("Failed to parse seed document {}", path.display()))?;
        catalog
            .load(seed)
            .with_context(|| format!("Failed to load seed document {}", path.display()))?;
        tracing::info!("Loaded seed document {}", path.display());
    }

    let authorizer: Arc<dyn Authorizer> = if config.read_only {
        tracing::info!("Serving catalog read-only");
        Arc::new(ReadOnly)
    } else {
        Arc::new(AllowAll)
    };
    let state = AppState::new(catalog, authorizer);

    match GoogleBooksClient::new(config.google_books_api_key.clone()) {
        Ok(client) => Ok(state.with_lookup(client)),
        Err(error) => {
            tracing::warn!("ISBN lookup disabled: {error}");
            Ok(state)
        }
    }
}
