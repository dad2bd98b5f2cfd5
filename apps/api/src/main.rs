mod catalog;
mod config;
mod embeddings;
mod errors;
mod matching;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::embeddings::build_embedder;
use crate::matching::hybrid::HybridEngine;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career Match API v{}", env!("CARGO_PKG_VERSION"));

    // Load the catalog eagerly; an unreadable catalog is fatal
    let catalog = Arc::new(CatalogStore::new(config.catalog_dir.clone()));
    let careers = catalog
        .get()
        .with_context(|| format!("Failed to load catalog from {}", config.catalog_dir.display()))?;

    // Initialize embedder
    let embedder = build_embedder(&config).context("Failed to initialize embedding backend")?;
    info!(
        "Embedding backend initialized ({:?}: {})",
        config.embedding_backend,
        embedder.name()
    );

    // Build the semantic index before accepting traffic
    let hybrid = Arc::new(HybridEngine::new(Arc::from(embedder), config.hybrid));
    hybrid
        .build(careers)
        .await
        .context("Failed to build semantic index")?;
    info!(
        "Hybrid engine ready (threshold {}, prefilter {})",
        hybrid.config().similarity_threshold,
        hybrid.config().prefilter
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        catalog,
        hybrid,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
