use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::matching::hybrid::HybridEngine;

/// Shared application state injected into all route handlers via Axum extractors.
/// Both engines are built before the listener binds; handlers only read.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<CatalogStore>,
    /// Semantic engine. Holds the embedding index for the process lifetime.
    pub hybrid: Arc<HybridEngine>,
}
