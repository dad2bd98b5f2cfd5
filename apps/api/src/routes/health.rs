use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version plus catalog and semantic index status.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "careermatch-api",
        "catalog_loaded": state.catalog.is_loaded(),
        "indexed_careers": state.hybrid.indexed(),
        "engine_state": state.hybrid.phase(),
        "similarity_threshold": state.config.hybrid.similarity_threshold,
        "prefilter": state.config.hybrid.prefilter,
    }))
}
