pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/search", post(handlers::handle_keyword_search))
        .route("/hf-search", post(handlers::handle_semantic_search))
        .with_state(state)
}
