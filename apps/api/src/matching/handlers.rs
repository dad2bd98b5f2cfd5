//! Axum route handlers for the matching API.

use axum::{extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::matching::hybrid::HybridQuery;
use crate::matching::keyword::{self, KeywordQuery};
use crate::models::CareerRecord;
use crate::state::AppState;

/// Longest accepted input, per field for keyword search and combined for
/// semantic search.
const MAX_QUERY_CHARS: usize = 1000;

/// POST /search
pub async fn handle_keyword_search(
    State(state): State<AppState>,
    Json(req): Json<KeywordQuery>,
) -> Result<Json<Vec<CareerRecord>>, AppError> {
    for field in [&req.interest, &req.skills, &req.job].into_iter().flatten() {
        check_length(field)?;
    }

    let catalog = state.catalog.get()?;
    let matches: Vec<CareerRecord> = keyword::search(&catalog, &req)
        .into_iter()
        .cloned()
        .collect();

    info!("Keyword search matched {} careers", matches.len());
    Ok(Json(matches))
}

/// POST /hf-search
pub async fn handle_semantic_search(
    State(state): State<AppState>,
    Json(req): Json<HybridQuery>,
) -> Result<Json<Vec<CareerRecord>>, AppError> {
    let query = req.combined();
    check_length(&query)?;

    let matches = state.hybrid.search(&query).await?;

    info!("Semantic search matched {} careers", matches.len());
    Ok(Json(matches))
}

fn check_length(text: &str) -> Result<(), AppError> {
    let chars = text.chars().count();
    if chars > MAX_QUERY_CHARS {
        return Err(AppError::Validation(format!(
            "query is {chars} characters; the limit is {MAX_QUERY_CHARS}"
        )));
    }
    Ok(())
}
