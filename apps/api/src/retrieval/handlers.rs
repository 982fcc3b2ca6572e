use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::retrieval::models::SimilarityResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuestionSearchRequest {
    pub query: String,
    /// Defaults to the configured `SEARCH_TOP_K`.
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct QuestionSearchResponse {
    pub results: Vec<SimilarityResult>,
}

/// POST /chroma/search (alias: /questions/search)
pub async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<QuestionSearchRequest>,
) -> Result<Json<QuestionSearchResponse>, AppError> {
    let k = req.k.unwrap_or(state.config.search_top_k);
    let results = state.search.search(&req.query, k).await?;
    Ok(Json(QuestionSearchResponse { results }))
}
