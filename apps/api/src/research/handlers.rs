use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::research::company_summary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// POST /perplexity/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let summary = company_summary(&state.llm, &req.query).await?;
    Ok(Json(SummaryResponse { summary }))
}
