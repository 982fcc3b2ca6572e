use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Returns service status plus a summary of the question index on disk.
/// A missing or unreadable index does not fail the health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let index = match state.search.manifest().await {
        Ok(manifest) => json!({
            "present": true,
            "build_id": manifest.build_id,
            "entries": manifest.entry_count,
            "model": manifest.model,
            "built_at": manifest.built_at,
        }),
        Err(e) => {
            warn!("health check could not read the question index: {e}");
            json!({ "present": false })
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "interview-api",
        "index": index
    }))
}
