use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retrieval::search::SearchService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Similar-question lookup over the on-disk index; reloads itself after a rebuild.
    pub search: Arc<SearchService>,
    pub config: Config,
}
