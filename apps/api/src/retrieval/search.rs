//! Similarity Search Service — nearest-neighbour lookup over the question index.
//!
//! The loaded index is cached as an immutable snapshot. Every call checks the
//! manifest's `build_id`; after a rebuild the new index is loaded off the async
//! runtime and swapped in whole, so concurrent readers see either the old or
//! the new snapshot, never a partial one.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::retrieval::embedding::{cosine_similarity, Embedder, EmbeddingError};
use crate::retrieval::error::IndexError;
use crate::retrieval::models::SimilarityResult;
use crate::retrieval::store::{IndexManifest, IndexStore, StoredIndex};

#[derive(Debug, Clone, Copy)]
struct Scored {
    idx: usize,
    score: f32,
}

/// Scores every embedding against `query` and returns the best `k`,
/// highest score first. Equal scores keep their stored order.
fn top_k_cosine(haystack: &StoredIndex, query: &[f32], k: usize) -> Vec<Scored> {
    let mut scored: Vec<Scored> = haystack
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| Scored {
            idx,
            score: cosine_similarity(&entry.embedding, query),
        })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}

pub struct SearchService {
    store: Arc<dyn IndexStore>,
    embedder: Arc<dyn Embedder>,
    snapshot: RwLock<Option<Arc<StoredIndex>>>,
}

impl SearchService {
    pub fn new(store: Arc<dyn IndexStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            snapshot: RwLock::new(None),
        }
    }

    /// Manifest of the index currently on disk.
    pub async fn manifest(&self) -> Result<IndexManifest, IndexError> {
        let store = Arc::clone(&self.store);
        run_blocking(move || store.read_manifest()).await
    }

    /// Returns up to `k` stored questions most similar to `query`, most similar first.
    /// When `k` exceeds the index size every entry is returned.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SimilarityResult>, IndexError> {
        if query.trim().is_empty() {
            return Err(IndexError::InvalidQuery("query cannot be empty".to_string()));
        }
        if k == 0 {
            return Err(IndexError::InvalidQuery("k must be positive".to_string()));
        }

        let index = self.current_snapshot().await?;

        if index.manifest.model != self.embedder.model_id() {
            return Err(EmbeddingError::ModelMismatch {
                index_model: index.manifest.model.clone(),
                embedder_model: self.embedder.model_id().to_string(),
            }
            .into());
        }

        let query_vec = self.embedder.embed_one(query).await?;
        if query_vec.len() != index.manifest.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: index.manifest.dimensions,
                got: query_vec.len(),
            }
            .into());
        }
        if query_vec.iter().any(|x| !x.is_finite()) {
            return Err(
                EmbeddingError::Malformed("query vector contains non-finite values".to_string())
                    .into(),
            );
        }

        let results = top_k_cosine(&index, &query_vec, k)
            .into_iter()
            .map(|s| {
                let entry = &index.entries[s.idx];
                SimilarityResult {
                    content: entry.content.clone(),
                    metadata: entry.metadata.clone(),
                    score: s.score,
                }
            })
            .collect();
        Ok(results)
    }

    /// Cached snapshot, reloaded when the on-disk build id changes.
    async fn current_snapshot(&self) -> Result<Arc<StoredIndex>, IndexError> {
        let manifest = match self.manifest().await {
            Ok(m) => m,
            Err(e) => {
                if matches!(e, IndexError::IndexNotFound { .. }) {
                    self.replace_snapshot(None);
                }
                return Err(e);
            }
        };

        if let Some(cached) = self.cached() {
            if cached.manifest.build_id == manifest.build_id {
                return Ok(cached);
            }
        }

        let store = Arc::clone(&self.store);
        let loaded = Arc::new(run_blocking(move || store.read()).await?);
        info!(
            "loaded question index {} ({} entries, model {})",
            loaded.manifest.build_id, loaded.manifest.entry_count, loaded.manifest.model
        );
        self.replace_snapshot(Some(Arc::clone(&loaded)));
        Ok(loaded)
    }

    fn cached(&self) -> Option<Arc<StoredIndex>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_snapshot(&self, next: Option<Arc<StoredIndex>>) {
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = next;
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, IndexError>
where
    F: FnOnce() -> Result<T, IndexError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IndexError::io("<index loader>", std::io::Error::other(e)))?
}
