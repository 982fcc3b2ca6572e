//! Embedding collaborator: text in, fixed-length vector out.
//!
//! The retrieval core only sees the [`Embedder`] trait. `OllamaEmbedder` talks
//! to a local embedding runtime; tests swap in a stub with hand-picked vectors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub type Embedding = Vec<f32>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding runtime error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed embedding output: {0}")]
    Malformed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("index was built with model '{index_model}' but embedder uses '{embedder_model}'")]
    ModelMismatch {
        index_model: String,
        embedder_model: String,
    },
}

/// Must be deterministic for a fixed model: the same text yields the same vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Malformed("no vector returned".to_string()))
    }

    /// Identifier pinned into the index manifest.
    fn model_id(&self) -> &str;
}

/// Checks a batch response: one vector per input, all non-empty, equal length
/// and finite. Returns the shared dimensionality.
pub fn validate_embeddings(inputs: usize, vectors: &[Embedding]) -> Result<usize, EmbeddingError> {
    if vectors.len() != inputs {
        return Err(EmbeddingError::Malformed(format!(
            "expected {inputs} vectors, got {}",
            vectors.len()
        )));
    }
    let Some(first) = vectors.first() else {
        return Ok(0);
    };
    let dim = first.len();
    if dim == 0 {
        return Err(EmbeddingError::Malformed("empty vector".to_string()));
    }
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                got: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::Malformed(format!(
                "vector {i} contains non-finite values"
            )));
        }
    }
    Ok(dim)
}

/// Cosine similarity of two equal-length vectors.
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

// ────────────────────────────────────────────────────────────────────────────
// Ollama backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Embedding>,
}

/// Embedder backed by a local Ollama runtime (`POST /api/embed`).
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedResponse = response.json().await?;
        let dim = validate_embeddings(texts.len(), &body.embeddings)?;
        debug!(
            "embedded {} texts with {} (dim {dim})",
            texts.len(),
            self.model
        );
        Ok(body.embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
