use std::path::PathBuf;

use thiserror::Error;

use crate::retrieval::embedding::EmbeddingError;

/// Failures of the index builder and the similarity search service.
/// None of these are retried inside the retrieval core.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no question records left after filtering blank text")]
    EmptyInput,

    #[error("no question index found at {}", path.display())]
    IndexNotFound { path: PathBuf },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read dataset {}: {source}", path.display())]
    Dataset {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("index at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
