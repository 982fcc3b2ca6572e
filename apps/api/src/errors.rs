use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::retrieval::error::IndexError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Question index error: {0}")]
    Index(#[from] IndexError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The language model service failed to respond".to_string(),
                )
            }
            AppError::Index(e) => index_error_parts(e),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn index_error_parts(e: &IndexError) -> (StatusCode, &'static str, String) {
    match e {
        IndexError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        IndexError::EmptyInput => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "EMPTY_INPUT",
            e.to_string(),
        ),
        IndexError::IndexNotFound { .. } => {
            tracing::warn!("{e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "INDEX_NOT_FOUND",
                "The question index has not been built yet".to_string(),
            )
        }
        IndexError::Embedding(inner) => {
            tracing::error!("Embedding error: {inner}");
            (
                StatusCode::BAD_GATEWAY,
                "EMBEDDING_ERROR",
                "The embedding model failed to process the query".to_string(),
            )
        }
        IndexError::Io { .. } | IndexError::Dataset { .. } | IndexError::Corrupt { .. } => {
            tracing::error!("Index storage error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INDEX_STORAGE_ERROR",
                "The question index could not be read".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::retrieval::embedding::EmbeddingError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_index_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_of(IndexError::InvalidQuery("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(IndexError::EmptyInput.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(
                IndexError::IndexNotFound {
                    path: PathBuf::from("./db")
                }
                .into()
            ),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(IndexError::Embedding(EmbeddingError::Malformed("bad".to_string())).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(
                IndexError::Corrupt {
                    path: PathBuf::from("./db"),
                    reason: "truncated".to_string()
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_llm_failure_is_bad_gateway() {
        assert_eq!(
            status_of(LlmError::EmptyContent.into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_validation_is_bad_request() {
        assert_eq!(
            status_of(AppError::Validation("query cannot be empty".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
