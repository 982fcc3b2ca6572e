pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::research::handlers as research;
use crate::retrieval::handlers as retrieval;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Web summary
        .route("/perplexity/summary", post(research::handle_summary))
        // Similar-question search
        .route("/chroma/search", post(retrieval::handle_search))
        .route("/questions/search", post(retrieval::handle_search))
        // Interview coaching
        .route(
            "/interview/analyze-resume",
            post(interview::handle_analyze_resume),
        )
        .route(
            "/interview/analyze-answer",
            post(interview::handle_analyze_answer),
        )
        .route("/interview/follow-up", post(interview::handle_follow_up))
        .route(
            "/interview/generate-qas",
            post(interview::handle_generate_qas),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{Config, IndexConfig};
    use crate::llm_client::LlmClient;
    use crate::retrieval::builder::build_index;
    use crate::retrieval::models::QuestionRecord;
    use crate::retrieval::search::SearchService;
    use crate::retrieval::store::FsIndexStore;
    use crate::retrieval::test_support::StubEmbedder;

    fn embedder() -> StubEmbedder {
        StubEmbedder::new(vec![
            ("A", vec![1.0, 0.0]),
            ("B", vec![0.0, 1.0]),
            ("AB", vec![0.8, 0.2]),
        ])
    }

    fn test_config(index_path: &Path, llm_url: &str) -> Config {
        Config {
            index: IndexConfig {
                index_path: index_path.to_path_buf(),
                dataset_path: "dataset_question.csv".into(),
                embedding_url: "http://127.0.0.1:1".to_string(),
                embedding_model: "stub-embedder".to_string(),
                embedding_batch_size: 16,
                embedding_timeout: Duration::from_secs(1),
            },
            pplx_api_key: "test-key".to_string(),
            pplx_base_url: llm_url.to_string(),
            llm_model: "sonar".to_string(),
            llm_timeout: Duration::from_secs(5),
            llm_max_attempts: 1,
            search_top_k: 3,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }

    async fn app(index_path: &Path, llm_url: &str) -> Router {
        let config = test_config(index_path, llm_url);
        let store = Arc::new(FsIndexStore::new(&config.index.index_path));
        let state = AppState {
            llm: LlmClient::from_config(&config),
            search: Arc::new(SearchService::new(store, Arc::new(embedder()))),
            config,
        };
        build_router(state)
    }

    async fn build_sample_index(index_path: &Path) {
        let store = FsIndexStore::new(index_path);
        build_index(
            vec![
                QuestionRecord::new("A", "X", "신입", "백엔드"),
                QuestionRecord::new("B", "Y", "경력", "프론트엔드"),
            ],
            &embedder(),
            &store,
            16,
            "inline",
        )
        .await
        .unwrap();
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_search_returns_content_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("db");
        build_sample_index(&index_path).await;

        let (status, body) = post_json(
            app(&index_path, "http://127.0.0.1:1").await,
            "/chroma/search",
            json!({"query": "AB"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0]["content"],
            "A [기업명: X, 경력: 신입, 직무: 백엔드]"
        );
        assert_eq!(
            results[0]["metadata"],
            json!({"company": "X", "experienceLevel": "신입", "role": "백엔드"})
        );
    }

    #[tokio::test]
    async fn test_search_alias_honours_k() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("db");
        build_sample_index(&index_path).await;

        let (status, body) = post_json(
            app(&index_path, "http://127.0.0.1:1").await,
            "/questions/search",
            json!({"query": "B", "k": 1}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["metadata"]["company"], "Y");
    }

    #[tokio::test]
    async fn test_search_without_index_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            app(&dir.path().join("db"), "http://127.0.0.1:1").await,
            "/chroma/search",
            json!({"query": "A"}),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "INDEX_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_blank_search_query_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("db");
        build_sample_index(&index_path).await;

        let (status, body) = post_json(
            app(&index_path, "http://127.0.0.1:1").await,
            "/chroma/search",
            json!({"query": "  "}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_follow_up_returns_lines() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "\n그때 가장 어려웠던 점은 무엇인가요?\n"}}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            app(&dir.path().join("db"), &server.uri()).await,
            "/interview/follow-up",
            json!({"question": "프로젝트 경험을 말해주세요", "answer": "팀 프로젝트를 했습니다"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"followUps": ["그때 가장 어려웠던 점은 무엇인가요?"]})
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            app(&dir.path().join("db"), &server.uri()).await,
            "/interview/analyze-resume",
            json!({"resume": "자소서", "company": "카카오", "position": "백엔드"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_generate_qas_rejects_blank_resume() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            app(&dir.path().join("db"), "http://127.0.0.1:1").await,
            "/interview/generate-qas",
            json!({"company": "카카오", "position": "백엔드", "resumeContent": " "}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("resumeContent"));
    }

    #[tokio::test]
    async fn test_summary_relays_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "요약입니다"}}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            app(&dir.path().join("db"), &server.uri()).await,
            "/perplexity/summary",
            json!({"query": "네이버 백엔드"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"summary": "요약입니다"}));
    }

    #[tokio::test]
    async fn test_health_hides_index_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("db");
        std::fs::create_dir_all(&index_path).unwrap();
        std::fs::write(index_path.join("manifest.json"), b"{not json").unwrap();

        let response = app(&index_path, "http://127.0.0.1:1")
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["index"], json!({"present": false}));
        assert!(!String::from_utf8_lossy(&bytes).contains(index_path.to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_health_reports_index_presence() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("db");

        let response = app(&index_path, "http://127.0.0.1:1")
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["index"], json!({"present": false}));

        build_sample_index(&index_path).await;
        let response = app(&index_path, "http://127.0.0.1:1")
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["index"]["present"], true);
        assert_eq!(body["index"]["entries"], 2);
        assert_eq!(body["index"]["model"], "stub-embedder");
    }
}
