pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::outreach::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/emails", post(handlers::handle_generate_emails))
        .route("/api/v1/jobs/extract", post(handlers::handle_extract_jobs))
        .route("/api/v1/portfolio", get(handlers::handle_list_portfolio))
        .route(
            "/api/v1/portfolio/query",
            post(handlers::handle_query_portfolio),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Html,
    };
    use serde_json::{json, Value};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{CandidateProfile, Config};
    use crate::llm_client::{ChatModel, LlmError};
    use crate::portfolio::hash_embedder::HashEmbedder;
    use crate::portfolio::PortfolioStore;
    use crate::scrape::PageFetcher;

    struct FixedModel;

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            if prompt.contains("### SCRAPED TEXT FROM WEBSITE:") {
                Ok(r#"{"role": "Data Scientist", "experience": 3, "skills": ["PyTorch"], "description": "Models."}"#.to_string())
            } else {
                Ok("Hello, I build ML systems.".to_string())
            }
        }
    }

    /// Records how many completions overlap.
    #[derive(Default)]
    struct SlowModel {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for SlowModel {
        async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            FixedModel.complete(prompt, system).await
        }
    }

    async fn test_state(dir: &tempfile::TempDir) -> AppState {
        test_state_with(dir, Arc::new(FixedModel)).await
    }

    async fn test_state_with(dir: &tempfile::TempDir, llm: Arc<dyn ChatModel>) -> AppState {
        let csv = dir.path().join("portfolio.csv");
        std::fs::write(
            &csv,
            "Techstack,Links\n\
             \"PyTorch, scikit-learn\",https://example.com/ml\n\
             \"Vue, Nuxt\",https://example.com/web\n",
        )
        .unwrap();
        let vectorstore = dir.path().join("vectorstore");
        let mut portfolio =
            PortfolioStore::open(&csv, &vectorstore, Arc::new(HashEmbedder::default()))
                .await
                .unwrap();
        portfolio.load_portfolio().await.unwrap();

        AppState {
            llm,
            fetcher: PageFetcher::new(Duration::from_secs(5)).unwrap(),
            portfolio: Arc::new(portfolio),
            config: Config {
                groq_api_key: "test".to_string(),
                llm_api_url: "http://127.0.0.1:9/unused".to_string(),
                port: 0,
                rust_log: "info".to_string(),
                portfolio_csv: csv,
                vectorstore_dir: vectorstore,
                embedding_cache_dir: dir.path().join("models"),
                portfolio_results: 2,
                fetch_timeout_secs: 5,
                candidate: CandidateProfile::default(),
            },
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn spawn_job_page() -> String {
        let app = axum::Router::new().route(
            "/job",
            get(|| async { Html("<html><body><h2>Data Scientist</h2><p>PyTorch</p></body></html>") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/job")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_portfolio_size() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["portfolio_entries"], 2);
    }

    #[tokio::test]
    async fn test_generate_emails_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);
        let url = spawn_job_page().await;

        let response = app
            .oneshot(post_json("/api/v1/emails", json!({ "url": url })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["emails"].as_array().unwrap().len(), 1);
        assert_eq!(body["emails"][0]["job"]["experience"], "3");
        assert_eq!(
            body["emails"][0]["matched_links"][0]["links"][0]["link"],
            "https://example.com/ml"
        );
        assert_eq!(body["emails"][0]["email"], "Hello, I build ML systems.");
        assert!(body["warnings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generations_run_one_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(SlowModel::default());
        let app = build_router(test_state_with(&dir, model.clone()).await);
        let url = spawn_job_page().await;

        let (first, second) = tokio::join!(
            app.clone()
                .oneshot(post_json("/api/v1/emails", json!({ "url": url }))),
            app.oneshot(post_json("/api/v1/jobs/extract", json!({ "url": url }))),
        );

        assert_eq!(first.unwrap().status(), StatusCode::OK);
        assert_eq!(second.unwrap().status(), StatusCode::OK);
        // extract + compose for the email run, extract for the preview
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert_eq!(model.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_emails_rejects_blank_url() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(post_json("/api/v1/emails", json!({ "url": "  " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_emails_rejects_non_http_url() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(post_json("/api/v1/emails", json!({ "url": "file:///etc/passwd" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extract_jobs_preview() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);
        let url = spawn_job_page().await;

        let response = app
            .oneshot(post_json("/api/v1/jobs/extract", json!({ "url": url })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["jobs"][0]["role"], "Data Scientist");
        assert_eq!(body["jobs"][0]["skills"], json!(["PyTorch"]));
    }

    #[tokio::test]
    async fn test_list_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(Request::get("/api/v1/portfolio").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = read_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["entries"][1]["link"], "https://example.com/web");
        assert_eq!(body["entries"][1]["techstack"], "Vue, Nuxt");
    }

    #[tokio::test]
    async fn test_query_portfolio_respects_n_results() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(post_json(
                "/api/v1/portfolio/query",
                json!({ "skills": ["Vue", "vue"], "n_results": 1 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let matches = body["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["links"].as_array().unwrap().len(), 1);
        assert_eq!(matches[0]["links"][0]["link"], "https://example.com/web");
    }

    #[tokio::test]
    async fn test_query_portfolio_requires_skills() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(post_json("/api/v1/portfolio/query", json!({ "skills": [" "] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
