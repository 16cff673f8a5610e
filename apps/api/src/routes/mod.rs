pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::optimize::handlers as optimize;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::tracker;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route(
            "/api/v1/resumes/upload",
            post(resumes::handle_upload).layer(DefaultBodyLimit::max(resumes::MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/resumes/:id", get(resumes::handle_get_resume))
        .route("/api/v1/resumes/optimize", post(optimize::handle_optimize))
        .route(
            "/api/v1/resumes/optimize/entry",
            post(optimize::handle_optimize_entry),
        )
        .route(
            "/api/v1/job-resumes/:id/export",
            get(resumes::handle_export),
        )
        // Audit log API
        .route("/api/v1/audit-log/revert", post(optimize::handle_revert))
        .route(
            "/api/v1/audit-log/:resume_id",
            get(optimize::handle_audit_log),
        )
        // Career tracker API
        .route("/api/v1/career-tracker/push", post(tracker::handle_push))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::models::resume::ParsedResume;
    use crate::optimize::testing::{experience, seed_resume, ScriptedRewriter};
    use crate::optimize::{OptimizerSettings, ResumeLocks};
    use crate::parser::decode::MIME_DOCX;
    use crate::parser::segmenter::SegmenterConfig;
    use crate::scoring::testing::FakeEmbedder;
    use crate::store::memory::MemoryStore;

    const BOUNDARY: &str = "refit-test-boundary";

    fn test_config() -> Config {
        Config {
            database_url: "postgres://unused".to_string(),
            s3_bucket: "uploads".to_string(),
            s3_endpoint: "http://127.0.0.1:9".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            openai_api_key: "test".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            port: 0,
            rust_log: "info".to_string(),
            llm_call_timeout: Duration::from_secs(1),
            match_score_cap: 95.0,
            segmenter: SegmenterConfig::default(),
        }
    }

    fn test_s3() -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url("http://127.0.0.1:9")
            .force_path_style(true)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    fn app(store: Arc<MemoryStore>, rewriter: ScriptedRewriter) -> Router {
        build_router(AppState {
            store,
            s3: test_s3(),
            embedder: Arc::new(FakeEmbedder::new([])),
            rewriter: Arc::new(rewriter),
            config: test_config(),
            locks: ResumeLocks::new(),
            optimizer: OptimizerSettings {
                call_timeout: Duration::from_secs(1),
                score_cap: 95.0,
            },
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_upload(user_id: Option<Uuid>, content_type: &str, file: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(user_id) = user_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n{user_id}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/v1/resumes/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedRewriter::default());
        let (status, body) = send_json(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_resume_is_404_with_error_body() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedRewriter::default());
        let uri = format!("/api/v1/resumes/{}?user_id={}", Uuid::new_v4(), Uuid::new_v4());
        let (status, body) = send_json(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_revert_of_unknown_entry_is_404() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedRewriter::default());
        let request = post_json(
            "/api/v1/audit-log/revert",
            json!({"user_id": Uuid::new_v4(), "audit_log_id": Uuid::new_v4()}),
        );
        let (status, _) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedRewriter::default());
        let request = multipart_upload(Some(Uuid::new_v4()), "text/plain", b"Summary\nhello");
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_upload_requires_user_id() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedRewriter::default());
        let request = multipart_upload(None, "application/pdf", b"%PDF-1.4");
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_of_corrupt_docx_is_unprocessable() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone(), ScriptedRewriter::default());
        let request = multipart_upload(Some(Uuid::new_v4()), MIME_DOCX, b"not a zip archive");
        let (status, _) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_optimize_audit_revert_export_flow() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let mut resume = ParsedResume::default();
        resume.sections.experience = vec![experience(0, "Built web apps")];
        let resume_id = seed_resume(&store, user, resume).await;
        let app = app(
            store.clone(),
            ScriptedRewriter::new([("Built web apps", "Built scalable microservice web apps")]),
        );

        let (status, report) = send_json(
            &app,
            post_json(
                "/api/v1/resumes/optimize",
                json!({
                    "user_id": user,
                    "resume_id": resume_id,
                    "job_description": "Microservices engineer",
                    "job_title": "Backend Engineer"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["sections_optimized"], 1);
        let job_resume_id = report["job_resume_id"].as_str().unwrap().to_string();

        let audit_uri = format!("/api/v1/audit-log/{resume_id}?user_id={user}");
        let (_, log) = send_json(&app, get(&audit_uri)).await;
        let entries = log["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "AI_OPTIMIZATION");
        let audit_id = entries[0]["id"].clone();

        let (status, reverted) = send_json(
            &app,
            post_json(
                "/api/v1/audit-log/revert",
                json!({"user_id": user, "audit_log_id": audit_id}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entry = &reverted["document"]["sections"]["experience"][0];
        assert_eq!(entry["original"], "Built web apps");
        assert!(entry.get("optimized").is_none());

        let (_, log) = send_json(&app, get(&audit_uri)).await;
        let entries = log["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["action"], "REVERT");

        let export_uri =
            format!("/api/v1/job-resumes/{job_resume_id}/export?user_id={user}&format=markdown");
        let response = app.clone().oneshot(get(&export_uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/markdown"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let markdown = String::from_utf8(body.to_vec()).unwrap();
        assert!(markdown.contains("Built web apps"));
        assert!(!markdown.contains("microservice"));

        let (status, push) = send_json(
            &app,
            post_json(
                "/api/v1/career-tracker/push",
                json!({"user_id": user, "job_resume_id": job_resume_id}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(push["job"]["stage"], "applied");
        assert_eq!(store.audit_log().len(), 3);
    }
}
