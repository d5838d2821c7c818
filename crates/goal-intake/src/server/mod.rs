//! HTTP server for file intake

pub mod routes;
pub mod state;

use axum::{routing::get, Json, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::IntakeConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Intake HTTP server
pub struct IntakeServer {
    config: IntakeConfig,
    state: AppState,
}

impl IntakeServer {
    /// Create a new server backed by SQLite and local storage
    pub async fn new(config: IntakeConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server over existing state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            // Health check
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .nest("/api", routes::api_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            // Middleware layers (order matters - applied bottom to top)
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server and run until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting intake server on http://{}", addr);
        tracing::info!("API info: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        let state = self.state.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
                tracing::info!("Shutdown requested, draining connections");
                state.set_ready(false);
            })
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "File Parser API is running"
    }))
}

/// Readiness check endpoint; also requires a healthy blob store
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if !state.is_ready() {
        return axum::http::StatusCode::SERVICE_UNAVAILABLE;
    }

    match state.blobs().health_check().await {
        Ok(true) => axum::http::StatusCode::OK,
        Ok(false) => {
            tracing::warn!("Blob store {} is unhealthy", state.blobs().name());
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            tracing::warn!("Blob store {} health check failed: {}", state.blobs().name(), e);
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LocalBlobStore, MemoryBlobStore};
    use crate::storage::MemoryRecordStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "intake-test-boundary";

    async fn test_router() -> Router {
        let state = AppState::with_stores(
            IntakeConfig::default(),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new()),
        )
        .await
        .unwrap();
        IntakeServer::with_state(state).build_router()
    }

    fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/files/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(field, filename, data)))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_until_settled(router: &Router, id: &str) -> Value {
        for _ in 0..200 {
            let response = router
                .clone()
                .oneshot(get(&format!("/api/files/{}/progress", id)))
                .await
                .unwrap();
            let view = json_body(response).await;
            if view["status"] == "ready" || view["status"] == "failed" {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("record {} never settled", id);
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router().await;
        let response = router.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "File Parser API is running");
    }

    #[tokio::test]
    async fn test_ready_follows_flag_and_blob_store() {
        let state = AppState::with_stores(
            IntakeConfig::default(),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new()),
        )
        .await
        .unwrap();
        let router = IntakeServer::with_state(state.clone()).build_router();

        let response = router.clone().oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        state.set_ready(false);
        let response = router.oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_fails_when_blob_dir_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let blob_dir = dir.path().join("uploads");
        let blobs = Arc::new(LocalBlobStore::new(blob_dir.clone()).unwrap());
        let state = AppState::with_stores(
            IntakeConfig::default(),
            Arc::new(MemoryRecordStore::new()),
            blobs,
        )
        .await
        .unwrap();
        let router = IntakeServer::with_state(state).build_router();

        std::fs::remove_dir_all(&blob_dir).unwrap();
        let response = router.oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_upload_then_fetch_csv() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(upload_request("file", "people.csv", b"name,age\nAda,36\nLinus,54\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let upload = json_body(response).await;
        assert_eq!(upload["status"], "received");
        let id = upload["id"].as_str().unwrap().to_string();

        let progress = wait_until_settled(&router, &id).await;
        assert_eq!(progress["status"], "ready");
        assert_eq!(progress["progress"], 100);

        let response = router
            .clone()
            .oneshot(get(&format!("/api/files/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let detail = json_body(response).await;
        assert_eq!(detail["original_name"], "people.csv");
        assert_eq!(detail["result"]["type"], "csv");
        assert_eq!(detail["result"]["rows"], 2);
        assert!(detail.get("error").is_none());

        let response = router.oneshot(get("/api/files")).await.unwrap();
        let listing = json_body(response).await;
        assert_eq!(listing.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_parse_reports_error() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(upload_request("file", "broken.pdf", b"not a pdf"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let progress = wait_until_settled(&router, &id).await;
        assert_eq!(progress["status"], "failed");

        let response = router
            .oneshot(get(&format!("/api/files/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let detail = json_body(response).await;
        assert!(detail["error"].as_str().unwrap().contains("PDF"));
        assert!(detail.get("result").is_none());
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(upload_request("file", "setup.exe", b"MZ"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .clone()
            .oneshot(upload_request("attachment", "a.csv", b"a\n1\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router.oneshot(get("/api/files")).await.unwrap();
        assert!(json_body(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let router = test_router().await;
        let id = uuid::Uuid::new_v4();

        let response = router
            .clone()
            .oneshot(get(&format!("/api/files/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/files/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(upload_request("file", "notes.txt", b"hello\nworld"))
            .await
            .unwrap();
        let id = json_body(response).await["id"].as_str().unwrap().to_string();
        wait_until_settled(&router, &id).await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/files/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(get(&format!("/api/files/{}/progress", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
