//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use cas::{CacheConfig, ContentId, ContentStore};
use cidgate::{BackendError, CopyPersister, GatewayMetrics, MemoryBackend, PinnedObject, StorageBackend, WebState};
use gateconf::GatewayConfig;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "cidgate-test-boundary";

/// A gateway over a [`MemoryBackend`] with copies written under a temp dir.
pub struct TestGateway {
    pub app: Router,
    pub state: WebState,
    pub backend: Arc<MemoryBackend>,
    pub dir: TempDir,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::with(CacheConfig::default(), 50 * 1024 * 1024)
    }

    pub fn with(cache: CacheConfig, max_upload_bytes: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let state = WebState {
            store: ContentStore::new(cache),
            backend: backend.clone(),
            persister: CopyPersister::new(dir.path().join("upload"), dir.path().join("retrieve")),
            gateway: Arc::new(GatewayConfig::default()),
            max_upload_bytes,
            started_at: Instant::now(),
            metrics: GatewayMetrics::default(),
        };
        Self {
            app: cidgate::router(state.clone()),
            state,
            backend,
            dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        send(&self.app, request).await
    }

    /// Upload and return the cid from the response.
    pub async fn upload(&self, filename: Option<&str>, payload: &[u8]) -> ContentId {
        let (status, _, body) = self.send(upload_request(filename, payload)).await;
        assert_eq!(status, StatusCode::OK, "upload failed: {:?}", body);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["cid"].as_str().unwrap().parse().unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

/// Multipart body with one part named `field`.
pub fn multipart_body(field: &str, filename: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(field: &str, filename: Option<&str>, payload: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, filename, payload)))
        .unwrap()
}

pub fn upload_request(filename: Option<&str>, payload: &[u8]) -> Request<Body> {
    multipart_request("file", filename, payload)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A backend whose every call fails, as if the node were down.
pub struct OfflineBackend;

fn offline() -> BackendError {
    BackendError::Status {
        status: 502,
        body: "node offline".to_string(),
    }
}

#[async_trait]
impl StorageBackend for OfflineBackend {
    async fn add(&self, _payload: Bytes) -> Result<ContentId, BackendError> {
        Err(offline())
    }

    async fn fetch(&self, _id: &ContentId) -> Result<Bytes, BackendError> {
        Err(offline())
    }

    async fn list_pinned(&self) -> Result<Vec<PinnedObject>, BackendError> {
        Err(offline())
    }

    async fn version(&self) -> Result<String, BackendError> {
        Err(offline())
    }
}

pub fn offline_gateway() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = WebState {
        store: ContentStore::default(),
        backend: Arc::new(OfflineBackend),
        persister: CopyPersister::new(dir.path().join("upload"), dir.path().join("retrieve")),
        gateway: Arc::new(GatewayConfig::default()),
        max_upload_bytes: 1024 * 1024,
        started_at: Instant::now(),
        metrics: GatewayMetrics::default(),
    };
    (cidgate::router(state), dir)
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";
