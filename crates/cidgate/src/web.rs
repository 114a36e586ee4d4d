//! HTTP endpoints for the gateway.
//!
//! | route | |
//! |-------|---|
//! | `POST /upload` | multipart field `file` → backend, cache, index, upload copy |
//! | `GET /retrieve?cid=` | cache, else backend; text as JSON, everything else raw |
//! | `GET /list` | pinned objects |
//! | `GET /health` | backend liveness plus cache counters |
//! | `GET /` | endpoint docs |

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{
        multipart::{Multipart, MultipartError},
        DefaultBodyLimit, Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use cas::{ContentId, ContentStore, FileMetadata};
use gateconf::{GateConfig, GatewayConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::backend::{BackendError, StorageBackend};
use crate::metrics::GatewayMetrics;
use crate::persist::{safe_basename, CopyPersister};

/// Multipart field that carries the upload.
pub const FILE_FIELD: &str = "file";

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebState {
    pub store: ContentStore,
    pub backend: Arc<dyn StorageBackend>,
    pub persister: CopyPersister,
    pub gateway: Arc<GatewayConfig>,
    pub max_upload_bytes: usize,
    pub started_at: Instant,
    pub metrics: GatewayMetrics,
}

impl WebState {
    pub fn from_config(config: &GateConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            store: ContentStore::new(config.cache.clone()),
            backend,
            persister: CopyPersister::from_config(&config.infra.paths),
            gateway: Arc::new(config.gateway.clone()),
            max_upload_bytes: config.infra.bind.max_upload_bytes,
            started_at: Instant::now(),
            metrics: GatewayMetrics::new(),
        }
    }
}

pub fn router(state: WebState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(serve_root))
        .route("/upload", post(upload).layer(upload_limit))
        .route("/retrieve", get(retrieve))
        .route("/list", get(list_pinned))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request failures, each mapped to a status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: BackendError,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub cid: String,
    pub size: u64,
    pub path: String,
    pub gateways: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub content: String,
    pub cid: String,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveQuery {
    pub cid: Option<String>,
}

/// One entry of the `/list` map, shaped like Kubo's `pin/ls`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PinEntry {
    #[serde(rename = "Type")]
    pub pin_type: String,
}

/// Pull the `file` field out of the form. Other fields are skipped.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let payload = field.bytes().await?;
        return Ok((name, payload));
    }
    Err(ApiError::BadRequest(format!(
        "multipart field '{}' is required",
        FILE_FIELD
    )))
}

#[tracing::instrument(
    name = "gateway.upload",
    skip_all,
    fields(cid = tracing::field::Empty, size = tracing::field::Empty, media_type = tracing::field::Empty)
)]
async fn upload(State(state): State<WebState>, mut multipart: Multipart) -> Result<Response, ApiError> {
    let (original_name, payload) = read_file_field(&mut multipart).await?;

    let id = state
        .backend
        .add(payload.clone())
        .await
        .map_err(|e| {
            state.metrics.record_backend_error("add");
            ApiError::Backend {
                context: "Error adding to storage backend",
                source: e,
            }
        })?;

    let meta = state.store.record_upload(&original_name, id, payload.clone());
    state.metrics.record_upload(meta.size);
    state.metrics.record_cache(&state.store.stats());

    let span = tracing::Span::current();
    span.record("cid", meta.id.as_str());
    span.record("size", meta.size);
    span.record("media_type", meta.media_type.as_str());

    state.persister.save_upload(&meta, &payload).await;

    tracing::info!(name = %meta.original_name, "file uploaded");

    let cid = meta.id.to_string();
    let body = UploadResponse {
        path: format!("/ipfs/{}", cid),
        gateways: state.gateway.links_for(&cid),
        size: meta.size,
        cid,
    };

    Ok(([(header::CACHE_CONTROL, "no-cache")], Json(body)).into_response())
}

#[tracing::instrument(
    name = "gateway.retrieve",
    skip_all,
    fields(cid = tracing::field::Empty, size = tracing::field::Empty, media_type = tracing::field::Empty, cache_hit = tracing::field::Empty)
)]
async fn retrieve(
    State(state): State<WebState>,
    Query(query): Query<RetrieveQuery>,
) -> Result<Response, ApiError> {
    let raw = query.cid.unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("cid parameter is required".to_string()));
    }
    let id = ContentId::new(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let span = tracing::Span::current();
    span.record("cid", id.as_str());

    let cached = state.store.cached(&id);
    let cache_hit = cached.is_some();
    span.record("cache_hit", cache_hit);

    let payload = match cached {
        Some(payload) => payload,
        None => {
            let payload = state.backend.fetch(&id).await.map_err(|e| {
                state.metrics.record_backend_error("fetch");
                ApiError::Backend {
                    context: "Error retrieving from storage backend",
                    source: e,
                }
            })?;
            state.store.cache_payload(id.clone(), payload.clone());
            state.metrics.record_cache(&state.store.stats());
            payload
        }
    };
    state.metrics.record_retrieval(cache_hit);

    let meta = state.store.describe(&id, &payload);
    span.record("size", meta.size);
    span.record("media_type", meta.media_type.as_str());

    state.persister.save_retrieved(&meta, &payload).await;

    tracing::info!(name = %meta.original_name, "file retrieved");

    if meta.media_type.is_text() {
        let body = RetrieveResponse {
            content: String::from_utf8_lossy(&payload).into_owned(),
            cid: id.into_inner(),
            size: meta.size,
        };
        return Ok(Json(body).into_response());
    }

    Ok(raw_response(&meta, payload))
}

fn raw_response(meta: &FileMetadata, payload: Bytes) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, meta.media_type.as_str())
        .header(header::CONTENT_LENGTH, payload.len())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", disposition_filename(&meta.original_name)),
        )
        .body(Body::from(payload))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
        .unwrap_or_else(|status| status.into_response())
}

/// Filename safe to quote in a `Content-Disposition` header.
///
/// Header values must be visible ASCII, so anything else, plus `"` and `\`,
/// becomes `_`.
pub fn disposition_filename(name: &str) -> String {
    safe_basename(name)
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

async fn list_pinned(
    State(state): State<WebState>,
) -> Result<Json<BTreeMap<String, PinEntry>>, ApiError> {
    let pinned = state
        .backend
        .list_pinned()
        .await
        .map_err(|e| {
            state.metrics.record_backend_error("list_pinned");
            ApiError::Backend {
                context: "Error listing pinned objects",
                source: e,
            }
        })?;

    tracing::info!(count = pinned.len(), "listed pinned objects");

    Ok(Json(
        pinned
            .into_iter()
            .map(|p| (p.id.into_inner(), PinEntry { pin_type: p.pin_type }))
            .collect(),
    ))
}

async fn health(State(state): State<WebState>) -> Response {
    match state.backend.version().await {
        Ok(version) => Json(serde_json::json!({
            "status": "healthy",
            "version": version,
            "node": "connected",
            "uptime_secs": state.started_at.elapsed().as_secs(),
            "cache": state.store.stats(),
            "index": { "entries": state.store.index().len() },
        }))
        .into_response(),
        Err(e) => {
            state.metrics.record_backend_error("version");
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Storage node not available: {}", e),
            )
                .into_response()
        }
    }
}

async fn serve_root() -> Html<&'static str> {
    Html(ROOT_HTML)
}

const ROOT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>cidgate</title>
    <style>
        body { font-family: sans-serif; margin: 40px; max-width: 720px; }
        .endpoint { background: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 5px; }
        .method { color: #007bff; font-weight: bold; }
        code { background: #eee; padding: 1px 4px; }
    </style>
</head>
<body>
    <h1>cidgate</h1>
    <p>Content-addressed file storage over HTTP.</p>

    <div class="endpoint">
        <span class="method">POST</span> <code>/upload</code>
        <p>Upload a file as multipart form field <code>file</code>. Returns its CID, size and public gateway links.</p>
    </div>

    <div class="endpoint">
        <span class="method">GET</span> <code>/retrieve?cid=&lt;cid&gt;</code>
        <p>Fetch content by CID. Text comes back as JSON; anything else as raw bytes with its media type.</p>
    </div>

    <div class="endpoint">
        <span class="method">GET</span> <code>/list</code>
        <p>List pinned objects.</p>
    </div>

    <div class="endpoint">
        <span class="method">GET</span> <code>/health</code>
        <p>Storage node status and cache counters.</p>
    </div>

    <h2>Example</h2>
    <pre>curl -F file=@photo.jpg http://localhost:8081/upload
curl -o photo.jpg "http://localhost:8081/retrieve?cid=&lt;cid&gt;"</pre>
</body>
</html>
"#;
