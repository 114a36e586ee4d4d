//! Storage backends.
//!
//! The gateway never stores content itself. It hands payloads to a
//! content-addressed node and gets back an identifier; it fetches by that
//! identifier later. [`StorageBackend`] is the whole surface it needs.

mod kubo;
mod memory;

pub use kubo::KuboBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use bytes::Bytes;
use cas::ContentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from talking to a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected backend response: {0}")]
    Decode(String),

    #[error("content not found: {0}")]
    NotFound(ContentId),
}

/// An identifier the backend keeps instead of garbage collecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedObject {
    pub id: ContentId,
    /// `recursive`, `direct` or `indirect` on Kubo.
    pub pin_type: String,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store and pin a payload, returning its identifier.
    async fn add(&self, payload: Bytes) -> Result<ContentId, BackendError>;

    /// Fetch a payload by identifier.
    async fn fetch(&self, id: &ContentId) -> Result<Bytes, BackendError>;

    async fn list_pinned(&self) -> Result<Vec<PinnedObject>, BackendError>;

    /// Backend version string. Doubles as the liveness probe.
    async fn version(&self) -> Result<String, BackendError>;
}
