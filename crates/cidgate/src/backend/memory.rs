//! In-process backend for tests and offline runs.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use cas::ContentId;

use super::{BackendError, PinnedObject, StorageBackend};

/// Keeps every payload in a map. Identifiers come from [`ContentId::digest`],
/// so adding the same bytes twice yields the same id. Everything is pinned.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<ContentId, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn add(&self, payload: Bytes) -> Result<ContentId, BackendError> {
        let id = ContentId::digest(&payload);
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), payload);
        Ok(id)
    }

    async fn fetch(&self, id: &ContentId) -> Result<Bytes, BackendError> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.clone()))
    }

    async fn list_pinned(&self) -> Result<Vec<PinnedObject>, BackendError> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut pinned: Vec<PinnedObject> = objects
            .keys()
            .map(|id| PinnedObject {
                id: id.clone(),
                pin_type: "recursive".to_string(),
            })
            .collect();
        pinned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(pinned)
    }

    async fn version(&self) -> Result<String, BackendError> {
        Ok(format!("memory-{}", env!("CARGO_PKG_VERSION")))
    }
}
