//! Metadata recorded at upload time.
//!
//! Entries are keyed by [`ContentId`] and live only as long as the process.
//! Retrieval of an id uploaded elsewhere falls back to classifying the bytes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::id::ContentId;
use crate::media::MediaType;

/// What the gateway knows about an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Client-supplied filename, `unknown_file` when none was given.
    pub original_name: String,

    /// Classified from the bytes, never from the name.
    pub media_type: MediaType,

    /// Size in bytes.
    pub size: u64,

    pub id: ContentId,
}

impl FileMetadata {
    pub fn new(
        original_name: impl Into<String>,
        media_type: MediaType,
        size: u64,
        id: ContentId,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            media_type,
            size,
            id,
        }
    }
}

/// Concurrent map of id to [`FileMetadata`]. Unbounded.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    entries: RwLock<HashMap<ContentId, FileMetadata>>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metadata, replacing any earlier entry for the same id.
    pub fn put(&self, meta: FileMetadata) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(meta.id.clone(), meta);
    }

    pub fn get(&self, id: &ContentId) -> Option<FileMetadata> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
