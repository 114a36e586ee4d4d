//! ContentStore: the gateway's shared in-process state.
//!
//! Bundles the [`ContentCache`] and the [`MetadataIndex`] behind one cheaply
//! clonable handle. Handlers clone it per request; both maps are shared.

use std::sync::Arc;

use bytes::Bytes;

use crate::cache::{CacheStats, ContentCache};
use crate::config::CacheConfig;
use crate::id::ContentId;
use crate::index::{FileMetadata, MetadataIndex};
use crate::media::classify;

/// Name recorded for uploads that arrive without a filename.
pub const UNKNOWN_FILE_NAME: &str = "unknown_file";

/// Name used for content fetched by id with no upload metadata.
pub const RETRIEVED_FILE_NAME: &str = "retrieved_file";

#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    cache: Arc<ContentCache>,
    index: Arc<MetadataIndex>,
}

impl ContentStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: Arc::new(ContentCache::new(config)),
            index: Arc::new(MetadataIndex::new()),
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Record a payload the backend just accepted.
    ///
    /// Classifies the bytes, caches them and stores metadata under `id`.
    /// An empty `original_name` is recorded as [`UNKNOWN_FILE_NAME`].
    pub fn record_upload(&self, original_name: &str, id: ContentId, payload: Bytes) -> FileMetadata {
        let name = if original_name.is_empty() {
            UNKNOWN_FILE_NAME
        } else {
            original_name
        };
        let meta = FileMetadata::new(name, classify(&payload), payload.len() as u64, id.clone());
        self.cache.put(id, payload);
        self.index.put(meta.clone());
        meta
    }

    /// Metadata for a retrieved payload.
    ///
    /// Upload-time metadata wins. Otherwise the bytes are classified and the
    /// name falls back to [`RETRIEVED_FILE_NAME`]. Nothing is recorded.
    pub fn describe(&self, id: &ContentId, payload: &[u8]) -> FileMetadata {
        self.index.get(id).unwrap_or_else(|| {
            FileMetadata::new(
                RETRIEVED_FILE_NAME,
                classify(payload),
                payload.len() as u64,
                id.clone(),
            )
        })
    }

    pub fn cached(&self, id: &ContentId) -> Option<Bytes> {
        self.cache.get(id)
    }

    pub fn cache_payload(&self, id: ContentId, payload: Bytes) {
        self.cache.put(id, payload);
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;

    fn id(s: &str) -> ContentId {
        s.parse().unwrap()
    }

    #[test]
    fn test_record_upload_caches_and_indexes() {
        let store = ContentStore::default();
        let payload = Bytes::from_static(b"%PDF-1.4 body");
        let meta = store.record_upload("report.pdf", id("QmPdf"), payload.clone());

        assert_eq!(meta.media_type, MediaType::Pdf);
        assert_eq!(meta.size, payload.len() as u64);
        assert_eq!(store.cached(&id("QmPdf")), Some(payload));
        assert_eq!(store.index().get(&id("QmPdf")), Some(meta));
    }

    #[test]
    fn test_empty_name_becomes_unknown_file() {
        let store = ContentStore::default();
        let meta = store.record_upload("", id("QmAnon"), Bytes::from_static(b"hi"));
        assert_eq!(meta.original_name, UNKNOWN_FILE_NAME);
    }

    #[test]
    fn test_describe_prefers_recorded_metadata() {
        let store = ContentStore::default();
        store.record_upload("notes.txt", id("QmNotes"), Bytes::from_static(b"plain words"));

        let meta = store.describe(&id("QmNotes"), b"\x89PNG ignored");
        assert_eq!(meta.original_name, "notes.txt");
        assert_eq!(meta.media_type, MediaType::Text);
    }

    #[test]
    fn test_describe_falls_back_to_classification() {
        let store = ContentStore::default();
        let meta = store.describe(&id("QmForeign"), b"GIF89a\x01\x00");

        assert_eq!(meta.original_name, RETRIEVED_FILE_NAME);
        assert_eq!(meta.media_type, MediaType::Gif);
        assert_eq!(meta.size, 8);
        assert!(store.index().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ContentStore::default();
        let other = store.clone();
        other.cache_payload(id("QmShared"), Bytes::from_static(b"x"));
        assert!(store.cached(&id("QmShared")).is_some());
    }
}
