//! Core types for the cidgate content gateway.
//!
//! Everything here is backend-agnostic and synchronous:
//! - [`ContentId`]: opaque identifier issued by a storage backend
//! - [`classify`]: magic-number media type detection
//! - [`derive_name`]: filenames for persisted copies
//! - [`ContentCache`]: bounded payload cache with threshold eviction
//! - [`MetadataIndex`]: upload-time metadata keyed by id
//! - [`ContentStore`]: shared handle over the cache and index
//!
//! ```rust
//! use bytes::Bytes;
//! use cas::{CacheConfig, ContentId, ContentStore, MediaType};
//!
//! let store = ContentStore::new(CacheConfig::default());
//! let id: ContentId = "QmExampleCid".parse().unwrap();
//! let meta = store.record_upload("scan.pdf", id.clone(), Bytes::from_static(b"%PDF-1.7"));
//!
//! assert_eq!(meta.media_type, MediaType::Pdf);
//! assert_eq!(cas::derive_name(&meta.original_name, &id, meta.media_type), "scan_QmExampl.pdf");
//! ```

pub mod cache;
pub mod config;
pub mod id;
pub mod index;
pub mod media;
pub mod naming;
pub mod store;

pub use cache::{CacheStats, ContentCache};
pub use config::{CacheConfig, Eviction, UnknownEviction, DEFAULT_THRESHOLD};
pub use id::{ContentId, IdError};
pub use index::{FileMetadata, MetadataIndex};
pub use media::{classify, looks_like_text, MediaType};
pub use naming::derive_name;
pub use store::{ContentStore, RETRIEVED_FILE_NAME, UNKNOWN_FILE_NAME};
