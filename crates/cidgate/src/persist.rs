//! Writes copies of uploaded and retrieved content to disk.
//!
//! Persistence is a side effect of a request, never part of its outcome: a
//! failed write is logged and the request carries on.

use std::path::{Path, PathBuf};

use cas::{derive_name, FileMetadata, UNKNOWN_FILE_NAME};
use gateconf::PathsConfig;

/// Final path component of a client-supplied name.
///
/// Both `/` and `\` count as separators. Names that reduce to nothing, `.`
/// or `..` become [`UNKNOWN_FILE_NAME`].
pub fn safe_basename(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    match base {
        "" | "." | ".." => UNKNOWN_FILE_NAME,
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct CopyPersister {
    upload_dir: Option<PathBuf>,
    retrieve_dir: Option<PathBuf>,
}

impl CopyPersister {
    pub fn new(upload_dir: impl Into<PathBuf>, retrieve_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: Some(upload_dir.into()),
            retrieve_dir: Some(retrieve_dir.into()),
        }
    }

    /// A persister that never touches the disk.
    pub fn disabled() -> Self {
        Self {
            upload_dir: None,
            retrieve_dir: None,
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        if paths.persist_copies {
            Self::new(&paths.upload_dir, &paths.retrieve_dir)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.upload_dir.is_some() || self.retrieve_dir.is_some()
    }

    /// Where a copy of `meta` lands under `dir`.
    pub fn target_path(dir: &Path, meta: &FileMetadata) -> PathBuf {
        dir.join(derive_name(
            safe_basename(&meta.original_name),
            &meta.id,
            meta.media_type,
        ))
    }

    /// Copy an uploaded original. Returns the written path, if any.
    pub async fn save_upload(&self, meta: &FileMetadata, payload: &[u8]) -> Option<PathBuf> {
        let dir = self.upload_dir.as_deref()?;
        save_logged(dir, meta, payload, "upload").await
    }

    /// Copy retrieved content. Returns the written path, if any.
    pub async fn save_retrieved(&self, meta: &FileMetadata, payload: &[u8]) -> Option<PathBuf> {
        let dir = self.retrieve_dir.as_deref()?;
        save_logged(dir, meta, payload, "retrieve").await
    }
}

async fn save_logged(dir: &Path, meta: &FileMetadata, payload: &[u8], kind: &str) -> Option<PathBuf> {
    match save(dir, meta, payload).await {
        Ok(path) => {
            tracing::debug!(path = %path.display(), cid = %meta.id, kind, "saved copy");
            Some(path)
        }
        Err(e) => {
            tracing::warn!(
                dir = %dir.display(),
                cid = %meta.id,
                kind,
                error = %e,
                "could not save copy"
            );
            None
        }
    }
}

async fn save(dir: &Path, meta: &FileMetadata, payload: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = CopyPersister::target_path(dir, meta);
    tokio::fs::write(&path, payload).await?;
    Ok(path)
}
