//! One-shot CLI commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cas::{classify, derive_name, ContentId, MediaType};

use crate::backend::{KuboBackend, StorageBackend};
use crate::persist::safe_basename;

/// One line of `cidgate classify` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub path: PathBuf,
    pub media_type: MediaType,
    pub size: usize,
    /// Name a copy would get, using the content's BLAKE3 digest as its id.
    pub derived_name: String,
}

pub async fn classify_file(path: &Path) -> Result<Classified> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let media_type = classify(&bytes);
    let id = ContentId::digest(&bytes);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Classified {
        path: path.to_path_buf(),
        media_type,
        size: bytes.len(),
        derived_name: derive_name(safe_basename(&name), &id, media_type),
    })
}

/// Print media type and derived name for each file.
pub async fn classify_files(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let c = classify_file(path).await?;
        println!(
            "{}\t{}\t{} bytes\t{}",
            c.path.display(),
            c.media_type,
            c.size,
            c.derived_name
        );
    }
    Ok(())
}

/// Ask a Kubo node for its version.
pub async fn ping(api_url: &str, timeout_ms: u64) -> Result<()> {
    let backend = KuboBackend::new(api_url, Duration::from_millis(timeout_ms))
        .context("Failed to create storage backend client")?;

    let version = backend
        .version()
        .await
        .with_context(|| format!("No answer from {}", api_url))?;

    println!("{} {}", api_url, version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_classify_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan");
        std::fs::write(&path, b"%PDF-1.4\n...").unwrap();

        let c = classify_file(&path).await.unwrap();
        assert_eq!(c.media_type, MediaType::Pdf);
        assert_eq!(c.size, 12);
        assert!(c.derived_name.starts_with("scan_b3"));
        assert!(c.derived_name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_classify_missing_file() {
        let err = classify_file(Path::new("/definitely/not/here")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
