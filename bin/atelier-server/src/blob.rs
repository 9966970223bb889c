//! Filesystem blob access for generated outputs and uploaded inputs.
//!
//! Each [`FsBlobStore`] is rooted at one directory; callers address blobs by
//! paths relative to that root.  Anything that could escape the root (empty,
//! absolute, or `..`-containing paths) is rejected before touching the
//! filesystem.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors produced by blob access.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The blob does not exist.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The relative path is empty, absolute, or tries to escape the root.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    /// Any other filesystem failure.
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read/remove access to blobs under one root.
///
/// Implement this trait to swap the local filesystem for object storage
/// without touching any handler code.
pub trait BlobStore: Send + Sync + 'static {
    /// Read the full contents of a blob.
    fn read(
        &self,
        rel_path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, BlobError>> + Send;

    /// Remove a blob.
    fn remove(
        &self,
        rel_path: &str,
    ) -> impl std::future::Future<Output = Result<(), BlobError>> + Send;
}

/// Local-directory blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative blob path against the root, rejecting escapes.
    fn resolve(&self, rel_path: &str) -> Result<PathBuf, BlobError> {
        if rel_path.is_empty() {
            return Err(BlobError::InvalidPath(rel_path.to_owned()));
        }
        let rel = Path::new(rel_path);
        if rel.is_absolute() {
            return Err(BlobError::InvalidPath(rel_path.to_owned()));
        }
        let escapes = rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(BlobError::InvalidPath(rel_path.to_owned()));
        }
        Ok(self.root.join(rel))
    }
}

impl BlobStore for FsBlobStore {
    async fn read(&self, rel_path: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(rel_path.to_owned()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    async fn remove(&self, rel_path: &str) -> Result<(), BlobError> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(rel_path.to_owned()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    /// Unique scratch directory under the system temp dir.
    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("atelier-blob-test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn read_round_trips_written_file() {
        let root = scratch_root();
        tokio::fs::create_dir_all(root.join("2024-01-15")).await.unwrap();
        tokio::fs::write(root.join("2024-01-15/img.png"), b"png-bytes")
            .await
            .unwrap();

        let store = FsBlobStore::new(&root);
        let bytes = store.read("2024-01-15/img.png").await.unwrap();
        assert_eq!(bytes, b"png-bytes");

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let store = FsBlobStore::new(scratch_root());
        let err = store.read("nope.png").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let store = FsBlobStore::new(scratch_root());
        for bad in ["", "../secret.png", "a/../../secret.png", "/etc/passwd"] {
            let err = store.read(bad).await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidPath(_)), "path: {bad:?}");
        }
    }

    #[tokio::test]
    async fn remove_deletes_the_file() {
        let root = scratch_root();
        tokio::fs::create_dir_all(&root).await.unwrap();
        tokio::fs::write(root.join("img.png"), b"x").await.unwrap();

        let store = FsBlobStore::new(&root);
        store.remove("img.png").await.unwrap();
        assert!(matches!(
            store.read("img.png").await.unwrap_err(),
            BlobError::NotFound(_)
        ));

        let err = store.remove("img.png").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
