//! Blob storage for canonical image bytes, keyed by image id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use lb_core::{Error, ImageId, Result};
use tokio::io::AsyncWriteExt;

/// Opaque byte storage keyed by image id.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `data` under `id`, replacing anything already there.
    async fn write(&self, id: &ImageId, data: &[u8]) -> Result<()>;

    /// Read the bytes for `id`; fails with [`Error::NotFound`] if absent.
    async fn read(&self, id: &ImageId) -> Result<Bytes>;

    /// Remove the bytes for `id`. Removing a missing blob is not an error.
    async fn delete(&self, id: &ImageId) -> Result<()>;

    /// Whether any bytes exist for `id`.
    async fn exists(&self, id: &ImageId) -> Result<bool>;
}

/// Filesystem storage laid out as `{root}/{id}`.
///
/// Writes land in a temporary sibling file that is synced and renamed into
/// place, and the directory is synced after the rename. A reader never
/// observes a half-written blob, and `write` returns only once the bytes are
/// on stable storage.
#[derive(Debug, Clone)]
pub struct FsBlobStorage {
    root: PathBuf,
}

impl FsBlobStorage {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::info!("Blob storage rooted at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a blob.
    pub fn path_for(&self, id: &ImageId) -> PathBuf {
        self.root.join(id.to_string())
    }
}

#[async_trait]
impl BlobStorage for FsBlobStorage {
    async fn write(&self, id: &ImageId, data: &[u8]) -> Result<()> {
        let path = self.path_for(id);
        let tmp = self.root.join(format!(".{id}.partial"));

        if let Err(e) = write_synced(&tmp, data).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!("Could not remove {}: {cleanup}", tmp.display());
            }
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &path).await?;
        sync_dir(&self.root).await?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn read(&self, id: &ImageId) -> Result<Bytes> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found("blob", id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &ImageId) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, id: &ImageId) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(id)).await?)
    }
}

/// Write `data` to `path` and flush it to stable storage.
async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// Persist directory entries, so a completed rename survives a crash.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// In-memory storage for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStorage {
    blobs: DashMap<ImageId, Bytes>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn write(&self, id: &ImageId, data: &[u8]) -> Result<()> {
        self.blobs.insert(*id, Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn read(&self, id: &ImageId) -> Result<Bytes> {
        self.blobs
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found("blob", id))
    }

    async fn delete(&self, id: &ImageId) -> Result<()> {
        self.blobs.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &ImageId) -> Result<bool> {
        Ok(self.blobs.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn fs_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsBlobStorage::new(dir.path().join("blobs")).unwrap();
        let id = ImageId::new();

        storage.write(&id, b"jpeg bytes").await.unwrap();
        assert!(storage.exists(&id).await.unwrap());
        assert_eq!(storage.read(&id).await.unwrap(), Bytes::from_static(b"jpeg bytes"));
        assert_eq!(storage.path_for(&id), dir.path().join("blobs").join(id.to_string()));

        storage.delete(&id).await.unwrap();
        assert!(!storage.exists(&id).await.unwrap());
        storage.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn fs_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsBlobStorage::new(dir.path()).unwrap();
        let id = ImageId::new();

        storage.write(&id, b"first").await.unwrap();
        storage.write(&id, b"second").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![id.to_string()]);
        assert_eq!(storage.read(&id).await.unwrap(), Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn fs_synced_write_is_complete_on_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let data = vec![7u8; 64 * 1024];

        write_synced(&path, &data).await.unwrap();
        sync_dir(dir.path()).await.unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), data.len() as u64);
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[tokio::test]
    async fn fs_write_into_vanished_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blobs");
        let storage = FsBlobStorage::new(&root).unwrap();
        std::fs::remove_dir(&root).unwrap();

        let id = ImageId::new();
        let err = storage.write(&id, b"bytes").await.unwrap_err();
        assert_matches!(err, Error::Io { .. });
        assert!(!storage.path_for(&id).exists());
    }

    #[tokio::test]
    async fn fs_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsBlobStorage::new(dir.path()).unwrap();
        let err = storage.read(&ImageId::new()).await.unwrap_err();
        assert_matches!(err, Error::NotFound { .. });
    }

    #[tokio::test]
    async fn memory_round_trip() {
        let storage = MemoryBlobStorage::new();
        let id = ImageId::new();
        assert_matches!(storage.read(&id).await, Err(Error::NotFound { .. }));

        storage.write(&id, b"abc").await.unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.read(&id).await.unwrap(), Bytes::from_static(b"abc"));

        storage.delete(&id).await.unwrap();
        assert!(storage.is_empty());
    }
}
