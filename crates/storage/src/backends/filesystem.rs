//! Local filesystem blob store backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::BlobStore;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use depot_core::{split_into_parts, BlobRef, StoredPart};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem blob store.
///
/// Each stored part is one file under `root/parts/`, keyed by a random
/// UUID sharded over a two-character prefix directory. Payloads above
/// `max_part_size` are subdivided into multiple parts, mirroring a remote
/// backend's single-object limit.
pub struct FilesystemBackend {
    root: PathBuf,
    max_part_size: u64,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at `root`.
    pub async fn new(root: impl AsRef<Path>, max_part_size: u64) -> StorageResult<Self> {
        if max_part_size == 0 {
            return Err(StorageError::Config(
                "max_part_size must be positive".to_string(),
            ));
        }
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("parts")).await?;
        fs::create_dir_all(root.join("tmp")).await?;
        Ok(Self {
            root,
            max_part_size,
        })
    }

    /// Resolve a reference to its on-disk path.
    ///
    /// References are issued by this backend, but a stored reference may
    /// round-trip through external metadata, so unsafe components are
    /// rejected rather than trusted.
    fn ref_path(&self, blob_ref: &BlobRef) -> StorageResult<PathBuf> {
        let key = blob_ref.as_str();
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidRef(key.to_string()));
        }
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidRef(key.to_string())),
            }
        }
        Ok(self.root.join(key))
    }

    /// Write one part atomically: stage under `tmp/`, then rename into place.
    async fn write_part(&self, data: &[u8]) -> StorageResult<BlobRef> {
        let id = Uuid::new_v4().to_string();
        let key = format!("parts/{}/{}", &id[..2], id);
        let final_path = self.root.join(&key);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.root.join("tmp").join(&id);
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_path, &final_path).await?;

        Ok(BlobRef::new(key))
    }
}

#[async_trait]
impl BlobStore for FilesystemBackend {
    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    async fn store(&self, data: Bytes, label: &str) -> StorageResult<Vec<StoredPart>> {
        let boundaries = split_into_parts(data.len() as u64, self.max_part_size);
        let mut parts = Vec::with_capacity(boundaries.len());
        for (offset, len) in boundaries {
            let slice = data.slice(offset as usize..(offset + len) as usize);
            let blob_ref = self.write_part(&slice).await?;
            parts.push(StoredPart {
                blob_ref,
                size: len,
            });
        }
        tracing::debug!(parts = parts.len(), label, "stored payload");
        Ok(parts)
    }

    async fn retrieve(&self, refs: &[BlobRef]) -> StorageResult<Bytes> {
        let mut out = BytesMut::new();
        for blob_ref in refs {
            let path = self.ref_path(blob_ref)?;
            let data = fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StorageError::NotFound(blob_ref.to_string())
                } else {
                    StorageError::Io(e)
                }
            })?;
            out.extend_from_slice(&data);
        }
        Ok(out.freeze())
    }

    async fn delete(&self, blob_ref: &BlobRef) -> StorageResult<()> {
        let path = self.ref_path(blob_ref)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(blob_ref.to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
