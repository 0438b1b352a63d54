//! Blob store abstraction and backends for depot.
//!
//! This crate provides:
//! - The `BlobStore` contract the engine stores file bytes through
//! - A local filesystem backend that models a size-limited remote store

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::BlobStore;

use depot_core::config::StorageConfig;
use std::sync::Arc;

/// Create a blob store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem {
            path,
            max_part_size,
        } => {
            let backend = FilesystemBackend::new(path, *max_part_size).await?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use depot_core::config::StorageConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("store"),
            max_part_size: 1024,
        };

        let store = from_config(&config).await.unwrap();
        let parts = store
            .store(Bytes::from_static(b"hi"), "hello.txt")
            .await
            .unwrap();
        assert_eq!(parts.len(), 1);
    }

    #[tokio::test]
    async fn from_config_rejects_zero_part_size() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("store"),
            max_part_size: 0,
        };

        match from_config(&config).await {
            Ok(_) => panic!("expected error"),
            Err(StorageError::Config(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}
