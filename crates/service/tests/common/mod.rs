//! Common test utilities.

use depot_core::{ServiceConfig, UploadId};
use depot_metadata::SqliteStore;
use depot_service::StorageService;
use depot_storage::FilesystemBackend;
use std::sync::Arc;
use tempfile::TempDir;

/// A service wired to a tempdir-backed SQLite store and filesystem blob
/// backend. Note: #[allow(dead_code)] because each test file compiles
/// common/ separately.
#[allow(dead_code)]
pub struct TestEnv {
    pub service: StorageService,
    pub metadata: Arc<SqliteStore>,
    pub blobs: Arc<FilesystemBackend>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestEnv {
    /// Default config, 1 MiB backend object limit.
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::default(), 1024 * 1024).await
    }

    /// Default config with a custom backend object limit.
    pub async fn with_part_size(max_part_size: u64) -> Self {
        Self::with_config(ServiceConfig::default(), max_part_size).await
    }

    pub async fn with_config(config: ServiceConfig, max_part_size: u64) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");
        let metadata = Arc::new(
            SqliteStore::new(temp_dir.path().join("metadata.db"))
                .await
                .expect("failed to open metadata store"),
        );
        let blobs = Arc::new(
            FilesystemBackend::new(temp_dir.path().join("blobs"), max_part_size)
                .await
                .expect("failed to create blob backend"),
        );
        let service = StorageService::new(metadata.clone(), blobs.clone(), config);

        Self {
            service,
            metadata,
            blobs,
            _temp_dir: temp_dir,
        }
    }
}

/// Parse an upload id, panicking on invalid input (tests only).
#[allow(dead_code)]
pub fn upload_id(s: &str) -> UploadId {
    UploadId::parse(s).expect("invalid upload id")
}
