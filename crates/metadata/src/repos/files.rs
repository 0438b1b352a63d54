//! File repository.

use crate::error::MetadataResult;
use crate::models::FileRow;
use async_trait::async_trait;

/// Repository for file operations.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Create a file record. Fails with `AlreadyExists` on a sibling name
    /// clash in the destination folder.
    async fn create_file(
        &self,
        name: &str,
        folder_id: Option<i64>,
        size: i64,
        mime_type: &str,
    ) -> MetadataResult<FileRow>;

    /// Get a file by id.
    async fn get_file(&self, id: i64) -> MetadataResult<Option<FileRow>>;

    /// List the files directly inside a folder (root when `None`),
    /// ordered by name.
    async fn list_files(&self, folder_id: Option<i64>) -> MetadataResult<Vec<FileRow>>;

    /// Rename a file in place, refreshing `updated_at`.
    /// Fails with `NotFound` or `AlreadyExists`.
    async fn rename_file(&self, id: i64, name: &str) -> MetadataResult<FileRow>;

    /// Move a file to another folder, refreshing `updated_at`.
    /// Fails with `NotFound` or `AlreadyExists`.
    async fn set_file_folder(&self, id: i64, folder_id: Option<i64>) -> MetadataResult<FileRow>;

    /// Delete a file row. Fails with `NotFound` if it does not exist.
    ///
    /// The file's chunk rows go with it (FK cascade).
    async fn delete_file(&self, id: i64) -> MetadataResult<()>;
}
