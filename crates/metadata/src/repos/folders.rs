//! Folder repository.

use crate::error::MetadataResult;
use crate::models::FolderRow;
use async_trait::async_trait;

/// Repository for folder operations.
///
/// Sibling uniqueness (same name under the same parent, with NULL parent
/// meaning root) is enforced by every method that creates, renames, or
/// reparents a folder.
#[async_trait]
pub trait FolderRepo: Send + Sync {
    /// Create a folder. Fails with `AlreadyExists` on a sibling name clash.
    async fn create_folder(&self, name: &str, parent_id: Option<i64>)
        -> MetadataResult<FolderRow>;

    /// Get a folder by id.
    async fn get_folder(&self, id: i64) -> MetadataResult<Option<FolderRow>>;

    /// List the folders directly under a parent (root when `None`),
    /// ordered by name.
    async fn list_folders(&self, parent_id: Option<i64>) -> MetadataResult<Vec<FolderRow>>;

    /// Rename a folder in place. Fails with `NotFound` or `AlreadyExists`.
    async fn rename_folder(&self, id: i64, name: &str) -> MetadataResult<FolderRow>;

    /// Reparent a folder. Fails with `NotFound` or `AlreadyExists`.
    ///
    /// Cycle safety is the caller's responsibility; this method only checks
    /// sibling uniqueness in the destination.
    async fn set_folder_parent(
        &self,
        id: i64,
        parent_id: Option<i64>,
    ) -> MetadataResult<FolderRow>;

    /// Delete a folder row. Fails with `NotFound` if it does not exist.
    ///
    /// Children are not touched: recursive deletion is performed app-level
    /// by the namespace engine, children before parent.
    async fn delete_folder(&self, id: i64) -> MetadataResult<()>;
}
