//! Namespace engine: hierarchy operations over folders and files.
//!
//! Batch operations never abort on a single item's failure: items are
//! processed strictly sequentially, each outcome recorded independently,
//! and the aggregate reports per-category counts plus per-item error
//! strings. Input order determines evaluation order.

use crate::error::{ServiceError, ServiceResult};
use depot_core::BlobRef;
use depot_metadata::{ChunkRepo, FileRepo, FileRow, FolderRepo, MetadataStore};
use depot_storage::BlobStore;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a batch move.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MoveOutcome {
    pub success: bool,
    pub moved_files: u64,
    pub moved_folders: u64,
    pub errors: Vec<String>,
}

/// Result of a batch copy.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CopyOutcome {
    pub success: bool,
    pub copied_files: u64,
    pub copied_folders: u64,
    pub errors: Vec<String>,
}

/// Result of a batch delete.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub deleted_files: u64,
    pub deleted_folders: u64,
    pub errors: Vec<String>,
}

/// Folder/file hierarchy operations: move, copy, delete, cycle detection.
///
/// Known limitation, reproduced from the documented contract: copies share
/// blob references with their source, so deleting the original file deletes
/// blob data a copy's chunk rows still point at. There is no reference
/// counting.
pub struct NamespaceEngine {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl NamespaceEngine {
    /// Create an engine over the given stores.
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { metadata, blobs }
    }

    /// Move files and folders under a new parent (root when `None`).
    #[tracing::instrument(skip(self, file_ids, folder_ids), fields(files = file_ids.len(), folders = folder_ids.len()))]
    pub async fn move_items(
        &self,
        file_ids: &[i64],
        folder_ids: &[i64],
        target_folder_id: Option<i64>,
    ) -> MoveOutcome {
        let mut outcome = MoveOutcome::default();

        for &file_id in file_ids {
            match self.metadata.set_file_folder(file_id, target_folder_id).await {
                Ok(_) => outcome.moved_files += 1,
                Err(err) => {
                    let err = ServiceError::from(err);
                    tracing::debug!(file_id, error = %err, "file move failed");
                    outcome.errors.push(format!("file {file_id}: {err}"));
                }
            }
        }

        for &folder_id in folder_ids {
            match self.move_folder(folder_id, target_folder_id).await {
                Ok(()) => outcome.moved_folders += 1,
                Err(err) => {
                    tracing::debug!(folder_id, error = %err, "folder move failed");
                    outcome.errors.push(format!("folder {folder_id}: {err}"));
                }
            }
        }

        outcome.success = outcome.errors.is_empty();
        outcome
    }

    async fn move_folder(&self, folder_id: i64, target: Option<i64>) -> ServiceResult<()> {
        if !self.is_safe_move(folder_id, target).await? {
            return Err(ServiceError::cycle_rejected(
                "cannot move a folder into itself or its own subtree",
            )
            .with_context("folder_id", folder_id));
        }
        self.metadata.set_folder_parent(folder_id, target).await?;
        Ok(())
    }

    /// Check whether reparenting `folder_id` under `target` keeps the
    /// parent graph acyclic.
    ///
    /// Root is always safe; the folder itself never is; otherwise the
    /// ancestor chain of the target is walked toward the root looking for
    /// `folder_id`. An ancestor that no longer resolves ends the walk.
    pub async fn is_safe_move(
        &self,
        folder_id: i64,
        target_folder_id: Option<i64>,
    ) -> ServiceResult<bool> {
        let Some(mut current) = target_folder_id else {
            return Ok(true);
        };
        loop {
            if current == folder_id {
                return Ok(false);
            }
            match self.metadata.get_folder(current).await? {
                Some(folder) => match folder.parent_id {
                    Some(parent) => current = parent,
                    None => return Ok(true),
                },
                None => return Ok(true),
            }
        }
    }

    /// Copy files and folders under a new parent (root when `None`).
    ///
    /// File copies are metadata-only; folder copies are structural and
    /// recursive. Partial completion on error is acceptable and reported
    /// per item.
    #[tracing::instrument(skip(self, file_ids, folder_ids), fields(files = file_ids.len(), folders = folder_ids.len()))]
    pub async fn copy_items(
        &self,
        file_ids: &[i64],
        folder_ids: &[i64],
        target_folder_id: Option<i64>,
    ) -> CopyOutcome {
        let mut outcome = CopyOutcome::default();

        for &file_id in file_ids {
            match self.copy_file(file_id, target_folder_id).await {
                Ok(_) => outcome.copied_files += 1,
                Err(err) => {
                    tracing::debug!(file_id, error = %err, "file copy failed");
                    outcome.errors.push(format!("file {file_id}: {err}"));
                }
            }
        }

        for &folder_id in folder_ids {
            match self.copy_folder(folder_id, target_folder_id).await {
                Ok(()) => outcome.copied_folders += 1,
                Err(err) => {
                    tracing::debug!(folder_id, error = %err, "folder copy failed");
                    outcome.errors.push(format!("folder {folder_id}: {err}"));
                }
            }
        }

        outcome.success = outcome.errors.is_empty();
        outcome
    }

    /// Copy one file: a new file row plus chunk rows pointing at the same
    /// blob refs as the source, in the same order. No bytes move.
    async fn copy_file(&self, file_id: i64, target: Option<i64>) -> ServiceResult<FileRow> {
        let source = self
            .metadata
            .get_file(file_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("file {file_id} not found"))
                    .with_context("file_id", file_id)
            })?;
        let chunks = self.metadata.chunks_of_file(file_id).await?;
        if chunks.is_empty() {
            return Err(
                ServiceError::not_found(format!("file {file_id} has no chunks"))
                    .with_context("file_id", file_id),
            );
        }

        let copy = self
            .metadata
            .create_file(&source.name, target, source.size, &source.mime_type)
            .await?;
        for chunk in &chunks {
            self.metadata
                .create_chunk(copy.id, chunk.chunk_index, &chunk.blob_ref, chunk.size)
                .await?;
        }
        Ok(copy)
    }

    /// Copy a folder subtree, pre-order: each destination folder exists
    /// before its contents are copied into it. Driven by an explicit
    /// work-list rather than call-stack recursion.
    async fn copy_folder(&self, folder_id: i64, target: Option<i64>) -> ServiceResult<()> {
        let source = self
            .metadata
            .get_folder(folder_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("folder {folder_id} not found"))
                    .with_context("folder_id", folder_id)
            })?;

        let root_copy = self.metadata.create_folder(&source.name, target).await?;

        // Folders created by this copy are skipped during traversal so that
        // copying a folder into its own subtree terminates.
        let mut created: HashSet<i64> = HashSet::from([root_copy.id]);
        let mut work = vec![(folder_id, root_copy.id)];
        while let Some((src_id, dst_id)) = work.pop() {
            for file in self.metadata.list_files(Some(src_id)).await? {
                self.copy_file(file.id, Some(dst_id)).await?;
            }
            for sub in self.metadata.list_folders(Some(src_id)).await? {
                if created.contains(&sub.id) {
                    continue;
                }
                let sub_copy = self.metadata.create_folder(&sub.name, Some(dst_id)).await?;
                created.insert(sub_copy.id);
                work.push((sub.id, sub_copy.id));
            }
        }
        Ok(())
    }

    /// Delete files and folder subtrees.
    #[tracing::instrument(skip(self, file_ids, folder_ids), fields(files = file_ids.len(), folders = folder_ids.len()))]
    pub async fn delete_items(&self, file_ids: &[i64], folder_ids: &[i64]) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();

        for &file_id in file_ids {
            match self.delete_file(file_id).await {
                Ok(()) => outcome.deleted_files += 1,
                Err(err) => {
                    tracing::debug!(file_id, error = %err, "file delete failed");
                    outcome.errors.push(format!("file {file_id}: {err}"));
                }
            }
        }

        for &folder_id in folder_ids {
            match self.delete_folder_tree(folder_id).await {
                Ok(()) => outcome.deleted_folders += 1,
                Err(err) => {
                    tracing::debug!(folder_id, error = %err, "folder delete failed");
                    outcome.errors.push(format!("folder {folder_id}: {err}"));
                }
            }
        }

        outcome.success = outcome.errors.is_empty();
        outcome
    }

    /// Delete one file: blobs first (best-effort, failures logged but the
    /// metadata delete still proceeds), then the file row. Chunk rows go
    /// with the file via FK cascade.
    async fn delete_file(&self, file_id: i64) -> ServiceResult<()> {
        let chunks = self.metadata.chunks_of_file(file_id).await?;
        for chunk in &chunks {
            if let Err(err) = self
                .blobs
                .delete(&BlobRef::new(chunk.blob_ref.as_str()))
                .await
            {
                tracing::warn!(
                    error = %err,
                    blob_ref = %chunk.blob_ref,
                    "failed to delete blob, continuing with metadata delete"
                );
            }
        }
        self.metadata.delete_file(file_id).await?;
        Ok(())
    }

    /// Delete a folder subtree, post-order: children before parent, every
    /// file through the blob-deleting path. Driven by an explicit
    /// work-list rather than call-stack recursion.
    async fn delete_folder_tree(&self, folder_id: i64) -> ServiceResult<()> {
        if self.metadata.get_folder(folder_id).await?.is_none() {
            return Err(
                ServiceError::not_found(format!("folder {folder_id} not found"))
                    .with_context("folder_id", folder_id),
            );
        }

        // Pre-order visit, then process reversed: every folder comes after
        // all of its descendants.
        let mut order = Vec::new();
        let mut stack = vec![folder_id];
        while let Some(id) = stack.pop() {
            order.push(id);
            for sub in self.metadata.list_folders(Some(id)).await? {
                stack.push(sub.id);
            }
        }

        for &id in order.iter().rev() {
            for file in self.metadata.list_files(Some(id)).await? {
                self.delete_file(file.id).await?;
            }
            self.metadata.delete_folder(id).await?;
        }
        Ok(())
    }
}
