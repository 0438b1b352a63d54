//! Storage service facade.
//!
//! Thin composition over the upload coordinator and namespace engine; this
//! layer adds no invariants of its own and delegate failures propagate
//! unchanged.

use crate::error::{ServiceError, ServiceResult};
use crate::namespace::{CopyOutcome, DeleteOutcome, MoveOutcome, NamespaceEngine};
use crate::registry::ChunkRegistry;
use crate::upload::UploadCoordinator;
use bytes::Bytes;
use depot_core::{BlobRef, CleanupReport, DeclaredChunk, ServiceConfig, UploadId};
use depot_metadata::{
    ChunkRow, FileRepo, FileRow, FolderRepo, FolderRow, MetadataStore, TempChunkRow,
};
use depot_storage::BlobStore;
use std::sync::Arc;
use time::OffsetDateTime;

/// The contents of one directory level.
#[derive(Clone, Debug)]
pub struct DirectoryListing {
    pub folders: Vec<FolderRow>,
    pub files: Vec<FileRow>,
}

/// A downloaded file: reassembled bytes plus metadata.
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    pub data: Bytes,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
}

/// A file row together with its chunk records.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub file: FileRow,
    pub chunks: Vec<ChunkRow>,
}

/// Facade exposing the storage engine to a higher layer.
pub struct StorageService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    uploads: UploadCoordinator,
    namespace: NamespaceEngine,
    registry: ChunkRegistry,
    config: ServiceConfig,
}

impl StorageService {
    /// Compose a service over the given stores.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            uploads: UploadCoordinator::new(metadata.clone(), blobs.clone(), config.clone()),
            namespace: NamespaceEngine::new(metadata.clone(), blobs.clone()),
            registry: ChunkRegistry::new(metadata.clone()),
            metadata,
            blobs,
            config,
        }
    }

    // ===== Directory operations =====

    /// List the folders and files at one directory level (root when `None`).
    pub async fn list_directory(&self, folder_id: Option<i64>) -> ServiceResult<DirectoryListing> {
        let folders = self.metadata.list_folders(folder_id).await?;
        let files = self.metadata.list_files(folder_id).await?;
        Ok(DirectoryListing { folders, files })
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<i64>,
    ) -> ServiceResult<FolderRow> {
        Ok(self.metadata.create_folder(name, parent_id).await?)
    }

    /// Rename a folder.
    pub async fn rename_folder(&self, folder_id: i64, name: &str) -> ServiceResult<FolderRow> {
        Ok(self.metadata.rename_folder(folder_id, name).await?)
    }

    /// Rename a file.
    pub async fn rename_file(&self, file_id: i64, name: &str) -> ServiceResult<FileRow> {
        Ok(self.metadata.rename_file(file_id, name).await?)
    }

    /// Get the ancestor chain of a folder, root first.
    ///
    /// The walk stops at the first ancestor that no longer resolves, so a
    /// missing id yields whatever prefix is still reachable.
    pub async fn folder_path(&self, folder_id: i64) -> ServiceResult<Vec<FolderRow>> {
        let mut path = Vec::new();
        let mut current = Some(folder_id);
        while let Some(id) = current {
            let Some(folder) = self.metadata.get_folder(id).await? else {
                break;
            };
            current = folder.parent_id;
            path.push(folder);
        }
        path.reverse();
        Ok(path)
    }

    // ===== Upload operations =====

    /// Validate an upload request before any bytes are staged.
    ///
    /// Checks the name is not blank, the declared size is within the
    /// configured cap, and the extension is not on the denylist.
    pub fn validate_upload(&self, file_name: &str, size: u64) -> ServiceResult<()> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::invalid_argument("file name must not be blank"));
        }
        if size > self.config.max_file_size {
            return Err(ServiceError::invalid_argument(format!(
                "file size {size} exceeds the maximum {}",
                self.config.max_file_size
            ))
            .with_context("size", size)
            .with_context("max", self.config.max_file_size));
        }
        let extension = file_name
            .rfind('.')
            .map(|dot| file_name[dot..].to_ascii_lowercase())
            .unwrap_or_default();
        if self.config.denied_extensions.iter().any(|e| *e == extension) {
            return Err(ServiceError::invalid_argument(format!(
                "file type {extension} is not allowed"
            ))
            .with_context("extension", extension));
        }
        Ok(())
    }

    /// Stage one chunk of a multi-part upload.
    #[allow(clippy::too_many_arguments)]
    pub async fn stage_chunk(
        &self,
        upload_id: &UploadId,
        chunk_index: u32,
        data: Bytes,
        original_file_name: &str,
        original_file_size: u64,
        folder_id: Option<i64>,
    ) -> ServiceResult<TempChunkRow> {
        self.uploads
            .stage_chunk(
                upload_id,
                chunk_index,
                data,
                original_file_name,
                original_file_size,
                folder_id,
            )
            .await
    }

    /// Merge the staged chunks of an upload into a file.
    pub async fn merge(
        &self,
        upload_id: &UploadId,
        file_name: &str,
        file_size: u64,
        mime_type: &str,
        folder_id: Option<i64>,
        declared_chunks: &[DeclaredChunk],
    ) -> ServiceResult<FileRow> {
        self.uploads
            .merge(upload_id, file_name, file_size, mime_type, folder_id, declared_chunks)
            .await
    }

    /// Remove everything staged for an upload.
    pub async fn cleanup_upload(&self, upload_id: &UploadId) -> ServiceResult<CleanupReport> {
        self.uploads.cleanup_upload(upload_id).await
    }

    /// Remove staged chunks older than the configured TTL.
    pub async fn sweep_expired(&self, now: OffsetDateTime) -> ServiceResult<u64> {
        self.uploads.sweep_expired(now).await
    }

    /// Direct upload of a whole payload.
    pub async fn upload_whole(
        &self,
        data: Bytes,
        file_name: &str,
        folder_id: Option<i64>,
        mime_type: &str,
    ) -> ServiceResult<FileRow> {
        self.uploads
            .upload_whole(data, file_name, folder_id, mime_type)
            .await
    }

    // ===== Namespace operations =====

    /// Move files and folders under a new parent.
    pub async fn move_items(
        &self,
        file_ids: &[i64],
        folder_ids: &[i64],
        target_folder_id: Option<i64>,
    ) -> MoveOutcome {
        self.namespace
            .move_items(file_ids, folder_ids, target_folder_id)
            .await
    }

    /// Copy files and folders under a new parent.
    pub async fn copy_items(
        &self,
        file_ids: &[i64],
        folder_ids: &[i64],
        target_folder_id: Option<i64>,
    ) -> CopyOutcome {
        self.namespace
            .copy_items(file_ids, folder_ids, target_folder_id)
            .await
    }

    /// Delete files and folder subtrees.
    pub async fn delete_items(&self, file_ids: &[i64], folder_ids: &[i64]) -> DeleteOutcome {
        self.namespace.delete_items(file_ids, folder_ids).await
    }

    // ===== File access =====

    /// Get a file row together with its ordered chunk records.
    pub async fn file_info(&self, file_id: i64) -> ServiceResult<FileInfo> {
        let file = self.metadata.get_file(file_id).await?.ok_or_else(|| {
            ServiceError::not_found(format!("file {file_id} not found"))
                .with_context("file_id", file_id)
        })?;
        let chunks = self.registry.chunks_of(file_id).await?;
        Ok(FileInfo { file, chunks })
    }

    /// Download a file: retrieve its chunks in index order and concatenate.
    pub async fn download_file(&self, file_id: i64) -> ServiceResult<DownloadedFile> {
        let file = self.metadata.get_file(file_id).await?.ok_or_else(|| {
            ServiceError::not_found(format!("file {file_id} not found"))
                .with_context("file_id", file_id)
        })?;
        let chunks = self.registry.chunks_of(file_id).await?;
        if chunks.is_empty() {
            return Err(
                ServiceError::not_found(format!("file {file_id} has no chunks"))
                    .with_context("file_id", file_id),
            );
        }

        let refs: Vec<BlobRef> = chunks
            .iter()
            .map(|chunk| BlobRef::new(chunk.blob_ref.as_str()))
            .collect();
        let data = self.blobs.retrieve(&refs).await?;
        Ok(DownloadedFile {
            data,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size,
        })
    }
}
