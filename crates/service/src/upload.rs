//! Staged multi-part upload coordinator.

use crate::error::{ServiceError, ServiceResult};
use crate::registry::ChunkRegistry;
use bytes::Bytes;
use depot_core::{part_label, BlobRef, CleanupReport, DeclaredChunk, ServiceConfig, UploadId};
use depot_metadata::{
    ChunkRepo, FileRepo, FileRow, MetadataStore, NewTempChunk, TempChunkRepo, TempChunkRow,
};
use depot_storage::BlobStore;
use std::sync::Arc;
use time::OffsetDateTime;

/// Runs the staged upload protocol: stage → validate → commit → sweep.
///
/// Each upload session is identified by a caller-supplied upload id and is
/// isolated from every other session. There is no mutual exclusion per
/// upload id — callers must serialize stage/merge/cleanup calls for the
/// same id.
pub struct UploadCoordinator {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    config: ServiceConfig,
}

impl UploadCoordinator {
    /// Create a coordinator over the given stores.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            metadata,
            blobs,
            config,
        }
    }

    /// Stage one chunk of a multi-part upload.
    ///
    /// Stores the bytes under a derived part label and records a staged
    /// chunk row. No File/Chunk rows are created yet. Re-staging an index
    /// already used by this upload replaces the earlier chunk: the
    /// superseded blob is deleted best-effort and its row removed.
    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    pub async fn stage_chunk(
        &self,
        upload_id: &UploadId,
        chunk_index: u32,
        data: Bytes,
        original_file_name: &str,
        original_file_size: u64,
        folder_id: Option<i64>,
    ) -> ServiceResult<TempChunkRow> {
        let size = checked_i64(data.len() as u64, "chunk size")?;
        let original_file_size = checked_i64(original_file_size, "original file size")?;

        let label = part_label(original_file_name, chunk_index);
        let mut parts = self.blobs.store(data, &label).await?;
        if parts.len() != 1 {
            // A staged chunk must fit in a single backend object; the
            // client is responsible for slicing below the backend limit.
            for part in &parts {
                if let Err(err) = self.blobs.delete(&part.blob_ref).await {
                    tracing::warn!(error = %err, blob_ref = %part.blob_ref, "failed to delete stray part");
                }
            }
            return Err(ServiceError::backend_failure(
                "staged chunk exceeded the backend object limit",
            )
            .with_context("parts", parts.len()));
        }
        let part = parts.swap_remove(0);

        if let Some(previous) = self
            .metadata
            .get_temp_chunk(upload_id.as_str(), chunk_index as i64)
            .await?
        {
            if let Err(err) = self
                .blobs
                .delete(&BlobRef::new(previous.blob_ref.as_str()))
                .await
            {
                tracing::warn!(
                    error = %err,
                    blob_ref = %previous.blob_ref,
                    "failed to delete superseded staged blob"
                );
            }
            self.metadata.delete_temp_chunk(previous.id).await?;
        }

        let row = self
            .metadata
            .create_temp_chunk(&NewTempChunk {
                upload_id: upload_id.as_str().to_string(),
                chunk_index: chunk_index as i64,
                blob_ref: part.blob_ref.as_str().to_string(),
                size,
                original_file_name: original_file_name.to_string(),
                original_file_size,
                folder_id,
                created_at: OffsetDateTime::now_utc(),
            })
            .await?;
        tracing::debug!(blob_ref = %row.blob_ref, "staged chunk");
        Ok(row)
    }

    /// Merge the staged chunks of an upload into a durable file record.
    ///
    /// Fails with `NotFound` when nothing is staged and `CountMismatch`
    /// when the staged count disagrees with the declared chunk list. On any
    /// failure after the staged rows are loaded, a best-effort
    /// `cleanup_upload` runs before the original error is returned; cleanup
    /// failures are logged, not propagated.
    #[tracing::instrument(skip(self, declared_chunks))]
    pub async fn merge(
        &self,
        upload_id: &UploadId,
        file_name: &str,
        file_size: u64,
        mime_type: &str,
        folder_id: Option<i64>,
        declared_chunks: &[DeclaredChunk],
    ) -> ServiceResult<FileRow> {
        let staged = self
            .metadata
            .temp_chunks_for_upload(upload_id.as_str())
            .await?;
        if staged.is_empty() {
            return Err(
                ServiceError::not_found(format!("no staged chunks for upload {upload_id}"))
                    .with_context("upload_id", upload_id)
                    .with_context("staged_count", 0),
            );
        }

        match self
            .try_merge(upload_id, file_name, file_size, mime_type, folder_id, declared_chunks, &staged)
            .await
        {
            Ok(file) => {
                tracing::info!(file_id = file.id, chunks = staged.len(), "merged upload");
                Ok(file)
            }
            Err(err) => {
                tracing::warn!(error = %err, "merge failed, cleaning up staged chunks");
                if let Err(cleanup_err) = self.cleanup_upload(upload_id).await {
                    tracing::warn!(error = %cleanup_err, "cleanup after failed merge also failed");
                }
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn try_merge(
        &self,
        upload_id: &UploadId,
        file_name: &str,
        file_size: u64,
        mime_type: &str,
        folder_id: Option<i64>,
        declared_chunks: &[DeclaredChunk],
        staged: &[TempChunkRow],
    ) -> ServiceResult<FileRow> {
        ChunkRegistry::validate_complete(staged, declared_chunks.len())?;

        let file_size = checked_i64(file_size, "file size")?;
        if self.config.verify_declared_size {
            let staged_total = ChunkRegistry::staged_size(staged);
            if staged_total != file_size as u64 {
                return Err(ServiceError::invalid_argument(format!(
                    "declared file size {file_size} disagrees with staged total {staged_total}"
                ))
                .with_context("declared", file_size)
                .with_context("staged", staged_total));
            }
        }

        let file = self
            .metadata
            .create_file(file_name, folder_id, file_size, mime_type)
            .await?;

        // The staged rows arrive ordered by chunk index; the same blob refs
        // become the committed chunks, no blob copy involved.
        for temp in staged {
            self.metadata
                .create_chunk(file.id, temp.chunk_index, &temp.blob_ref, temp.size)
                .await?;
        }

        self.metadata
            .delete_temp_chunks(upload_id.as_str())
            .await?;
        Ok(file)
    }

    /// Remove everything staged for an upload.
    ///
    /// Blob deletions are best-effort: individual failures are logged and
    /// counted, never abort the loop. Idempotent — an upload with nothing
    /// staged is a no-op success.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_upload(&self, upload_id: &UploadId) -> ServiceResult<CleanupReport> {
        let staged = self
            .metadata
            .temp_chunks_for_upload(upload_id.as_str())
            .await?;
        if staged.is_empty() {
            return Ok(CleanupReport::default());
        }

        let mut failed_blob_deletes = 0;
        for chunk in &staged {
            if let Err(err) = self
                .blobs
                .delete(&BlobRef::new(chunk.blob_ref.as_str()))
                .await
            {
                failed_blob_deletes += 1;
                tracing::warn!(
                    error = %err,
                    blob_ref = %chunk.blob_ref,
                    "failed to delete staged blob, continuing"
                );
            }
        }

        let cleared_chunks = self
            .metadata
            .delete_temp_chunks(upload_id.as_str())
            .await?;
        tracing::info!(cleared_chunks, "cleaned up staged upload");
        Ok(CleanupReport {
            cleared_chunks,
            failed_blob_deletes,
        })
    }

    /// Remove staged chunks older than the configured TTL.
    ///
    /// `now` is injected so the sweep can be tested against a fixed clock.
    /// Blobs of expired chunks are deleted best-effort before the rows go,
    /// consistent with `cleanup_upload`. Returns the number of rows removed.
    pub async fn sweep_expired(&self, now: OffsetDateTime) -> ServiceResult<u64> {
        let cutoff = now - self.config.temp_chunk_ttl();
        let expired = self.metadata.expired_temp_chunks(cutoff).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        for chunk in &expired {
            if let Err(err) = self
                .blobs
                .delete(&BlobRef::new(chunk.blob_ref.as_str()))
                .await
            {
                tracing::warn!(
                    error = %err,
                    blob_ref = %chunk.blob_ref,
                    "failed to delete expired staged blob, continuing"
                );
            }
        }

        let removed = self.metadata.delete_expired_temp_chunks(cutoff).await?;
        tracing::info!(removed, "swept expired staged chunks");
        Ok(removed)
    }

    /// Direct (non-staged) upload of a whole payload.
    ///
    /// The backend may subdivide the payload; its declared part order is
    /// preserved as chunk order.
    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    pub async fn upload_whole(
        &self,
        data: Bytes,
        file_name: &str,
        folder_id: Option<i64>,
        mime_type: &str,
    ) -> ServiceResult<FileRow> {
        let size = checked_i64(data.len() as u64, "file size")?;

        let parts = self.blobs.store(data, file_name).await?;
        let file = self
            .metadata
            .create_file(file_name, folder_id, size, mime_type)
            .await?;
        for (index, part) in parts.iter().enumerate() {
            self.metadata
                .create_chunk(
                    file.id,
                    index as i64,
                    part.blob_ref.as_str(),
                    checked_i64(part.size, "part size")?,
                )
                .await?;
        }
        tracing::info!(file_id = file.id, parts = parts.len(), "uploaded file");
        Ok(file)
    }
}

fn checked_i64(value: u64, what: &str) -> ServiceResult<i64> {
    i64::try_from(value).map_err(|_| {
        ServiceError::invalid_argument(format!("{what} {value} exceeds the supported maximum"))
            .with_context("value", value)
    })
}
