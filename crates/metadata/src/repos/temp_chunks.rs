//! Staged upload chunk repository.

use crate::error::MetadataResult;
use crate::models::{NewTempChunk, TempChunkRow};
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for staged upload chunks.
#[async_trait]
pub trait TempChunkRepo: Send + Sync {
    /// Insert a staged chunk row.
    async fn create_temp_chunk(&self, chunk: &NewTempChunk) -> MetadataResult<TempChunkRow>;

    /// Get the staged chunk at a specific index of an upload, if any.
    async fn get_temp_chunk(
        &self,
        upload_id: &str,
        chunk_index: i64,
    ) -> MetadataResult<Option<TempChunkRow>>;

    /// Get all staged chunks of an upload, ordered by `chunk_index`.
    async fn temp_chunks_for_upload(&self, upload_id: &str) -> MetadataResult<Vec<TempChunkRow>>;

    /// Delete one staged chunk row by id.
    async fn delete_temp_chunk(&self, id: i64) -> MetadataResult<()>;

    /// Delete all staged chunks of an upload. Returns the number removed;
    /// zero is a valid no-op.
    async fn delete_temp_chunks(&self, upload_id: &str) -> MetadataResult<u64>;

    /// Get staged chunks created strictly before `older_than`, across all
    /// uploads. Used by the TTL sweep to release their blobs first.
    async fn expired_temp_chunks(
        &self,
        older_than: OffsetDateTime,
    ) -> MetadataResult<Vec<TempChunkRow>>;

    /// Delete staged chunks created strictly before `older_than`.
    /// Returns the number removed.
    async fn delete_expired_temp_chunks(&self, older_than: OffsetDateTime) -> MetadataResult<u64>;
}
