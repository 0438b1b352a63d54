//! Chunk repository.

use crate::error::MetadataResult;
use crate::models::ChunkRow;
use async_trait::async_trait;

/// Repository for committed chunk records.
#[async_trait]
pub trait ChunkRepo: Send + Sync {
    /// Create a chunk record for a file.
    async fn create_chunk(
        &self,
        file_id: i64,
        chunk_index: i64,
        blob_ref: &str,
        size: i64,
    ) -> MetadataResult<ChunkRow>;

    /// Get all chunks of a file, ordered by `chunk_index`.
    async fn chunks_of_file(&self, file_id: i64) -> MetadataResult<Vec<ChunkRow>>;
}
