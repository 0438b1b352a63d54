//! Chunk registry: ordered, gapless chunk sequences per file.

use crate::error::{ServiceError, ServiceResult};
use depot_metadata::{ChunkRepo, ChunkRow, FileRepo, MetadataStore, TempChunkRow};
use std::sync::Arc;

/// Maps a file to its ordered chunk sequence and validates staged uploads
/// for completeness.
#[derive(Clone)]
pub struct ChunkRegistry {
    metadata: Arc<dyn MetadataStore>,
}

impl ChunkRegistry {
    /// Create a registry over a metadata store.
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// Get the chunks of a file, ordered by chunk index.
    ///
    /// Fails with `NotFound` when the file row does not exist (a file with
    /// zero chunks is returned as an empty sequence — that inconsistency is
    /// the caller's to report).
    pub async fn chunks_of(&self, file_id: i64) -> ServiceResult<Vec<ChunkRow>> {
        if self.metadata.get_file(file_id).await?.is_none() {
            return Err(
                ServiceError::not_found(format!("file {file_id} not found"))
                    .with_context("file_id", file_id),
            );
        }
        Ok(self.metadata.chunks_of_file(file_id).await?)
    }

    /// Validate that the staged chunk count equals the declared count.
    ///
    /// Count equality is the entire check, reproducing the trust boundary
    /// of the merge contract; see [`indices_contiguous`] for the stricter
    /// validation used by tests and strict mode.
    ///
    /// [`indices_contiguous`]: ChunkRegistry::indices_contiguous
    pub fn validate_complete(staged: &[TempChunkRow], declared_count: usize) -> ServiceResult<()> {
        if staged.len() != declared_count {
            return Err(ServiceError::count_mismatch(format!(
                "staged chunk count {} does not match declared count {declared_count}",
                staged.len()
            ))
            .with_context("expected", declared_count)
            .with_context("actual", staged.len()));
        }
        Ok(())
    }

    /// Sum of committed chunk sizes.
    pub fn total_size(chunks: &[ChunkRow]) -> u64 {
        chunks.iter().map(|c| c.size.max(0) as u64).sum()
    }

    /// Sum of staged chunk sizes.
    pub fn staged_size(staged: &[TempChunkRow]) -> u64 {
        staged.iter().map(|c| c.size.max(0) as u64).sum()
    }

    /// Check that chunk indices form exactly {0..n-1}, in order.
    ///
    /// Expects the slice already ordered by chunk index, as the repository
    /// returns it.
    pub fn indices_contiguous(chunks: &[ChunkRow]) -> bool {
        chunks
            .iter()
            .enumerate()
            .all(|(i, chunk)| chunk.chunk_index == i as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn chunk(chunk_index: i64, size: i64) -> ChunkRow {
        ChunkRow {
            id: chunk_index + 1,
            file_id: 1,
            chunk_index,
            blob_ref: format!("parts/{chunk_index}"),
            size,
        }
    }

    fn staged(chunk_index: i64) -> TempChunkRow {
        TempChunkRow {
            id: chunk_index + 1,
            upload_id: "u1".to_string(),
            chunk_index,
            blob_ref: format!("parts/{chunk_index}"),
            size: 10,
            original_file_name: "a.bin".to_string(),
            original_file_size: 30,
            folder_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_validate_complete_counts_only() {
        let rows = vec![staged(0), staged(1), staged(2)];
        assert!(ChunkRegistry::validate_complete(&rows, 3).is_ok());

        let err = ChunkRegistry::validate_complete(&rows, 2).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::CountMismatch);
        assert_eq!(err.context("expected"), Some("2"));
        assert_eq!(err.context("actual"), Some("3"));

        // Count equality alone does not catch gaps; that is the documented
        // trust boundary.
        let gappy = vec![staged(0), staged(2), staged(5)];
        assert!(ChunkRegistry::validate_complete(&gappy, 3).is_ok());
    }

    #[test]
    fn test_total_size_sums_chunks() {
        let chunks = vec![chunk(0, 20), chunk(1, 20), chunk(2, 10)];
        assert_eq!(ChunkRegistry::total_size(&chunks), 50);
        assert_eq!(ChunkRegistry::total_size(&[]), 0);
    }

    #[test]
    fn test_indices_contiguous() {
        assert!(ChunkRegistry::indices_contiguous(&[
            chunk(0, 1),
            chunk(1, 1),
            chunk(2, 1)
        ]));
        assert!(ChunkRegistry::indices_contiguous(&[]));
        assert!(!ChunkRegistry::indices_contiguous(&[chunk(1, 1), chunk(2, 1)]));
        assert!(!ChunkRegistry::indices_contiguous(&[
            chunk(0, 1),
            chunk(0, 1),
            chunk(1, 1)
        ]));
    }
}
