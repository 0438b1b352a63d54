//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// Folder record. `parent_id = NULL` means the folder sits at the root.
#[derive(Debug, Clone, FromRow)]
pub struct FolderRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// File record. `folder_id = NULL` means the file sits at the root.
///
/// `size` carries the caller-declared byte count; the invariant that it
/// equals the sum of the file's chunk sizes is enforced by the upload paths
/// and checked by the test suite, not recomputed here.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: i64,
    pub name: String,
    pub folder_id: Option<i64>,
    pub size: i64,
    pub mime_type: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Committed chunk record: one ordered slice of a file's bytes.
///
/// For a given `file_id`, `chunk_index` values are exactly {0..n-1};
/// ordering by `chunk_index` reconstructs the original byte stream.
#[derive(Debug, Clone, FromRow)]
pub struct ChunkRow {
    pub id: i64,
    pub file_id: i64,
    pub chunk_index: i64,
    pub blob_ref: String,
    pub size: i64,
}

/// Staged chunk of an in-progress multi-part upload.
///
/// Transient: consumed on merge, or purged by explicit cleanup or the TTL
/// sweep.
#[derive(Debug, Clone, FromRow)]
pub struct TempChunkRow {
    pub id: i64,
    pub upload_id: String,
    pub chunk_index: i64,
    pub blob_ref: String,
    pub size: i64,
    pub original_file_name: String,
    pub original_file_size: i64,
    pub folder_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Parameters for inserting a staged chunk.
///
/// `created_at` is supplied by the caller so the TTL sweep can be tested
/// against an injected clock.
#[derive(Debug, Clone)]
pub struct NewTempChunk {
    pub upload_id: String,
    pub chunk_index: i64,
    pub blob_ref: String,
    pub size: i64,
    pub original_file_name: String,
    pub original_file_size: i64,
    pub folder_id: Option<i64>,
    pub created_at: OffsetDateTime,
}
