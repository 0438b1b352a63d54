//! Blob store trait definition.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use depot_core::{BlobRef, StoredPart};

/// Opaque blob store abstraction.
///
/// The backend owns the bytes; callers hold only the references it issues.
/// A single `store` call may yield more than one part when the payload
/// exceeds the backend's single-object limit — the order of returned parts
/// is significant and must be preserved as chunk order.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store a payload under a human-readable label.
    ///
    /// Returns one part per stored object, in byte order. The label is
    /// advisory (used for diagnostics and backend-side display); identity
    /// lives in the returned references.
    async fn store(&self, data: Bytes, label: &str) -> StorageResult<Vec<StoredPart>>;

    /// Retrieve and concatenate the given references, in the given order.
    async fn retrieve(&self, refs: &[BlobRef]) -> StorageResult<Bytes>;

    /// Delete one stored object.
    ///
    /// Best-effort callers tolerate and log failures from this method.
    async fn delete(&self, blob_ref: &BlobRef) -> StorageResult<()>;

    /// Get the name of this storage backend.
    ///
    /// Returns a static string identifier for the backend type
    /// (e.g., "filesystem"). Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends
    /// that don't require a connectivity probe.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
