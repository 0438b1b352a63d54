//! Upload session identifiers and staged-chunk declarations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a staged upload session.
///
/// Upload ids are caller-supplied opaque strings: the client picks one per
/// multi-part upload and uses it for every stage call and the final merge.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(String);

impl UploadId {
    /// Parse from a string, rejecting empty and whitespace-only ids.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.trim().is_empty() {
            return Err(crate::Error::InvalidUploadId(
                "upload id must not be blank".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadId({})", self.0)
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One chunk declared by the client in a merge request.
///
/// Only the count of declared chunks participates in merge validation; the
/// per-chunk fields are carried for the stricter validation hook and for
/// logging.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeclaredChunk {
    /// The chunk index (0-based).
    pub chunk_index: u32,
    /// The chunk size in bytes.
    pub size: u64,
}

/// Result of cleaning up a staged upload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Number of staged chunk rows removed.
    pub cleared_chunks: u64,
    /// Number of blob deletions that failed and were tolerated.
    pub failed_blob_deletes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_id_rejects_blank() {
        assert!(UploadId::parse("").is_err());
        assert!(UploadId::parse("   ").is_err());
        let id = UploadId::parse("upload-42").unwrap();
        assert_eq!(id.as_str(), "upload-42");
    }

    #[test]
    fn test_declared_chunk_serde_roundtrip() {
        let declared = DeclaredChunk {
            chunk_index: 2,
            size: 1024,
        };
        let json = serde_json::to_string(&declared).unwrap();
        let back: DeclaredChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunk_index, 2);
        assert_eq!(back.size, 1024);
    }
}
