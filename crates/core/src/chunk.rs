//! Blob references and backend part descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque reference to an object held by the blob backend.
///
/// The engine never interprets the contents; it only stores, compares, and
/// hands references back to the backend that issued them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef(String);

impl BlobRef {
    /// Wrap a backend-issued reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Parse from a string, rejecting empty references.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Err(crate::Error::InvalidBlobRef("empty reference".to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", self.0)
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BlobRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One stored part returned by the backend for a single `store` call.
///
/// The backend may subdivide a payload; the order of returned parts is
/// significant and must be preserved as chunk order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredPart {
    /// Backend reference for this part.
    pub blob_ref: BlobRef,
    /// Part size in bytes.
    pub size: u64,
}

/// Derive the backend label for a staged chunk.
///
/// Mirrors the client-visible naming of multi-part uploads: the original
/// file name suffixed with a zero-padded part number.
pub fn part_label(original_file_name: &str, chunk_index: u32) -> String {
    format!("{original_file_name}.part{chunk_index:03}")
}

/// Compute the part boundaries for a payload of `len` bytes with the given
/// per-part size limit. Returns `(offset, len)` pairs in order.
pub fn split_into_parts(len: u64, max_part_size: u64) -> Vec<(u64, u64)> {
    assert!(max_part_size > 0, "max_part_size must be positive");
    if len == 0 {
        return vec![(0, 0)];
    }
    let mut parts = Vec::with_capacity(len.div_ceil(max_part_size) as usize);
    let mut offset = 0;
    while offset < len {
        let part_len = (len - offset).min(max_part_size);
        parts.push((offset, part_len));
        offset += part_len;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_ref_parse() {
        let blob_ref = BlobRef::parse("fs:abc123").unwrap();
        assert_eq!(blob_ref.as_str(), "fs:abc123");
        assert!(BlobRef::parse("").is_err());
    }

    #[test]
    fn test_part_label_padding() {
        assert_eq!(part_label("video.mkv", 0), "video.mkv.part000");
        assert_eq!(part_label("video.mkv", 12), "video.mkv.part012");
        assert_eq!(part_label("video.mkv", 123), "video.mkv.part123");
    }

    #[test]
    fn test_split_into_parts_exact_and_remainder() {
        assert_eq!(split_into_parts(100, 50), vec![(0, 50), (50, 50)]);
        assert_eq!(split_into_parts(120, 50), vec![(0, 50), (50, 50), (100, 20)]);
        assert_eq!(split_into_parts(10, 50), vec![(0, 10)]);
    }

    #[test]
    fn test_split_into_parts_empty_payload() {
        // An empty payload still produces one empty part so the stored file
        // keeps a chunk row to anchor its metadata.
        assert_eq!(split_into_parts(0, 50), vec![(0, 0)]);
    }
}
