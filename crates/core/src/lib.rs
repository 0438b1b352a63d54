//! Core domain types and shared logic for the depot virtual drive.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Blob references and backend part descriptors
//! - Upload session identifiers and staged-chunk declarations
//! - Service and storage configuration
//! - Core error types

pub mod chunk;
pub mod config;
pub mod error;
pub mod upload;

pub use chunk::{BlobRef, StoredPart, part_label, split_into_parts};
pub use config::{ServiceConfig, StorageConfig};
pub use error::{Error, Result};
pub use upload::{CleanupReport, DeclaredChunk, UploadId};

/// Default maximum size of a single backend object: 48 MiB.
///
/// Payloads above this are subdivided by the backend into multiple parts.
pub const DEFAULT_MAX_PART_SIZE: u64 = 48 * 1024 * 1024;

/// Default maximum size of an uploaded file: 2 GiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Default time-to-live for staged upload chunks: 24 hours.
pub const DEFAULT_TEMP_CHUNK_TTL_SECS: u64 = 86_400;
