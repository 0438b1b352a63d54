//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid upload id: {0}")]
    InvalidUploadId(String),

    #[error("invalid blob reference: {0}")]
    InvalidBlobRef(String),

    #[error("invalid part size: {size} (must be between {min} and {max})")]
    InvalidPartSize { size: u64, min: u64, max: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
