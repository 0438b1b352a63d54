//! Service error type: a fixed kind tag plus key-value context.
//!
//! Callers pattern-match on `ErrorKind` and inspect context entries
//! uniformly instead of probing ad hoc fields.

use depot_metadata::MetadataError;
use depot_storage::StorageError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Classification of a service failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A folder, file, or upload does not exist.
    NotFound,
    /// Sibling uniqueness violation.
    NameConflict,
    /// A folder move would make a folder its own ancestor.
    CycleRejected,
    /// Staged chunk count disagrees with the declared count at merge time.
    CountMismatch,
    /// A blob-store or metadata-store call failed.
    BackendFailure,
    /// Malformed input.
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::NameConflict => "name conflict",
            ErrorKind::CycleRejected => "cycle rejected",
            ErrorKind::CountMismatch => "count mismatch",
            ErrorKind::BackendFailure => "backend failure",
            ErrorKind::InvalidArgument => "invalid argument",
        };
        f.write_str(s)
    }
}

/// Service operation error.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    /// The fixed kind tag.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Arbitrary context entries (ids, counts) for diagnostics.
    pub context: BTreeMap<String, String>,
}

impl ServiceError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Look up a context entry.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn name_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameConflict, message)
    }

    pub fn cycle_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CycleRejected, message)
    }

    pub fn count_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CountMismatch, message)
    }

    pub fn backend_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendFailure, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }
}

impl From<MetadataError> for ServiceError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(msg) => Self::not_found(msg),
            MetadataError::AlreadyExists(msg) => Self::name_conflict(msg),
            other => Self::backend_failure(other.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        Self::backend_failure(err.to_string())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_entries_are_inspectable() {
        let err = ServiceError::count_mismatch("staged 2, declared 3")
            .with_context("expected", 3)
            .with_context("actual", 2);
        assert_eq!(err.kind, ErrorKind::CountMismatch);
        assert_eq!(err.context("expected"), Some("3"));
        assert_eq!(err.context("actual"), Some("2"));
        assert_eq!(err.context("missing"), None);
    }

    #[test]
    fn test_metadata_error_mapping() {
        let err: ServiceError = MetadataError::NotFound("file 7".to_string()).into();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err: ServiceError = MetadataError::AlreadyExists("file 'a'".to_string()).into();
        assert_eq!(err.kind, ErrorKind::NameConflict);

        let err: ServiceError = MetadataError::Internal("boom".to_string()).into();
        assert_eq!(err.kind, ErrorKind::BackendFailure);
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = ServiceError::cycle_rejected("folder 3 into folder 9");
        assert_eq!(err.to_string(), "cycle rejected: folder 3 into folder 9");
    }
}
