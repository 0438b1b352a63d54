//! Storage engine for the depot virtual drive.
//!
//! This crate composes the metadata store and the blob backend into the
//! operations a higher layer calls:
//! - `UploadCoordinator`: the staged multi-part upload protocol
//!   (stage → validate → commit → sweep)
//! - `NamespaceEngine`: cycle-safe moves, reference-sharing copies, and
//!   recursive deletes over the folder/file hierarchy
//! - `ChunkRegistry`: ordered, gapless chunk sequences per file
//! - `StorageService`: the thin facade tying the above together

pub mod error;
pub mod namespace;
pub mod registry;
pub mod service;
pub mod upload;

pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use namespace::{CopyOutcome, DeleteOutcome, MoveOutcome, NamespaceEngine};
pub use registry::ChunkRegistry;
pub use service::{DirectoryListing, DownloadedFile, FileInfo, StorageService};
pub use upload::UploadCoordinator;
