//! Relational metadata store for the depot virtual drive.
//!
//! Owns the folder/file hierarchy, committed chunk records, and the staged
//! upload chunks. Blob bytes live elsewhere; rows here only carry backend
//! references.

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{ChunkRow, FileRow, FolderRow, NewTempChunk, TempChunkRow};
pub use repos::{ChunkRepo, FileRepo, FolderRepo, TempChunkRepo};
pub use store::{MetadataStore, SqliteStore};
