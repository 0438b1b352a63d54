//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{ChunkRepo, FileRepo, FolderRepo, TempChunkRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    FolderRepo + FileRepo + ChunkRepo + TempChunkRepo + Send + Sync
{
    /// Create the schema if it does not exist.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity.
    async fn health_check(&self) -> MetadataResult<()>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES folders(id),
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id);

CREATE TABLE IF NOT EXISTS files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    folder_id   INTEGER REFERENCES folders(id),
    size        INTEGER NOT NULL,
    mime_type   TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_files_folder ON files(folder_id);

CREATE TABLE IF NOT EXISTS file_chunks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id     INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    blob_ref    TEXT NOT NULL,
    size        INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_file_chunks_file ON file_chunks(file_id, chunk_index);

CREATE TABLE IF NOT EXISTS temp_chunks (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    upload_id           TEXT NOT NULL,
    chunk_index         INTEGER NOT NULL,
    blob_ref            TEXT NOT NULL,
    size                INTEGER NOT NULL,
    original_file_name  TEXT NOT NULL,
    original_file_size  INTEGER NOT NULL,
    folder_id           INTEGER,
    created_at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_temp_chunks_upload ON temp_chunks(upload_id, chunk_index);
CREATE INDEX IF NOT EXISTS idx_temp_chunks_created ON temp_chunks(created_at);
"#;

/// SQLite-based metadata store.
///
/// Sibling uniqueness is enforced app-level (check-then-insert) because a
/// SQL UNIQUE index on (name, parent_id) would not cover NULL parents.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) a SQLite store at the given path.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MetadataError::Internal(format!("create db directory: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under test
            // concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;

    /// Check whether a sibling folder with `name` exists under `parent_id`,
    /// excluding `exclude_id` (pass 0 to exclude nothing; rowids start at 1).
    async fn folder_name_taken(
        pool: &Pool<Sqlite>,
        name: &str,
        parent_id: Option<i64>,
        exclude_id: i64,
    ) -> MetadataResult<bool> {
        let row: Option<(i64,)> = match parent_id {
            Some(parent) => {
                sqlx::query_as(
                    "SELECT id FROM folders WHERE name = ? AND parent_id = ? AND id != ?",
                )
                .bind(name)
                .bind(parent)
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id FROM folders WHERE name = ? AND parent_id IS NULL AND id != ?",
                )
                .bind(name)
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?
            }
        };
        Ok(row.is_some())
    }

    /// Same check for files within a folder.
    async fn file_name_taken(
        pool: &Pool<Sqlite>,
        name: &str,
        folder_id: Option<i64>,
        exclude_id: i64,
    ) -> MetadataResult<bool> {
        let row: Option<(i64,)> = match folder_id {
            Some(folder) => {
                sqlx::query_as("SELECT id FROM files WHERE name = ? AND folder_id = ? AND id != ?")
                    .bind(name)
                    .bind(folder)
                    .bind(exclude_id)
                    .fetch_optional(pool)
                    .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id FROM files WHERE name = ? AND folder_id IS NULL AND id != ?",
                )
                .bind(name)
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?
            }
        };
        Ok(row.is_some())
    }

    #[async_trait]
    impl FolderRepo for SqliteStore {
        async fn create_folder(
            &self,
            name: &str,
            parent_id: Option<i64>,
        ) -> MetadataResult<FolderRow> {
            if folder_name_taken(&self.pool, name, parent_id, 0).await? {
                return Err(MetadataError::AlreadyExists(format!(
                    "folder '{name}' already exists in the target folder"
                )));
            }

            let row = sqlx::query_as::<_, FolderRow>(
                "INSERT INTO folders (name, parent_id, created_at) VALUES (?, ?, ?) RETURNING *",
            )
            .bind(name)
            .bind(parent_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_folder(&self, id: i64) -> MetadataResult<Option<FolderRow>> {
            let row = sqlx::query_as::<_, FolderRow>("SELECT * FROM folders WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_folders(&self, parent_id: Option<i64>) -> MetadataResult<Vec<FolderRow>> {
            let rows = match parent_id {
                Some(parent) => {
                    sqlx::query_as::<_, FolderRow>(
                        "SELECT * FROM folders WHERE parent_id = ? ORDER BY name ASC",
                    )
                    .bind(parent)
                    .fetch_all(&self.pool)
                    .await?
                }
                None => {
                    sqlx::query_as::<_, FolderRow>(
                        "SELECT * FROM folders WHERE parent_id IS NULL ORDER BY name ASC",
                    )
                    .fetch_all(&self.pool)
                    .await?
                }
            };
            Ok(rows)
        }

        async fn rename_folder(&self, id: i64, name: &str) -> MetadataResult<FolderRow> {
            let folder = self
                .get_folder(id)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("folder {id} not found")))?;

            if folder_name_taken(&self.pool, name, folder.parent_id, id).await? {
                return Err(MetadataError::AlreadyExists(format!(
                    "folder '{name}' already exists in the target folder"
                )));
            }

            let row = sqlx::query_as::<_, FolderRow>(
                "UPDATE folders SET name = ? WHERE id = ? RETURNING *",
            )
            .bind(name)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn set_folder_parent(
            &self,
            id: i64,
            parent_id: Option<i64>,
        ) -> MetadataResult<FolderRow> {
            let folder = self
                .get_folder(id)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("folder {id} not found")))?;

            if folder_name_taken(&self.pool, &folder.name, parent_id, id).await? {
                return Err(MetadataError::AlreadyExists(format!(
                    "folder '{}' already exists in the target folder",
                    folder.name
                )));
            }

            let row = sqlx::query_as::<_, FolderRow>(
                "UPDATE folders SET parent_id = ? WHERE id = ? RETURNING *",
            )
            .bind(parent_id)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn delete_folder(&self, id: i64) -> MetadataResult<()> {
            let result = sqlx::query("DELETE FROM folders WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("folder {id} not found")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FileRepo for SqliteStore {
        async fn create_file(
            &self,
            name: &str,
            folder_id: Option<i64>,
            size: i64,
            mime_type: &str,
        ) -> MetadataResult<FileRow> {
            if file_name_taken(&self.pool, name, folder_id, 0).await? {
                return Err(MetadataError::AlreadyExists(format!(
                    "file '{name}' already exists in the target folder"
                )));
            }

            let now = OffsetDateTime::now_utc();
            let row = sqlx::query_as::<_, FileRow>(
                r#"
                INSERT INTO files (name, folder_id, size, mime_type, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?) RETURNING *
                "#,
            )
            .bind(name)
            .bind(folder_id)
            .bind(size)
            .bind(mime_type)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_file(&self, id: i64) -> MetadataResult<Option<FileRow>> {
            let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_files(&self, folder_id: Option<i64>) -> MetadataResult<Vec<FileRow>> {
            let rows = match folder_id {
                Some(folder) => {
                    sqlx::query_as::<_, FileRow>(
                        "SELECT * FROM files WHERE folder_id = ? ORDER BY name ASC",
                    )
                    .bind(folder)
                    .fetch_all(&self.pool)
                    .await?
                }
                None => {
                    sqlx::query_as::<_, FileRow>(
                        "SELECT * FROM files WHERE folder_id IS NULL ORDER BY name ASC",
                    )
                    .fetch_all(&self.pool)
                    .await?
                }
            };
            Ok(rows)
        }

        async fn rename_file(&self, id: i64, name: &str) -> MetadataResult<FileRow> {
            let file = self
                .get_file(id)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("file {id} not found")))?;

            if file_name_taken(&self.pool, name, file.folder_id, id).await? {
                return Err(MetadataError::AlreadyExists(format!(
                    "file '{name}' already exists in the target folder"
                )));
            }

            let row = sqlx::query_as::<_, FileRow>(
                "UPDATE files SET name = ?, updated_at = ? WHERE id = ? RETURNING *",
            )
            .bind(name)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn set_file_folder(
            &self,
            id: i64,
            folder_id: Option<i64>,
        ) -> MetadataResult<FileRow> {
            let file = self
                .get_file(id)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("file {id} not found")))?;

            if file_name_taken(&self.pool, &file.name, folder_id, id).await? {
                return Err(MetadataError::AlreadyExists(format!(
                    "file '{}' already exists in the target folder",
                    file.name
                )));
            }

            let row = sqlx::query_as::<_, FileRow>(
                "UPDATE files SET folder_id = ?, updated_at = ? WHERE id = ? RETURNING *",
            )
            .bind(folder_id)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn delete_file(&self, id: i64) -> MetadataResult<()> {
            let result = sqlx::query("DELETE FROM files WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("file {id} not found")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChunkRepo for SqliteStore {
        async fn create_chunk(
            &self,
            file_id: i64,
            chunk_index: i64,
            blob_ref: &str,
            size: i64,
        ) -> MetadataResult<ChunkRow> {
            let row = sqlx::query_as::<_, ChunkRow>(
                r#"
                INSERT INTO file_chunks (file_id, chunk_index, blob_ref, size)
                VALUES (?, ?, ?, ?) RETURNING *
                "#,
            )
            .bind(file_id)
            .bind(chunk_index)
            .bind(blob_ref)
            .bind(size)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn chunks_of_file(&self, file_id: i64) -> MetadataResult<Vec<ChunkRow>> {
            let rows = sqlx::query_as::<_, ChunkRow>(
                "SELECT * FROM file_chunks WHERE file_id = ? ORDER BY chunk_index ASC",
            )
            .bind(file_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl TempChunkRepo for SqliteStore {
        async fn create_temp_chunk(&self, chunk: &NewTempChunk) -> MetadataResult<TempChunkRow> {
            let row = sqlx::query_as::<_, TempChunkRow>(
                r#"
                INSERT INTO temp_chunks (
                    upload_id, chunk_index, blob_ref, size,
                    original_file_name, original_file_size, folder_id, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *
                "#,
            )
            .bind(&chunk.upload_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.blob_ref)
            .bind(chunk.size)
            .bind(&chunk.original_file_name)
            .bind(chunk.original_file_size)
            .bind(chunk.folder_id)
            .bind(chunk.created_at)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_temp_chunk(
            &self,
            upload_id: &str,
            chunk_index: i64,
        ) -> MetadataResult<Option<TempChunkRow>> {
            let row = sqlx::query_as::<_, TempChunkRow>(
                "SELECT * FROM temp_chunks WHERE upload_id = ? AND chunk_index = ?",
            )
            .bind(upload_id)
            .bind(chunk_index)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn temp_chunks_for_upload(
            &self,
            upload_id: &str,
        ) -> MetadataResult<Vec<TempChunkRow>> {
            let rows = sqlx::query_as::<_, TempChunkRow>(
                "SELECT * FROM temp_chunks WHERE upload_id = ? ORDER BY chunk_index ASC",
            )
            .bind(upload_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn delete_temp_chunk(&self, id: i64) -> MetadataResult<()> {
            let result = sqlx::query("DELETE FROM temp_chunks WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "temp chunk {id} not found"
                )));
            }
            Ok(())
        }

        async fn delete_temp_chunks(&self, upload_id: &str) -> MetadataResult<u64> {
            let result = sqlx::query("DELETE FROM temp_chunks WHERE upload_id = ?")
                .bind(upload_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }

        async fn expired_temp_chunks(
            &self,
            older_than: OffsetDateTime,
        ) -> MetadataResult<Vec<TempChunkRow>> {
            let rows = sqlx::query_as::<_, TempChunkRow>(
                "SELECT * FROM temp_chunks WHERE created_at < ? ORDER BY created_at ASC",
            )
            .bind(older_than)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn delete_expired_temp_chunks(
            &self,
            older_than: OffsetDateTime,
        ) -> MetadataResult<u64> {
            let result = sqlx::query("DELETE FROM temp_chunks WHERE created_at < ?")
                .bind(older_than)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }
    }
}
