//! SQLite metadata store integration tests.

use depot_metadata::{
    ChunkRepo, FileRepo, FolderRepo, MetadataError, NewTempChunk, SqliteStore, TempChunkRepo,
};
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};

async fn store() -> (SqliteStore, TempDir) {
    let temp = tempfile::tempdir().expect("failed to create temp directory");
    let store = SqliteStore::new(temp.path().join("metadata.db"))
        .await
        .expect("failed to open store");
    (store, temp)
}

fn temp_chunk(upload_id: &str, chunk_index: i64, created_at: OffsetDateTime) -> NewTempChunk {
    NewTempChunk {
        upload_id: upload_id.to_string(),
        chunk_index,
        blob_ref: format!("parts/{upload_id}-{chunk_index}"),
        size: 100,
        original_file_name: "big.bin".to_string(),
        original_file_size: 300,
        folder_id: None,
        created_at,
    }
}

#[tokio::test]
async fn folder_sibling_names_are_unique_per_parent() {
    let (store, _temp) = store().await;

    let docs = store.create_folder("docs", None).await.unwrap();
    // Same name at root is rejected.
    match store.create_folder("docs", None).await {
        Err(MetadataError::AlreadyExists(_)) => {}
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    // Same name under a different parent is fine.
    store.create_folder("docs", Some(docs.id)).await.unwrap();
}

#[tokio::test]
async fn rename_folder_rejects_sibling_clash() {
    let (store, _temp) = store().await;

    store.create_folder("a", None).await.unwrap();
    let b = store.create_folder("b", None).await.unwrap();

    match store.rename_folder(b.id, "a").await {
        Err(MetadataError::AlreadyExists(_)) => {}
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    let renamed = store.rename_folder(b.id, "c").await.unwrap();
    assert_eq!(renamed.name, "c");
}

#[tokio::test]
async fn reparent_folder_checks_destination_siblings() {
    let (store, _temp) = store().await;

    let target = store.create_folder("target", None).await.unwrap();
    store.create_folder("dup", Some(target.id)).await.unwrap();
    let loose = store.create_folder("dup", None).await.unwrap();

    match store.set_folder_parent(loose.id, Some(target.id)).await {
        Err(MetadataError::AlreadyExists(_)) => {}
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    // The failed reparent left the folder where it was.
    let unchanged = store.get_folder(loose.id).await.unwrap().unwrap();
    assert_eq!(unchanged.parent_id, None);
}

#[tokio::test]
async fn file_delete_cascades_to_chunks() {
    let (store, _temp) = store().await;

    let file = store
        .create_file("movie.mkv", None, 200, "video/x-matroska")
        .await
        .unwrap();
    store
        .create_chunk(file.id, 0, "parts/aa", 100)
        .await
        .unwrap();
    store
        .create_chunk(file.id, 1, "parts/bb", 100)
        .await
        .unwrap();
    assert_eq!(store.chunks_of_file(file.id).await.unwrap().len(), 2);

    store.delete_file(file.id).await.unwrap();
    assert!(store.get_file(file.id).await.unwrap().is_none());
    assert!(store.chunks_of_file(file.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn chunks_come_back_ordered_by_index() {
    let (store, _temp) = store().await;

    let file = store
        .create_file("data.bin", None, 30, "application/octet-stream")
        .await
        .unwrap();
    // Insert out of order on purpose.
    for index in [2i64, 0, 1] {
        store
            .create_chunk(file.id, index, &format!("parts/{index}"), 10)
            .await
            .unwrap();
    }

    let chunks = store.chunks_of_file(file.id).await.unwrap();
    let indices: Vec<i64> = chunks.iter().map(|c| c.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn listing_is_ordered_by_name_and_scoped_to_parent() {
    let (store, _temp) = store().await;

    let parent = store.create_folder("parent", None).await.unwrap();
    store.create_folder("zeta", Some(parent.id)).await.unwrap();
    store.create_folder("alpha", Some(parent.id)).await.unwrap();
    store.create_folder("elsewhere", None).await.unwrap();

    let children = store.list_folders(Some(parent.id)).await.unwrap();
    let names: Vec<&str> = children.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[tokio::test]
async fn temp_chunk_expiry_cutoff_is_strict() {
    let (store, _temp) = store().await;

    let now = OffsetDateTime::now_utc();
    store
        .create_temp_chunk(&temp_chunk("u1", 0, now - Duration::hours(25)))
        .await
        .unwrap();
    store
        .create_temp_chunk(&temp_chunk("u1", 1, now - Duration::hours(23)))
        .await
        .unwrap();

    let cutoff = now - Duration::hours(24);
    let expired = store.expired_temp_chunks(cutoff).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].chunk_index, 0);

    let removed = store.delete_expired_temp_chunks(cutoff).await.unwrap();
    assert_eq!(removed, 1);

    let remaining = store.temp_chunks_for_upload("u1").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].chunk_index, 1);
}

#[tokio::test]
async fn delete_temp_chunks_is_idempotent() {
    let (store, _temp) = store().await;

    assert_eq!(store.delete_temp_chunks("missing").await.unwrap(), 0);

    let now = OffsetDateTime::now_utc();
    store
        .create_temp_chunk(&temp_chunk("u2", 0, now))
        .await
        .unwrap();
    assert_eq!(store.delete_temp_chunks("u2").await.unwrap(), 1);
    assert_eq!(store.delete_temp_chunks("u2").await.unwrap(), 0);
}
