//! Filesystem backend integration tests.

use bytes::Bytes;
use depot_core::BlobRef;
use depot_storage::{BlobStore, FilesystemBackend, StorageError};
use tempfile::tempdir;

async fn backend(max_part_size: u64) -> (FilesystemBackend, tempfile::TempDir) {
    let temp = tempdir().expect("failed to create temp directory");
    let backend = FilesystemBackend::new(temp.path(), max_part_size)
        .await
        .expect("failed to create backend");
    (backend, temp)
}

#[tokio::test]
async fn store_and_retrieve_roundtrip() {
    let (backend, _temp) = backend(1024).await;

    let parts = backend
        .store(Bytes::from_static(b"hello world"), "hello.txt")
        .await
        .unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].size, 11);

    let refs: Vec<BlobRef> = parts.iter().map(|p| p.blob_ref.clone()).collect();
    let data = backend.retrieve(&refs).await.unwrap();
    assert_eq!(&data[..], b"hello world");
}

#[tokio::test]
async fn oversized_payload_is_subdivided_in_order() {
    let (backend, _temp) = backend(4).await;

    // 10 bytes with a 4-byte object limit: parts of 4, 4, 2.
    let parts = backend
        .store(Bytes::from_static(b"0123456789"), "digits.bin")
        .await
        .unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(
        parts.iter().map(|p| p.size).collect::<Vec<_>>(),
        vec![4, 4, 2]
    );

    // Concatenation in returned order reconstructs the payload.
    let refs: Vec<BlobRef> = parts.iter().map(|p| p.blob_ref.clone()).collect();
    let data = backend.retrieve(&refs).await.unwrap();
    assert_eq!(&data[..], b"0123456789");

    // Out of order, it does not.
    let reversed: Vec<BlobRef> = refs.iter().rev().cloned().collect();
    let scrambled = backend.retrieve(&reversed).await.unwrap();
    assert_ne!(&scrambled[..], b"0123456789");
}

#[tokio::test]
async fn delete_removes_the_part() {
    let (backend, _temp) = backend(1024).await;

    let parts = backend
        .store(Bytes::from_static(b"ephemeral"), "gone.txt")
        .await
        .unwrap();
    let blob_ref = parts[0].blob_ref.clone();

    backend.delete(&blob_ref).await.unwrap();

    match backend.retrieve(std::slice::from_ref(&blob_ref)).await {
        Err(StorageError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    // Deleting again reports NotFound; best-effort callers tolerate this.
    assert!(matches!(
        backend.delete(&blob_ref).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn rejects_traversal_refs() {
    let (backend, _temp) = backend(1024).await;

    let evil = BlobRef::new("../../etc/passwd");
    assert!(matches!(
        backend.retrieve(std::slice::from_ref(&evil)).await,
        Err(StorageError::InvalidRef(_))
    ));
    assert!(matches!(
        backend.delete(&evil).await,
        Err(StorageError::InvalidRef(_))
    ));
}

#[tokio::test]
async fn empty_payload_stores_one_empty_part() {
    let (backend, _temp) = backend(1024).await;

    let parts = backend.store(Bytes::new(), "empty.bin").await.unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].size, 0);

    let refs: Vec<BlobRef> = parts.iter().map(|p| p.blob_ref.clone()).collect();
    let data = backend.retrieve(&refs).await.unwrap();
    assert!(data.is_empty());
}
