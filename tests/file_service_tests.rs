use chrono::Duration;
use std::sync::Arc;
use tablecrud::blob::{BlobStore, FileService, InMemoryBlobStore, StorageFile};
use tablecrud::{InMemoryTableStore, Storage, StorageAccount, TableEntityCrud};

fn test_file() -> StorageFile {
    StorageFile::new("testfilecontainername", "testfilefilename")
}

fn load_file_bytes() -> Vec<u8> {
    (0..4096u32).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_get_file_url() {
    let service = FileService::new(Arc::new(InMemoryBlobStore::new()), StorageAccount::Development);
    let url = service.file_url(&test_file());
    assert!(url.starts_with("http://127.0.0.1:10000/"));
}

#[tokio::test]
async fn test_upload_download_delete() {
    let store = Arc::new(InMemoryBlobStore::new());
    let service = FileService::new(store.clone(), StorageAccount::Development);
    let file = test_file();
    let bytes = load_file_bytes();

    service.upload(&file, bytes.as_slice()).await.unwrap();
    let read = service.download(&file).await.unwrap().unwrap();
    assert_eq!(read.len(), bytes.len());
    assert_eq!(read, bytes);

    service.delete(&file).await.unwrap();
    assert!(service.download(&file).await.unwrap().is_none());
    assert!(!store.blob_exists(&file.container_name, &file.file_name).await.unwrap());
}

#[tokio::test]
async fn test_cloud_url_with_token() {
    let account = StorageAccount::parse(
        "DefaultEndpointsProtocol=https;AccountName=acme;AccountKey=c2VjcmV0",
    )
    .unwrap();
    let service = FileService::new(Arc::new(InMemoryBlobStore::new()), account);
    let url = service
        .file_url_with_token(&test_file(), Duration::hours(1))
        .await
        .unwrap();
    assert!(url.starts_with("//acme.blob.core.windows.net/testfilecontainername/testfilefilename?"));
}

#[tokio::test]
async fn test_storage_file_descriptor_keeps_container() {
    let storage = Storage::new(Arc::new(InMemoryTableStore::new()));
    let files: TableEntityCrud<StorageFile> = storage.entities("Files", "Uploads");

    let mut file = test_file();
    file.meta.row_key = "1".to_string();
    file.name = Some("Test".to_string());
    files.create(file).await.unwrap();

    let mut moved = StorageFile::new("othercontainer", "renamed");
    moved.meta.row_key = "1".to_string();
    let updated = files.update(moved).await.unwrap();

    assert_eq!(updated.container_name, "testfilecontainername");
    assert_eq!(updated.file_name, "renamed");
    assert_eq!(updated.name, None);
}
