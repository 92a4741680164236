use std::sync::Arc;
use tablecrud::{Entity, InMemoryTableStore, StoreError, TableHandleCache, TableStore};

const TEST_TABLE_NAME: &str = "cloudtablefactortests";

fn cache() -> (Arc<InMemoryTableStore>, TableHandleCache) {
    let store = Arc::new(InMemoryTableStore::new());
    let cache = TableHandleCache::new(store.clone());
    (store, cache)
}

#[tokio::test]
async fn test_get_table_creates_table() {
    let (_store, cache) = cache();
    let table = cache.get_table(TEST_TABLE_NAME).await.unwrap();
    assert!(table.exists().await.unwrap());
    assert_eq!(cache.cached_tables().await, vec![TEST_TABLE_NAME.to_string()]);
}

#[tokio::test]
async fn test_delete_table() {
    let (_store, cache) = cache();
    let table = cache.get_table(TEST_TABLE_NAME).await.unwrap();
    cache.delete_table(TEST_TABLE_NAME).await.unwrap();

    assert!(!table.exists().await.unwrap());
    assert!(cache.cached_tables().await.is_empty());
}

#[tokio::test]
async fn test_delete_table_twice_is_harmless() {
    let (store, cache) = cache();
    cache.delete_table(TEST_TABLE_NAME).await.unwrap();
    cache.delete_table(TEST_TABLE_NAME).await.unwrap();
    assert!(!store.table_exists(TEST_TABLE_NAME).await.unwrap());
}

#[tokio::test]
async fn test_deleted_table_is_recreated_on_next_use() {
    let (_store, cache) = cache();
    let table = cache.get_table(TEST_TABLE_NAME).await.unwrap();
    table.insert_entity(Entity::new("p", "r")).await.unwrap();

    cache.delete_table(TEST_TABLE_NAME).await.unwrap();

    let table = cache.get_table(TEST_TABLE_NAME).await.unwrap();
    assert!(table.retrieve_entity("p", "r").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_name_is_configuration_error() {
    let (_store, cache) = cache();
    let err = cache.get_table("no-dashes").await.unwrap_err();
    assert!(matches!(err, StoreError::ConfigurationError(_)));
}

#[tokio::test]
async fn test_unavailable_store_surfaces() {
    let (store, cache) = cache();
    store.set_available(false);

    let err = cache.get_table(TEST_TABLE_NAME).await.unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));
    assert!(err.is_retriable());
    assert!(cache.cached_tables().await.is_empty());

    store.set_available(true);
    assert!(cache.get_table(TEST_TABLE_NAME).await.is_ok());
}
