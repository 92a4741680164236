use super::engine::{ContinuationToken, ScanPage, TableStore};
use super::table::validate_table_name;
use crate::core::{Entity, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Live reference to a table known to exist in the store.
///
/// Cheap to clone; every primitive is forwarded to the store with the table name
/// filled in.
#[derive(Clone)]
pub struct TableHandle {
    name: Arc<str>,
    store: Arc<dyn TableStore>,
}

impl std::fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHandle").field("name", &self.name).finish()
    }
}

impl TableHandle {
    pub(crate) fn new(name: &str, store: Arc<dyn TableStore>) -> Self {
        Self {
            name: Arc::from(name),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn exists(&self) -> Result<bool> {
        self.store.table_exists(&self.name).await
    }

    pub async fn insert_entity(&self, entity: Entity) -> Result<Entity> {
        tracing::debug!(
            table = %self.name,
            partition = %entity.partition_key(),
            row = %entity.row_key(),
            "inserting entity"
        );
        self.store.insert_entity(&self.name, entity).await
    }

    pub async fn replace_entity(&self, entity: Entity, if_match: Option<&str>) -> Result<Entity> {
        tracing::debug!(
            table = %self.name,
            partition = %entity.partition_key(),
            row = %entity.row_key(),
            "replacing entity"
        );
        self.store.replace_entity(&self.name, entity, if_match).await
    }

    /// Point read. Returns `Ok(None)` when the entity does not exist.
    pub async fn retrieve_entity(&self, partition_key: &str, row_key: &str) -> Result<Option<Entity>> {
        tracing::debug!(table = %self.name, partition = %partition_key, row = %row_key, "retrieving entity");
        self.store.retrieve_entity(&self.name, partition_key, row_key).await
    }

    pub async fn delete_entity(&self, partition_key: &str, row_key: &str, if_match: Option<&str>) -> Result<()> {
        tracing::debug!(table = %self.name, partition = %partition_key, row = %row_key, "deleting entity");
        self.store
            .delete_entity(&self.name, partition_key, row_key, if_match)
            .await
    }

    pub async fn scan_page(
        &self,
        partition_key: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> Result<ScanPage> {
        self.store
            .scan_page(&self.name, partition_key, continuation)
            .await
    }
}

/// Resolves table names to handles, creating missing tables on first use.
///
/// The map lock is never held across a store call, so two first-time lookups of
/// the same name may both issue a create-if-absent; the store tolerates that.
pub struct TableHandleCache {
    store: Arc<dyn TableStore>,
    tables: RwLock<HashMap<String, TableHandle>>,
}

impl TableHandleCache {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    pub async fn get_table(&self, name: &str) -> Result<TableHandle> {
        if let Some(handle) = self.tables.read().await.get(name) {
            return Ok(handle.clone());
        }

        validate_table_name(name)?;
        let handle = TableHandle::new(name, Arc::clone(&self.store));
        if self.store.create_table_if_absent(name).await? {
            tracing::info!(table = %name, "created table");
        }

        self.tables
            .write()
            .await
            .insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Evict the table and delete it from the store if it exists.
    /// Deleting a name that was never seen is not an error.
    pub async fn delete_table(&self, name: &str) -> Result<()> {
        let handle = self.get_table(name).await?;
        self.tables.write().await.remove(name);

        if handle.exists().await? {
            self.store.delete_table(name).await?;
            tracing::info!(table = %name, "deleted table");
        }
        Ok(())
    }

    pub async fn cached_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StoreError;
    use crate::storage::InMemoryTableStore;

    fn cache() -> (Arc<InMemoryTableStore>, TableHandleCache) {
        let store = Arc::new(InMemoryTableStore::new());
        let cache = TableHandleCache::new(store.clone());
        (store, cache)
    }

    #[tokio::test]
    async fn test_get_table_creates_and_caches() {
        let (store, cache) = cache();

        let handle = cache.get_table("cloudtablefactortests").await.unwrap();
        assert!(handle.exists().await.unwrap());
        assert!(store.table_exists("cloudtablefactortests").await.unwrap());

        // Second lookup is served from the cache and does not fail
        let again = cache.get_table("cloudtablefactortests").await.unwrap();
        assert_eq!(again.name(), handle.name());
        assert_eq!(cache.cached_tables().await, vec!["cloudtablefactortests"]);
    }

    #[tokio::test]
    async fn test_delete_table() {
        let (_store, cache) = cache();

        let handle = cache.get_table("cloudtablefactortests").await.unwrap();
        cache.delete_table("cloudtablefactortests").await.unwrap();

        assert!(!handle.exists().await.unwrap());
        assert!(cache.cached_tables().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_never_seen_table_is_noop() {
        let (store, cache) = cache();
        cache.delete_table("Humans").await.unwrap();
        cache.delete_table("Humans").await.unwrap();
        assert!(!store.table_exists("Humans").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_table_name() {
        let (_store, cache) = cache();
        let err = cache.get_table("no-dashes").await.unwrap_err();
        assert!(matches!(err, StoreError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_store_outage_surfaces() {
        let (store, cache) = cache();
        store.set_available(false);
        let err = cache.get_table("People").await.unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_concurrent_first_lookups() {
        let (_store, cache) = cache();
        let cache = Arc::new(cache);

        let lookups = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_table("People").await })
        });

        for result in futures::future::join_all(lookups).await {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(cache.cached_tables().await, vec!["People"]);
    }
}
