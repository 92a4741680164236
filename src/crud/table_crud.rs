use crate::connection::StorageConfig;
use crate::core::{Entity, Result, StoreError};
use crate::entity::{MergePolicy, MergeStrategy, TableEntity};
use crate::scan::{ContinuationScanner, ScanOptions};
use crate::storage::{TableHandle, TableHandleCache};
use std::marker::PhantomData;
use std::sync::Arc;

/// CRUD over one partition of one table for a typed entity.
///
/// Creates stamp the configured partition key; updates merge the incoming
/// entity into the stored one and replace it conditionally on the ETag.
pub struct TableEntityCrud<E> {
    tables: Arc<TableHandleCache>,
    table_name: String,
    partition_name: String,
    strategy: MergeStrategy,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for TableEntityCrud<E> {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            table_name: self.table_name.clone(),
            partition_name: self.partition_name.clone(),
            strategy: self.strategy,
            _entity: PhantomData,
        }
    }
}

impl<E: TableEntity> TableEntityCrud<E> {
    pub fn new(tables: Arc<TableHandleCache>, table_name: &str, partition_name: &str) -> Self {
        Self {
            tables,
            table_name: table_name.to_string(),
            partition_name: partition_name.to_string(),
            strategy: MergeStrategy::default(),
            _entity: PhantomData,
        }
    }

    pub fn from_config(tables: Arc<TableHandleCache>, config: &StorageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(tables, &config.table_name, &config.partition_name))
    }

    /// Strategy used by `update`.
    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn partition_name(&self) -> &str {
        &self.partition_name
    }

    pub async fn table(&self) -> Result<TableHandle> {
        self.tables.get_table(&self.table_name).await
    }

    pub async fn create(&self, entity: E) -> Result<E> {
        let mut entity = entity.into_entity();
        entity.meta.partition_key = self.partition_name.clone();

        let table = self.table().await?;
        let stored = table.insert_entity(entity).await?;
        E::from_entity(stored)
    }

    pub async fn read_all(&self) -> Result<Vec<E>> {
        let table = self.table().await?;
        let options = ScanOptions::new().partition(&self.partition_name);
        ContinuationScanner::scan_all(&table, options)
            .await?
            .into_iter()
            .map(E::from_entity)
            .collect()
    }

    /// `Ok(None)` when no entity has this row key.
    pub async fn read(&self, id: &str) -> Result<Option<E>> {
        let table = self.table().await?;
        table
            .retrieve_entity(&self.partition_name, id)
            .await?
            .map(E::from_entity)
            .transpose()
    }

    pub async fn update(&self, entity: E) -> Result<E> {
        self.update_with(entity, self.strategy).await
    }

    /// Merges `entity` into the stored one with `strategy` and replaces it.
    ///
    /// The replace is conditional on the incoming ETag when one is supplied,
    /// otherwise on the ETag just read.
    pub async fn update_with(&self, entity: E, strategy: MergeStrategy) -> Result<E> {
        let mut incoming = entity.into_entity();
        incoming.meta.partition_key = self.partition_name.clone();

        let table = self.table().await?;
        let existing = self.fetch_existing(&table, incoming.row_key()).await?;

        let merged = MergePolicy::new(strategy, E::merge_rules()).merge(existing, incoming);
        let if_match = merged.meta.etag.clone();
        let stored = table.replace_entity(merged, if_match.as_deref()).await?;
        E::from_entity(stored)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let table = self.table().await?;
        let existing = self.fetch_existing(&table, id).await?;
        table
            .delete_entity(&self.partition_name, id, existing.etag())
            .await
    }

    async fn fetch_existing(&self, table: &TableHandle, id: &str) -> Result<Entity> {
        table
            .retrieve_entity(&self.partition_name, id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "Entity '{}' not found in {}/{}",
                    id, self.table_name, self.partition_name
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::storage::InMemoryTableStore;

    fn crud() -> TableEntityCrud<Entity> {
        let tables = Arc::new(TableHandleCache::new(Arc::new(InMemoryTableStore::new())));
        TableEntityCrud::new(tables, "people", "Ralston")
    }

    #[tokio::test]
    async fn test_create_sets_partition_and_etag() {
        let crud = crud();
        let stored = crud
            .create(Entity::new("ignored", "evee").with_property("Age", 3))
            .await
            .unwrap();
        assert_eq!(stored.partition_key(), "Ralston");
        assert!(stored.etag().is_some());
        assert!(stored.timestamp().is_some());

        let err = crud.create(Entity::new("", "evee")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_read_absent_is_none() {
        assert!(crud().read("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let err = crud().update(Entity::new("", "ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_full_replace_drops_missing_fields() {
        let crud = crud().merge_strategy(MergeStrategy::FullReplace);
        crud.create(
            Entity::new("", "evee")
                .with_property("Age", 3)
                .with_property("Toy", "ball"),
        )
        .await
        .unwrap();

        let updated = crud
            .update(Entity::new("", "evee").with_property("Age", 4))
            .await
            .unwrap();
        assert_eq!(updated.properties.get("Age"), Some(&Value::Int32(4)));
        assert!(!updated.properties.contains("Toy"));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let crud = crud();
        crud.create(Entity::new("", "evee")).await.unwrap();
        crud.delete("evee").await.unwrap();
        assert!(crud.read("evee").await.unwrap().is_none());
        assert!(crud.delete("evee").await.unwrap_err().is_not_found());
    }
}
