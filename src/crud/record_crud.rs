use super::TableEntityCrud;
use crate::connection::StorageConfig;
use crate::core::{Entity, Result, StoreError};
use crate::entity::MergeStrategy;
use crate::keys::RowKeyGenerator;
use crate::record::{CodecMode, DynamicRecordCodec, Record};
use crate::storage::{TableHandle, TableHandleCache};
use std::sync::Arc;

/// Schema-less CRUD: records go through the codec and are stored as dynamic
/// entities, replaced wholesale on update.
#[derive(Clone)]
pub struct RecordCrud {
    entities: TableEntityCrud<Entity>,
    codec: DynamicRecordCodec,
}

impl RecordCrud {
    pub fn new(tables: Arc<TableHandleCache>, table_name: &str, partition_name: &str) -> Self {
        Self {
            entities: TableEntityCrud::new(tables, table_name, partition_name)
                .merge_strategy(MergeStrategy::FullReplace),
            codec: DynamicRecordCodec::default(),
        }
    }

    pub fn from_config(tables: Arc<TableHandleCache>, config: &StorageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(tables, &config.table_name, &config.partition_name)
            .codec_mode(config.codec_mode))
    }

    pub fn codec_mode(mut self, mode: CodecMode) -> Self {
        self.codec = DynamicRecordCodec::new(mode);
        self
    }

    pub async fn table(&self) -> Result<TableHandle> {
        self.entities.table().await
    }

    /// Stores a new record. Records without an `Id` get a descending
    /// time-based row key, so newer records scan first.
    pub async fn create(&self, record: Record) -> Result<Record> {
        let mut entity = self.codec.to_entity(record)?;
        if entity.meta.row_key.is_empty() {
            entity.meta.row_key = RowKeyGenerator::next_descending_key();
        }
        let stored = self.entities.create(entity).await?;
        Ok(self.codec.to_record(&stored))
    }

    pub async fn read_all(&self) -> Result<Vec<Record>> {
        let entities = self.entities.read_all().await?;
        Ok(entities.iter().map(|e| self.codec.to_record(e)).collect())
    }

    pub async fn read(&self, id: &str) -> Result<Record> {
        match self.entities.read(id).await? {
            Some(entity) => Ok(self.codec.to_record(&entity)),
            None => Err(StoreError::NotFound(format!("Record '{}' cannot be found", id))),
        }
    }

    pub async fn update(&self, record: Record) -> Result<Record> {
        let entity = self.codec.to_entity(record)?;
        let stored = self.entities.update(entity).await?;
        Ok(self.codec.to_record(&stored))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.entities.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ID_FIELD, Variant};
    use crate::storage::InMemoryTableStore;

    fn crud() -> RecordCrud {
        let tables = Arc::new(TableHandleCache::new(Arc::new(InMemoryTableStore::new())));
        RecordCrud::new(tables, "lists", "ListItems")
    }

    #[tokio::test]
    async fn test_create_generates_descending_ids() {
        let crud = crud();
        let first = crud.create(Record::new().with("Title", "a")).await.unwrap();
        let second = crud.create(Record::new().with("Title", "b")).await.unwrap();

        let first_id = first.id().unwrap();
        let second_id = second.id().unwrap();
        assert_eq!(first_id.len(), 19);
        assert!(second_id < first_id);

        let all = crud.read_all().await.unwrap();
        let titles: Vec<&Variant> = all.iter().filter_map(|r| r.get("Title")).collect();
        assert_eq!(titles, vec![&Variant::from("b"), &Variant::from("a")]);
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_id() {
        let stored = crud()
            .create(Record::new().with(ID_FIELD, "r1"))
            .await
            .unwrap();
        assert_eq!(stored.id().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_read_missing_is_error() {
        assert!(crud().read("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_lists() {
        let crud = crud().codec_mode(CodecMode::Strict);
        let record = Record::new().with("Tags", vec![Variant::from("x")]);
        assert!(matches!(
            crud.create(record).await,
            Err(StoreError::TypeMismatch(_))
        ));
    }
}
