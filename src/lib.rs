// ============================================================================
// tablecrud Library
// ============================================================================

pub mod blob;
pub mod connection;
pub mod core;
pub mod crud;
pub mod entity;
pub mod keys;
pub mod record;
pub mod scan;
pub mod storage;

// Re-export main types for convenience
pub use core::{Entity, EntityMeta, Properties, Result, StoreError, Value};
pub use entity::{FieldRule, MergeAnnotation, MergeStrategy, PersistentFields, TableEntity};
pub use record::{CodecMode, DynamicRecordCodec, Record, Variant};
pub use scan::{CancellationToken, ContinuationScanner, ScanOptions};
pub use keys::RowKeyGenerator;

// Re-export storage and connection API
pub use connection::{StorageAccount, StorageConfig};
pub use crud::{RecordCrud, TableEntityCrud};
pub use storage::{InMemoryTableStore, TableHandle, TableHandleCache, TableStore};

use std::sync::Arc;

// ============================================================================
// High-level Client API
// ============================================================================

/// Entry point owning the table handle cache shared by every façade.
///
/// # Examples
///
/// ```
/// use tablecrud::{Record, Storage, StorageConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tablecrud::Result<()> {
/// let config = StorageConfig::new("lists", "ListItems");
/// let storage = Storage::in_memory(&config)?;
///
/// let lists = storage.records_for(&config)?;
/// let created = lists.create(Record::new().with("Title", "Groceries")).await?;
/// assert_eq!(lists.read_all().await?.len(), 1);
/// assert!(created.id().is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Storage {
    tables: Arc<TableHandleCache>,
}

impl Storage {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            tables: Arc::new(TableHandleCache::new(store)),
        }
    }

    /// Development storage held in process memory.
    pub fn in_memory(config: &StorageConfig) -> Result<Self> {
        config.validate()?;
        let store = InMemoryTableStore::with_page_size(config.page_size);
        Ok(Self::new(Arc::new(store)))
    }

    pub fn tables(&self) -> &Arc<TableHandleCache> {
        &self.tables
    }

    pub fn entities<E: TableEntity>(&self, table_name: &str, partition_name: &str) -> TableEntityCrud<E> {
        TableEntityCrud::new(Arc::clone(&self.tables), table_name, partition_name)
    }

    pub fn entities_for<E: TableEntity>(&self, config: &StorageConfig) -> Result<TableEntityCrud<E>> {
        TableEntityCrud::from_config(Arc::clone(&self.tables), config)
    }

    pub fn records(&self, table_name: &str, partition_name: &str) -> RecordCrud {
        RecordCrud::new(Arc::clone(&self.tables), table_name, partition_name)
    }

    pub fn records_for(&self, config: &StorageConfig) -> Result<RecordCrud> {
        RecordCrud::from_config(Arc::clone(&self.tables), config)
    }

    pub async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.tables.delete_table(table_name).await
    }
}
