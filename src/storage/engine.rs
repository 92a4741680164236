use crate::core::{Entity, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque cursor marking where the next scan page begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    next_partition_key: String,
    next_row_key: String,
}

impl ContinuationToken {
    pub(crate) fn new(next_partition_key: impl Into<String>, next_row_key: impl Into<String>) -> Self {
        Self {
            next_partition_key: next_partition_key.into(),
            next_row_key: next_row_key.into(),
        }
    }

    pub(crate) fn next_partition_key(&self) -> &str {
        &self.next_partition_key
    }

    pub(crate) fn next_row_key(&self) -> &str {
        &self.next_row_key
    }
}

/// One page of a segmented scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub entities: Vec<Entity>,
    /// `None` once the scan is exhausted.
    pub continuation: Option<ContinuationToken>,
}

/// Primitive operations of a partitioned, key-sorted table store.
///
/// Implementations enforce ETag preconditions themselves and never retry;
/// transient failures surface as `StorageUnavailable`.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create the table unless it exists. Returns `true` when it was created.
    async fn create_table_if_absent(&self, table: &str) -> Result<bool>;

    /// Delete the table and all its entities
    async fn delete_table(&self, table: &str) -> Result<()>;

    /// Check if a table exists
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Insert a new entity; fails with `DuplicateKey` when the key is taken.
    /// Returns the stored entity with its fresh ETag and Timestamp.
    async fn insert_entity(&self, table: &str, entity: Entity) -> Result<Entity>;

    /// Replace an existing entity.
    ///
    /// `if_match` of `None` or `"*"` replaces unconditionally; any other value must
    /// equal the stored ETag or the write fails with `ConcurrencyConflict`.
    async fn replace_entity(&self, table: &str, entity: Entity, if_match: Option<&str>) -> Result<Entity>;

    /// Point read; absence is `Ok(None)`.
    async fn retrieve_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<Option<Entity>>;

    /// Delete an entity under the same `if_match` rules as `replace_entity`.
    async fn delete_entity(&self, table: &str, partition_key: &str, row_key: &str, if_match: Option<&str>) -> Result<()>;

    /// Return one page of entities in ascending (PartitionKey, RowKey) order,
    /// optionally restricted to one partition.
    async fn scan_page(
        &self,
        table: &str,
        partition_key: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> Result<ScanPage>;
}
