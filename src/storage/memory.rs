use super::engine::{ContinuationToken, ScanPage, TableStore};
use super::persistence::{SnapshotManager, StoreSnapshot};
use super::table::Table;
use crate::connection::DEFAULT_PAGE_SIZE;
use crate::core::{Entity, Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Development table store held in process memory.
///
/// Each table sits behind its own lock; the name map is only locked briefly to
/// resolve or register a table. Optionally checkpoints to a snapshot file.
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
    page_size: usize,
    available: AtomicBool,
    snapshots: Option<SnapshotManager>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Scans return at most `page_size` entities per page (minimum 1).
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
            available: AtomicBool::new(true),
            snapshots: None,
        }
    }

    /// Open a store backed by a snapshot file, restoring its tables if the file exists.
    pub fn open<P: AsRef<Path>>(snapshot_path: P, page_size: usize) -> Result<Self> {
        let manager = SnapshotManager::new(snapshot_path);
        let mut tables = HashMap::new();

        if let Some(snapshot) = manager.load()? {
            tracing::info!(
                tables = snapshot.metadata.table_count,
                entities = snapshot.metadata.entity_count,
                "restored development table store from snapshot"
            );
            for (name, table) in snapshot.tables {
                tables.insert(name, Arc::new(RwLock::new(table)));
            }
        }

        Ok(Self {
            tables: RwLock::new(tables),
            page_size: page_size.max(1),
            available: AtomicBool::new(true),
            snapshots: Some(manager),
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Simulate the service going away (or coming back). While unavailable every
    /// operation fails with `StorageUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::StorageUnavailable(
                "development table store is offline".to_string(),
            ))
        }
    }

    async fn get_table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.ensure_available()?;
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Table '{}' not found", name)))
    }

    /// Copy of every table, for snapshots.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let mut tables = HashMap::new();
        for (name, handle) in self.tables.read().await.iter() {
            tables.insert(name.clone(), handle.read().await.clone());
        }
        StoreSnapshot::new(tables)
    }

    /// Write the current state to the snapshot file, if the store has one.
    pub async fn checkpoint(&self) -> Result<()> {
        let Some(manager) = &self.snapshots else {
            return Ok(());
        };
        let snapshot = self.snapshot().await;
        manager.save(&snapshot)?;
        tracing::debug!(
            tables = snapshot.metadata.table_count,
            entities = snapshot.metadata.entity_count,
            "checkpointed development table store"
        );
        Ok(())
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.row_count())
    }
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn create_table_if_absent(&self, table: &str) -> Result<bool> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Ok(false);
        }
        tables.insert(table.to_string(), Arc::new(RwLock::new(Table::new(table))));
        Ok(true)
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        self.ensure_available()?;
        if self.tables.write().await.remove(table).is_none() {
            return Err(StoreError::NotFound(format!("Table '{}' not found", table)));
        }
        Ok(())
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.tables.read().await.contains_key(table))
    }

    async fn insert_entity(&self, table: &str, entity: Entity) -> Result<Entity> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.insert(entity)
    }

    async fn replace_entity(&self, table: &str, entity: Entity, if_match: Option<&str>) -> Result<Entity> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.replace(entity, if_match)
    }

    async fn retrieve_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<Option<Entity>> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.get(partition_key, row_key).cloned())
    }

    async fn delete_entity(&self, table: &str, partition_key: &str, row_key: &str, if_match: Option<&str>) -> Result<()> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.delete(partition_key, row_key, if_match)
    }

    async fn scan_page(
        &self,
        table: &str,
        partition_key: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> Result<ScanPage> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.scan_page(partition_key, continuation, self.page_size))
    }
}
