//! Snapshot persistence for the development table store

use super::table::Table;
use crate::core::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Store Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub tables: HashMap<String, Table>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub entity_count: usize,
    pub table_count: usize,
}

impl StoreSnapshot {
    pub fn new(tables: HashMap<String, Table>) -> Self {
        let entity_count = tables.values().map(Table::row_count).sum();
        let table_count = tables.len();

        Self {
            version: SNAPSHOT_VERSION,
            tables,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                entity_count,
                table_count,
            },
        }
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Write the snapshot to a temp file beside the target, then rename it into place.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let serialized = rmp_serde::to_vec(snapshot)?;
        let temp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            writer.write_all(&serialized)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data)?;
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    pub fn delete(&self) -> Result<()> {
        if self.snapshot_path.exists() {
            fs::remove_file(&self.snapshot_path)?;
        }
        Ok(())
    }
}
