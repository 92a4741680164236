use super::engine::{ContinuationToken, ScanPage};
use crate::core::{Entity, Result, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use uuid::Uuid;

/// Wildcard ETag that matches any stored version.
pub const ETAG_WILDCARD: &str = "*";

/// Check a table name against the store's naming rules:
/// 3-63 ASCII alphanumerics, starting with a letter.
pub fn validate_table_name(name: &str) -> Result<()> {
    let valid_length = (3..=63).contains(&name.len());
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let alphanumeric = name.chars().all(|c| c.is_ascii_alphanumeric());

    if valid_length && starts_with_letter && alphanumeric {
        Ok(())
    } else {
        Err(StoreError::ConfigurationError(format!(
            "Invalid table name '{}': expected 3-63 alphanumeric characters starting with a letter",
            name
        )))
    }
}

fn new_etag() -> String {
    format!("W/\"{}\"", Uuid::new_v4().simple())
}

/// Entities of one table, partition by partition, each partition sorted by row key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    name: String,
    partitions: BTreeMap<String, BTreeMap<String, Entity>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }

    fn describe(&self, partition_key: &str, row_key: &str) -> String {
        format!(
            "entity '{}/{}' in table '{}'",
            partition_key, row_key, self.name
        )
    }

    fn check_precondition(&self, current: &Entity, if_match: Option<&str>) -> Result<()> {
        match if_match {
            None | Some(ETAG_WILDCARD) => Ok(()),
            Some(expected) if current.etag() == Some(expected) => Ok(()),
            Some(expected) => Err(StoreError::ConcurrencyConflict(format!(
                "{} has changed: presented ETag {} but current is {}",
                self.describe(current.partition_key(), current.row_key()),
                expected,
                current.etag().unwrap_or("<none>")
            ))),
        }
    }

    /// Stamp a fresh ETag and Timestamp and return what the store keeps.
    fn stamp(mut entity: Entity) -> Entity {
        entity.meta.etag = Some(new_etag());
        entity.meta.timestamp = Some(Utc::now());
        entity
    }

    pub fn insert(&mut self, entity: Entity) -> Result<Entity> {
        if self.get(entity.partition_key(), entity.row_key()).is_some() {
            return Err(StoreError::DuplicateKey(format!(
                "{} already exists",
                self.describe(entity.partition_key(), entity.row_key())
            )));
        }

        let stored = Self::stamp(entity);
        self.partitions
            .entry(stored.meta.partition_key.clone())
            .or_default()
            .insert(stored.meta.row_key.clone(), stored.clone());
        Ok(stored)
    }

    pub fn replace(&mut self, entity: Entity, if_match: Option<&str>) -> Result<Entity> {
        let current = self
            .get(entity.partition_key(), entity.row_key())
            .ok_or_else(|| StoreError::NotFound(self.describe(entity.partition_key(), entity.row_key())))?;
        self.check_precondition(current, if_match)?;

        let stored = Self::stamp(entity);
        self.partitions
            .entry(stored.meta.partition_key.clone())
            .or_default()
            .insert(stored.meta.row_key.clone(), stored.clone());
        Ok(stored)
    }

    pub fn get(&self, partition_key: &str, row_key: &str) -> Option<&Entity> {
        self.partitions.get(partition_key)?.get(row_key)
    }

    pub fn delete(&mut self, partition_key: &str, row_key: &str, if_match: Option<&str>) -> Result<()> {
        let current = self
            .get(partition_key, row_key)
            .ok_or_else(|| StoreError::NotFound(self.describe(partition_key, row_key)))?;
        self.check_precondition(current, if_match)?;

        if let Some(rows) = self.partitions.get_mut(partition_key) {
            rows.remove(row_key);
            if rows.is_empty() {
                self.partitions.remove(partition_key);
            }
        }
        Ok(())
    }

    /// Up to `page_size` entities in (PartitionKey, RowKey) order, starting at the
    /// continuation point.
    pub fn scan_page(
        &self,
        partition_key: Option<&str>,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> ScanPage {
        let start_partition = continuation
            .map(ContinuationToken::next_partition_key)
            .or(partition_key)
            .unwrap_or("");

        let mut entities = Vec::with_capacity(page_size.min(self.row_count()));
        let mut next = None;

        'partitions: for (pk, rows) in self
            .partitions
            .range::<str, _>((Bound::Included(start_partition), Bound::Unbounded))
        {
            if let Some(scoped) = partition_key
                && pk != scoped
            {
                break;
            }

            let start_row = match continuation {
                Some(token) if token.next_partition_key() == pk => token.next_row_key(),
                _ => "",
            };

            for (rk, entity) in rows.range::<str, _>((Bound::Included(start_row), Bound::Unbounded)) {
                if entities.len() == page_size {
                    next = Some(ContinuationToken::new(pk.clone(), rk.clone()));
                    break 'partitions;
                }
                entities.push(entity.clone());
            }
        }

        ScanPage {
            entities,
            continuation: next,
        }
    }
}
