use super::merge::{FieldRule, MergeAnnotation};
use crate::core::{Properties, Result};
use chrono::{DateTime, Utc};

pub const CREATED_UTC: &str = "CreatedUtc";
pub const UPDATED_UTC: &str = "UpdatedUtc";
pub const DELETED_UTC: &str = "DeletedUtc";
pub const UNIVERSAL_ID: &str = "UniversalId";

/// Bookkeeping fields shared by persistent entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistentFields {
    pub created_utc: Option<DateTime<Utc>>,
    pub updated_utc: Option<DateTime<Utc>>,
    pub deleted_utc: Option<DateTime<Utc>>,
    pub universal_id: Option<String>,
}

impl PersistentFields {
    pub const UPDATED_RULE: FieldRule =
        FieldRule::new(UPDATED_UTC, MergeAnnotation::new().allow_create(false));
    pub const CREATED_RULE: FieldRule =
        FieldRule::new(CREATED_UTC, MergeAnnotation::new().allow_update(false));
    pub const UNIVERSAL_ID_RULE: FieldRule =
        FieldRule::new(UNIVERSAL_ID, MergeAnnotation::new().allow_once(true));

    /// Rules for entities that embed these fields; types with more annotated
    /// fields list these alongside their own.
    pub const RULES: [FieldRule; 3] = [Self::UPDATED_RULE, Self::CREATED_RULE, Self::UNIVERSAL_ID_RULE];

    /// Fields for a record about to be created at `now`.
    pub fn created_at(now: DateTime<Utc>) -> Self {
        Self {
            created_utc: Some(now),
            updated_utc: Some(now),
            ..Self::default()
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_utc.is_some()
    }

    pub fn write_into(&self, properties: &mut Properties) {
        properties.set_optional(CREATED_UTC, self.created_utc);
        properties.set_optional(UPDATED_UTC, self.updated_utc);
        properties.set_optional(DELETED_UTC, self.deleted_utc);
        properties.set_optional(UNIVERSAL_ID, self.universal_id.clone());
    }

    pub fn read_from(properties: &Properties) -> Result<Self> {
        Ok(Self {
            created_utc: properties.get_as(CREATED_UTC)?,
            updated_utc: properties.get_as(UPDATED_UTC)?,
            deleted_utc: properties.get_as(DELETED_UTC)?,
            universal_id: properties.get_as(UNIVERSAL_ID)?,
        })
    }
}
