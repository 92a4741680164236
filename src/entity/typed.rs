use super::merge::FieldRule;
use crate::core::{Entity, EntityMeta, Properties, Result};

/// A record type stored in a table.
///
/// Implementors keep an `EntityMeta` for the system fields, convert their own
/// fields to and from `Properties`, and declare merge rules statically.
///
/// # Examples
///
/// ```
/// use tablecrud::{EntityMeta, Properties, Result, TableEntity};
///
/// #[derive(Debug, Clone, Default)]
/// struct Person {
///     meta: EntityMeta,
///     name: Option<String>,
/// }
///
/// impl TableEntity for Person {
///     fn meta(&self) -> &EntityMeta { &self.meta }
///     fn meta_mut(&mut self) -> &mut EntityMeta { &mut self.meta }
///
///     fn to_properties(&self) -> Properties {
///         let mut properties = Properties::new();
///         properties.set_optional("Name", self.name.clone());
///         properties
///     }
///
///     fn from_properties(meta: EntityMeta, properties: Properties) -> Result<Self> {
///         Ok(Self { meta, name: properties.get_as("Name")? })
///     }
/// }
/// ```
pub trait TableEntity: Sized + Send + Sync + 'static {
    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Merge annotations of this type's fields. Unlisted fields overwrite.
    fn merge_rules() -> &'static [FieldRule] {
        &[]
    }

    fn to_properties(&self) -> Properties;

    fn from_properties(meta: EntityMeta, properties: Properties) -> Result<Self>;

    fn to_entity(&self) -> Entity {
        Entity {
            meta: self.meta().clone(),
            properties: self.to_properties(),
        }
    }

    fn from_entity(entity: Entity) -> Result<Self> {
        Self::from_properties(entity.meta, entity.properties)
    }

    fn into_entity(self) -> Entity {
        self.to_entity()
    }

    fn row_key(&self) -> &str {
        &self.meta().row_key
    }

    fn etag(&self) -> Option<&str> {
        self.meta().etag.as_deref()
    }
}

impl TableEntity for Entity {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn to_properties(&self) -> Properties {
        self.properties.clone()
    }

    fn from_properties(meta: EntityMeta, properties: Properties) -> Result<Self> {
        Ok(Self { meta, properties })
    }

    fn into_entity(self) -> Entity {
        self
    }
}
