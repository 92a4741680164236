use crate::core::{Entity, EntityMeta, Properties, Value};

/// Per-field merge annotation of a typed entity.
///
/// The default allows everything: the incoming value always overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeAnnotation {
    /// `false`: the field only matters at creation; updates keep the existing value.
    pub allow_create: bool,
    /// `false`: the field is immutable after creation.
    pub allow_update: bool,
    /// `true`: the field may leave its default value once, then is frozen.
    pub allow_once: bool,
}

impl MergeAnnotation {
    pub const fn new() -> Self {
        Self {
            allow_create: true,
            allow_update: true,
            allow_once: false,
        }
    }

    pub const fn allow_create(mut self, allow: bool) -> Self {
        self.allow_create = allow;
        self
    }

    pub const fn allow_update(mut self, allow: bool) -> Self {
        self.allow_update = allow;
        self
    }

    pub const fn allow_once(mut self, allow: bool) -> Self {
        self.allow_once = allow;
        self
    }

    /// Decide which side wins for a field whose stored value is `existing`.
    /// An absent value counts as the default.
    pub fn resolve(&self, existing: Option<&Value>) -> FieldSource {
        if !self.allow_create || !self.allow_update {
            return FieldSource::Existing;
        }
        if self.allow_once {
            return match existing {
                Some(value) if !value.is_default() => FieldSource::Existing,
                _ => FieldSource::Incoming,
            };
        }
        FieldSource::Incoming
    }
}

impl Default for MergeAnnotation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Existing,
    Incoming,
}

/// A declared `(field, annotation)` pair, registered statically per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub annotation: MergeAnnotation,
}

impl FieldRule {
    pub const fn new(field: &'static str, annotation: MergeAnnotation) -> Self {
        Self { field, annotation }
    }
}

/// How an update combines the stored entity with the caller's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Apply the entity type's field rules property by property.
    #[default]
    FieldMerge,
    /// Take the caller's property set verbatim. Used for dynamic entities.
    FullReplace,
}

/// Field-level rules governing what an update may change.
#[derive(Debug, Clone, Copy)]
pub struct MergePolicy<'a> {
    strategy: MergeStrategy,
    rules: &'a [FieldRule],
}

impl<'a> MergePolicy<'a> {
    pub fn new(strategy: MergeStrategy, rules: &'a [FieldRule]) -> Self {
        Self { strategy, rules }
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Combine the stored entity with the caller's.
    ///
    /// PartitionKey, RowKey and Timestamp always come from `existing`; the ETag
    /// comes from `incoming` when the caller supplied one so the write stays
    /// conditional on the version the caller saw.
    pub fn merge(&self, existing: Entity, incoming: Entity) -> Entity {
        let properties = match self.strategy {
            MergeStrategy::FullReplace => incoming.properties,
            MergeStrategy::FieldMerge => {
                merge_properties(&existing.properties, incoming.properties, self.rules)
            }
        };

        Entity {
            meta: EntityMeta {
                partition_key: existing.meta.partition_key,
                row_key: existing.meta.row_key,
                etag: incoming.meta.etag.or(existing.meta.etag),
                timestamp: existing.meta.timestamp,
            },
            properties,
        }
    }
}

fn merge_properties(existing: &Properties, incoming: Properties, rules: &[FieldRule]) -> Properties {
    let mut merged = incoming;
    for rule in rules {
        let current = existing.get(rule.field);
        if rule.annotation.resolve(current) == FieldSource::Existing {
            merged.set_optional(rule.field, current.cloned());
        }
    }
    merged
}
