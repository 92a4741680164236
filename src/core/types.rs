use super::{FromValue, Result, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Insertion-ordered map keyed by field name.
///
/// Records carry a handful of fields, so lookups scan linearly the same way a
/// `Schema` resolves its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

/// Property set of a stored entity.
pub type Properties = OrderedMap<Value>;

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == name)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Sets a field, keeping its original position when it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<V>) -> Option<V> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Sets the field when `value` is `Some`, removes it otherwise.
    pub fn set_optional<T: Into<V>>(&mut self, name: &str, value: Option<T>) {
        match value {
            Some(v) => {
                self.insert(name, v);
            }
            None => {
                self.remove(name);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl OrderedMap<Value> {
    /// Typed lookup; `Ok(None)` when the property is absent.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<Option<T>> {
        self.get(name)
            .map(|value| T::try_from_value(name, value))
            .transpose()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, T: Into<V>, V> FromIterator<(K, T)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// System fields every stored entity carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub partition_key: String,
    pub row_key: String,
    /// Opaque version token assigned by the store on every write.
    pub etag: Option<String>,
    /// Set by the store, never by the client.
    pub timestamp: Option<DateTime<Utc>>,
}

impl EntityMeta {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            etag: None,
            timestamp: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.partition_key, self.row_key)
    }
}

/// Dynamic entity: system fields plus an untyped property set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub meta: EntityMeta,
    pub properties: Properties,
}

impl Entity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(partition_key, row_key),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name, value);
        self
    }

    pub fn partition_key(&self) -> &str {
        &self.meta.partition_key
    }

    pub fn row_key(&self) -> &str {
        &self.meta.row_key
    }

    pub fn etag(&self) -> Option<&str> {
        self.meta.etag.as_deref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.meta.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut props = Properties::new();
        props.insert("Name", "Erik");
        props.insert("Age", 32);
        props.insert("Name", "Jon");

        let names: Vec<&str> = props.names().collect();
        assert_eq!(names, vec!["Name", "Age"]);
        assert_eq!(props.get("Name"), Some(&Value::Text("Jon".into())));
    }

    #[test]
    fn test_get_as_typed() {
        let props: Properties = vec![("Age", Value::Int32(32))].into_iter().collect();
        assert_eq!(props.get_as::<i32>("Age").unwrap(), Some(32));
        assert_eq!(props.get_as::<i32>("Missing").unwrap(), None);
        assert!(props.get_as::<String>("Age").is_err());
    }

    #[test]
    fn test_set_optional_removes() {
        let mut props = Properties::new();
        props.set_optional("DeletedUtc", Some(true));
        assert!(props.contains("DeletedUtc"));
        props.set_optional::<bool>("DeletedUtc", None);
        assert!(!props.contains("DeletedUtc"));
    }

    #[test]
    fn test_meta_key_and_etag() {
        let meta = EntityMeta::new("Ralston", "Evee").with_etag("W/\"1\"");
        assert_eq!(meta.key(), "Ralston/Evee");
        assert_eq!(meta.etag.as_deref(), Some("W/\"1\""));
        assert_eq!(meta.timestamp, None);
    }
}
