//! Schema-less records and their mapping onto stored entities.

pub mod codec;
pub mod json;

pub use codec::{CodecMode, DynamicRecordCodec};

use crate::core::OrderedMap;
use chrono::{DateTime, FixedOffset, Utc};

/// Reserved field carrying the row key.
pub const ID_FIELD: &str = "Id";
/// Reserved field carrying the concurrency token.
pub const ETAG_FIELD: &str = "ETag";
/// Field synthesized on read from the store-assigned timestamp.
pub const TIMESTAMP_FIELD: &str = "Timestamp";

/// Caller-facing field value of a schema-less record.
///
/// `Null`, `List` and `Object` have no stored counterpart; the codec drops or
/// rejects them depending on its mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Null,
    Bool(bool),
    String(String),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<Variant>),
    Object(Record),
}

/// Ordered named-field record.
pub type Record = OrderedMap<Variant>;

impl Variant {
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Null => "null",
            Variant::Bool(_) => "bool",
            Variant::String(_) => "string",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::Timestamp(_) => "timestamp",
            Variant::List(_) => "list",
            Variant::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(b: bool) -> Self {
        Variant::Bool(b)
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::String(s)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::String(s.to_string())
    }
}

impl From<i64> for Variant {
    fn from(i: i64) -> Self {
        Variant::Int(i)
    }
}

impl From<i32> for Variant {
    fn from(i: i32) -> Self {
        Variant::Int(i64::from(i))
    }
}

impl From<f64> for Variant {
    fn from(f: f64) -> Self {
        Variant::Float(f)
    }
}

impl From<DateTime<FixedOffset>> for Variant {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Variant::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for Variant {
    fn from(ts: DateTime<Utc>) -> Self {
        Variant::Timestamp(ts.into())
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(items: Vec<Variant>) -> Self {
        Variant::List(items)
    }
}

impl From<Record> for Variant {
    fn from(record: Record) -> Self {
        Variant::Object(record)
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(value: Option<T>) -> Self {
        value.map_or(Variant::Null, Into::into)
    }
}

impl OrderedMap<Variant> {
    /// Row key as rendered by the codec, if the record carries one.
    pub fn id(&self) -> Option<String> {
        match self.get(ID_FIELD)? {
            Variant::String(s) => Some(s.clone()),
            Variant::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub fn etag(&self) -> Option<&str> {
        self.get(ETAG_FIELD).and_then(Variant::as_str)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.insert(name, value);
        self
    }
}
