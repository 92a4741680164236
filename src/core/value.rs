use crate::core::{Result, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed entity property as the table store keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Text(String),
    Int32(i32),
    Float32(f32),
    Timestamp(DateTime<Utc>),
}

/// The zero timestamp, 0001-01-01T00:00:00Z.
pub fn default_timestamp() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "BOOLEAN",
            Self::Text(_) => "TEXT",
            Self::Int32(_) => "INT32",
            Self::Float32(_) => "FLOAT32",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }

    /// True for the default/empty value of each kind.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Boolean(b) => !*b,
            Self::Text(s) => s.is_empty(),
            Self::Int32(i) => *i == 0,
            Self::Float32(f) => *f == 0.0,
            Self::Timestamp(t) => *t == default_timestamp(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float32(f) => Some(*f),
            Self::Int32(i) => Some(*i as f32),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
            Self::Int32(i) => write!(f, "{}", i),
            Self::Float32(fl) => write!(f, "{}", fl),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int32(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float32(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

/// Extraction of a Rust field type from a stored property.
///
/// Typed entities use this when rebuilding themselves from `Properties`.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;

    fn expected_type() -> &'static str;

    fn try_from_value(name: &str, value: &Value) -> Result<Self> {
        Self::from_value(value).ok_or_else(|| {
            StoreError::TypeMismatch(format!(
                "Property '{}' expects type {}, got {}",
                name,
                Self::expected_type(),
                value.type_name()
            ))
        })
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn expected_type() -> &'static str {
        "BOOLEAN"
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn expected_type() -> &'static str {
        "TEXT"
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i32()
    }

    fn expected_type() -> &'static str {
        "INT32"
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f32()
    }

    fn expected_type() -> &'static str {
        "FLOAT32"
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_timestamp()
    }

    fn expected_type() -> &'static str {
        "TIMESTAMP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_values() {
        assert!(Value::Boolean(false).is_default());
        assert!(Value::Text(String::new()).is_default());
        assert!(Value::Int32(0).is_default());
        assert!(Value::Float32(0.0).is_default());
        assert!(Value::Timestamp(default_timestamp()).is_default());

        assert!(!Value::Text("A".into()).is_default());
        assert!(!Value::Int32(7).is_default());
        assert!(!Value::Timestamp(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()).is_default());
    }

    #[test]
    fn test_from_value_mismatch() {
        let err = i32::try_from_value("Age", &Value::Text("old".into())).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch(_)));
        assert_eq!(i32::try_from_value("Age", &Value::Int32(32)).unwrap(), 32);
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(f32::from_value(&Value::Int32(3)), Some(3.0));
    }
}
