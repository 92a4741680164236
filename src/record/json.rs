use super::{Record, Variant};
use crate::core::{Result, StoreError};
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Number, Value as JsonValue};

impl Record {
    /// Builds a record from a JSON object, keeping field order.
    ///
    /// Strings that parse as RFC 3339 become timestamps.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match json {
            JsonValue::Object(map) => object_to_record(map),
            other => Err(StoreError::TypeMismatch(format!(
                "Expected a JSON object, got {}",
                json_type_name(other)
            ))),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .iter()
            .map(|(name, variant)| (name.to_string(), variant_to_json(variant)))
            .collect();
        JsonValue::Object(map)
    }
}

fn object_to_record(map: &Map<String, JsonValue>) -> Result<Record> {
    map.iter()
        .map(|(name, value)| {
            let variant = json_to_variant(name, value)?;
            Ok::<_, StoreError>((name.as_str(), variant))
        })
        .collect()
}

fn json_to_variant(name: &str, json: &JsonValue) -> Result<Variant> {
    let variant = match json {
        JsonValue::Null => Variant::Null,
        JsonValue::Bool(b) => Variant::Bool(*b),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Variant::Int(i),
            (None, Some(u)) => {
                return Err(StoreError::TypeMismatch(format!(
                    "Field '{}': integer {} does not fit in 64 bits",
                    name, u
                )));
            }
            (None, None) => Variant::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Variant::Timestamp(ts),
            Err(_) => Variant::String(s.clone()),
        },
        JsonValue::Array(items) => Variant::List(
            items
                .iter()
                .map(|item| json_to_variant(name, item))
                .collect::<Result<_>>()?,
        ),
        JsonValue::Object(map) => Variant::Object(object_to_record(map)?),
    };
    Ok(variant)
}

fn variant_to_json(variant: &Variant) -> JsonValue {
    match variant {
        Variant::Null => JsonValue::Null,
        Variant::Bool(b) => JsonValue::Bool(*b),
        Variant::String(s) => JsonValue::String(s.clone()),
        Variant::Int(i) => JsonValue::Number((*i).into()),
        // Non-finite floats have no JSON form
        Variant::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Variant::Timestamp(ts) => {
            JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        Variant::List(items) => JsonValue::Array(items.iter().map(variant_to_json).collect()),
        Variant::Object(record) => record.to_json(),
    }
}

fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
