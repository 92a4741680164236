use super::{ETAG_FIELD, ID_FIELD, Record, TIMESTAMP_FIELD, Variant};
use crate::core::{Entity, EntityMeta, Properties, Result, StoreError, Value};
use chrono::Utc;

/// How unsupported field shapes are treated on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecMode {
    /// Null, list and object fields are dropped with a warning.
    #[default]
    Lenient,
    /// Null, list and object fields fail the conversion.
    Strict,
}

/// Maps schema-less records to stored entities and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicRecordCodec {
    mode: CodecMode,
}

impl DynamicRecordCodec {
    pub fn new(mode: CodecMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// Converts a record into an entity with an empty partition key.
    ///
    /// `Id` and `ETag` are lifted into the entity's system fields and never
    /// stored as properties.
    pub fn to_entity(&self, record: Record) -> Result<Entity> {
        let mut meta = EntityMeta::default();
        let mut properties = Properties::new();

        for (name, variant) in record {
            if name == ID_FIELD {
                meta.row_key = key_field(&name, variant)?.unwrap_or_default();
            } else if name == ETAG_FIELD {
                meta.etag = key_field(&name, variant)?;
            } else if let Some(value) = self.coerce(&name, variant)? {
                properties.insert(name, value);
            }
        }

        Ok(Entity { meta, properties })
    }

    /// Converts an entity into a record led by `Id`, `Timestamp` and `ETag`.
    ///
    /// A synthesized field is skipped when a property of the same name exists.
    pub fn to_record(&self, entity: &Entity) -> Record {
        let mut record = Record::new();
        let properties = &entity.properties;

        if !properties.contains(ID_FIELD) {
            record.insert(ID_FIELD, entity.row_key());
        }
        if !properties.contains(TIMESTAMP_FIELD) {
            record.insert(TIMESTAMP_FIELD, entity.timestamp());
        }
        if !properties.contains(ETAG_FIELD) {
            record.insert(ETAG_FIELD, entity.etag());
        }

        for (name, value) in properties.iter() {
            record.insert(name, to_variant(value));
        }
        record
    }

    fn coerce(&self, name: &str, variant: Variant) -> Result<Option<Value>> {
        let value = match variant {
            Variant::Bool(b) => Value::Boolean(b),
            Variant::String(s) => Value::Text(s),
            Variant::Int(i) => Value::Int32(i32::try_from(i).map_err(|_| {
                StoreError::TypeMismatch(format!(
                    "Field '{}': integer {} does not fit in 32 bits",
                    name, i
                ))
            })?),
            Variant::Float(f) => Value::Float32(f as f32),
            Variant::Timestamp(ts) => Value::Timestamp(ts.with_timezone(&Utc)),
            unsupported @ (Variant::Null | Variant::List(_) | Variant::Object(_)) => {
                return match self.mode {
                    CodecMode::Lenient => {
                        log::warn!(
                            "dropping field '{}': {} values cannot be stored",
                            name,
                            unsupported.type_name()
                        );
                        Ok(None)
                    }
                    CodecMode::Strict => Err(StoreError::TypeMismatch(format!(
                        "Field '{}': {} values cannot be stored",
                        name,
                        unsupported.type_name()
                    ))),
                };
            }
        };
        Ok(Some(value))
    }
}

/// Reads `Id` or `ETag`: strings verbatim, integers in decimal, null as absent.
fn key_field(name: &str, variant: Variant) -> Result<Option<String>> {
    match variant {
        Variant::String(s) => Ok(Some(s)),
        Variant::Int(i) => Ok(Some(i.to_string())),
        Variant::Null => Ok(None),
        other => Err(StoreError::TypeMismatch(format!(
            "Field '{}' must be a string or integer, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn to_variant(value: &Value) -> Variant {
    match value {
        Value::Boolean(b) => Variant::Bool(*b),
        Value::Text(s) => Variant::String(s.clone()),
        Value::Int32(i) => Variant::Int(i64::from(*i)),
        Value::Float32(f) => Variant::Float(f64::from(*f)),
        Value::Timestamp(ts) => Variant::from(*ts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn erik() -> Record {
        Record::new()
            .with("Name", "Erik")
            .with("Age", 32i64)
            .with("Score", 1.5f64)
            .with("Active", true)
    }

    #[test]
    fn test_to_entity_extracts_reserved_fields() {
        let record = erik().with(ID_FIELD, 7i64).with(ETAG_FIELD, "W/\"1\"");
        let entity = DynamicRecordCodec::default().to_entity(record).unwrap();

        assert_eq!(entity.row_key(), "7");
        assert_eq!(entity.etag(), Some("W/\"1\""));
        assert!(!entity.properties.contains(ID_FIELD));
        assert!(!entity.properties.contains(ETAG_FIELD));
        assert_eq!(entity.properties.get("Age"), Some(&Value::Int32(32)));
        assert_eq!(entity.properties.get("Score"), Some(&Value::Float32(1.5)));
    }

    #[test]
    fn test_timestamp_normalized_to_utc() {
        let ts = DateTime::parse_from_rfc3339("2017-05-01T12:00:00+02:00").unwrap();
        let entity = DynamicRecordCodec::default()
            .to_entity(Record::new().with("When", ts))
            .unwrap();
        assert_eq!(
            entity.properties.get("When"),
            Some(&Value::Timestamp(Utc.with_ymd_and_hms(2017, 5, 1, 10, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_lenient_drops_unsupported() {
        let record = erik()
            .with("Tags", vec![Variant::from("a")])
            .with("Nothing", Variant::Null);
        let entity = DynamicRecordCodec::new(CodecMode::Lenient).to_entity(record).unwrap();
        assert_eq!(entity.properties.len(), 4);
        assert!(!entity.properties.contains("Tags"));
    }

    #[test]
    fn test_strict_rejects_unsupported() {
        assert_eq!(DynamicRecordCodec::new(CodecMode::Strict).mode(), CodecMode::Strict);
        let record = erik().with("Nested", Record::new().with("a", 1i64));
        let err = DynamicRecordCodec::new(CodecMode::Strict).to_entity(record).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch(_)));
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let record = Record::new().with("Big", i64::from(i32::MAX) + 1);
        assert!(DynamicRecordCodec::default().to_entity(record).is_err());
    }

    #[test]
    fn test_to_record_field_order() {
        let mut entity = Entity::new("p", "r1")
            .with_property("Name", "Erik")
            .with_property("Age", 32);
        entity.meta.etag = Some("e1".into());

        let record = DynamicRecordCodec::default().to_record(&entity);
        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["Id", "Timestamp", "ETag", "Name", "Age"]);
        assert_eq!(record.get("Timestamp"), Some(&Variant::Null));
        assert_eq!(record.etag(), Some("e1"));
    }

    #[test]
    fn test_to_record_keeps_colliding_property() {
        let entity = Entity::new("p", "r1").with_property("Id", "custom");
        let record = DynamicRecordCodec::default().to_record(&entity);
        assert_eq!(record.id().as_deref(), Some("custom"));
        assert_eq!(record.names().filter(|n| *n == "Id").count(), 1);
    }

    #[test]
    fn test_caller_timestamp_round_trips() {
        let codec = DynamicRecordCodec::default();
        let at = Utc.with_ymd_and_hms(2017, 5, 1, 10, 0, 0).unwrap();
        let record = Record::new()
            .with(ID_FIELD, "r1")
            .with(TIMESTAMP_FIELD, at)
            .with("Name", "Erik");

        let entity = codec.to_entity(record).unwrap();
        assert_eq!(entity.properties.get(TIMESTAMP_FIELD), Some(&Value::Timestamp(at)));

        let back = codec.to_record(&entity);
        assert_eq!(back.get(TIMESTAMP_FIELD), Some(&Variant::from(at)));
        assert_eq!(back.id().as_deref(), Some("r1"));
        assert_eq!(back.names().filter(|n| *n == TIMESTAMP_FIELD).count(), 1);
    }

    #[test]
    fn test_round_trip() {
        let codec = DynamicRecordCodec::default();
        assert_eq!(codec.mode(), CodecMode::Lenient);

        let offset = DateTime::parse_from_rfc3339("2017-05-01T12:00:00+02:00").unwrap();
        let records = vec![
            erik().with(ID_FIELD, "r1"),
            Record::new().with(ID_FIELD, "r2").with("Flag", false),
            Record::new().with(ID_FIELD, "r3").with("Empty", "").with("Zero", 0i64),
            Record::new()
                .with(ID_FIELD, "r4")
                .with("Min", i64::from(i32::MIN))
                .with("Max", i64::from(i32::MAX))
                .with("Ratio", -2.25f64),
            Record::new().with(ID_FIELD, "r5").with("When", offset),
            Record::new()
                .with(ID_FIELD, "r6")
                .with(ETAG_FIELD, "W/\"7\"")
                .with(TIMESTAMP_FIELD, offset)
                .with("Name", "Erik"),
        ];

        for record in records {
            let mut entity = codec.to_entity(record.clone()).unwrap();
            entity.meta.partition_key = "p".into();

            let back = codec.to_record(&entity);
            for (name, value) in record.iter() {
                assert_eq!(back.get(name), Some(value), "field {} of {:?}", name, record.id());
            }
        }
    }
}
