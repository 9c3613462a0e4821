use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CodecError, Result};
use crate::schema::{Endianness, FieldDescriptor, PacketSchema, PrimitiveKind};
use crate::value::{FieldValue, FieldValues};

/// Serialized form of a [`PacketSchema`].
///
/// ```json
/// {
///   "name": "HeartRate",
///   "fields": [
///     { "name": "flags", "kind": "u8",  "start": 0, "end": 0 },
///     { "name": "bpm",   "kind": "u16", "start": 1, "end": 2, "endianness": "big" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub name: String,
    pub fields: Vec<FieldDocument>,
}

/// One field entry of a [`SchemaDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    pub name: String,
    pub kind: PrimitiveKind,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub endianness: Endianness,
}

impl PacketSchema {
    /// Parse a schema from its JSON document form.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let fields = document
            .fields
            .into_iter()
            .map(|field| {
                FieldDescriptor::new(
                    field.name,
                    field.kind,
                    field.start..=field.end,
                    field.endianness,
                )
            })
            .collect();
        PacketSchema::new(document.name, fields)
    }

    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            name: self.name().to_string(),
            fields: self
                .fields()
                .iter()
                .map(|field| FieldDocument {
                    name: field.name().to_string(),
                    kind: field.kind(),
                    start: field.start(),
                    end: field.end(),
                    endianness: field.endianness(),
                })
                .collect(),
        }
    }
}

impl FieldValues {
    /// Build values from a JSON object, coercing each entry to the kind its
    /// field declares in `schema`.
    ///
    /// Numbers must fit the declared integer width; uuid fields take the
    /// hyphenated string form. Unknown field names are rejected.
    pub fn from_json(json: &Value, schema: &PacketSchema) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| CodecError::InvalidValue {
            field: String::new(),
            message: "expected a JSON object of field values".to_string(),
        })?;

        let mut values = FieldValues::new();
        for (name, raw) in object {
            let field = schema.field(name).ok_or_else(|| CodecError::InvalidValue {
                field: name.clone(),
                message: format!("no such field in schema {}", schema.name()),
            })?;
            values.insert(name.clone(), coerce(field, raw)?);
        }
        Ok(values)
    }
}

fn coerce(field: &FieldDescriptor, raw: &Value) -> Result<FieldValue> {
    let invalid = |message: String| CodecError::InvalidValue {
        field: field.name().to_string(),
        message,
    };

    let value = match field.kind() {
        PrimitiveKind::U8 => raw
            .as_i64()
            .and_then(|n| u8::try_from(n).ok())
            .map(FieldValue::U8),
        PrimitiveKind::U16 => raw
            .as_i64()
            .and_then(|n| u16::try_from(n).ok())
            .map(FieldValue::U16),
        PrimitiveKind::I16 => raw
            .as_i64()
            .and_then(|n| i16::try_from(n).ok())
            .map(FieldValue::I16),
        PrimitiveKind::U32 => raw
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .map(FieldValue::U32),
        PrimitiveKind::String => raw.as_str().map(|s| FieldValue::Str(s.to_string())),
        PrimitiveKind::Uuid => {
            let text = raw
                .as_str()
                .ok_or_else(|| invalid("expected a uuid string".to_string()))?;
            let id = Uuid::parse_str(text).map_err(|err| invalid(err.to_string()))?;
            Some(FieldValue::Uuid(id))
        }
        PrimitiveKind::Float | PrimitiveKind::Int => {
            return Err(invalid(format!("kind {} is not supported", field.kind())));
        }
    };
    value.ok_or_else(|| invalid(format!("{raw} is not a valid {}", field.kind())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEART_RATE: &str = r#"{
        "name": "HeartRate",
        "fields": [
            { "name": "bpm", "kind": "u16", "start": 1, "end": 2, "endianness": "big" },
            { "name": "flags", "kind": "u8", "start": 0, "end": 0 },
            { "name": "sensor", "kind": "uuid", "start": 3, "end": 18, "endianness": "big" }
        ]
    }"#;

    #[test]
    fn parses_schema_document() {
        let schema = PacketSchema::from_json(HEART_RATE).unwrap();
        assert_eq!(schema.name(), "HeartRate");
        assert_eq!(schema.fields()[0].name(), "flags");
        assert_eq!(schema.fields()[0].endianness(), Endianness::Little);
        assert_eq!(schema.field("bpm").unwrap().endianness(), Endianness::Big);
        assert_eq!(
            schema.field("sensor").unwrap().endianness(),
            Endianness::Little
        );
    }

    #[test]
    fn document_round_trips_through_schema() {
        let schema = PacketSchema::from_json(HEART_RATE).unwrap();
        let again = PacketSchema::from_document(schema.to_document()).unwrap();
        assert_eq!(schema, again);
    }

    #[test]
    fn rejects_unknown_kind_and_duplicate_names() {
        let bad_kind = r#"{"name":"x","fields":[{"name":"a","kind":"u64","start":0,"end":7}]}"#;
        assert!(matches!(
            PacketSchema::from_json(bad_kind),
            Err(CodecError::InvalidDocument(_))
        ));

        let dup = r#"{"name":"x","fields":[
            {"name":"a","kind":"u8","start":0,"end":0},
            {"name":"a","kind":"u8","start":1,"end":1}]}"#;
        assert!(matches!(
            PacketSchema::from_json(dup),
            Err(CodecError::DuplicateField { .. })
        ));
    }

    #[test]
    fn rejects_ranges_past_packet_limit() {
        let max_end = r#"{"name":"x","fields":[
            {"name":"a","kind":"u8","start":0,"end":0},
            {"name":"b","kind":"string","start":1,"end":18446744073709551615}]}"#;
        assert!(matches!(
            PacketSchema::from_json(max_end),
            Err(CodecError::InvalidRange { ref field, .. }) if field == "b"
        ));

        let huge_end = r#"{"name":"x","fields":[
            {"name":"a","kind":"u8","start":0,"end":1000000000000000}]}"#;
        assert!(matches!(
            PacketSchema::from_json(huge_end),
            Err(CodecError::InvalidRange { end: 1_000_000_000_000_000, .. })
        ));
    }

    #[test]
    fn coerces_values_per_declared_kind() {
        let schema = PacketSchema::from_json(HEART_RATE).unwrap();
        let json = serde_json::json!({
            "flags": 1,
            "bpm": 72,
            "sensor": "0000180d-0000-1000-8000-00805f9b34fb"
        });

        let values = FieldValues::from_json(&json, &schema).unwrap();
        assert_eq!(values.get("flags"), Some(&FieldValue::U8(1)));
        assert_eq!(values.get("bpm"), Some(&FieldValue::U16(72)));
        assert!(values.get("sensor").and_then(|v| v.as_uuid()).is_some());
    }

    #[test]
    fn rejects_out_of_range_and_unknown_values() {
        let schema = PacketSchema::from_json(HEART_RATE).unwrap();

        let err = FieldValues::from_json(&serde_json::json!({ "flags": 300 }), &schema);
        assert!(matches!(err, Err(CodecError::InvalidValue { ref field, .. }) if field == "flags"));

        let err = FieldValues::from_json(&serde_json::json!({ "nope": 1 }), &schema);
        assert!(matches!(err, Err(CodecError::InvalidValue { ref field, .. }) if field == "nope"));

        let err = FieldValues::from_json(&serde_json::json!([1, 2]), &schema);
        assert!(matches!(err, Err(CodecError::InvalidValue { .. })));
    }
}
