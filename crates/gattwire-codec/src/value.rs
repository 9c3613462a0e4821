use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{PacketSchema, PrimitiveKind};

/// A single decoded or to-be-encoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    I16(i16),
    U32(u32),
    Str(String),
    Uuid(Uuid),
}

impl FieldValue {
    /// The primitive kind this value encodes as.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            FieldValue::U8(_) => PrimitiveKind::U8,
            FieldValue::U16(_) => PrimitiveKind::U16,
            FieldValue::I16(_) => PrimitiveKind::I16,
            FieldValue::U32(_) => PrimitiveKind::U32,
            FieldValue::Str(_) => PrimitiveKind::String,
            FieldValue::Uuid(_) => PrimitiveKind::Uuid,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            FieldValue::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            FieldValue::I16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U8(v) => write!(f, "{v}"),
            FieldValue::U16(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::Str(v) => f.write_str(v),
            FieldValue::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        FieldValue::U8(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        FieldValue::U16(value)
    }
}

impl From<i16> for FieldValue {
    fn from(value: i16) -> Self {
        FieldValue::I16(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::U32(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

/// Field values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert `value`, returning the value previously stored under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Insert `value` only if it is present.
    pub fn insert_opt<V: Into<FieldValue>>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate values in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, FieldValue)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The result of applying a schema to a byte buffer.
///
/// Only fields that had enough bytes are present. Fields declared with an
/// unsupported kind are listed in [`DecodedValue::unsupported`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedValue {
    schema: Arc<PacketSchema>,
    raw: Bytes,
    values: FieldValues,
    unsupported: Vec<String>,
}

impl DecodedValue {
    pub(crate) fn new(
        schema: Arc<PacketSchema>,
        raw: Bytes,
        values: FieldValues,
        unsupported: Vec<String>,
    ) -> Self {
        Self {
            schema,
            raw,
            values,
            unsupported,
        }
    }

    pub fn schema(&self) -> &Arc<PacketSchema> {
        &self.schema
    }

    /// Name of the schema this value was decoded with.
    pub fn schema_name(&self) -> &str {
        self.schema.name()
    }

    /// The bytes this value was decoded from.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn into_values(self) -> FieldValues {
        self.values
    }

    /// Names of declared fields whose kind has no codec.
    pub fn unsupported(&self) -> &[String] {
        &self.unsupported
    }

    /// Names of supported fields that were declared but not decoded.
    pub fn missing(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .filter(|field| field.kind().is_supported() && !self.values.contains(field.name()))
            .map(|field| field.name())
            .collect()
    }

    /// True when every supported field was decoded.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Human-readable value of one field, `Not set` when absent.
    pub fn describe(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(value) => value.to_string(),
            None => "Not set".to_string(),
        }
    }
}

impl fmt::Display for DecodedValue {
    /// Renders `name:value` pairs sorted by field name, comma separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.values.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{name}:{value}")?;
        }
        Ok(())
    }
}
