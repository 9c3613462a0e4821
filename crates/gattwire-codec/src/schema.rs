use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Largest attribute value a schema may describe, in bytes.
///
/// Every field range must end below this offset.
pub const MAX_PACKET_LEN: usize = 512;

pub(crate) const UUID_LEN: usize = 16;

/// Byte order of a multi-byte integer field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    Big,
    #[default]
    Little,
}

/// Primitive type of a schema field.
///
/// `Float` and `Int` can be declared but are not decoded or encoded; see
/// [`PrimitiveKind::is_supported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    U8,
    U16,
    I16,
    U32,
    Float,
    Int,
    String,
    Uuid,
}

impl PrimitiveKind {
    /// Number of bytes a value of this kind occupies, if fixed.
    ///
    /// String width comes from the field's declared range instead.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            PrimitiveKind::U8 => Some(1),
            PrimitiveKind::U16 | PrimitiveKind::I16 => Some(2),
            PrimitiveKind::U32 => Some(4),
            PrimitiveKind::Uuid => Some(UUID_LEN),
            PrimitiveKind::Float | PrimitiveKind::Int | PrimitiveKind::String => None,
        }
    }

    /// Returns false for kinds that are declared but have no codec.
    pub fn is_supported(self) -> bool {
        !matches!(self, PrimitiveKind::Float | PrimitiveKind::Int)
    }

    /// Returns true if the field's endianness is meaningful for this kind.
    pub fn has_byte_order(self) -> bool {
        !matches!(self, PrimitiveKind::String | PrimitiveKind::Uuid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Int => "int",
            PrimitiveKind::String => "string",
            PrimitiveKind::Uuid => "uuid",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named field of a packet: kind, inclusive byte range and byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: PrimitiveKind,
    start: usize,
    end: usize,
    endianness: Endianness,
}

impl FieldDescriptor {
    /// Describe a field occupying `range` (inclusive on both ends).
    ///
    /// String and uuid fields are always little-endian regardless of
    /// `endianness`. Ranges are checked when the descriptor joins a
    /// [`PacketSchema`]: uuid fields must span exactly 16 bytes.
    pub fn new(
        name: impl Into<String>,
        kind: PrimitiveKind,
        range: RangeInclusive<usize>,
        endianness: Endianness,
    ) -> Self {
        let endianness = if kind.has_byte_order() {
            endianness
        } else {
            Endianness::Little
        };
        Self {
            name: name.into(),
            kind,
            start: *range.start(),
            end: *range.end(),
            endianness,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Number of bytes covered by the declared range.
    pub fn width(&self) -> usize {
        self.end.saturating_add(1).saturating_sub(self.start)
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }
}

/// Named layout of one packet type.
///
/// Fields are kept ordered by range start (declaration order breaks ties),
/// which is also the order [`crate::encode`] writes them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl PacketSchema {
    /// Build a schema from field descriptors.
    ///
    /// Fails if two fields share a name, or a range is reversed, reaches past
    /// [`MAX_PACKET_LEN`], or does not match a uuid's 16-byte width.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let name = name.into();
        validate_fields(&name, &fields)?;

        let mut fields = fields;
        fields.sort_by_key(|field| field.start);
        Ok(Self { name, fields })
    }

    /// Start a schema with the fluent builder.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in ascending range-start order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Smallest buffer length that covers every declared range.
    pub fn extent(&self) -> usize {
        self.fields.iter().map(|field| field.end + 1).max().unwrap_or(0)
    }
}

fn validate_fields(schema: &str, fields: &[FieldDescriptor]) -> Result<()> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        let uuid_width_mismatch = field.kind == PrimitiveKind::Uuid && field.width() != UUID_LEN;
        if field.start > field.end || field.end >= MAX_PACKET_LEN || uuid_width_mismatch {
            return Err(CodecError::InvalidRange {
                field: field.name.clone(),
                start: field.start,
                end: field.end,
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(CodecError::DuplicateField {
                schema: schema.to_string(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

/// Fluent builder for [`PacketSchema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    pub fn field(
        mut self,
        name: impl Into<String>,
        kind: PrimitiveKind,
        range: RangeInclusive<usize>,
        endianness: Endianness,
    ) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind, range, endianness));
        self
    }

    pub fn u8(self, name: impl Into<String>, offset: usize) -> Self {
        self.field(name, PrimitiveKind::U8, offset..=offset, Endianness::Little)
    }

    pub fn u16(
        self,
        name: impl Into<String>,
        range: RangeInclusive<usize>,
        endianness: Endianness,
    ) -> Self {
        self.field(name, PrimitiveKind::U16, range, endianness)
    }

    pub fn i16(
        self,
        name: impl Into<String>,
        range: RangeInclusive<usize>,
        endianness: Endianness,
    ) -> Self {
        self.field(name, PrimitiveKind::I16, range, endianness)
    }

    pub fn u32(
        self,
        name: impl Into<String>,
        range: RangeInclusive<usize>,
        endianness: Endianness,
    ) -> Self {
        self.field(name, PrimitiveKind::U32, range, endianness)
    }

    pub fn string(self, name: impl Into<String>, range: RangeInclusive<usize>) -> Self {
        self.field(name, PrimitiveKind::String, range, Endianness::Little)
    }

    pub fn uuid(self, name: impl Into<String>, range: RangeInclusive<usize>) -> Self {
        self.field(name, PrimitiveKind::Uuid, range, Endianness::Little)
    }

    pub fn build(self) -> Result<PacketSchema> {
        PacketSchema::new(self.name, self.fields)
    }
}
