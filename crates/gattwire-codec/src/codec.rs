use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{CodecError, Result};
use crate::schema::{Endianness, FieldDescriptor, PacketSchema, PrimitiveKind, UUID_LEN};
use crate::value::{DecodedValue, FieldValue, FieldValues};

/// Decode `bytes` with `schema`.
///
/// Each field reads from its declared range clamped to the buffer length.
/// Fields without enough bytes for their kind are left out of the result;
/// decoding itself never fails.
///
/// ```text
/// schema: flags u8 @0 | value u16 BE @1..=2 | serial u32 LE @3..=6
/// bytes:  [01] [01 02] [0A 00]
/// result: flags=1, value=258          (serial absent: 2 of 4 bytes)
/// ```
pub fn decode(bytes: &[u8], schema: &Arc<PacketSchema>) -> DecodedValue {
    let mut values = FieldValues::new();
    let mut unsupported = Vec::new();

    for field in schema.fields() {
        if !field.kind().is_supported() {
            debug!(
                schema = schema.name(),
                field = field.name(),
                kind = %field.kind(),
                "skipping field with unsupported kind"
            );
            unsupported.push(field.name().to_string());
            continue;
        }

        let slice = clamped_slice(bytes, field);
        match decode_field(field, slice) {
            Some(value) => {
                values.insert(field.name(), value);
            }
            None => trace!(
                schema = schema.name(),
                field = field.name(),
                available = slice.len(),
                "field not decoded"
            ),
        }
    }

    DecodedValue::new(
        Arc::clone(schema),
        Bytes::copy_from_slice(bytes),
        values,
        unsupported,
    )
}

fn clamped_slice<'a>(bytes: &'a [u8], field: &FieldDescriptor) -> &'a [u8] {
    if field.start() >= bytes.len() {
        return &[];
    }
    let end = field.end().min(bytes.len() - 1);
    if end < field.start() {
        return &[];
    }
    &bytes[field.start()..=end]
}

fn decode_field(field: &FieldDescriptor, slice: &[u8]) -> Option<FieldValue> {
    if let Some(width) = field.kind().fixed_width() {
        if slice.len() < width {
            return None;
        }
    }

    let mut buf = slice;
    let big = field.endianness() == Endianness::Big;
    match field.kind() {
        PrimitiveKind::U8 => Some(FieldValue::U8(buf.get_u8())),
        PrimitiveKind::U16 if big => Some(FieldValue::U16(buf.get_u16())),
        PrimitiveKind::U16 => Some(FieldValue::U16(buf.get_u16_le())),
        PrimitiveKind::I16 if big => Some(FieldValue::I16(buf.get_i16())),
        PrimitiveKind::I16 => Some(FieldValue::I16(buf.get_i16_le())),
        PrimitiveKind::U32 if big => Some(FieldValue::U32(buf.get_u32())),
        PrimitiveKind::U32 => Some(FieldValue::U32(buf.get_u32_le())),
        PrimitiveKind::String => decode_ascii(slice).map(FieldValue::Str),
        PrimitiveKind::Uuid => Uuid::from_slice(&slice[..UUID_LEN])
            .ok()
            .map(FieldValue::Uuid),
        PrimitiveKind::Float | PrimitiveKind::Int => None,
    }
}

fn decode_ascii(slice: &[u8]) -> Option<String> {
    if slice.is_empty() || !slice.is_ascii() {
        return None;
    }
    // ASCII is always valid UTF-8.
    std::str::from_utf8(slice).ok().map(str::to_string)
}

/// Why a field contributed no bytes to an encoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// No value was supplied for the field.
    Missing,
    /// The supplied value has a different kind than the field declares.
    KindMismatch {
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },
    /// The field's kind has no codec.
    Unsupported,
    /// A string value contains non-ASCII characters.
    NotAscii,
    /// A string value is longer than the field's range.
    Overflow { width: usize, len: usize },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Missing => f.write_str("missing"),
            DropReason::KindMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            DropReason::Unsupported => f.write_str("unsupported kind"),
            DropReason::NotAscii => f.write_str("not ascii"),
            DropReason::Overflow { width, len } => {
                write!(f, "{len} bytes do not fit {width}-byte field")
            }
        }
    }
}

/// A field left out of an encoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub name: String,
    pub reason: DropReason,
}

/// Encoded bytes plus every field that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    schema: String,
    bytes: Bytes,
    dropped: Vec<DroppedField>,
}

impl EncodeOutcome {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Dropped fields in schema order.
    pub fn dropped(&self) -> &[DroppedField] {
        &self.dropped
    }

    /// True when every schema field was written.
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }

    /// Return the bytes only if nothing was dropped.
    pub fn into_strict(self) -> Result<Bytes> {
        if self.dropped.is_empty() {
            Ok(self.bytes)
        } else {
            Err(CodecError::Incomplete {
                schema: self.schema,
                dropped: self.dropped,
            })
        }
    }
}

/// Encode `values` with `schema`.
///
/// Fields are written in ascending range-start order with no padding. A field
/// whose value is absent, of the wrong kind, or unrepresentable contributes no
/// bytes and is reported in [`EncodeOutcome::dropped`].
pub fn encode(values: &FieldValues, schema: &PacketSchema) -> EncodeOutcome {
    let mut dst = BytesMut::with_capacity(encoded_len(values, schema));
    let mut dropped = Vec::new();

    for field in schema.fields() {
        let result = match values.get(field.name()) {
            _ if !field.kind().is_supported() => Err(DropReason::Unsupported),
            None => Err(DropReason::Missing),
            Some(value) => encode_field(field, value, &mut dst),
        };
        if let Err(reason) = result {
            trace!(
                schema = schema.name(),
                field = field.name(),
                %reason,
                "field dropped from encoded packet"
            );
            dropped.push(DroppedField {
                name: field.name().to_string(),
                reason,
            });
        }
    }

    EncodeOutcome {
        schema: schema.name().to_string(),
        bytes: dst.freeze(),
        dropped,
    }
}

/// Upper bound on the bytes `encode` will write for `values`.
fn encoded_len(values: &FieldValues, schema: &PacketSchema) -> usize {
    schema
        .fields()
        .iter()
        .filter_map(|field| match values.get(field.name())? {
            FieldValue::Str(text) => Some(text.len().min(field.width())),
            value => value.kind().fixed_width(),
        })
        .sum()
}

fn encode_field(
    field: &FieldDescriptor,
    value: &FieldValue,
    dst: &mut BytesMut,
) -> std::result::Result<(), DropReason> {
    if value.kind() != field.kind() {
        return Err(DropReason::KindMismatch {
            expected: field.kind(),
            found: value.kind(),
        });
    }

    let big = field.endianness() == Endianness::Big;
    match value {
        FieldValue::U8(v) => dst.put_u8(*v),
        FieldValue::U16(v) if big => dst.put_u16(*v),
        FieldValue::U16(v) => dst.put_u16_le(*v),
        FieldValue::I16(v) if big => dst.put_i16(*v),
        FieldValue::I16(v) => dst.put_i16_le(*v),
        FieldValue::U32(v) if big => dst.put_u32(*v),
        FieldValue::U32(v) => dst.put_u32_le(*v),
        FieldValue::Str(text) => {
            if !text.is_ascii() {
                return Err(DropReason::NotAscii);
            }
            if text.len() > field.width() {
                return Err(DropReason::Overflow {
                    width: field.width(),
                    len: text.len(),
                });
            }
            dst.put_slice(text.as_bytes());
        }
        FieldValue::Uuid(id) => dst.put_slice(id.as_bytes()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PACKET_LEN;

    fn schema(build: impl FnOnce(crate::SchemaBuilder) -> crate::SchemaBuilder) -> Arc<PacketSchema> {
        Arc::new(build(PacketSchema::builder("test")).build().unwrap())
    }

    #[test]
    fn u16_honors_endianness() {
        let be = schema(|b| b.u16("v", 0..=1, Endianness::Big));
        let le = schema(|b| b.u16("v", 0..=1, Endianness::Little));

        assert_eq!(decode(&[0x01, 0x02], &be).get("v"), Some(&FieldValue::U16(258)));
        assert_eq!(decode(&[0x01, 0x02], &le).get("v"), Some(&FieldValue::U16(513)));
    }

    #[test]
    fn signed_and_wide_integers() {
        let s = schema(|b| {
            b.i16("temp", 0..=1, Endianness::Little)
                .u32("ticks", 2..=5, Endianness::Big)
        });
        let value = decode(&[0xFE, 0xFF, 0x00, 0x01, 0x00, 0x00], &s);
        assert_eq!(value.get("temp"), Some(&FieldValue::I16(-2)));
        assert_eq!(value.get("ticks"), Some(&FieldValue::U32(65536)));
    }

    #[test]
    fn short_buffer_omits_field_without_error() {
        let s = schema(|b| b.u32("serial", 0..=3, Endianness::Little));
        let value = decode(&[0xAA, 0xBB], &s);
        assert!(value.get("serial").is_none());
        assert_eq!(value.missing(), vec!["serial"]);
        assert!(!value.is_complete());
    }

    #[test]
    fn range_past_buffer_end_is_empty() {
        let s = schema(|b| b.u8("head", 0).string("label", 10..=13));
        let value = decode(&[0x07], &s);
        assert_eq!(value.get("head"), Some(&FieldValue::U8(7)));
        assert!(value.get("label").is_none());
    }

    #[test]
    fn string_decodes_available_bytes() {
        let s = schema(|b| b.string("name", 0..=7));
        let value = decode(b"abc", &s);
        assert_eq!(value.get("name"), Some(&FieldValue::Str("abc".into())));
    }

    #[test]
    fn non_ascii_string_is_omitted() {
        let s = schema(|b| b.string("name", 0..=1));
        let value = decode(&[0x41, 0xC3], &s);
        assert!(value.get("name").is_none());
    }

    #[test]
    fn uuid_needs_sixteen_bytes() {
        let s = schema(|b| b.uuid("id", 0..=15));
        let id = Uuid::from_u128(0x0000180d_0000_1000_8000_00805f9b34fb);

        let value = decode(id.as_bytes(), &s);
        assert_eq!(value.get("id"), Some(&FieldValue::Uuid(id)));

        let value = decode(&id.as_bytes()[..15], &s);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn float_and_int_are_reported_unsupported() {
        let s = schema(|b| {
            b.u8("a", 0)
                .field("f", PrimitiveKind::Float, 1..=4, Endianness::Little)
                .field("i", PrimitiveKind::Int, 5..=12, Endianness::Little)
        });
        let value = decode(&[0u8; 13], &s);

        assert_eq!(value.unsupported(), &["f".to_string(), "i".to_string()]);
        assert!(value.get("f").is_none());
        assert!(value.get("i").is_none());
        assert!(value.is_complete());

        let outcome = encode(&FieldValues::new().with("a", 1u8).with("f", 3u32), &s);
        assert_eq!(outcome.bytes().as_ref(), &[1]);
        assert_eq!(
            outcome.dropped(),
            &[
                DroppedField {
                    name: "f".into(),
                    reason: DropReason::Unsupported
                },
                DroppedField {
                    name: "i".into(),
                    reason: DropReason::Unsupported
                },
            ]
        );
    }

    #[test]
    fn encode_orders_by_range_start() {
        let s = schema(|b| {
            b.u16("b", 1..=2, Endianness::Big)
                .u8("a", 0)
                .u16("c", 3..=4, Endianness::Little)
        });
        let values = FieldValues::new()
            .with("c", 0x0102u16)
            .with("a", 0xFFu8)
            .with("b", 0x0304u16);

        let outcome = encode(&values, &s);
        assert!(outcome.is_complete());
        assert_eq!(outcome.bytes().as_ref(), &[0xFF, 0x03, 0x04, 0x02, 0x01]);
    }

    #[test]
    fn kind_mismatch_contributes_no_bytes() {
        let s = schema(|b| b.u8("a", 0).u16("b", 1..=2, Endianness::Big));
        let values = FieldValues::new().with("a", 1u16).with("b", 2u16);

        let outcome = encode(&values, &s);
        assert_eq!(outcome.bytes().as_ref(), &[0x00, 0x02]);
        assert_eq!(
            outcome.dropped()[0].reason,
            DropReason::KindMismatch {
                expected: PrimitiveKind::U8,
                found: PrimitiveKind::U16
            }
        );
        assert!(matches!(
            outcome.into_strict(),
            Err(CodecError::Incomplete { ref dropped, .. }) if dropped.len() == 1
        ));
    }

    #[test]
    fn string_overflow_and_non_ascii_are_dropped() {
        let s = schema(|b| b.string("s", 0..=2));

        let outcome = encode(&FieldValues::new().with("s", "toolong"), &s);
        assert!(outcome.bytes().is_empty());
        assert_eq!(
            outcome.dropped()[0].reason,
            DropReason::Overflow { width: 3, len: 7 }
        );

        let outcome = encode(&FieldValues::new().with("s", "é"), &s);
        assert_eq!(outcome.dropped()[0].reason, DropReason::NotAscii);

        let outcome = encode(&FieldValues::new().with("s", "ab"), &s);
        assert_eq!(outcome.into_strict().unwrap().as_ref(), b"ab");
    }

    #[test]
    fn full_coverage_roundtrip_reproduces_bytes() {
        let s = schema(|b| {
            b.u8("flags", 0)
                .u16("be16", 1..=2, Endianness::Big)
                .i16("le16", 3..=4, Endianness::Little)
                .u32("be32", 5..=8, Endianness::Big)
                .string("tag", 9..=12)
                .uuid("id", 13..=28)
        });
        let mut bytes = vec![0x80, 0x12, 0x34, 0xFF, 0x7F, 0xDE, 0xAD, 0xBE, 0xEF];
        bytes.extend_from_slice(b"GATT");
        bytes.extend_from_slice(&[0x5A; 16]);
        assert_eq!(bytes.len(), s.extent());

        let decoded = decode(&bytes, &s);
        assert!(decoded.is_complete());
        let encoded = encode(decoded.values(), &s).into_strict().unwrap();
        assert_eq!(encoded.as_ref(), bytes.as_slice());
        assert_eq!(decoded.raw().as_ref(), bytes.as_slice());
    }

    #[test]
    fn encode_buffer_tracks_written_bytes() {
        let s = schema(|b| b.u8("a", 0).string("note", 1..=MAX_PACKET_LEN - 1));
        let values = FieldValues::new().with("a", 1u8).with("note", "hi");

        assert_eq!(encoded_len(&values, &s), 3);
        let outcome = encode(&values, &s);
        assert!(outcome.is_complete());
        assert_eq!(outcome.bytes().as_ref(), b"\x01hi");

        let outcome = encode(&FieldValues::new().with("a", 1u8), &s);
        assert_eq!(outcome.bytes().as_ref(), &[1]);
        assert_eq!(outcome.dropped()[0].reason, DropReason::Missing);
    }

    #[test]
    fn display_lists_fields_sorted_by_name() {
        let s = schema(|b| b.u8("zeta", 0).u8("alpha", 1).u8("mid", 2));
        let value = decode(&[3, 1, 2], &s);
        assert_eq!(value.to_string(), "alpha:1,mid:2,zeta:3");
        assert_eq!(value.describe("alpha"), "1");
        assert_eq!(value.describe("nope"), "Not set");
    }
}
