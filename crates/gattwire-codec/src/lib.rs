//! Schema-driven binary codec for GATT characteristic payloads.
//!
//! A [`PacketSchema`] maps named fields onto byte ranges of a packet:
//! - each field declares a [`PrimitiveKind`] and a 0-based inclusive range
//! - multi-byte integers declare their own [`Endianness`]
//! - string and uuid fields are fixed regions (ASCII text, 16-byte UUID)
//!
//! [`decode`] is best-effort: fields without enough bytes are simply absent.
//! [`encode`] never fails either, but reports every field it could not
//! write in the returned [`EncodeOutcome`].

pub mod codec;
pub mod document;
pub mod error;
pub mod hex;
pub mod packet;
pub mod schema;
pub mod value;

pub use codec::{decode, encode, DropReason, DroppedField, EncodeOutcome};
pub use document::{FieldDocument, SchemaDocument};
pub use error::{CodecError, Result};
pub use hex::{hex_decode, hex_encode, HexCase};
pub use packet::Packet;
pub use schema::{
    Endianness, FieldDescriptor, PacketSchema, PrimitiveKind, SchemaBuilder, MAX_PACKET_LEN,
};
pub use value::{DecodedValue, FieldValue, FieldValues};

pub use uuid::Uuid;
