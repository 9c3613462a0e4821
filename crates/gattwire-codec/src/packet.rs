use std::sync::Arc;

use crate::codec::{decode, encode, EncodeOutcome};
use crate::schema::PacketSchema;
use crate::value::{DecodedValue, FieldValues};

/// A concrete packet type with a fixed schema.
///
/// Implementations spell out the field mapping explicitly: `from_decoded`
/// reads whatever fields were present, `to_values` lists the fields to write.
///
/// ```
/// use std::sync::{Arc, OnceLock};
/// use gattwire_codec::{DecodedValue, Endianness, FieldValues, Packet, PacketSchema};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct HeartRate {
///     flags: Option<u8>,
///     bpm: Option<u16>,
/// }
///
/// impl Packet for HeartRate {
///     fn schema() -> Arc<PacketSchema> {
///         static SCHEMA: OnceLock<Arc<PacketSchema>> = OnceLock::new();
///         SCHEMA
///             .get_or_init(|| {
///                 Arc::new(
///                     PacketSchema::builder("HeartRate")
///                         .u8("flags", 0)
///                         .u16("bpm", 1..=2, Endianness::Little)
///                         .build()
///                         .expect("static schema is valid"),
///                 )
///             })
///             .clone()
///     }
///
///     fn from_decoded(value: &DecodedValue) -> Self {
///         Self {
///             flags: value.get("flags").and_then(|v| v.as_u8()),
///             bpm: value.get("bpm").and_then(|v| v.as_u16()),
///         }
///     }
///
///     fn to_values(&self) -> FieldValues {
///         let mut values = FieldValues::new();
///         values.insert_opt("flags", self.flags);
///         values.insert_opt("bpm", self.bpm);
///         values
///     }
/// }
///
/// let hr = HeartRate::decode(&[0x01, 0x48, 0x00]);
/// assert_eq!(hr.bpm, Some(72));
/// assert_eq!(hr.encode().bytes().as_ref(), &[0x01, 0x48, 0x00]);
/// ```
pub trait Packet: Sized + Send + 'static {
    /// The schema shared by every value of this type.
    fn schema() -> Arc<PacketSchema>;

    /// Build a value from a (possibly partial) decode.
    fn from_decoded(value: &DecodedValue) -> Self;

    /// The field values to encode.
    fn to_values(&self) -> FieldValues;

    fn decode(bytes: &[u8]) -> Self {
        Self::from_decoded(&decode(bytes, &Self::schema()))
    }

    fn encode(&self) -> EncodeOutcome {
        encode(&self.to_values(), &Self::schema())
    }
}
