//! Module: db::codec
//! Responsibility: order-preserving byte encoding of single values.
//! Does not own: index entry layout or scan range construction.
//! Boundary: every index key component is produced by `encode_value`.
//!
//! Ascending encodings are prefix-free and compare bytewise in canonical
//! value order. Descending encodings are the bytewise complement of the
//! ascending bytes, which reverses that order.

mod decode;
mod encode;


use crate::{
    db::Direction,
    error::InternalError,
    value::{TypeOrder, Value},
};
use thiserror::Error as ThisError;

pub(crate) use decode::decode_value_prefix;

///
/// TAGS
///
/// One leading byte per value kind. Gaps leave room for new kinds without
/// re-encoding existing entries.
///

pub(crate) const TAG_NULL: u8 = 5;
pub(crate) const TAG_MIN_KEY: u8 = 7;
pub(crate) const TAG_BOOLEAN: u8 = 10;
pub(crate) const TAG_NAN: u8 = 13;
pub(crate) const TAG_NUMBER: u8 = 15;
pub(crate) const TAG_TIMESTAMP: u8 = 20;
pub(crate) const TAG_BSON_TIMESTAMP: u8 = 22;
pub(crate) const TAG_STRING: u8 = 25;
pub(crate) const TAG_BYTES: u8 = 30;
pub(crate) const TAG_BSON_BINARY: u8 = 31;
pub(crate) const TAG_REFERENCE: u8 = 37;
pub(crate) const TAG_OBJECT_ID: u8 = 43;
pub(crate) const TAG_GEOPOINT: u8 = 45;
pub(crate) const TAG_REGEX: u8 = 47;
pub(crate) const TAG_ARRAY: u8 = 50;
pub(crate) const TAG_VECTOR: u8 = 53;
pub(crate) const TAG_MAP: u8 = 55;
pub(crate) const TAG_MAX_KEY: u8 = 60;

// Framing bytes inside composite payloads.
pub(crate) const END: u8 = 0x00;
pub(crate) const CONTINUE: u8 = 0x01;

// Number sign buckets, after TAG_NUMBER.
pub(crate) const NUMBER_NEGATIVE_INFINITY: u8 = 0;
pub(crate) const NUMBER_NEGATIVE: u8 = 1;
pub(crate) const NUMBER_ZERO: u8 = 2;
pub(crate) const NUMBER_POSITIVE: u8 = 3;
pub(crate) const NUMBER_POSITIVE_INFINITY: u8 = 4;

///
/// DecodeError
///
/// Byte-level failures while reading an encoded value. Any of these on a
/// persisted entry means the entry store is corrupt.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum DecodeError {
    #[error("encoded value ended unexpectedly")]
    UnexpectedEnd,

    #[error("unknown type tag {0:#04x}")]
    UnknownTag(u8),

    #[error("invalid number bucket {0:#04x}")]
    InvalidNumberBucket(u8),

    #[error("number payload has no significant digits")]
    EmptyNumber,

    #[error("invalid digit byte {0:#04x}")]
    InvalidDigit(u8),

    #[error("invalid escape sequence 0x00 {0:#04x}")]
    InvalidEscape(u8),

    #[error("invalid framing byte {0:#04x}")]
    InvalidFraming(u8),

    #[error("string payload is not valid utf-8")]
    InvalidUtf8,

    #[error("vector length {0} exceeds remaining input")]
    InvalidLength(u64),

    #[error("{0} trailing bytes after encoded value")]
    TrailingBytes(usize),
}

impl From<DecodeError> for InternalError {
    fn from(err: DecodeError) -> Self {
        Self::codec_corruption(format!("index value decode failed: {err}"))
    }
}

/// Encode one value in the given direction.
#[must_use]
pub fn encode_value(value: &Value, direction: Direction) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value_into(&mut out, value, direction);

    out
}

/// Append the encoding of `value` to `out`.
pub fn encode_value_into(out: &mut Vec<u8>, value: &Value, direction: Direction) {
    let start = out.len();
    encode::push_value(out, value);

    if direction.is_desc() {
        invert(&mut out[start..]);
    }
}

/// Decode exactly one value; trailing input is an error.
pub fn decode_value(bytes: &[u8], direction: Direction) -> Result<Value, DecodeError> {
    let (value, used) = decode_value_prefix(bytes, direction)?;
    if used != bytes.len() {
        return Err(DecodeError::TrailingBytes(bytes.len() - used));
    }

    Ok(value)
}

/// Ascending prefix shared by every value of type `order`; the inclusive
/// lower edge of that type's range.
#[must_use]
pub fn type_start(order: TypeOrder) -> Vec<u8> {
    vec![tag_range(order).0]
}

/// Ascending prefix just past every value of type `order`; the exclusive
/// upper edge of that type's range.
#[must_use]
pub fn type_end(order: TypeOrder) -> Vec<u8> {
    vec![tag_range(order).1 + 1]
}

// First and last tag used by a type order. Numbers span NaN and finite tags.
const fn tag_range(order: TypeOrder) -> (u8, u8) {
    match order {
        TypeOrder::Null => (TAG_NULL, TAG_NULL),
        TypeOrder::MinKey => (TAG_MIN_KEY, TAG_MIN_KEY),
        TypeOrder::Boolean => (TAG_BOOLEAN, TAG_BOOLEAN),
        TypeOrder::Number => (TAG_NAN, TAG_NUMBER),
        TypeOrder::Timestamp => (TAG_TIMESTAMP, TAG_TIMESTAMP),
        TypeOrder::BsonTimestamp => (TAG_BSON_TIMESTAMP, TAG_BSON_TIMESTAMP),
        TypeOrder::String => (TAG_STRING, TAG_STRING),
        TypeOrder::Bytes => (TAG_BYTES, TAG_BYTES),
        TypeOrder::BsonBinary => (TAG_BSON_BINARY, TAG_BSON_BINARY),
        TypeOrder::Reference => (TAG_REFERENCE, TAG_REFERENCE),
        TypeOrder::ObjectId => (TAG_OBJECT_ID, TAG_OBJECT_ID),
        TypeOrder::GeoPoint => (TAG_GEOPOINT, TAG_GEOPOINT),
        TypeOrder::Regex => (TAG_REGEX, TAG_REGEX),
        TypeOrder::Array => (TAG_ARRAY, TAG_ARRAY),
        TypeOrder::Vector => (TAG_VECTOR, TAG_VECTOR),
        TypeOrder::Map => (TAG_MAP, TAG_MAP),
        TypeOrder::MaxKey => (TAG_MAX_KEY, TAG_MAX_KEY),
    }
}

/// Smallest byte string greater than every string starting with `prefix`.
///
/// `None` when no such string exists (empty or all-`0xFF` prefix).
#[must_use]
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let keep = prefix.iter().rposition(|byte| *byte != 0xFF)?;
    let mut out = prefix[..=keep].to_vec();
    out[keep] += 1;

    Some(out)
}

pub(crate) fn invert(bytes: &mut [u8]) {
    for byte in bytes {
        *byte = !*byte;
    }
}

#[must_use]
pub(crate) fn inverted(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|byte| !byte).collect()
}
