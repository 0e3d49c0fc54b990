use crate::{
    db::codec::{
        CONTINUE, END, NUMBER_NEGATIVE, NUMBER_NEGATIVE_INFINITY, NUMBER_POSITIVE,
        NUMBER_POSITIVE_INFINITY, NUMBER_ZERO, TAG_ARRAY, TAG_BOOLEAN, TAG_BSON_BINARY,
        TAG_BSON_TIMESTAMP, TAG_BYTES, TAG_GEOPOINT, TAG_MAP, TAG_MAX_KEY, TAG_MIN_KEY, TAG_NAN,
        TAG_NULL, TAG_NUMBER, TAG_OBJECT_ID, TAG_REFERENCE, TAG_REGEX, TAG_STRING,
        TAG_TIMESTAMP, TAG_VECTOR,
    },
    value::{
        Value,
        number::{Magnitude, NumberParts},
    },
};

// Escaped byte strings end with 0x00 0x00; a literal 0x00 is 0x00 0xFF.
pub(super) const ESCAPE: u8 = 0x00;
pub(super) const ESCAPED_NUL: u8 = 0xFF;
pub(super) const TERMINATOR: u8 = 0x00;

// Number digits end with a byte below every ASCII digit.
pub(super) const DIGITS_END: u8 = 0x00;

pub(super) fn push_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::MinKey => out.push(TAG_MIN_KEY),
        Value::MaxKey => out.push(TAG_MAX_KEY),
        Value::Bool(v) => {
            out.push(TAG_BOOLEAN);
            out.push(u8::from(*v));
        }
        Value::Integer(_) | Value::Int32(_) | Value::Double(_) | Value::Decimal(_) => {
            if let Some(parts) = NumberParts::from_value(value) {
                push_number(out, &parts);
            }
        }
        Value::Timestamp(ts) => {
            out.push(TAG_TIMESTAMP);
            out.extend_from_slice(&ordered_i64_bytes(ts.seconds()));
            out.extend_from_slice(&ordered_i32_bytes(ts.nanos()));
        }
        Value::BsonTimestamp { seconds, increment } => {
            out.push(TAG_BSON_TIMESTAMP);
            out.extend_from_slice(&seconds.to_be_bytes());
            out.extend_from_slice(&increment.to_be_bytes());
        }
        Value::String(v) => {
            out.push(TAG_STRING);
            push_terminated_bytes(out, v.as_bytes());
        }
        Value::Bytes(v) => {
            out.push(TAG_BYTES);
            push_terminated_bytes(out, v);
        }
        Value::BsonBinary { subtype, data } => {
            out.push(TAG_BSON_BINARY);
            out.push(*subtype);
            push_terminated_bytes(out, data);
        }
        Value::Reference(path) => {
            out.push(TAG_REFERENCE);
            for segment in path.segments() {
                out.push(CONTINUE);
                push_terminated_bytes(out, segment.as_bytes());
            }
            out.push(END);
        }
        Value::ObjectId(v) => {
            out.push(TAG_OBJECT_ID);
            push_terminated_bytes(out, v.as_bytes());
        }
        Value::GeoPoint(point) => {
            out.push(TAG_GEOPOINT);
            out.extend_from_slice(&ordered_f64_bytes(point.latitude));
            out.extend_from_slice(&ordered_f64_bytes(point.longitude));
        }
        Value::Regex { pattern, options } => {
            out.push(TAG_REGEX);
            push_terminated_bytes(out, pattern.as_bytes());
            push_terminated_bytes(out, options.as_bytes());
        }
        Value::Array(values) => {
            out.push(TAG_ARRAY);
            for element in values {
                push_value(out, element);
            }
            out.push(END);
        }
        Value::Vector(values) => {
            out.push(TAG_VECTOR);
            out.extend_from_slice(&(values.len() as u64).to_be_bytes());
            for element in values {
                out.extend_from_slice(&ordered_f64_bytes(*element));
            }
        }
        Value::Map(fields) => {
            out.push(TAG_MAP);
            for (key, field) in fields {
                out.push(CONTINUE);
                push_terminated_bytes(out, key.as_bytes());
                push_value(out, field);
            }
            out.push(END);
        }
    }
}

// Numbers are sign bucket, then exponent and digits; negative magnitudes
// are inverted so larger magnitudes sort first.
fn push_number(out: &mut Vec<u8>, parts: &NumberParts) {
    match parts {
        NumberParts::NaN => out.push(TAG_NAN),
        NumberParts::NegativeInfinity => {
            out.extend_from_slice(&[TAG_NUMBER, NUMBER_NEGATIVE_INFINITY]);
        }
        NumberParts::Zero => out.extend_from_slice(&[TAG_NUMBER, NUMBER_ZERO]),
        NumberParts::PositiveInfinity => {
            out.extend_from_slice(&[TAG_NUMBER, NUMBER_POSITIVE_INFINITY]);
        }
        NumberParts::Positive(magnitude) => {
            out.extend_from_slice(&[TAG_NUMBER, NUMBER_POSITIVE]);
            push_magnitude(out, magnitude);
        }
        NumberParts::Negative(magnitude) => {
            out.extend_from_slice(&[TAG_NUMBER, NUMBER_NEGATIVE]);
            let start = out.len();
            push_magnitude(out, magnitude);
            super::invert(&mut out[start..]);
        }
    }
}

fn push_magnitude(out: &mut Vec<u8>, magnitude: &Magnitude) {
    out.extend_from_slice(&ordered_i32_bytes(magnitude.exponent));
    out.extend(magnitude.digits.iter().map(|digit| b'0' + digit));
    out.push(DIGITS_END);
}

fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == ESCAPE {
            out.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}

pub(super) const fn ordered_i32_bytes(value: i32) -> [u8; 4] {
    let biased = value.cast_unsigned() ^ (1u32 << 31);
    biased.to_be_bytes()
}

pub(super) const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    let biased = value.cast_unsigned() ^ (1u64 << 63);
    biased.to_be_bytes()
}

// -0.0 folds onto 0.0 and every NaN onto the all-zero pattern, below -inf.
pub(super) fn ordered_f64_bytes(value: f64) -> [u8; 8] {
    if value.is_nan() {
        return [0; 8];
    }

    let bits = if value == 0.0 { 0 } else { value.to_bits() };
    let ordered = if bits & 0x8000_0000_0000_0000 == 0 {
        bits ^ 0x8000_0000_0000_0000
    } else {
        !bits
    };

    ordered.to_be_bytes()
}
