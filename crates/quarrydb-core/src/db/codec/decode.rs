use crate::{
    db::{
        Direction,
        codec::{
            CONTINUE, DecodeError, END, NUMBER_NEGATIVE, NUMBER_NEGATIVE_INFINITY, NUMBER_POSITIVE,
            NUMBER_POSITIVE_INFINITY, NUMBER_ZERO, TAG_ARRAY, TAG_BOOLEAN, TAG_BSON_BINARY,
            TAG_BSON_TIMESTAMP, TAG_BYTES, TAG_GEOPOINT, TAG_MAP, TAG_MAX_KEY, TAG_MIN_KEY,
            TAG_NAN, TAG_NULL, TAG_NUMBER, TAG_OBJECT_ID, TAG_REFERENCE, TAG_REGEX, TAG_STRING,
            TAG_TIMESTAMP, TAG_VECTOR,
            encode::{DIGITS_END, ESCAPE, ESCAPED_NUL, TERMINATOR},
            inverted,
        },
    },
    model::path::ResourcePath,
    types::{GeoPoint, Timestamp},
    value::{
        Value,
        number::{Magnitude, NumberParts},
    },
};
use std::{borrow::Cow, collections::BTreeMap};

/// Decode one value from the front of `bytes`, returning it with the
/// number of bytes consumed.
pub(crate) fn decode_value_prefix(
    bytes: &[u8],
    direction: Direction,
) -> Result<(Value, usize), DecodeError> {
    let ascending: Cow<'_, [u8]> = if direction.is_desc() {
        Cow::Owned(inverted(bytes))
    } else {
        Cow::Borrowed(bytes)
    };

    let mut reader = Reader::new(&ascending);
    let value = reader.read_value()?;

    Ok((value, reader.position))
}

///
/// Reader
///
/// Cursor over ascending-encoded bytes.
///

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .bytes
            .get(self.position)
            .ok_or(DecodeError::UnexpectedEnd)?;
        self.position += 1;

        Ok(byte)
    }

    fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.bytes
            .get(self.position)
            .copied()
            .ok_or(DecodeError::UnexpectedEnd)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.position.checked_add(N).ok_or(DecodeError::UnexpectedEnd)?;
        let slice = self
            .bytes
            .get(self.position..end)
            .ok_or(DecodeError::UnexpectedEnd)?;
        self.position = end;

        let mut out = [0u8; N];
        out.copy_from_slice(slice);

        Ok(out)
    }

    fn read_value(&mut self) -> Result<Value, DecodeError> {
        let tag = self.read_u8()?;

        let value = match tag {
            TAG_NULL => Value::Null,
            TAG_MIN_KEY => Value::MinKey,
            TAG_MAX_KEY => Value::MaxKey,
            TAG_BOOLEAN => Value::Bool(self.read_u8()? != 0),
            TAG_NAN => Value::Double(f64::NAN),
            TAG_NUMBER => self.read_number()?.to_value(),
            TAG_TIMESTAMP => {
                let seconds = i64_from_ordered(self.read_array()?);
                let nanos = i32_from_ordered(self.read_array()?);
                Value::Timestamp(Timestamp::new(seconds, nanos))
            }
            TAG_BSON_TIMESTAMP => Value::BsonTimestamp {
                seconds: u32::from_be_bytes(self.read_array()?),
                increment: u32::from_be_bytes(self.read_array()?),
            },
            TAG_STRING => Value::String(self.read_string()?),
            TAG_BYTES => Value::Bytes(self.read_terminated_bytes()?),
            TAG_BSON_BINARY => {
                let subtype = self.read_u8()?;
                Value::BsonBinary {
                    subtype,
                    data: self.read_terminated_bytes()?,
                }
            }
            TAG_REFERENCE => {
                let mut segments = Vec::new();
                while self.read_continue()? {
                    segments.push(self.read_string()?);
                }
                Value::Reference(ResourcePath::from_segments(segments))
            }
            TAG_OBJECT_ID => Value::ObjectId(self.read_string()?),
            TAG_GEOPOINT => {
                let latitude = f64_from_ordered(self.read_array()?);
                let longitude = f64_from_ordered(self.read_array()?);
                Value::GeoPoint(GeoPoint::new(latitude, longitude))
            }
            TAG_REGEX => Value::Regex {
                pattern: self.read_string()?,
                options: self.read_string()?,
            },
            TAG_ARRAY => {
                let mut values = Vec::new();
                while self.peek_u8()? != END {
                    values.push(self.read_value()?);
                }
                self.position += 1;
                Value::Array(values)
            }
            TAG_VECTOR => {
                let len = u64::from_be_bytes(self.read_array()?);
                let remaining = (self.bytes.len() - self.position) / 8;
                let count = usize::try_from(len)
                    .ok()
                    .filter(|count| *count <= remaining)
                    .ok_or(DecodeError::InvalidLength(len))?;

                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(f64_from_ordered(self.read_array()?));
                }
                Value::Vector(values)
            }
            TAG_MAP => {
                let mut fields = BTreeMap::new();
                while self.read_continue()? {
                    let key = self.read_string()?;
                    let field = self.read_value()?;
                    fields.insert(key, field);
                }
                Value::Map(fields)
            }
            other => return Err(DecodeError::UnknownTag(other)),
        };

        Ok(value)
    }

    fn read_continue(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            CONTINUE => Ok(true),
            END => Ok(false),
            other => Err(DecodeError::InvalidFraming(other)),
        }
    }

    fn read_number(&mut self) -> Result<NumberParts, DecodeError> {
        let bucket = self.read_u8()?;

        let parts = match bucket {
            NUMBER_NEGATIVE_INFINITY => NumberParts::NegativeInfinity,
            NUMBER_ZERO => NumberParts::Zero,
            NUMBER_POSITIVE_INFINITY => NumberParts::PositiveInfinity,
            NUMBER_POSITIVE => NumberParts::Positive(self.read_magnitude(false)?),
            NUMBER_NEGATIVE => NumberParts::Negative(self.read_magnitude(true)?),
            other => return Err(DecodeError::InvalidNumberBucket(other)),
        };

        Ok(parts)
    }

    fn read_magnitude(&mut self, negative: bool) -> Result<Magnitude, DecodeError> {
        let flip = |byte: u8| if negative { !byte } else { byte };

        let mut exponent_bytes = self.read_array::<4>()?;
        for byte in &mut exponent_bytes {
            *byte = flip(*byte);
        }
        let exponent = i32_from_ordered(exponent_bytes);

        let mut digits = Vec::new();
        loop {
            match flip(self.read_u8()?) {
                DIGITS_END => break,
                byte @ b'0'..=b'9' => digits.push(byte - b'0'),
                other => return Err(DecodeError::InvalidDigit(other)),
            }
        }

        Magnitude::normalized(digits, exponent).ok_or(DecodeError::EmptyNumber)
    }

    fn read_terminated_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();

        loop {
            let byte = self.read_u8()?;
            if byte != ESCAPE {
                out.push(byte);
                continue;
            }

            match self.read_u8()? {
                TERMINATOR => return Ok(out),
                ESCAPED_NUL => out.push(0),
                other => return Err(DecodeError::InvalidEscape(other)),
            }
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        String::from_utf8(self.read_terminated_bytes()?).map_err(|_| DecodeError::InvalidUtf8)
    }
}

const fn i32_from_ordered(bytes: [u8; 4]) -> i32 {
    (u32::from_be_bytes(bytes) ^ (1u32 << 31)).cast_signed()
}

const fn i64_from_ordered(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1u64 << 63)).cast_signed()
}

fn f64_from_ordered(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    if ordered == 0 {
        return f64::NAN;
    }

    let bits = if ordered & 0x8000_0000_0000_0000 == 0 {
        !ordered
    } else {
        ordered ^ 0x8000_0000_0000_0000
    };

    f64::from_bits(bits)
}
