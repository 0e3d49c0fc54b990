//! Document values and their canonical total order.
//!
//! Equality and ordering are both defined by [`canonical_cmp`]: numbers of
//! different widths compare by mathematical value, `-0.0 == 0.0`, and NaN
//! is a self-equal value ordered before every other number.

mod compare;
pub(crate) mod number;
mod rank;

#[cfg(test)]
mod tests;

use crate::{
    model::path::ResourcePath,
    types::{Decimal, GeoPoint, Timestamp},
};
use std::{cmp::Ordering, collections::BTreeMap};

pub use compare::canonical_cmp;
pub use rank::TypeOrder;

///
/// Value
///
/// Closed sum of every value kind a document field can hold.
///

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    MinKey,
    MaxKey,
    Bool(bool),
    Integer(i64),
    Int32(i32),
    Double(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    BsonTimestamp { seconds: u32, increment: u32 },
    String(String),
    Bytes(Vec<u8>),
    BsonBinary { subtype: u8, data: Vec<u8> },
    Reference(ResourcePath),
    ObjectId(String),
    GeoPoint(GeoPoint),
    Regex { pattern: String, options: String },
    Array(Vec<Self>),
    Vector(Vec<f64>),
    Map(BTreeMap<String, Self>),
}

impl Value {
    #[must_use]
    pub const fn type_order(&self) -> TypeOrder {
        match self {
            Self::Null => TypeOrder::Null,
            Self::MinKey => TypeOrder::MinKey,
            Self::Bool(_) => TypeOrder::Boolean,
            Self::Integer(_) | Self::Int32(_) | Self::Double(_) | Self::Decimal(_) => {
                TypeOrder::Number
            }
            Self::Timestamp(_) => TypeOrder::Timestamp,
            Self::BsonTimestamp { .. } => TypeOrder::BsonTimestamp,
            Self::String(_) => TypeOrder::String,
            Self::Bytes(_) => TypeOrder::Bytes,
            Self::BsonBinary { .. } => TypeOrder::BsonBinary,
            Self::Reference(_) => TypeOrder::Reference,
            Self::ObjectId(_) => TypeOrder::ObjectId,
            Self::GeoPoint(_) => TypeOrder::GeoPoint,
            Self::Regex { .. } => TypeOrder::Regex,
            Self::Array(_) => TypeOrder::Array,
            Self::Vector(_) => TypeOrder::Vector,
            Self::Map(_) => TypeOrder::Map,
            Self::MaxKey => TypeOrder::MaxKey,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_nan(&self) -> bool {
        matches!(self, Self::Double(v) if v.is_nan())
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self.type_order(), TypeOrder::Number)
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Canonical membership test over an array value.
    #[must_use]
    pub fn array_contains(&self, needle: &Self) -> bool {
        self.as_array()
            .is_some_and(|values| values.iter().any(|value| value == needle))
    }

    #[must_use]
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        canonical_cmp(self, other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(self, other)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(values: Vec<Self>) -> Self {
        Self::Array(values)
    }
}
