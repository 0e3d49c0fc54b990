///
/// TypeOrder
///
/// Cross-type ordering of values. Variant order is the canonical order:
/// a value of an earlier variant sorts before every value of a later one.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TypeOrder {
    Null,
    MinKey,
    Boolean,
    Number,
    Timestamp,
    BsonTimestamp,
    String,
    Bytes,
    BsonBinary,
    Reference,
    ObjectId,
    GeoPoint,
    Regex,
    Array,
    Vector,
    Map,
    MaxKey,
}
