use crate::value::{Value, number};
use std::{cmp::Ordering, collections::BTreeMap};

/// Total canonical order over values.
///
/// Values of different type orders compare by type order; values of the
/// same type order compare by content.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = left.type_order().cmp(&right.type_order());
    if rank != Ordering::Equal {
        return rank;
    }

    compare_same_type(left, right)
}

fn compare_same_type(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        (
            Value::BsonTimestamp {
                seconds: sa,
                increment: ia,
            },
            Value::BsonTimestamp {
                seconds: sb,
                increment: ib,
            },
        ) => sa.cmp(sb).then_with(|| ia.cmp(ib)),
        (Value::String(a), Value::String(b)) | (Value::ObjectId(a), Value::ObjectId(b)) => {
            // UTF-8 byte order is code point order.
            a.cmp(b)
        }
        (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
        (
            Value::BsonBinary {
                subtype: sa,
                data: da,
            },
            Value::BsonBinary {
                subtype: sb,
                data: db,
            },
        ) => sa.cmp(sb).then_with(|| da.cmp(db)),
        (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
        (Value::GeoPoint(a), Value::GeoPoint(b)) => compare_f64(a.latitude, b.latitude)
            .then_with(|| compare_f64(a.longitude, b.longitude)),
        (
            Value::Regex {
                pattern: pa,
                options: oa,
            },
            Value::Regex {
                pattern: pb,
                options: ob,
            },
        ) => pa.cmp(pb).then_with(|| oa.cmp(ob)),
        (Value::Array(a), Value::Array(b)) => compare_arrays(a, b),
        (Value::Vector(a), Value::Vector(b)) => compare_vectors(a, b),
        (Value::Map(a), Value::Map(b)) => compare_maps(a, b),
        _ if left.is_number() => number::compare_numbers(left, right),

        // Null, MinKey, MaxKey: a single value each.
        _ => Ordering::Equal,
    }
}

/// Total order over doubles: NaN first and self-equal, `-0.0 == 0.0`.
pub(crate) fn compare_f64(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
    }
}

fn compare_arrays(left: &[Value], right: &[Value]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let cmp = canonical_cmp(a, b);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}

// Vectors order by dimension first.
fn compare_vectors(left: &[f64], right: &[f64]) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| {
        left.iter()
            .zip(right)
            .map(|(a, b)| compare_f64(*a, *b))
            .find(|cmp| *cmp != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    })
}

fn compare_maps(left: &BTreeMap<String, Value>, right: &BTreeMap<String, Value>) -> Ordering {
    for ((ka, va), (kb, vb)) in left.iter().zip(right) {
        let cmp = ka.cmp(kb).then_with(|| canonical_cmp(va, vb));
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}
