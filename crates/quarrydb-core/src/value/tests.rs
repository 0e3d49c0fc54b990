use crate::{
    model::path::ResourcePath,
    types::{Decimal, GeoPoint, Timestamp},
    value::{TypeOrder, Value, canonical_cmp, number::NumberParts},
};
use std::cmp::Ordering;

fn dec(literal: &str) -> Value {
    Value::Decimal(Decimal::parse(literal).expect("decimal literal should parse"))
}

fn reference(path: &str) -> Value {
    Value::Reference(ResourcePath::parse(path))
}

/// Groups in ascending order; values inside a group are canonically equal.
fn ordered_groups() -> Vec<Vec<Value>> {
    vec![
        vec![Value::Null],
        vec![Value::MinKey],
        vec![Value::Bool(false)],
        vec![Value::Bool(true)],
        vec![Value::Double(f64::NAN)],
        vec![Value::Double(f64::NEG_INFINITY)],
        vec![Value::Integer(i64::MIN), dec("-9223372036854775808")],
        vec![Value::Double(-1.5), dec("-1.5")],
        vec![Value::Integer(-1), Value::Int32(-1), Value::Double(-1.0), dec("-1.0")],
        vec![dec("-0.1")],
        vec![
            Value::Integer(0),
            Value::Int32(0),
            Value::Double(0.0),
            Value::Double(-0.0),
            dec("0"),
            dec("-0.00"),
        ],
        vec![Value::Double(f64::MIN_POSITIVE)],
        vec![dec("0.1")],
        vec![Value::Double(0.1)],
        vec![Value::Integer(1), Value::Int32(1), Value::Double(1.0), dec("1.000")],
        vec![dec("1.1")],
        vec![Value::Double(1.1)],
        vec![Value::Integer(i64::MAX)],
        vec![Value::Double(9.223_372_036_854_775_808e18)],
        vec![Value::Double(f64::MAX)],
        vec![Value::Double(f64::INFINITY)],
        vec![Value::Timestamp(Timestamp::new(-1, 0))],
        vec![Value::Timestamp(Timestamp::new(100, 0))],
        vec![Value::Timestamp(Timestamp::new(100, 1))],
        vec![Value::BsonTimestamp {
            seconds: 1,
            increment: 2,
        }],
        vec![Value::BsonTimestamp {
            seconds: 2,
            increment: 1,
        }],
        vec![Value::from("")],
        vec![Value::from("\u{0}")],
        vec![Value::from("a")],
        vec![Value::from("ab")],
        vec![Value::from("\u{ff61}")],
        vec![Value::from("\u{1f600}")],
        vec![Value::Bytes(vec![])],
        vec![Value::Bytes(vec![0])],
        vec![Value::Bytes(vec![0, 1])],
        vec![Value::Bytes(vec![255])],
        vec![Value::BsonBinary {
            subtype: 1,
            data: vec![9],
        }],
        vec![Value::BsonBinary {
            subtype: 2,
            data: vec![0],
        }],
        vec![reference("c1/doc1")],
        vec![reference("c1/doc1/c2/doc1")],
        vec![reference("c1/doc2")],
        vec![reference("c2/doc1")],
        vec![Value::ObjectId("507f191e810c19729de860ea".to_string())],
        vec![Value::GeoPoint(GeoPoint::new(-90.0, 0.0))],
        vec![Value::GeoPoint(GeoPoint::new(0.0, -180.0))],
        vec![Value::GeoPoint(GeoPoint::new(0.0, 10.0))],
        vec![Value::Regex {
            pattern: "^a".to_string(),
            options: "i".to_string(),
        }],
        vec![Value::Array(vec![])],
        vec![Value::Array(vec![Value::Null])],
        vec![Value::Array(vec![Value::Integer(1)])],
        vec![Value::Array(vec![Value::Integer(1), Value::Integer(2)])],
        vec![Value::Array(vec![Value::Integer(2)])],
        vec![Value::Vector(vec![100.0])],
        vec![Value::Vector(vec![1.0, 2.0])],
        vec![Value::Vector(vec![1.0, 3.0])],
        vec![Value::map::<_, String>([])],
        vec![Value::map([("a", Value::Integer(1))])],
        vec![Value::map([("a", Value::Integer(1)), ("b", Value::Integer(0))])],
        vec![Value::map([("a", Value::Integer(2))])],
        vec![Value::map([("b", Value::Integer(0))])],
        vec![Value::MaxKey],
    ]
}

#[test]
fn canonical_order_matches_groups() {
    let groups = ordered_groups();

    for (i, left_group) in groups.iter().enumerate() {
        for (j, right_group) in groups.iter().enumerate() {
            for left in left_group {
                for right in right_group {
                    assert_eq!(
                        canonical_cmp(left, right),
                        i.cmp(&j),
                        "comparing {left:?} with {right:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn type_order_follows_canonical_sequence() {
    assert!(TypeOrder::Null < TypeOrder::MinKey);
    assert!(TypeOrder::Number < TypeOrder::Timestamp);
    assert!(TypeOrder::Reference < TypeOrder::GeoPoint);
    assert!(TypeOrder::Array < TypeOrder::Vector);
    assert!(TypeOrder::Vector < TypeOrder::Map);
    assert!(TypeOrder::Map < TypeOrder::MaxKey);
}

#[test]
fn nan_is_self_equal_and_first_number() {
    let nan = Value::Double(f64::NAN);

    assert_eq!(nan, Value::Double(f64::NAN));
    assert_eq!(canonical_cmp(&nan, &Value::Double(f64::NEG_INFINITY)), Ordering::Less);
    assert_eq!(canonical_cmp(&nan, &dec("-1e20")), Ordering::Less);
}

#[test]
fn signed_zero_is_equal() {
    assert_eq!(Value::Double(-0.0), Value::Double(0.0));
    assert_eq!(Value::Double(-0.0), Value::Integer(0));
}

#[test]
fn decimal_literal_is_not_equal_to_nearest_double() {
    assert_ne!(dec("1.1"), Value::Double(1.1));
    assert_eq!(dec("1.5"), Value::Double(1.5));
}

#[test]
fn integer_and_double_compare_exactly_near_precision_edge() {
    // 2^53 + 1 is not representable as a double.
    let int = Value::Integer(9_007_199_254_740_993);
    let double = Value::Double(9_007_199_254_740_992.0);

    assert_eq!(canonical_cmp(&int, &double), Ordering::Greater);
    assert_eq!(canonical_cmp(&double, &int), Ordering::Less);
}

#[test]
fn array_contains_uses_canonical_equality() {
    let array = Value::Array(vec![Value::Integer(1), Value::Double(f64::NAN)]);

    assert!(array.array_contains(&Value::Double(1.0)));
    assert!(array.array_contains(&Value::Double(f64::NAN)));
    assert!(!array.array_contains(&Value::Integer(2)));
    assert!(!Value::Integer(1).array_contains(&Value::Integer(1)));
}

#[test]
fn number_parts_round_trip_to_narrowest_kind() {
    let cases = [
        (Value::Double(1.0), Value::Integer(1)),
        (Value::Int32(-7), Value::Integer(-7)),
        (Value::Double(0.5), Value::Double(0.5)),
        (dec("0.1"), dec("0.1")),
        (Value::Double(1e300), Value::Double(1e300)),
    ];

    for (input, expected) in cases {
        let parts = NumberParts::from_value(&input).expect("numeric input");
        let rebuilt = parts.to_value();

        assert_eq!(rebuilt, input);
        assert_eq!(
            std::mem::discriminant(&rebuilt),
            std::mem::discriminant(&expected),
            "rebuilt kind for {input:?}"
        );
    }
}
