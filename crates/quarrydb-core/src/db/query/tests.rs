use crate::{
    db::{
        Direction,
        query::{Cursor, Filter, LimitType, OrderBy, Query},
    },
    model::path::{FieldPath, ResourcePath},
    test_support::{array, doc, filter, query},
    value::Value,
};
use std::cmp::Ordering;

#[test]
fn implicit_order_adds_inequality_field_then_key() {
    let q = query("coll").filter(filter("a", ">", 1i64));

    assert_eq!(
        q.order_bys(),
        vec![OrderBy::asc("a"), OrderBy::key(Direction::Asc)]
    );
}

#[test]
fn implicit_key_order_follows_last_explicit_direction() {
    let q = query("coll")
        .order_by(OrderBy::desc("b"))
        .filter(filter("a", "<", 5i64));

    assert_eq!(
        q.order_bys(),
        vec![
            OrderBy::desc("b"),
            OrderBy::desc("a"),
            OrderBy::key(Direction::Desc)
        ]
    );
}

#[test]
fn limit_to_last_flips_order_and_swaps_cursors() {
    let start = Cursor::new(vec![Value::from(1i64)], true);
    let end = Cursor::new(vec![Value::from(9i64)], false);
    let q = query("coll")
        .order_by(OrderBy::asc("a"))
        .start_at(start.clone())
        .end_at(end.clone())
        .limit_to_last(3);

    let target = q.to_target();

    assert_eq!(q.limit_type(), LimitType::Last);
    assert_eq!(
        target.order_bys(),
        &[OrderBy::desc("a"), OrderBy::key(Direction::Desc)]
    );
    assert_eq!(target.start_at(), Some(&end));
    assert_eq!(target.end_at(), Some(&start));
    assert_eq!(target.limit(), Some(3));
}

#[test]
fn dnf_distributes_and_over_or() {
    // (a == 1 || b == 1) && c == 1
    let tree = Filter::And(vec![
        Filter::Or(vec![filter("a", "==", 1i64), filter("b", "==", 1i64)]),
        filter("c", "==", 1i64),
    ]);

    let terms = tree.to_dnf();
    let fields: Vec<Vec<String>> = terms
        .iter()
        .map(|term| term.iter().map(|f| f.field.canonical_string()).collect())
        .collect();

    assert_eq!(fields, vec![vec!["a", "c"], vec!["b", "c"]]);
}

#[test]
fn sub_targets_split_on_or() {
    let q = query("coll").filter(Filter::Or(vec![
        filter("a", "==", 1i64),
        filter("b", "==", 1i64),
    ]));

    let subs = q.to_target().sub_targets();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].field_filters()[0].field, FieldPath::from_dotted("a"));
    assert_eq!(subs[1].field_filters()[0].field, FieldPath::from_dotted("b"));

    let unfiltered = query("coll").to_target();
    assert_eq!(unfiltered.sub_targets(), vec![unfiltered.clone()]);
}

#[test]
fn segment_count_folds_array_filters_into_one_segment() {
    let q = query("coll")
        .filter(filter("tags", "array-contains", 1i64))
        .filter(filter("more", "array-contains-any", array(&[1])))
        .filter(filter("a", "==", 1i64))
        .filter(filter("__name__", "==", Value::Reference(ResourcePath::parse("coll/x"))))
        .order_by(OrderBy::asc("b"));

    assert_eq!(q.to_target().segment_count(), 3);
}

#[test]
fn field_filter_matching_rules() {
    let d = doc(
        "coll/a",
        1,
        &[
            ("n", Value::from(2i64)),
            ("s", Value::from("x")),
            ("tags", array(&[1, 2])),
            ("nil", Value::Null),
        ],
    );

    let cases = [
        (filter("n", "==", 2.0), true),
        (filter("n", "<", 3i64), true),
        (filter("n", "<", "z"), false),
        (filter("s", ">", 1i64), false),
        (filter("n", "!=", 3i64), true),
        (filter("nil", "!=", 3i64), true),
        (filter("nil", "!=", Value::Null), false),
        (filter("n", "!=", f64::NAN), true),
        (filter("missing", "!=", 3i64), false),
        (filter("tags", "array-contains", 2i64), true),
        (filter("n", "array-contains", 2i64), false),
        (filter("tags", "array-contains-any", array(&[5, 1])), true),
        (filter("n", "in", array(&[1, 2])), true),
        (filter("n", "not-in", array(&[1, 2])), false),
        (filter("nil", "not-in", array(&[1])), true),
        (filter("s", "not-in", array(&[1])), true),
    ];

    for (f, expected) in cases {
        assert_eq!(f.matches(&d), expected, "{f:?}");
    }
}

#[test]
fn query_matches_path_collection_group_and_cursors() {
    let d = doc("rooms/r1/messages/m1", 1, &[("n", Value::from(5i64))]);

    assert!(query("rooms/r1/messages").matches(&d));
    assert!(!query("rooms").matches(&d));
    assert!(query("rooms/r1/messages/m1").matches(&d));
    assert!(Query::collection_group("messages").matches(&d));
    assert!(!Query::collection_group("rooms").matches(&d));

    let ordered = query("rooms/r1/messages").order_by(OrderBy::asc("n"));
    let after_five = ordered
        .clone()
        .start_at(Cursor::new(vec![Value::from(5i64)], false));
    let from_five = ordered
        .clone()
        .start_at(Cursor::new(vec![Value::from(5i64)], true));
    let before_five = ordered.end_at(Cursor::new(vec![Value::from(5i64)], false));

    assert!(!after_five.matches(&d));
    assert!(from_five.matches(&d));
    assert!(!before_five.matches(&d));
}

#[test]
fn query_requires_explicit_order_fields() {
    let d = doc("coll/a", 1, &[("n", Value::from(5i64))]);

    assert!(query("coll").order_by(OrderBy::asc("n")).matches(&d));
    assert!(!query("coll").order_by(OrderBy::asc("m")).matches(&d));
}

#[test]
fn compare_uses_full_ordering() {
    let a = doc("coll/a", 1, &[("n", Value::from(1i64))]);
    let b = doc("coll/b", 1, &[("n", Value::from(1i64))]);
    let c = doc("coll/c", 1, &[("n", Value::from(0i64))]);

    let q = query("coll").order_by(OrderBy::desc("n"));

    assert_eq!(q.compare(&a, &c), Ordering::Less);
    // ties break on key in the last explicit direction
    assert_eq!(q.compare(&a, &b), Ordering::Greater);
}

#[test]
fn matches_all_documents_only_without_constraints() {
    assert!(query("coll").matches_all_documents());
    assert!(
        query("coll")
            .order_by(OrderBy::key(Direction::Asc))
            .matches_all_documents()
    );
    assert!(!query("coll").limit_to_first(1).matches_all_documents());
    assert!(
        !query("coll")
            .filter(filter("a", "==", 1i64))
            .matches_all_documents()
    );
}
