use super::{
    FieldIndex, Segment, TargetIndexMatcher,
    bound::{IndexScan, plan_scans},
};
use crate::{
    db::{
        Direction,
        codec::{encode_value, prefix_successor},
        query::{Cursor, OrderBy, Query},
    },
    test_support::{array, filter, query},
    value::Value,
};

fn index(segments: Vec<Segment>) -> FieldIndex {
    FieldIndex {
        index_id: 1,
        ..FieldIndex::new("coll", segments)
    }
}

fn served(q: &Query, segments: Vec<Segment>) -> bool {
    TargetIndexMatcher::new(&q.to_target()).served_by_index(&index(segments))
}

fn asc(value: i64) -> Vec<u8> {
    encode_value(&Value::from(value), Direction::Asc)
}

//
// Matcher
//

#[test]
fn equality_segments_match_in_any_order() {
    let q = query("coll")
        .filter(filter("a", "==", 1i64))
        .filter(filter("b", "in", array(&[1, 2])));

    assert!(served(&q, vec![Segment::asc("b"), Segment::asc("a")]));
    assert!(served(&q, vec![Segment::desc("a")]));
    assert!(!served(&q, vec![Segment::asc("c")]));
}

#[test]
fn inequality_segment_must_follow_equalities_and_match_order() {
    let q = query("coll")
        .filter(filter("a", "==", 1i64))
        .filter(filter("b", ">", 1i64));

    assert!(served(&q, vec![Segment::asc("a"), Segment::asc("b")]));
    assert!(served(&q, vec![Segment::asc("b")]));
    assert!(!served(&q, vec![Segment::desc("b")]));
    assert!(!served(&q, vec![Segment::asc("b"), Segment::asc("a"), Segment::asc("c")]));
}

#[test]
fn trailing_segments_must_follow_ordering() {
    let q = query("coll")
        .filter(filter("a", "==", 1i64))
        .order_by(OrderBy::asc("b"))
        .order_by(OrderBy::desc("c"));

    assert!(served(&q, vec![Segment::asc("a"), Segment::asc("b")]));
    assert!(served(
        &q,
        vec![Segment::asc("a"), Segment::asc("b"), Segment::desc("c")]
    ));
    assert!(!served(&q, vec![Segment::asc("a"), Segment::asc("c")]));
    assert!(!served(
        &q,
        vec![Segment::asc("a"), Segment::asc("b"), Segment::asc("c")]
    ));
}

#[test]
fn contains_segment_needs_an_array_filter() {
    let contains = query("coll").filter(filter("tags", "array-contains", "x"));
    let equal = query("coll").filter(filter("tags", "==", "x"));

    assert!(served(&contains, vec![Segment::contains("tags")]));
    assert!(!served(&contains, vec![Segment::asc("tags")]));
    assert!(!served(&equal, vec![Segment::contains("tags")]));
}

#[test]
fn indexes_of_other_groups_never_serve() {
    let q = query("coll").filter(filter("a", "==", 1i64));
    let other = FieldIndex::new("other", vec![Segment::asc("a")]);

    assert!(!TargetIndexMatcher::new(&q.to_target()).served_by_index(&other));
}

#[test]
fn build_target_index_orders_equalities_then_orderings() {
    let q = query("coll")
        .filter(filter("b", "==", 1i64))
        .filter(filter("tags", "array-contains-any", array(&[1])))
        .filter(filter("b", "in", array(&[1, 2])))
        .filter(filter("c", "<", 3i64))
        .order_by(OrderBy::desc("c"));

    let built = TargetIndexMatcher::new(&q.to_target())
        .build_target_index()
        .expect("single inequality should build");

    assert_eq!(built.collection_group, "coll");
    assert_eq!(
        built.segments,
        vec![
            Segment::asc("b"),
            Segment::contains("tags"),
            Segment::desc("c")
        ]
    );
}

#[test]
fn build_target_index_rejects_multiple_inequalities() {
    let q = query("coll")
        .filter(filter("a", ">", 1i64))
        .filter(filter("b", "!=", 1i64));

    assert!(
        TargetIndexMatcher::new(&q.to_target())
            .build_target_index()
            .is_none()
    );
}

//
// Bounds
//

#[test]
fn equality_scan_covers_one_prefix() {
    let q = query("coll").filter(filter("a", "==", 2i64));
    let plan = plan_scans(&q.to_target(), &index(vec![Segment::asc("a")]));

    assert!(plan.exact);
    assert_eq!(
        plan.scans,
        vec![IndexScan {
            array_value: Vec::new(),
            lower: asc(2),
            upper: prefix_successor(&asc(2)),
        }]
    );
}

#[test]
fn not_equal_splits_around_the_excluded_value() {
    let q = query("coll").filter(filter("a", "!=", 2i64));
    let plan = plan_scans(&q.to_target(), &index(vec![Segment::asc("a")]));

    assert_eq!(plan.scans.len(), 2);
    assert_eq!(plan.scans[0].upper, Some(asc(2)));
    assert_eq!(Some(plan.scans[1].lower.clone()), prefix_successor(&asc(2)));
    assert_eq!(plan.scans[1].upper, None);
}

#[test]
fn contradictory_range_yields_no_scan() {
    let q = query("coll")
        .filter(filter("a", ">", 5i64))
        .filter(filter("a", "<", 3i64));
    let plan = plan_scans(&q.to_target(), &index(vec![Segment::asc("a")]));

    assert!(plan.scans.is_empty());
}

#[test]
fn in_and_array_values_multiply_scans() {
    let q = query("coll")
        .filter(filter("a", "in", array(&[1, 2, 2])))
        .filter(filter("tags", "array-contains-any", array(&[7, 8])));
    let plan = plan_scans(
        &q.to_target(),
        &index(vec![Segment::contains("tags"), Segment::asc("a")]),
    );

    assert_eq!(plan.scans.len(), 4);
    assert!(plan.exact);
}

#[test]
fn unindexed_or_key_filters_make_scans_inexact() {
    let extra = query("coll")
        .filter(filter("a", "==", 1i64))
        .filter(filter("b", "==", 1i64));
    let keyed = query("coll")
        .filter(filter("a", "==", 1i64))
        .filter(filter(
            "__name__",
            "==",
            Value::Reference(crate::model::path::ResourcePath::parse("coll/x")),
        ));
    let by_a = index(vec![Segment::asc("a")]);

    assert!(!plan_scans(&extra.to_target(), &by_a).exact);
    assert!(!plan_scans(&keyed.to_target(), &by_a).exact);
}

#[test]
fn cursor_tightens_but_never_widens() {
    let q = query("coll")
        .filter(filter("a", ">=", 5i64))
        .order_by(OrderBy::asc("a"))
        .start_at(Cursor::new(vec![Value::from(1i64)], true))
        .end_at(Cursor::new(vec![Value::from(8i64)], false));
    let plan = plan_scans(&q.to_target(), &index(vec![Segment::asc("a")]));

    assert!(!plan.exact);
    assert_eq!(plan.scans.len(), 1);
    assert_eq!(plan.scans[0].lower, asc(5));
    assert_eq!(plan.scans[0].upper, Some(asc(8)));
}

#[test]
fn cursor_disagreeing_with_equality_is_ignored() {
    let q = query("coll")
        .filter(filter("a", "==", 1i64))
        .order_by(OrderBy::asc("a"))
        .order_by(OrderBy::asc("b"))
        .start_at(Cursor::new(vec![Value::from(0i64), Value::from(9i64)], true));
    let plan = plan_scans(
        &q.to_target(),
        &index(vec![Segment::asc("a"), Segment::asc("b")]),
    );

    assert_eq!(plan.scans[0].lower, asc(1));
}
