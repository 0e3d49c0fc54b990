//! Module: index::matcher
//! Responsibility: decide whether a field index can serve a (sub-)target,
//! and derive the index that would serve it fully.
//! Does not own: scan ranges or entry storage.

use crate::{
    db::{
        index::definition::{FieldIndex, Segment, SegmentKind},
        query::{FieldFilter, OrderBy, Target},
    },
    model::path::FieldPath,
};
use std::collections::BTreeSet;

///
/// TargetIndexMatcher
///
/// Splits one sub-target's filters into equality-style filters (`==`, `in`,
/// `array-contains`, `array-contains-any`) and inequality filters, then
/// matches index segments against them and the target ordering.
///

#[derive(Debug)]
pub(crate) struct TargetIndexMatcher<'a> {
    collection_id: &'a str,
    equality_filters: Vec<&'a FieldFilter>,
    inequality_filters: Vec<&'a FieldFilter>,
    order_bys: &'a [OrderBy],
}

impl<'a> TargetIndexMatcher<'a> {
    pub(crate) fn new(target: &'a Target) -> Self {
        let (inequality_filters, equality_filters) = target
            .field_filters()
            .into_iter()
            .partition(|filter| filter.op.is_inequality());

        Self {
            collection_id: target.collection_id(),
            equality_filters,
            inequality_filters,
            order_bys: target.order_bys(),
        }
    }

    pub(crate) const fn collection_id(&self) -> &'a str {
        self.collection_id
    }

    /// Inequalities on more than one distinct field cannot use an index.
    pub(crate) fn has_multiple_inequality(&self) -> bool {
        let fields: BTreeSet<&FieldPath> = self
            .inequality_filters
            .iter()
            .map(|filter| &filter.field)
            .collect();

        fields.len() > 1
    }

    /// Whether `index` can pre-filter this target.
    ///
    /// Directional segments are consumed greedily by equality filters (in
    /// any order), then at most one segment by the inequality field, which
    /// must also be the next ordering; every remaining segment must follow
    /// the target ordering with matching direction.
    pub(crate) fn served_by_index(&self, index: &FieldIndex) -> bool {
        if index.collection_group != self.collection_id || self.has_multiple_inequality() {
            return false;
        }

        if let Some(array_segment) = index.array_segment()
            && !self.has_matching_equality_filter(array_segment)
        {
            return false;
        }

        let segments = index.directional_segments();
        let mut position = 0;
        let mut equality_fields: BTreeSet<&FieldPath> = BTreeSet::new();

        while position < segments.len() && self.has_matching_equality_filter(segments[position]) {
            equality_fields.insert(&segments[position].field);
            position += 1;
        }

        if position == segments.len() {
            return true;
        }

        // Orderings on equality-bound fields are constant across results.
        let mut order_bys = self
            .order_bys
            .iter()
            .filter(|order_by| !equality_fields.contains(&order_by.field));

        if let Some(inequality) = self.inequality_filters.first()
            && !equality_fields.contains(&inequality.field)
        {
            let segment = segments[position];
            let Some(order_by) = order_bys.next() else {
                return false;
            };
            if !matches_filter(inequality, segment) || !matches_order_by(order_by, segment) {
                return false;
            }
            position += 1;
        }

        segments[position..].iter().all(|segment| {
            order_bys
                .next()
                .is_some_and(|order_by| matches_order_by(order_by, segment))
        })
    }

    /// Index that would fully serve this target, or `None` when inequalities
    /// span several fields.
    ///
    /// Equality fields come first as ascending segments (array filters as a
    /// single contains segment), followed by the ordering fields.
    pub(crate) fn build_target_index(&self) -> Option<FieldIndex> {
        if self.has_multiple_inequality() {
            return None;
        }

        let mut unique_fields: BTreeSet<&FieldPath> = BTreeSet::new();
        let mut segments = Vec::new();
        let mut has_array_segment = false;

        for filter in &self.equality_filters {
            if filter.field.is_key_field() {
                continue;
            }
            if filter.op.is_array_operator() {
                if !has_array_segment {
                    has_array_segment = true;
                    segments.push(Segment::new(filter.field.clone(), SegmentKind::Contains));
                }
            } else if unique_fields.insert(&filter.field) {
                segments.push(Segment::new(filter.field.clone(), SegmentKind::Ascending));
            }
        }

        for order_by in self.order_bys {
            if order_by.field.is_key_field() || !unique_fields.insert(&order_by.field) {
                continue;
            }
            segments.push(Segment::new(
                order_by.field.clone(),
                SegmentKind::from_direction(order_by.direction),
            ));
        }

        Some(FieldIndex::new(self.collection_id, segments))
    }

    fn has_matching_equality_filter(&self, segment: &Segment) -> bool {
        self.equality_filters
            .iter()
            .any(|filter| matches_filter(filter, segment))
    }
}

fn matches_filter(filter: &FieldFilter, segment: &Segment) -> bool {
    filter.field == segment.field
        && (segment.kind == SegmentKind::Contains) == filter.op.is_array_operator()
}

fn matches_order_by(order_by: &OrderBy, segment: &Segment) -> bool {
    order_by.field == segment.field && segment.kind.direction() == Some(order_by.direction)
}
