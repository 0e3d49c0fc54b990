//! Module: index::bound
//! Responsibility: translate one conjunctive target into byte ranges over
//! the directional values of a single field index.
//! Does not own: index selection (see `matcher`) or entry storage.
//!
//! A scan covers the directional values in `[lower, upper)`. Each range is
//! built from three parts: the equality prefix (one alternative per `in`
//! operand combination), an interval on the inequality segment, and the
//! cursor positions, which can only narrow the filter-derived range.
//! Missing trailing components match every value because encodings are
//! prefix-free; the document key breaks ties inside the entry order.

use crate::{
    db::{
        Direction,
        codec::{
            encode_value, encode_value_into, inverted, prefix_successor, type_end, type_start,
        },
        index::definition::{FieldIndex, Segment},
        query::{Cursor, FieldFilter, Operator, Target},
    },
    model::path::FieldPath,
    value::{TypeOrder, Value},
};
use std::collections::BTreeSet;

///
/// IndexScan
///
/// One contiguous scan over entries sharing `array_value`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct IndexScan {
    pub(crate) array_value: Vec<u8>,
    pub(crate) lower: Vec<u8>,
    pub(crate) upper: Option<Vec<u8>>,
}

///
/// ScanPlan
///
/// Scans whose union pre-filters a target. `exact` is set when every key in
/// the union satisfies all of the target's filters and cursors, so results
/// read in entry order may be truncated to the target limit directly.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ScanPlan {
    pub(crate) scans: Vec<IndexScan>,
    pub(crate) exact: bool,
}

///
/// Interval
///
/// Half-open interval `[start, end)` over ascending value encodings;
/// `end = None` is unbounded.
///

#[derive(Clone, Debug, Eq, PartialEq)]
struct Interval {
    start: Vec<u8>,
    end: Option<Vec<u8>>,
}

impl Interval {
    const fn unbounded() -> Self {
        Self {
            start: Vec::new(),
            end: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.end.as_ref().is_some_and(|end| *end <= self.start)
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.clone().max(other.start.clone());
        let end = min_upper(self.end.clone(), other.end.clone());
        let interval = Self { start, end };

        (!interval.is_empty()).then_some(interval)
    }

    /// Map to the byte space of a segment with `direction`, prefixed by the
    /// equality prefix. Descending flips the interval through complement.
    fn to_scan_range(
        &self,
        prefix: &[u8],
        direction: Direction,
    ) -> Option<(Vec<u8>, Option<Vec<u8>>)> {
        let (lower, upper) = match direction {
            Direction::Asc => (self.start.clone(), self.end.clone()),
            Direction::Desc => {
                let lower = match &self.end {
                    Some(end) => prefix_successor(&inverted(end))?,
                    None => Vec::new(),
                };
                (lower, prefix_successor(&inverted(&self.start)))
            }
        };

        let lower = concat(prefix, &lower);
        let upper = match upper {
            Some(upper) => Some(concat(prefix, &upper)),
            None => prefix_successor(prefix),
        };

        Some((lower, upper))
    }
}

/// Build the scans that serve `target` (a single DNF term) from `index`.
pub(crate) fn plan_scans(target: &Target, index: &FieldIndex) -> ScanPlan {
    let Some(array_values) = array_values(target, index) else {
        return ScanPlan::default();
    };

    let directional = index.directional_segments();
    let mut exact = !target.field_filters().iter().any(|f| f.field.is_key_field());
    let mut covered: BTreeSet<&FieldPath> = BTreeSet::new();
    if let Some(segment) = index.array_segment() {
        covered.insert(&segment.field);
        exact &= target.filters_on(&segment.field).count() == 1;
    }

    // equality prefix
    let mut prefixes: Vec<Vec<u8>> = vec![Vec::new()];
    let mut equality_values: Vec<(&FieldPath, Option<&Value>)> = Vec::new();
    let mut position = 0;
    while let Some(segment) = directional.get(position) {
        let Some(direction) = segment.kind.direction() else {
            break;
        };
        let filters: Vec<&FieldFilter> = target
            .filters_on(&segment.field)
            .filter(|f| !f.op.is_array_operator())
            .collect();
        let Some(filter) = filters
            .iter()
            .copied()
            .find(|f| matches!(f.op, Operator::Equal | Operator::In))
        else {
            break;
        };

        let operands: Vec<&Value> = match filter.op {
            Operator::Equal => vec![&filter.value],
            _ => filter.operands().iter().collect(),
        };
        prefixes = expand_prefixes(&prefixes, &operands, direction);
        exact &= filters.len() == 1;
        equality_values.push((
            &segment.field,
            (filter.op == Operator::Equal).then_some(&filter.value),
        ));
        covered.insert(&segment.field);
        position += 1;
    }

    // inequality segment
    let mut range: Option<(Vec<Interval>, Direction)> = None;
    if let Some(segment) = directional.get(position)
        && let Some(direction) = segment.kind.direction()
    {
        let filters: Vec<&FieldFilter> = target
            .filters_on(&segment.field)
            .filter(|f| f.op.is_inequality())
            .collect();
        if !filters.is_empty() {
            let intervals = filters
                .iter()
                .fold(vec![Interval::unbounded()], |acc, filter| {
                    intersect_all(&acc, &filter_intervals(filter))
                });
            exact &= filters.iter().all(|f| !is_unordered_operand(&f.value));
            covered.insert(&segment.field);
            range = Some((intervals, direction));
        }
    }

    exact &= target
        .field_filters()
        .iter()
        .all(|f| covered.contains(&f.field));

    let cursor_bounds = cursor_bounds(target, &directional[position..], &equality_values);
    if target.start_at().is_some() || target.end_at().is_some() {
        exact = false;
    }

    let intervals = range.as_ref().map_or_else(
        || vec![(Interval::unbounded(), Direction::Asc)],
        |(intervals, direction)| intervals.iter().map(|i| (i.clone(), *direction)).collect(),
    );

    let mut scans = Vec::new();
    for prefix in &prefixes {
        for (interval, direction) in &intervals {
            let Some((mut lower, mut upper)) = interval.to_scan_range(prefix, *direction) else {
                continue;
            };
            if let Some(bounds) = &cursor_bounds {
                let Some((cursor_lower, cursor_upper)) = bounds.resolve(prefix) else {
                    continue;
                };
                lower = lower.max(cursor_lower);
                upper = min_upper(upper, cursor_upper);
            }
            if upper.as_ref().is_some_and(|upper| *upper <= lower) {
                continue;
            }
            for array_value in &array_values {
                scans.push(IndexScan {
                    array_value: array_value.clone(),
                    lower: lower.clone(),
                    upper: upper.clone(),
                });
            }
        }
    }

    ScanPlan { scans, exact }
}

// Array values to look up: one for `array-contains`, each operand for
// `array-contains-any`, and a single empty value for indexes without a
// contains segment. `None` when the contains segment has no filter.
fn array_values(target: &Target, index: &FieldIndex) -> Option<Vec<Vec<u8>>> {
    let Some(segment) = index.array_segment() else {
        return Some(vec![Vec::new()]);
    };

    let filter = target
        .filters_on(&segment.field)
        .find(|f| f.op.is_array_operator())?;
    let values: BTreeSet<Vec<u8>> = filter
        .operands()
        .iter()
        .map(|value| encode_value(value, Direction::Asc))
        .collect();

    Some(values.into_iter().collect())
}

fn expand_prefixes(
    prefixes: &[Vec<u8>],
    operands: &[&Value],
    direction: Direction,
) -> Vec<Vec<u8>> {
    let mut expanded = BTreeSet::new();
    for prefix in prefixes {
        for operand in operands {
            let mut key = prefix.clone();
            encode_value_into(&mut key, operand, direction);
            expanded.insert(key);
        }
    }

    expanded.into_iter().collect()
}

/// Ascending intervals admitted by one inequality filter.
fn filter_intervals(filter: &FieldFilter) -> Vec<Interval> {
    let order = filter.value.type_order();
    let encoded = encode_value(&filter.value, Direction::Asc);

    match filter.op {
        Operator::LessThan => vec![Interval {
            start: type_start(order),
            end: Some(encoded),
        }],
        Operator::LessThanOrEqual => vec![Interval {
            start: type_start(order),
            end: prefix_successor(&encoded),
        }],
        Operator::GreaterThan => prefix_successor(&encoded)
            .map(|start| Interval {
                start,
                end: Some(type_end(order)),
            })
            .into_iter()
            .collect(),
        Operator::GreaterThanOrEqual => vec![Interval {
            start: encoded,
            end: Some(type_end(order)),
        }],
        Operator::NotEqual => excluded_points(std::slice::from_ref(&filter.value)),
        Operator::NotIn => excluded_points(filter.operands()),
        _ => vec![Interval::unbounded()],
    }
}

/// Every value except the excluded ones, as the gaps between the sorted
/// excluded encodings. Null stays in range unless it is itself excluded.
fn excluded_points(values: &[Value]) -> Vec<Interval> {
    let points: BTreeSet<Vec<u8>> = values
        .iter()
        .map(|value| encode_value(value, Direction::Asc))
        .collect();

    let mut start = type_start(TypeOrder::Null);
    let mut intervals = Vec::new();
    for point in points {
        if point < start {
            continue;
        }
        if point > start {
            intervals.push(Interval {
                start: start.clone(),
                end: Some(point.clone()),
            });
        }
        match prefix_successor(&point) {
            Some(next) => start = next,
            None => return intervals,
        }
    }
    intervals.push(Interval { start, end: None });

    intervals
}

fn intersect_all(left: &[Interval], right: &[Interval]) -> Vec<Interval> {
    left.iter()
        .flat_map(|l| right.iter().filter_map(|r| l.intersect(r)))
        .collect()
}

// NaN and null relational operands match nothing in memory, but their byte
// ranges are not empty.
fn is_unordered_operand(value: &Value) -> bool {
    value.is_nan() || value.is_null()
}

///
/// CursorBounds
///
/// Cursor positions encoded against the index segments that follow the
/// equality prefix. Positions beyond the encoded components (or on the
/// document key) are dropped, which widens the bound to be inclusive.
///

#[derive(Debug)]
struct CursorBounds {
    lower: Option<(Vec<u8>, bool)>,
    upper: Option<(Vec<u8>, bool)>,
}

impl CursorBounds {
    /// Absolute `[lower, upper)` for one equality prefix; `None` when the
    /// cursors exclude every key under it.
    fn resolve(&self, prefix: &[u8]) -> Option<(Vec<u8>, Option<Vec<u8>>)> {
        let lower = match &self.lower {
            Some((components, true)) => concat(prefix, components),
            Some((components, false)) => prefix_successor(&concat(prefix, components))?,
            None => prefix.to_vec(),
        };
        let upper = match &self.upper {
            Some((components, true)) => prefix_successor(&concat(prefix, components)),
            Some((components, false)) => Some(concat(prefix, components)),
            None => prefix_successor(prefix),
        };

        Some((lower, upper))
    }
}

fn cursor_bounds(
    target: &Target,
    segments: &[&Segment],
    equality_values: &[(&FieldPath, Option<&Value>)],
) -> Option<CursorBounds> {
    let lower = target
        .start_at()
        .and_then(|cursor| encode_cursor(target, cursor, segments, equality_values));
    let upper = target
        .end_at()
        .and_then(|cursor| encode_cursor(target, cursor, segments, equality_values));

    (lower.is_some() || upper.is_some()).then_some(CursorBounds { lower, upper })
}

/// Encode the leading cursor components that line up with `segments`.
/// Returns `(bytes, inclusive)`; `None` when no component can be used.
fn encode_cursor(
    target: &Target,
    cursor: &Cursor,
    segments: &[&Segment],
    equality_values: &[(&FieldPath, Option<&Value>)],
) -> Option<(Vec<u8>, bool)> {
    let mut encoded = Vec::new();
    let mut used = 0;
    let mut truncated = false;

    for (order_by, value) in target.order_bys().iter().zip(&cursor.position) {
        if let Some((_, equal)) = equality_values.iter().find(|(f, _)| **f == order_by.field) {
            // constant across the scan; only usable if the cursor agrees
            if *equal == Some(value) {
                continue;
            }
            return None;
        }
        let Some(segment) = segments.get(used) else {
            truncated = true;
            break;
        };
        if segment.field != order_by.field || segment.kind.direction() != Some(order_by.direction) {
            truncated = true;
            break;
        }
        encode_value_into(&mut encoded, value, order_by.direction);
        used += 1;
    }

    truncated |= cursor.position.len() > target.order_bys().len();
    (used > 0).then_some((encoded, cursor.inclusive || truncated))
}

fn min_upper(left: Option<Vec<u8>>, right: Option<Vec<u8>>) -> Option<Vec<u8>> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.min(r)),
        (l, None) => l,
        (None, r) => r,
    }
}

fn concat(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + suffix.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(suffix);

    out
}
