use crate::{
    db::{
        Direction,
        query::{
            filter::{FieldFilter, Filter},
            order::{Cursor, OrderBy},
        },
    },
    model::path::{FieldPath, ResourcePath},
};
use std::collections::BTreeSet;

///
/// Target
///
/// Normalized form of a query as the index layer sees it: order-bys are
/// complete (key ordering included) and already flipped for limit-to-last.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    pub(crate) path: ResourcePath,
    pub(crate) collection_group: Option<String>,
    pub(crate) filters: Vec<Filter>,
    pub(crate) order_bys: Vec<OrderBy>,
    pub(crate) limit: Option<u32>,
    pub(crate) start_at: Option<Cursor>,
    pub(crate) end_at: Option<Cursor>,
}

impl Target {
    #[must_use]
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    #[must_use]
    pub fn collection_group(&self) -> Option<&str> {
        self.collection_group.as_deref()
    }

    /// Collection id that indexes for this target are defined on.
    #[must_use]
    pub fn collection_id(&self) -> &str {
        self.collection_group
            .as_deref()
            .or_else(|| self.path.last_segment())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn order_bys(&self) -> &[OrderBy] {
        &self.order_bys
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub const fn has_limit(&self) -> bool {
        self.limit.is_some()
    }

    #[must_use]
    pub const fn start_at(&self) -> Option<&Cursor> {
        self.start_at.as_ref()
    }

    #[must_use]
    pub const fn end_at(&self) -> Option<&Cursor> {
        self.end_at.as_ref()
    }

    /// Direction of the trailing key ordering.
    #[must_use]
    pub fn key_order(&self) -> Direction {
        self.order_bys
            .last()
            .map_or(Direction::Asc, |order_by| order_by.direction)
    }

    /// Field filters of this target's top-level conjunction, flattened.
    #[must_use]
    pub fn field_filters(&self) -> Vec<&FieldFilter> {
        self.filters.iter().flat_map(Filter::flattened).collect()
    }

    /// One target per DNF term of the filters; a target without filters is
    /// its own single sub-target.
    #[must_use]
    pub fn sub_targets(&self) -> Vec<Self> {
        if self.filters.is_empty() {
            return vec![self.clone()];
        }

        Filter::And(self.filters.clone())
            .to_dnf()
            .into_iter()
            .map(|term| Self {
                filters: term.into_iter().map(Filter::Field).collect(),
                ..self.clone()
            })
            .collect()
    }

    /// Number of index segments a fully covering index would need.
    ///
    /// Array filters share one segment; key-field filters and orderings are
    /// served by the entry key itself.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let mut fields: BTreeSet<&FieldPath> = BTreeSet::new();
        let mut has_array_segment = false;

        for filter in self.field_filters() {
            if filter.field.is_key_field() {
                continue;
            }
            if filter.op.is_array_operator() {
                has_array_segment = true;
            } else {
                fields.insert(&filter.field);
            }
        }
        for order_by in &self.order_bys {
            if !order_by.field.is_key_field() {
                fields.insert(&order_by.field);
            }
        }

        fields.len() + usize::from(has_array_segment)
    }

    /// Filters on `field` in this target's conjunction.
    pub(crate) fn filters_on<'a>(
        &'a self,
        field: &'a FieldPath,
    ) -> impl Iterator<Item = &'a FieldFilter> + 'a {
        self.field_filters()
            .into_iter()
            .filter(move |filter| &filter.field == field)
    }

    #[must_use]
    pub fn without_limit(&self) -> Self {
        Self {
            limit: None,
            ..self.clone()
        }
    }
}
