use crate::{
    db::{
        Direction,
        query::{
            filter::Filter,
            order::{Cursor, OrderBy},
            target::Target,
        },
    },
    model::{
        document::Document,
        key::DocumentKey,
        path::{FieldPath, ResourcePath},
    },
};
use std::cmp::Ordering;

///
/// LimitType
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LimitType {
    #[default]
    First,
    Last,
}

///
/// Query
///
/// A collection, collection-group, or single-document query with its
/// filters, explicit ordering, limit, and cursors.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    path: ResourcePath,
    collection_group: Option<String>,
    filters: Vec<Filter>,
    explicit_order_bys: Vec<OrderBy>,
    limit: Option<u32>,
    limit_type: LimitType,
    start_at: Option<Cursor>,
    end_at: Option<Cursor>,
}

impl Query {
    /// Query the documents directly under `path` (or the single document at
    /// `path` when it names one).
    #[must_use]
    pub const fn at_path(path: ResourcePath) -> Self {
        Self {
            path,
            collection_group: None,
            filters: Vec::new(),
            explicit_order_bys: Vec::new(),
            limit: None,
            limit_type: LimitType::First,
            start_at: None,
            end_at: None,
        }
    }

    /// Query every collection named `collection_id`, wherever it lives.
    #[must_use]
    pub fn collection_group(collection_id: impl Into<String>) -> Self {
        Self {
            collection_group: Some(collection_id.into()),
            ..Self::at_path(ResourcePath::empty())
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.explicit_order_bys.push(order_by);
        self
    }

    #[must_use]
    pub const fn limit_to_first(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self.limit_type = LimitType::First;
        self
    }

    #[must_use]
    pub const fn limit_to_last(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self.limit_type = LimitType::Last;
        self
    }

    #[must_use]
    pub fn start_at(mut self, cursor: Cursor) -> Self {
        self.start_at = Some(cursor);
        self
    }

    #[must_use]
    pub fn end_at(mut self, cursor: Cursor) -> Self {
        self.end_at = Some(cursor);
        self
    }

    #[must_use]
    pub fn without_limit(&self) -> Self {
        Self {
            limit: None,
            ..self.clone()
        }
    }

    /// The same constraints applied to one collection path of a group.
    #[must_use]
    pub fn as_collection_query_at_path(&self, path: ResourcePath) -> Self {
        Self {
            path,
            collection_group: None,
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn path(&self) -> &ResourcePath {
        &self.path
    }

    #[must_use]
    pub fn collection_group_id(&self) -> Option<&str> {
        self.collection_group.as_deref()
    }

    #[must_use]
    pub const fn is_collection_group_query(&self) -> bool {
        self.collection_group.is_some()
    }

    #[must_use]
    pub fn is_document_query(&self) -> bool {
        DocumentKey::is_document_path(&self.path)
            && self.collection_group.is_none()
            && self.filters.is_empty()
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub const fn limit_type(&self) -> LimitType {
        self.limit_type
    }

    /// Whether nothing in this query can drop a document from the results.
    #[must_use]
    pub fn matches_all_documents(&self) -> bool {
        self.filters.is_empty()
            && self.limit.is_none()
            && self.start_at.is_none()
            && self.end_at.is_none()
            && (self.explicit_order_bys.is_empty()
                || (self.explicit_order_bys.len() == 1
                    && self.explicit_order_bys[0].field.is_key_field()))
    }

    /// Fields constrained by an inequality filter, in first-seen order.
    #[must_use]
    pub fn inequality_fields(&self) -> Vec<FieldPath> {
        let mut fields: Vec<FieldPath> = Vec::new();
        for filter in self.filters.iter().flat_map(Filter::flattened) {
            if filter.op.is_inequality() && !fields.contains(&filter.field) {
                fields.push(filter.field.clone());
            }
        }

        fields
    }

    /// Full ordering: explicit order-bys, then inequality fields not yet
    /// ordered, then the document key. Implicit entries take the direction
    /// of the last explicit order-by.
    #[must_use]
    pub fn order_bys(&self) -> Vec<OrderBy> {
        let mut order_bys = self.explicit_order_bys.clone();
        let last_direction = order_bys
            .last()
            .map_or(Direction::Asc, |order_by| order_by.direction);

        for field in self.inequality_fields() {
            if field.is_key_field() {
                continue;
            }
            if !order_bys.iter().any(|order_by| order_by.field == field) {
                order_bys.push(OrderBy::new(field, last_direction));
            }
        }

        if !order_bys.iter().any(|order_by| order_by.field.is_key_field()) {
            order_bys.push(OrderBy::key(last_direction));
        }

        order_bys
    }

    /// The target this query executes as. Limit-to-last queries run in the
    /// reversed order with their cursors swapped.
    #[must_use]
    pub fn to_target(&self) -> Target {
        let order_bys = self.order_bys();

        match self.limit_type {
            LimitType::First => Target {
                path: self.path.clone(),
                collection_group: self.collection_group.clone(),
                filters: self.filters.clone(),
                order_bys,
                limit: self.limit,
                start_at: self.start_at.clone(),
                end_at: self.end_at.clone(),
            },
            LimitType::Last => Target {
                path: self.path.clone(),
                collection_group: self.collection_group.clone(),
                filters: self.filters.clone(),
                order_bys: order_bys.iter().map(OrderBy::reversed).collect(),
                limit: self.limit,
                start_at: self.end_at.clone(),
                end_at: self.start_at.clone(),
            },
        }
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        doc.is_found_document()
            && self.matches_path_and_collection_group(doc)
            && self.matches_order_by(doc)
            && self.filters.iter().all(|filter| filter.matches(doc))
            && self.matches_bounds(doc)
    }

    /// Compare two documents under this query's full ordering.
    #[must_use]
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        self.order_bys()
            .iter()
            .map(|order_by| order_by.compare(left, right))
            .find(|cmp| cmp.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    fn matches_path_and_collection_group(&self, doc: &Document) -> bool {
        let doc_path = doc.key().path();

        if let Some(group) = &self.collection_group {
            doc.key().has_collection_id(group) && self.path.is_prefix_of(doc_path)
        } else if DocumentKey::is_document_path(&self.path) {
            &self.path == doc_path
        } else {
            self.path.is_immediate_parent_of(doc_path)
        }
    }

    // A document must carry every explicitly ordered field.
    fn matches_order_by(&self, doc: &Document) -> bool {
        self.explicit_order_bys
            .iter()
            .all(|order_by| order_by.field.is_key_field() || doc.field(&order_by.field).is_some())
    }

    fn matches_bounds(&self, doc: &Document) -> bool {
        let order_bys = self.order_bys();

        if let Some(start) = &self.start_at
            && !start.admits_from_start(&order_bys, doc)
        {
            return false;
        }
        if let Some(end) = &self.end_at
            && !end.admits_from_end(&order_bys, doc)
        {
            return false;
        }

        true
    }
}
