use crate::{
    db::Direction,
    model::{document::Document, path::FieldPath},
    value::Value,
};
use std::cmp::Ordering;

///
/// OrderBy
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OrderBy {
    pub field: FieldPath,
    pub direction: Direction,
}

impl OrderBy {
    #[must_use]
    pub const fn new(field: FieldPath, direction: Direction) -> Self {
        Self { field, direction }
    }

    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self::new(FieldPath::from_dotted(field), Direction::Asc)
    }

    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self::new(FieldPath::from_dotted(field), Direction::Desc)
    }

    #[must_use]
    pub fn key(direction: Direction) -> Self {
        Self::new(FieldPath::key_path(), direction)
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.field.clone(), self.direction.reversed())
    }

    /// Compare two documents on this field in this direction.
    ///
    /// Documents missing the field sort first; queries never return them.
    #[must_use]
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        let cmp = if self.field.is_key_field() {
            left.key().cmp(right.key())
        } else {
            left.field(&self.field).cmp(&right.field(&self.field))
        };

        match self.direction {
            Direction::Asc => cmp,
            Direction::Desc => cmp.reverse(),
        }
    }
}

///
/// Cursor
///
/// A position in a query's sort order: one value per order-by, in order.
/// `inclusive` decides whether a document exactly at the position is kept.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cursor {
    pub position: Vec<Value>,
    pub inclusive: bool,
}

impl Cursor {
    #[must_use]
    pub const fn new(position: Vec<Value>, inclusive: bool) -> Self {
        Self {
            position,
            inclusive,
        }
    }

    /// Order of this position relative to `doc` under `order_bys`, or `None`
    /// when the document lacks a positioned field.
    fn compare_to_document(&self, order_bys: &[OrderBy], doc: &Document) -> Option<Ordering> {
        for (value, order_by) in self.position.iter().zip(order_bys) {
            let cmp = if order_by.field.is_key_field() {
                match value {
                    Value::Reference(path) => path.cmp(doc.key().path()),
                    _ => value.cmp(&Value::Reference(doc.key().path().clone())),
                }
            } else {
                let field = doc.field(&order_by.field)?;
                value.cmp(field.as_ref())
            };

            let cmp = match order_by.direction {
                Direction::Asc => cmp,
                Direction::Desc => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return Some(cmp);
            }
        }

        Some(Ordering::Equal)
    }

    /// Whether `doc` lies at or after this cursor used as a start bound.
    #[must_use]
    pub fn admits_from_start(&self, order_bys: &[OrderBy], doc: &Document) -> bool {
        self.compare_to_document(order_bys, doc)
            .is_some_and(|cmp| if self.inclusive { cmp.is_le() } else { cmp.is_lt() })
    }

    /// Whether `doc` lies at or before this cursor used as an end bound.
    #[must_use]
    pub fn admits_from_end(&self, order_bys: &[OrderBy], doc: &Document) -> bool {
        self.compare_to_document(order_bys, doc)
            .is_some_and(|cmp| if self.inclusive { cmp.is_ge() } else { cmp.is_gt() })
    }
}
