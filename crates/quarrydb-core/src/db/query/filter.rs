use crate::{
    model::{document::Document, path::FieldPath},
    value::Value,
};
use std::fmt;

///
/// Operator
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Operator {
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
    GreaterThanOrEqual,
    GreaterThan,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl Operator {
    /// Operators that constrain a field to a range rather than fixed points.
    #[must_use]
    pub const fn is_inequality(self) -> bool {
        matches!(
            self,
            Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
                | Self::NotEqual
                | Self::NotIn
        )
    }

    #[must_use]
    pub const fn is_array_operator(self) -> bool {
        matches!(self, Self::ArrayContains | Self::ArrayContainsAny)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThanOrEqual => ">=",
            Self::GreaterThan => ">",
            Self::ArrayContains => "array-contains",
            Self::ArrayContainsAny => "array-contains-any",
            Self::In => "in",
            Self::NotIn => "not-in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// FieldFilter
///
/// One `field <op> value` predicate. `in`, `not-in`, and
/// `array-contains-any` carry their operands as an array value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldFilter {
    pub field: FieldPath,
    pub op: Operator,
    pub value: Value,
}

impl FieldFilter {
    #[must_use]
    pub const fn new(field: FieldPath, op: Operator, value: Value) -> Self {
        Self { field, op, value }
    }

    /// Operand list for list-valued operators; a scalar operand is a list
    /// of one.
    #[must_use]
    pub fn operands(&self) -> &[Value] {
        self.value
            .as_array()
            .unwrap_or(std::slice::from_ref(&self.value))
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(field) = doc.field(&self.field) else {
            return false;
        };
        let field = field.as_ref();

        match self.op {
            Operator::Equal => *field == self.value,
            Operator::NotEqual => *field != self.value,
            Operator::LessThan
            | Operator::LessThanOrEqual
            | Operator::GreaterThan
            | Operator::GreaterThanOrEqual => {
                // relational operators only match values of the same type
                field.type_order() == self.value.type_order() && self.matches_comparison(field)
            }
            Operator::ArrayContains => field.array_contains(&self.value),
            Operator::ArrayContainsAny => field
                .as_array()
                .is_some_and(|values| values.iter().any(|v| self.value.array_contains(v))),
            Operator::In => self.value.array_contains(field),
            Operator::NotIn => !self.value.array_contains(field),
        }
    }

    fn matches_comparison(&self, field: &Value) -> bool {
        let cmp = field.cmp(&self.value);

        match self.op {
            Operator::LessThan => cmp.is_lt(),
            Operator::LessThanOrEqual => cmp.is_le(),
            Operator::GreaterThan => cmp.is_gt(),
            Operator::GreaterThanOrEqual => cmp.is_ge(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.op, self.value)
    }
}

///
/// Filter
///
/// Filter tree. Composite nodes combine children with AND or OR; the
/// planner only sees the disjunctive normal form from [`Filter::to_dnf`].
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    Field(FieldFilter),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    #[must_use]
    pub fn field(field: &str, op: Operator, value: impl Into<Value>) -> Self {
        Self::Field(FieldFilter::new(
            FieldPath::from_dotted(field),
            op,
            value.into(),
        ))
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Field(filter) => filter.matches(doc),
            Self::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }

    /// Every field filter in the tree, depth first.
    #[must_use]
    pub fn flattened(&self) -> Vec<&FieldFilter> {
        let mut out = Vec::new();
        self.collect_field_filters(&mut out);

        out
    }

    fn collect_field_filters<'a>(&'a self, out: &mut Vec<&'a FieldFilter>) {
        match self {
            Self::Field(filter) => out.push(filter),
            Self::And(filters) | Self::Or(filters) => {
                for filter in filters {
                    filter.collect_field_filters(out);
                }
            }
        }
    }

    /// Disjunctive normal form: a list of conjunctions whose union matches
    /// exactly what this filter matches.
    ///
    /// AND distributes over OR; nested composites of the same kind flatten.
    #[must_use]
    pub fn to_dnf(&self) -> Vec<Vec<FieldFilter>> {
        match self {
            Self::Field(filter) => vec![vec![filter.clone()]],
            Self::Or(filters) => filters.iter().flat_map(Self::to_dnf).collect(),
            Self::And(filters) => {
                let mut terms: Vec<Vec<FieldFilter>> = vec![Vec::new()];

                for filter in filters {
                    let child_terms = filter.to_dnf();
                    let mut next = Vec::with_capacity(terms.len() * child_terms.len());
                    for term in &terms {
                        for child in &child_terms {
                            let mut combined = term.clone();
                            combined.extend(child.iter().cloned());
                            next.push(combined);
                        }
                    }
                    terms = next;
                }

                terms
            }
        }
    }
}

impl From<FieldFilter> for Filter {
    fn from(filter: FieldFilter) -> Self {
        Self::Field(filter)
    }
}
