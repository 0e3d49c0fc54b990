//! Query model: filters, ordering, cursors, and the normalized target the
//! index layer plans against.

mod filter;
mod order;
mod request;
mod target;

#[cfg(test)]
mod tests;

pub use filter::{FieldFilter, Filter, Operator};
pub use order::{Cursor, OrderBy};
pub use request::{LimitType, Query};
pub use target::Target;
