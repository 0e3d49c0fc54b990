//! Module: db::index
//! Responsibility: field index definitions, entry storage, target matching,
//! scan bounds, and the manager that ties them to the local tables.
//! Does not own: document reads or overlay merging.

mod bound;
mod definition;
mod entry;
mod manager;
mod matcher;

#[cfg(test)]
mod tests;

pub use definition::{FieldIndex, IndexOffset, IndexState, IndexType, Segment, SegmentKind};
pub use entry::{IndexEntry, IndexEntryStore};
pub use manager::IndexManager;

pub(crate) use definition::FieldIndexRow;
pub(crate) use matcher::TargetIndexMatcher;
