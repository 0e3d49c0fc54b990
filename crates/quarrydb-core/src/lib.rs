//! Core runtime for QuarryDB: values, the order-preserving index codec,
//! field indexes, the index manager, the backfiller, and the local query
//! engine that merges pending-write overlays into index and scan results.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod serialize;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum number of significant decimal digits carried by the numeric
/// index encoding.
///
/// Doubles are expanded to their exact decimal value and truncated to this
/// budget; two numbers that agree on the first `MAX_NUMBER_DIGITS` digits
/// encode identically.
pub const MAX_NUMBER_DIGITS: usize = 34;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No stores, executors, or serializers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            Direction, User,
            index::{FieldIndex, IndexOffset, IndexState, IndexType, Segment, SegmentKind},
            query::{Cursor, FieldFilter, Filter, LimitType, Operator, OrderBy, Query, Target},
        },
        model::{
            document::{Document, SnapshotVersion},
            key::DocumentKey,
            mutation::{Mutation, Overlay},
            path::{FieldPath, ResourcePath},
        },
        types::{Decimal, GeoPoint, Timestamp},
        value::Value,
    };
}
