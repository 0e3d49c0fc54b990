//! Scalar types carried inside [`Value`](crate::value::Value).

mod decimal;
mod geo;
mod timestamp;

pub use decimal::{Decimal, DecimalParseError, DecimalParts};
pub use geo::GeoPoint;
pub use timestamp::Timestamp;
