//! Storage-side engine: value codec, field indexes, local views over the
//! document and overlay sources, backfill, and the query engine.

pub mod backfill;
pub mod codec;
mod direction;
pub mod engine;
pub mod index;
pub mod persistence;
pub mod query;
pub mod reference;
pub mod source;
mod user;

pub use direction::Direction;
pub use user::User;
