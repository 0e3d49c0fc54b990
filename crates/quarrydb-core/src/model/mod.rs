//! Document model: paths, keys, document snapshots, and pending mutations.

pub mod document;
pub mod key;
pub mod mutation;
pub mod object;
pub mod path;
