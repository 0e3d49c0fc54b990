//! ## Crate layout
//! - `core`: values, the index codec, field indexes, the backfiller, and the
//!   local query engine.
//!
//! The `prelude` module carries the vocabulary and the components an
//! embedder wires together: persistence, document and overlay sources, the
//! index manager, the backfiller, and the query engine.

pub use quarrydb_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::error::InternalError as Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        config::{AutoIndexConfig, BackfillConfig, EngineConfig},
        db::{
            backfill::IndexBackfiller,
            engine::{QueryEngine, QueryResult},
            index::IndexManager,
            persistence::Persistence,
            source::{
                DocumentSource, LocalDocuments, MemoryDocumentCache, MemoryOverlayCache,
                OverlaySource,
            },
        },
        obs::PlanKind,
        prelude::*,
    };
    pub use serde::{Deserialize, Serialize};
}
