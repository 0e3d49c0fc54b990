//! Module: db::source
//! Responsibility: the collaborator contracts the engine reads documents and
//! pending mutations through, in-memory implementations of both, and the
//! local view that merges them.
//! Does not own: durability of documents or the mutation queue.

mod local;
mod memory;


pub use local::{LocalDocuments, LocalDocumentsResult};
pub use memory::{MemoryDocumentCache, MemoryOverlayCache};

use crate::{
    db::{index::IndexOffset, query::Query},
    error::InternalError,
    model::{document::Document, key::DocumentKey, mutation::Overlay, path::ResourcePath},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// DocumentSource
///
/// Committed documents as last read from the server, each tagged with its
/// read time and existence state.
///

pub trait DocumentSource: Send + Sync {
    /// Documents for `keys`; keys without a stored document come back as
    /// invalid documents.
    fn get_all(&self, keys: &[DocumentKey])
    -> Result<BTreeMap<DocumentKey, Document>, InternalError>;

    /// Up to `limit` documents of `collection_group` positioned after
    /// `offset`, in offset order.
    fn get_all_in_group(
        &self,
        collection_group: &str,
        offset: &IndexOffset,
        limit: usize,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError>;

    /// Documents directly inside the query's collection that were read after
    /// `offset` and match `query`, plus every stored document in
    /// `mutated_keys` regardless of read time. Every document examined is
    /// counted in `context`.
    fn get_documents_matching_query(
        &self,
        query: &Query,
        offset: &IndexOffset,
        mutated_keys: &BTreeSet<DocumentKey>,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError>;
}

///
/// QueryContext
///
/// Cost observed while scanning documents for one query.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryContext {
    pub documents_read: usize,
}

///
/// OverlaySource
///
/// Net pending mutation per document.
///

pub trait OverlaySource: Send + Sync {
    fn get_overlay(&self, key: &DocumentKey) -> Result<Option<Overlay>, InternalError>;

    /// Overlays of documents directly inside `collection` whose batch id is
    /// greater than `since_batch_id`.
    fn get_overlays_for_collection(
        &self,
        collection: &ResourcePath,
        since_batch_id: i32,
    ) -> Result<BTreeMap<DocumentKey, Overlay>, InternalError>;

    /// Overlays of `collection_group` newer than `since_batch_id`, taking
    /// whole batches in batch order until at least `count` are collected.
    fn get_overlays_for_group(
        &self,
        collection_group: &str,
        since_batch_id: i32,
        count: usize,
    ) -> Result<BTreeMap<DocumentKey, Overlay>, InternalError>;
}
