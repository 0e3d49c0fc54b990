use crate::{
    db::{
        index::IndexOffset,
        query::Query,
        source::{DocumentSource, OverlaySource, QueryContext},
    },
    error::InternalError,
    model::{document::Document, key::DocumentKey, mutation::Overlay, path::ResourcePath},
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

///
/// MemoryDocumentCache
///

#[derive(Debug, Default)]
pub struct MemoryDocumentCache {
    documents: RwLock<BTreeMap<DocumentKey, Document>>,
}

impl MemoryDocumentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `doc`, replacing any previous version.
    pub fn add(&self, doc: Document) {
        self.documents.write().insert(doc.key().clone(), doc);
    }

    pub fn remove(&self, key: &DocumentKey) {
        self.documents.write().remove(key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentSource for MemoryDocumentCache {
    fn get_all(
        &self,
        keys: &[DocumentKey],
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let documents = self.documents.read();

        Ok(keys
            .iter()
            .map(|key| {
                let doc = documents
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| Document::invalid(key.clone()));
                (key.clone(), doc)
            })
            .collect())
    }

    fn get_all_in_group(
        &self,
        collection_group: &str,
        offset: &IndexOffset,
        limit: usize,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let documents = self.documents.read();
        let mut candidates: Vec<&Document> = documents
            .values()
            .filter(|doc| doc.key().has_collection_id(collection_group))
            .filter(|doc| IndexOffset::from_document(doc) > *offset)
            .collect();
        candidates.sort_by(|left, right| {
            (left.read_time(), left.key()).cmp(&(right.read_time(), right.key()))
        });

        Ok(candidates
            .into_iter()
            .take(limit)
            .map(|doc| (doc.key().clone(), doc.clone()))
            .collect())
    }

    fn get_documents_matching_query(
        &self,
        query: &Query,
        offset: &IndexOffset,
        mutated_keys: &BTreeSet<DocumentKey>,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let documents = self.documents.read();
        let mut results = BTreeMap::new();

        for doc in documents
            .values()
            .filter(|doc| query.path().is_immediate_parent_of(doc.key().path()))
        {
            // mutated documents are returned whatever their read time so
            // overlays always have their base document
            let mutated = mutated_keys.contains(doc.key());
            if !mutated && IndexOffset::from_document(doc) <= *offset {
                continue;
            }

            context.documents_read += 1;
            if mutated || query.matches(doc) {
                results.insert(doc.key().clone(), doc.clone());
            }
        }

        Ok(results)
    }
}

///
/// MemoryOverlayCache
///

#[derive(Debug, Default)]
pub struct MemoryOverlayCache {
    overlays: RwLock<BTreeMap<DocumentKey, Overlay>>,
}

impl MemoryOverlayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `overlay` as the net pending mutation of its document.
    pub fn save_overlay(&self, overlay: Overlay) {
        self.overlays.write().insert(overlay.key().clone(), overlay);
    }

    /// Drop every overlay written by `batch_id`, e.g. once the batch is
    /// acknowledged.
    pub fn remove_overlays_for_batch_id(&self, batch_id: i32) {
        self.overlays
            .write()
            .retain(|_, overlay| overlay.largest_batch_id != batch_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overlays.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.read().is_empty()
    }
}

impl OverlaySource for MemoryOverlayCache {
    fn get_overlay(&self, key: &DocumentKey) -> Result<Option<Overlay>, InternalError> {
        Ok(self.overlays.read().get(key).cloned())
    }

    fn get_overlays_for_collection(
        &self,
        collection: &ResourcePath,
        since_batch_id: i32,
    ) -> Result<BTreeMap<DocumentKey, Overlay>, InternalError> {
        Ok(self
            .overlays
            .read()
            .iter()
            .filter(|(key, overlay)| {
                collection.is_immediate_parent_of(key.path())
                    && overlay.largest_batch_id > since_batch_id
            })
            .map(|(key, overlay)| (key.clone(), overlay.clone()))
            .collect())
    }

    fn get_overlays_for_group(
        &self,
        collection_group: &str,
        since_batch_id: i32,
        count: usize,
    ) -> Result<BTreeMap<DocumentKey, Overlay>, InternalError> {
        let mut batches: BTreeMap<i32, Vec<Overlay>> = BTreeMap::new();
        for (key, overlay) in self.overlays.read().iter() {
            if key.has_collection_id(collection_group) && overlay.largest_batch_id > since_batch_id
            {
                batches
                    .entry(overlay.largest_batch_id)
                    .or_default()
                    .push(overlay.clone());
            }
        }

        let mut result = BTreeMap::new();
        for overlays in batches.into_values() {
            if result.len() >= count {
                break;
            }
            result.extend(
                overlays
                    .into_iter()
                    .map(|overlay| (overlay.key().clone(), overlay)),
            );
        }

        Ok(result)
    }
}
