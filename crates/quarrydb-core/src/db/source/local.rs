use crate::{
    db::{
        index::{IndexManager, IndexOffset},
        query::Query,
        source::{DocumentSource, OverlaySource, QueryContext},
    },
    error::InternalError,
    model::{
        document::Document,
        key::DocumentKey,
        mutation::{Mutation, Overlay},
    },
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// LocalDocumentsResult
///
/// A batch of local views together with the largest mutation batch id that
/// contributed to them.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalDocumentsResult {
    pub largest_batch_id: i32,
    pub documents: BTreeMap<DocumentKey, Document>,
}

///
/// LocalDocuments
///
/// Local view of documents: committed state from the document source with
/// pending overlays applied on top.
///

#[derive(Clone)]
pub struct LocalDocuments {
    documents: Arc<dyn DocumentSource>,
    overlays: Arc<dyn OverlaySource>,
    index_manager: IndexManager,
}

impl LocalDocuments {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        overlays: Arc<dyn OverlaySource>,
        index_manager: IndexManager,
    ) -> Self {
        Self {
            documents,
            overlays,
            index_manager,
        }
    }

    #[must_use]
    pub const fn index_manager(&self) -> &IndexManager {
        &self.index_manager
    }

    /// Local view of one document; invalid when neither a stored document
    /// nor an overlay exists.
    pub fn get_document(&self, key: &DocumentKey) -> Result<Document, InternalError> {
        let mut documents = self.get_documents(std::slice::from_ref(key))?;

        Ok(documents
            .remove(key)
            .unwrap_or_else(|| Document::invalid(key.clone())))
    }

    /// Local views of `keys`, one per key.
    pub fn get_documents(
        &self,
        keys: &[DocumentKey],
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let mut documents = self.documents.get_all(keys)?;
        for (key, doc) in &mut documents {
            if let Some(overlay) = self.overlays.get_overlay(key)? {
                overlay.mutation.apply_to_local_view(doc);
            }
        }

        Ok(documents)
    }

    /// Local views of documents matching `query` that changed after
    /// `offset`, either on the server (read time) or locally (batch id).
    pub fn get_documents_matching_query(
        &self,
        query: &Query,
        offset: &IndexOffset,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        self.get_documents_matching_query_with_context(query, offset, &mut QueryContext::default())
    }

    /// As [`Self::get_documents_matching_query`], counting scanned documents
    /// into `context`.
    pub fn get_documents_matching_query_with_context(
        &self,
        query: &Query,
        offset: &IndexOffset,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        if query.is_document_query() {
            return self.document_query(query);
        }
        if let Some(collection_group) = query.collection_group_id() {
            return self.collection_group_query(query, collection_group, offset, context);
        }

        self.collection_query(query, offset, context)
    }

    /// Next `count` documents of `collection_group` after `offset`, read
    /// time first, then documents touched only by newer overlays.
    pub fn get_next_documents(
        &self,
        collection_group: &str,
        offset: &IndexOffset,
        count: usize,
    ) -> Result<LocalDocumentsResult, InternalError> {
        let mut documents = self
            .documents
            .get_all_in_group(collection_group, offset, count)?;
        let remaining = count.saturating_sub(documents.len());
        let mut overlays = if remaining > 0 {
            self.overlays.get_overlays_for_group(
                collection_group,
                offset.largest_batch_id,
                remaining,
            )?
        } else {
            BTreeMap::new()
        };

        let mut largest_batch_id = IndexOffset::INITIAL_LARGEST_BATCH_ID;
        for overlay in overlays.values() {
            if !documents.contains_key(overlay.key()) {
                let base = self.base_document(overlay)?;
                documents.insert(overlay.key().clone(), base);
            }
            largest_batch_id = largest_batch_id.max(overlay.largest_batch_id);
        }

        // documents read by time may still carry overlays older than the
        // offset's batch id
        for key in documents.keys() {
            if !overlays.contains_key(key)
                && let Some(overlay) = self.overlays.get_overlay(key)?
            {
                overlays.insert(key.clone(), overlay);
            }
        }
        for (key, doc) in &mut documents {
            if let Some(overlay) = overlays.get(key) {
                overlay.mutation.apply_to_local_view(doc);
            }
        }

        Ok(LocalDocumentsResult {
            largest_batch_id,
            documents,
        })
    }

    fn document_query(
        &self,
        query: &Query,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let key = DocumentKey::from_path(query.path().clone())?;
        let doc = self.get_document(&key)?;

        Ok(if doc.is_found_document() {
            BTreeMap::from([(key, doc)])
        } else {
            BTreeMap::new()
        })
    }

    fn collection_group_query(
        &self,
        query: &Query,
        collection_group: &str,
        offset: &IndexOffset,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let mut results = BTreeMap::new();
        for parent in self.index_manager.get_collection_parents(collection_group) {
            let collection_query =
                query.as_collection_query_at_path(parent.child(collection_group));
            results.extend(self.collection_query(&collection_query, offset, context)?);
        }

        Ok(results)
    }

    fn collection_query(
        &self,
        query: &Query,
        offset: &IndexOffset,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let overlays = self
            .overlays
            .get_overlays_for_collection(query.path(), offset.largest_batch_id)?;
        let mutated_keys: BTreeSet<DocumentKey> = overlays.keys().cloned().collect();
        let mut documents = self
            .documents
            .get_documents_matching_query(query, offset, &mutated_keys, context)?;

        // an overlay alone can make a document match
        for key in overlays.keys() {
            documents
                .entry(key.clone())
                .or_insert_with(|| Document::invalid(key.clone()));
        }

        let mut results = BTreeMap::new();
        for (key, mut doc) in documents {
            if let Some(overlay) = overlays.get(&key) {
                overlay.mutation.apply_to_local_view(&mut doc);
            }
            if query.matches(&doc) {
                results.insert(key, doc);
            }
        }

        Ok(results)
    }

    // Patches need the committed document underneath them.
    fn base_document(&self, overlay: &Overlay) -> Result<Document, InternalError> {
        match overlay.mutation {
            Mutation::Patch { .. } => {
                let mut documents = self
                    .documents
                    .get_all(std::slice::from_ref(overlay.key()))?;
                Ok(documents
                    .remove(overlay.key())
                    .unwrap_or_else(|| Document::invalid(overlay.key().clone())))
            }
            Mutation::Set { .. } | Mutation::Delete { .. } => {
                Ok(Document::invalid(overlay.key().clone()))
            }
        }
    }
}
