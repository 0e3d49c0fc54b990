//! Module: db::backfill
//! Responsibility: bounded, resumable catch-up of field indexes against the
//! committed documents and pending overlays written before (or while) they
//! were behind.
//! Does not own: scheduling. Callers decide when an idle slot exists and
//! invoke `backfill` once per slot.
//! Boundary: one invocation is one persistence transaction; entries and the
//! advanced offsets commit together or not at all.

#[cfg(test)]
mod tests;

use crate::{
    config::BackfillConfig,
    db::{
        index::{IndexManager, IndexOffset},
        persistence::Transaction,
        source::LocalDocuments,
    },
    error::InternalError,
    model::{
        document::{Document, SnapshotVersion},
        key::DocumentKey,
    },
    obs::sink::{MetricsEvent, record},
};
use std::collections::BTreeSet;
use tracing::debug;

///
/// IndexBackfiller
///
/// Walks collection groups least-recently-updated first, feeding each one's
/// next batch of changed documents into the index manager until the
/// document budget runs out.
///

#[derive(Clone)]
pub struct IndexBackfiller {
    local_documents: LocalDocuments,
    config: BackfillConfig,
}

impl IndexBackfiller {
    #[must_use]
    pub const fn new(local_documents: LocalDocuments, config: BackfillConfig) -> Self {
        Self {
            local_documents,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Run one backfill pass and return the number of documents indexed.
    ///
    /// Every group visited has its offset persisted, even when the budget
    /// ran out partway through it, so the next pass resumes where this one
    /// stopped. A group is visited at most once per pass.
    pub fn backfill(&self) -> Result<usize, InternalError> {
        let index_manager = self.local_documents.index_manager();

        let processed = index_manager
            .persistence()
            .run_transaction("backfill", |txn| {
                let mut remaining = self.config.max_documents_per_run;
                let mut processed = 0;
                let mut visited: BTreeSet<String> = BTreeSet::new();

                while remaining > 0 {
                    let next = index_manager.next_collection_group_in(txn.tables())?;
                    let Some(collection_group) = next else {
                        break;
                    };
                    if !visited.insert(collection_group.clone()) {
                        break;
                    }

                    let documents =
                        self.backfill_group(index_manager, txn, &collection_group, remaining)?;
                    processed += documents;
                    remaining = remaining.saturating_sub(documents);
                }

                Ok(processed)
            })?;

        debug!(documents = processed, "backfill.run");

        Ok(processed)
    }

    // Index the next `budget` changed documents of one group and persist
    // the offset reached.
    fn backfill_group(
        &self,
        index_manager: &IndexManager,
        txn: &mut Transaction<'_>,
        collection_group: &str,
        budget: usize,
    ) -> Result<usize, InternalError> {
        let existing = index_manager.min_offset_for_group_in(txn.tables(), collection_group)?;
        let next = self
            .local_documents
            .get_next_documents(collection_group, &existing, budget)?;
        let documents: Vec<Document> = next.documents.into_values().collect();

        index_manager.update_index_entries_in(txn, &documents)?;

        let offset = new_offset(&documents, &existing, next.largest_batch_id);
        index_manager.update_collection_group_in(txn, collection_group, offset)?;

        debug!(
            collection_group,
            documents = documents.len(),
            "backfill.collection_group"
        );
        record(MetricsEvent::Backfill {
            collection_group: collection_group.to_string(),
            documents: u64::try_from(documents.len()).unwrap_or(u64::MAX),
        });

        Ok(documents.len())
    }
}

/// Offset after a batch: the furthest document position reached (never
/// moving backwards), carrying the largest batch id seen so far.
fn new_offset(
    documents: &[Document],
    existing: &IndexOffset,
    largest_batch_id: i32,
) -> IndexOffset {
    let batch = IndexOffset::new(SnapshotVersion::NONE, DocumentKey::empty(), largest_batch_id);

    documents
        .iter()
        .map(IndexOffset::from_document)
        .fold(existing.advanced_to(&batch), |furthest, offset| {
            furthest.advanced_to(&offset)
        })
}
