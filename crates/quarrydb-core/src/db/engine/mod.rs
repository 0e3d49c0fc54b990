//! Module: db::engine
//! Responsibility: the local read path. Chooses between serving a query
//! from field indexes, from the keys the server last reported for it, or
//! from a full collection scan, and completes every path with documents
//! changed since that source was current.
//! Does not own: index maintenance or overlay storage.
//! Boundary: every path returns local views (overlays applied), filtered,
//! sorted, and limited by the query itself.

mod auto_index;
mod refill;


use crate::{
    config::{AutoIndexConfig, EngineConfig},
    db::{
        index::{IndexManager, IndexOffset, IndexType},
        query::{LimitType, Query},
        source::{LocalDocuments, QueryContext},
    },
    error::InternalError,
    model::{
        document::{Document, SnapshotVersion},
        key::DocumentKey,
    },
    obs::sink::{MetricsEvent, PlanKind, record},
};
use auto_index::should_create_index;
use refill::needs_refill;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

///
/// QueryResult
///
/// Documents matching a query in query order, and the path that produced
/// them.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub documents: Vec<Document>,
    pub plan: PlanKind,
}

impl QueryResult {
    #[must_use]
    pub fn keys(&self) -> Vec<DocumentKey> {
        self.documents.iter().map(|doc| doc.key().clone()).collect()
    }
}

///
/// QueryEngine
///
/// Executes queries against the local view. Stateless between calls apart
/// from the index definitions it may create.
///

#[derive(Clone)]
pub struct QueryEngine {
    local_documents: LocalDocuments,
    config: AutoIndexConfig,
}

impl QueryEngine {
    #[must_use]
    pub fn new(local_documents: LocalDocuments, config: &EngineConfig) -> Self {
        Self {
            local_documents,
            config: config.auto_index.clone(),
        }
    }

    #[must_use]
    pub const fn local_documents(&self) -> &LocalDocuments {
        &self.local_documents
    }

    pub const fn set_index_auto_creation_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Documents matching `query`.
    ///
    /// `last_limbo_free_version` is the snapshot at which `remote_keys` were
    /// last known to be exactly the server's result set for this query;
    /// [`SnapshotVersion::NONE`] when there is no such snapshot.
    pub fn get_documents_matching_query(
        &self,
        query: &Query,
        last_limbo_free_version: SnapshotVersion,
        remote_keys: &BTreeSet<DocumentKey>,
    ) -> Result<QueryResult, InternalError> {
        let mut context = QueryContext::default();

        let (documents, plan) = if let Some(documents) =
            self.perform_query_using_index(query, &mut context)?
        {
            (documents, PlanKind::Index)
        } else if let Some(documents) = self.perform_query_using_remote_keys(
            query,
            remote_keys,
            last_limbo_free_version,
            &mut context,
        )? {
            (documents, PlanKind::RemoteKeys)
        } else {
            let documents = self.execute_full_collection_scan(query, &mut context)?;
            self.create_cache_indexes(query, &context, documents.len())?;

            (documents, PlanKind::FullScan)
        };

        let documents = apply_limit(query, apply_query(query, documents));

        debug!(
            plan = ?plan,
            documents_read = context.documents_read,
            results = documents.len(),
            "query.execute"
        );
        record(MetricsEvent::Plan { kind: plan });
        record(MetricsEvent::DocumentsRead {
            count: u64::try_from(context.documents_read).unwrap_or(u64::MAX),
        });

        Ok(QueryResult { documents, plan })
    }

    fn index_manager(&self) -> &IndexManager {
        self.local_documents.index_manager()
    }

    // Index path: a full index answers directly; a partial one narrows the
    // candidates and the query is re-applied in memory. Documents changed
    // since the least advanced index was last backfilled are added from a
    // scan.
    fn perform_query_using_index(
        &self,
        query: &Query,
        context: &mut QueryContext,
    ) -> Result<Option<BTreeMap<DocumentKey, Document>>, InternalError> {
        if query.matches_all_documents() {
            // a plain collection read gains nothing from an index
            return Ok(None);
        }

        let target = query.to_target();
        let index_type = self.index_manager().get_index_type(&target)?;
        match index_type {
            IndexType::None => return Ok(None),
            // the index order may not be the query order, so the limit
            // can only be applied after sorting everything
            IndexType::Partial if query.limit().is_some() => {
                return self.perform_query_using_index(&query.without_limit(), context);
            }
            IndexType::Partial | IndexType::Full => {}
        }

        let Some(keys) = self.index_manager().get_documents_matching_target(&target)? else {
            return Ok(None);
        };
        context.documents_read += keys.len();

        let indexed = self.local_documents.get_documents(&keys)?;
        let offset = self.index_manager().get_min_offset(&target)?;
        let previous = apply_query(query, indexed);

        if needs_refill(query, &previous, keys.len(), offset.read_time) {
            debug!(limit = ?query.limit(), "query.index.refill");
            return self.perform_query_using_index(&query.without_limit(), context);
        }
        debug!(?index_type, keys = keys.len(), "query.index");

        let documents = self.append_remaining_results(previous, query, &offset, context)?;
        if index_type == IndexType::Partial {
            self.create_cache_indexes(query, context, documents.len())?;
        }

        Ok(Some(documents))
    }

    // Remote-keys path: reuse the server's last result set for this query,
    // unless a limit window may have shifted since it was current.
    fn perform_query_using_remote_keys(
        &self,
        query: &Query,
        remote_keys: &BTreeSet<DocumentKey>,
        last_limbo_free_version: SnapshotVersion,
        context: &mut QueryContext,
    ) -> Result<Option<BTreeMap<DocumentKey, Document>>, InternalError> {
        if query.matches_all_documents() || last_limbo_free_version.is_none() {
            return Ok(None);
        }

        let keys: Vec<DocumentKey> = remote_keys.iter().cloned().collect();
        let documents = self.local_documents.get_documents(&keys)?;
        context.documents_read += keys.len();
        let previous = apply_query(query, documents);

        if needs_refill(query, &previous, remote_keys.len(), last_limbo_free_version) {
            debug!(
                limit = ?query.limit(),
                version = %last_limbo_free_version,
                "query.remote_keys.refill"
            );
            return Ok(None);
        }
        debug!(
            keys = remote_keys.len(),
            version = %last_limbo_free_version,
            "query.remote_keys"
        );

        let offset = IndexOffset::create_successor(
            last_limbo_free_version,
            IndexOffset::INITIAL_LARGEST_BATCH_ID,
        );

        self.append_remaining_results(previous, query, &offset, context)
            .map(Some)
    }

    fn execute_full_collection_scan(
        &self,
        query: &Query,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        debug!(path = %query.path(), "query.full_scan");

        self.local_documents
            .get_documents_matching_query_with_context(query, &IndexOffset::NONE, context)
    }

    // Documents changed after `offset` (remotely or by a newer batch)
    // merged over the earlier results. A key present in both has the same
    // local view in each.
    fn append_remaining_results(
        &self,
        previous: Vec<Document>,
        query: &Query,
        offset: &IndexOffset,
        context: &mut QueryContext,
    ) -> Result<BTreeMap<DocumentKey, Document>, InternalError> {
        let mut results = self
            .local_documents
            .get_documents_matching_query_with_context(query, offset, context)?;
        for doc in previous {
            results.insert(doc.key().clone(), doc);
        }

        Ok(results)
    }

    fn create_cache_indexes(
        &self,
        query: &Query,
        context: &QueryContext,
        result_size: usize,
    ) -> Result<(), InternalError> {
        if !should_create_index(&self.config, context.documents_read, result_size) {
            return Ok(());
        }

        let created = self
            .index_manager()
            .create_target_indexes(&query.to_target())?;
        debug!(
            path = %query.path(),
            documents_read = context.documents_read,
            result_size,
            created = created.len(),
            "query.auto_index"
        );

        Ok(())
    }
}

// Query matches only, in query order.
fn apply_query(query: &Query, documents: BTreeMap<DocumentKey, Document>) -> Vec<Document> {
    let mut matches: Vec<Document> = documents
        .into_values()
        .filter(|doc| query.matches(doc))
        .collect();
    matches.sort_by(|left, right| query.compare(left, right));

    matches
}

// The first `limit` documents, or the last `limit` for limit-to-last.
fn apply_limit(query: &Query, mut documents: Vec<Document>) -> Vec<Document> {
    let Some(limit) = query.limit() else {
        return documents;
    };
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    if documents.len() <= limit {
        return documents;
    }

    match query.limit_type() {
        LimitType::First => {
            documents.truncate(limit);
            documents
        }
        LimitType::Last => documents.split_off(documents.len() - limit),
    }
}
