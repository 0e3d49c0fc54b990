use crate::{
    db::query::{LimitType, Query},
    model::document::{Document, SnapshotVersion},
};

/// Whether a limit query's earlier result set can no longer be trusted and
/// has to be recomputed without the shortcut that produced it.
///
/// `sorted_results` are the earlier results re-read from the local view and
/// sorted by `query`. They are stale when a document left the set
/// (`expected_count` differs) or when the document at the limit edge has a
/// pending write or changed after `limit_free_version`: either could let a
/// document that was never part of the set move inside the window.
/// Unlimited queries never need a refill.
pub(crate) fn needs_refill(
    query: &Query,
    sorted_results: &[Document],
    expected_count: usize,
    limit_free_version: SnapshotVersion,
) -> bool {
    if query.limit().is_none() {
        return false;
    }
    if expected_count != sorted_results.len() {
        return true;
    }

    let edge = match query.limit_type() {
        LimitType::First => sorted_results.last(),
        LimitType::Last => sorted_results.first(),
    };

    edge.is_some_and(|doc| doc.has_pending_writes() || doc.version() > limit_free_version)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::query::OrderBy,
        test_support::{doc, query, version},
        value::Value,
    };

    fn docs() -> Vec<Document> {
        vec![
            doc("coll/a", 1, &[("n", Value::from(1i64))]),
            doc("coll/b", 2, &[("n", Value::from(2i64))]),
        ]
    }

    fn limited(limit_type: LimitType) -> Query {
        let q = query("coll").order_by(OrderBy::asc("n"));
        match limit_type {
            LimitType::First => q.limit_to_first(2),
            LimitType::Last => q.limit_to_last(2),
        }
    }

    #[test]
    fn unlimited_queries_never_refill() {
        assert!(!needs_refill(&query("coll"), &docs(), 7, version(0)));
    }

    #[test]
    fn missing_documents_force_refill() {
        assert!(needs_refill(&limited(LimitType::First), &docs(), 3, version(10)));
    }

    #[test]
    fn edge_newer_than_snapshot_forces_refill() {
        let q = limited(LimitType::First);

        assert!(needs_refill(&q, &docs(), 2, version(1)));
        assert!(!needs_refill(&q, &docs(), 2, version(2)));
    }

    #[test]
    fn limit_to_last_checks_the_first_document() {
        let q = limited(LimitType::Last);
        let mut results = docs();
        results[0] = results[0].clone().with_local_mutations();

        assert!(needs_refill(&q, &results, 2, version(10)));
        assert!(!needs_refill(&q, &docs(), 2, version(10)));
    }

    #[test]
    fn pending_write_at_the_edge_forces_refill() {
        let q = limited(LimitType::First);
        let mut results = docs();
        results[1] = results[1].clone().with_local_mutations();

        assert!(needs_refill(&q, &results, 2, version(10)));
    }

    #[test]
    fn empty_results_are_trusted() {
        assert!(!needs_refill(&limited(LimitType::First), &[], 0, version(0)));
    }
}
