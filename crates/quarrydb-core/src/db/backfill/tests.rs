use crate::{
    config::BackfillConfig,
    db::{
        User,
        backfill::IndexBackfiller,
        index::{FieldIndex, IndexManager, IndexOffset, Segment},
        persistence::Persistence,
        query::Query,
        source::{LocalDocuments, MemoryDocumentCache, MemoryOverlayCache},
    },
    model::key::DocumentKey,
    obs::MetricsEvent,
    test_support::{
        capture_events, deleted_doc, doc, filter, key, query, set_overlay, version,
    },
    value::Value,
};
use std::sync::Arc;

struct Fixture {
    documents: Arc<MemoryDocumentCache>,
    overlays: Arc<MemoryOverlayCache>,
    manager: IndexManager,
    backfiller: IndexBackfiller,
}

fn fixture(max_documents_per_run: usize) -> Fixture {
    let documents = Arc::new(MemoryDocumentCache::new());
    let overlays = Arc::new(MemoryOverlayCache::new());
    let manager = IndexManager::new(Arc::new(Persistence::new()), User::UNAUTHENTICATED);
    let local = LocalDocuments::new(documents.clone(), overlays.clone(), manager.clone());
    let backfiller = IndexBackfiller::new(
        local,
        BackfillConfig {
            max_documents_per_run,
        },
    );

    Fixture {
        documents,
        overlays,
        manager,
        backfiller,
    }
}

impl Fixture {
    fn add_index(&self, group: &str, field: &str) -> FieldIndex {
        self.manager
            .add_field_index(&FieldIndex::new(group, vec![Segment::asc(field)]))
            .expect("index should be added")
    }

    fn indexed(&self, query: &Query) -> Vec<String> {
        self.manager
            .get_documents_matching_target(&query.to_target())
            .expect("target should be served")
            .expect("an index should serve the target")
            .iter()
            .map(DocumentKey::to_string)
            .collect()
    }

    fn offset(&self, group: &str) -> IndexOffset {
        self.manager
            .get_min_offset_for_group(group)
            .expect("group should have an index")
    }
}

fn n(value: i64) -> Value {
    Value::from(value)
}

#[test]
fn nothing_to_do_without_indexes() {
    let fx = fixture(10);
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));

    assert_eq!(fx.backfiller.backfill().unwrap(), 0);
}

#[test]
fn budget_caps_each_run_and_later_runs_resume() {
    let fx = fixture(2);
    fx.add_index("coll", "n");
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));
    fx.documents.add(doc("coll/b", 2, &[("n", n(2))]));
    fx.documents.add(doc("coll/c", 3, &[("n", n(3))]));
    let all = query("coll").filter(filter("n", ">=", 0i64));

    assert_eq!(fx.backfiller.backfill().unwrap(), 2);
    assert_eq!(fx.indexed(&all), vec!["coll/a", "coll/b"]);
    assert_eq!(fx.offset("coll").read_time, version(2));

    assert_eq!(fx.backfiller.backfill().unwrap(), 1);
    assert_eq!(fx.indexed(&all), vec!["coll/a", "coll/b", "coll/c"]);
    assert_eq!(fx.offset("coll").read_time, version(3));

    assert_eq!(fx.backfiller.backfill().unwrap(), 0);
}

#[test]
fn documents_written_later_are_picked_up() {
    let fx = fixture(10);
    fx.add_index("coll", "n");
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));
    fx.backfiller.backfill().unwrap();

    fx.documents.add(doc("coll/b", 5, &[("n", n(2))]));
    fx.documents.add(doc("coll/a", 6, &[("n", n(10))]));

    assert_eq!(fx.backfiller.backfill().unwrap(), 2);
    assert_eq!(
        fx.indexed(&query("coll").filter(filter("n", ">", 5i64))),
        vec!["coll/a"]
    );
    assert_eq!(
        fx.indexed(&query("coll").filter(filter("n", "<", 5i64))),
        vec!["coll/b"]
    );
}

#[test]
fn deletions_remove_entries() {
    let fx = fixture(10);
    fx.add_index("coll", "n");
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));
    fx.backfiller.backfill().unwrap();

    fx.documents.add(deleted_doc("coll/a", 2));
    fx.backfiller.backfill().unwrap();

    assert!(
        fx.indexed(&query("coll").filter(filter("n", "==", 1i64)))
            .is_empty()
    );
}

#[test]
fn budget_is_shared_round_robin_across_groups() {
    let fx = fixture(3);
    fx.add_index("alpha", "n");
    fx.add_index("beta", "n");
    for (path, micros) in [("alpha/1", 1), ("alpha/2", 2), ("beta/1", 3), ("beta/2", 4)] {
        fx.documents.add(doc(path, micros, &[("n", n(micros))]));
    }

    // alpha first (tie on sequence number, smaller name), then beta with
    // what is left of the budget
    assert_eq!(fx.backfiller.backfill().unwrap(), 3);
    assert_eq!(fx.offset("alpha").read_time, version(2));
    assert_eq!(fx.offset("beta").read_time, version(3));

    // alpha has nothing new; beta resumes after its first document
    assert_eq!(fx.backfiller.backfill().unwrap(), 1);
    assert_eq!(fx.offset("beta").read_time, version(4));
    assert_eq!(
        fx.indexed(&query("beta").filter(filter("n", ">", 0i64))),
        vec!["beta/1", "beta/2"]
    );
}

#[test]
fn pending_overlays_are_indexed_and_advance_the_batch_id() {
    let fx = fixture(10);
    fx.add_index("coll", "n");
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));
    fx.overlays
        .save_overlay(set_overlay(3, "coll/b", &[("n", n(2))]));

    assert_eq!(fx.backfiller.backfill().unwrap(), 2);
    assert_eq!(
        fx.indexed(&query("coll").filter(filter("n", ">", 0i64))),
        vec!["coll/a", "coll/b"]
    );

    let offset = fx.offset("coll");
    assert_eq!(offset.read_time, version(1));
    assert_eq!(offset.largest_batch_id, 3);
}

#[test]
fn repeated_runs_converge_to_a_full_scan() {
    let fx = fixture(2);
    fx.add_index("coll", "n");
    for i in 0..7 {
        fx.documents
            .add(doc(&format!("coll/d{i}"), i + 1, &[("n", n(i % 3))]));
    }

    while fx.backfiller.backfill().unwrap() > 0 {}

    let q = query("coll").filter(filter("n", "==", 1i64));
    let scanned: Vec<String> = fx
        .backfiller
        .local_documents
        .get_documents_matching_query(&q, &IndexOffset::NONE)
        .unwrap()
        .keys()
        .map(DocumentKey::to_string)
        .collect();

    assert_eq!(fx.indexed(&q), scanned);
    assert_eq!(scanned, vec!["coll/d1", "coll/d4"]);
}

#[test]
fn each_visited_group_records_an_event() {
    let fx = fixture(10);
    fx.add_index("coll", "n");
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));
    fx.documents.add(doc("coll/b", 2, &[("n", n(2))]));

    let (processed, events) = capture_events(|| fx.backfiller.backfill());
    let backfills: Vec<&MetricsEvent> = events
        .iter()
        .filter(|event| matches!(event, MetricsEvent::Backfill { .. }))
        .collect();

    assert_eq!(processed.unwrap(), 2);
    assert_eq!(
        backfills,
        vec![&MetricsEvent::Backfill {
            collection_group: "coll".to_string(),
            documents: 2,
        }]
    );
}

#[test]
fn undecodable_definition_fails_the_run() {
    let fx = fixture(10);
    fx.add_index("coll", "n");
    fx.documents.add(doc("coll/a", 1, &[("n", n(1))]));

    fx.manager
        .persistence()
        .run_transaction("corrupt", |txn| {
            txn.put_index_config(99, vec![0xff]);
            Ok(())
        })
        .unwrap();

    assert!(fx.backfiller.backfill().is_err());
    fx.manager
        .persistence()
        .read(|tables| assert!(tables.entries().is_empty()));
}

#[test]
fn lagging_index_does_not_pull_back_an_index_ahead_of_it() {
    let fx = fixture(1);
    fx.add_index("coll", "x");
    for (path, micros) in [("coll/a", 1), ("coll/b", 2), ("coll/c", 3)] {
        fx.documents.add(doc(path, micros, &[("x", n(micros)), ("y", n(micros))]));
    }
    while fx.backfiller.backfill().unwrap() > 0 {}
    let initial_batch = IndexOffset::INITIAL_LARGEST_BATCH_ID;
    let caught_up = IndexOffset::new(version(3), key("coll/c"), initial_batch);
    assert_eq!(fx.offset("coll"), caught_up);

    fx.add_index("coll", "y");
    assert_eq!(fx.backfiller.backfill().unwrap(), 1);

    let offsets: Vec<IndexOffset> = fx
        .manager
        .get_field_indexes("coll")
        .unwrap()
        .into_iter()
        .map(|index| index.state.offset)
        .collect();
    assert_eq!(
        offsets,
        vec![
            caught_up.clone(),
            IndexOffset::new(version(1), key("coll/a"), initial_batch),
        ]
    );

    while fx.backfiller.backfill().unwrap() > 0 {}
    let all = query("coll").filter(filter("y", ">=", 0i64));
    assert_eq!(fx.indexed(&all), vec!["coll/a", "coll/b", "coll/c"]);
    assert_eq!(fx.offset("coll"), caught_up);
}
