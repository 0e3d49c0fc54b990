use super::Persistence;
use crate::{
    db::index::{IndexEntry, IndexState},
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::path::ResourcePath,
    test_support::key,
};
use std::panic::{self, AssertUnwindSafe};

fn entry(path: &str) -> IndexEntry {
    IndexEntry::new(1, String::new(), Vec::new(), vec![1], key(path))
}

#[test]
fn committed_writes_are_visible_to_readers() {
    let persistence = Persistence::new();

    persistence
        .run_transaction("write", |txn| {
            txn.put_index_config(1, vec![0xA0]);
            txn.put_index_state(1, "u", IndexState::INITIAL);
            txn.insert_entry(entry("coll/a"));
            txn.add_collection_parent("coll", ResourcePath::empty());
            Ok(())
        })
        .unwrap();

    persistence.read(|tables| {
        assert_eq!(tables.index_configs().len(), 1);
        assert_eq!(tables.index_state(1, "u"), Some(&IndexState::INITIAL));
        assert!(tables.entries().contains(&entry("coll/a")));
        assert_eq!(tables.collection_parents("coll"), vec![ResourcePath::empty()]);
    });
}

#[test]
fn failed_transaction_restores_every_table() {
    let persistence = Persistence::new();
    persistence
        .run_transaction("seed", |txn| {
            txn.put_index_config(1, vec![1]);
            txn.put_index_state(1, "u", IndexState::INITIAL);
            txn.insert_entry(entry("coll/a"));
            Ok(())
        })
        .unwrap();

    let result: Result<(), InternalError> = persistence.run_transaction("fail", |txn| {
        txn.put_index_config(1, vec![2]);
        txn.put_index_config(2, vec![3]);
        txn.put_index_state(1, "u", IndexState::new(7, IndexState::INITIAL.offset));
        txn.delete_index_states(1);
        txn.remove_entry(&entry("coll/a"));
        txn.insert_entry(entry("coll/b"));
        txn.add_collection_parent("coll", ResourcePath::parse("rooms/r1"));
        Err(InternalError::new(ErrorClass::Internal, ErrorOrigin::Store, "boom"))
    });

    assert!(result.is_err());
    persistence.read(|tables| {
        assert_eq!(tables.index_configs().get(&1), Some(&vec![1]));
        assert!(tables.index_configs().get(&2).is_none());
        assert_eq!(tables.index_state(1, "u"), Some(&IndexState::INITIAL));
        assert!(tables.entries().contains(&entry("coll/a")));
        assert!(!tables.entries().contains(&entry("coll/b")));
        assert!(tables.collection_parents("coll").is_empty());
    });
}

#[test]
fn duplicate_writes_record_no_undo() {
    let persistence = Persistence::new();

    let inserted = persistence
        .run_transaction("dup", |txn| {
            txn.put_index_config(1, vec![0xA0]);
            let first = txn.insert_entry(entry("coll/a"));
            let second = txn.insert_entry(entry("coll/a"));
            let removed_missing = txn.remove_entry(&entry("coll/z"));
            Ok((first, second, removed_missing))
        })
        .unwrap();

    assert_eq!(inserted, (true, false, false));
}

#[test]
fn panicking_transaction_is_rolled_back() {
    let persistence = Persistence::new();
    persistence
        .run_transaction("seed", |txn| {
            txn.put_index_config(1, vec![1]);
            Ok(())
        })
        .unwrap();

    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        persistence.run_transaction("panic", |txn| -> Result<(), InternalError> {
            txn.put_index_config(1, vec![2]);
            txn.insert_entry(entry("coll/a"));
            panic!("writer failed mid-transaction");
        })
    }));

    assert!(unwound.is_err());
    persistence.read(|tables| {
        assert_eq!(tables.index_configs().get(&1), Some(&vec![1]));
        assert!(tables.entries().is_empty());
    });
    persistence
        .run_transaction("after", |txn| {
            txn.insert_entry(entry("coll/b"));
            Ok(())
        })
        .unwrap();
}
