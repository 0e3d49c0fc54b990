//! Module: db::persistence
//! Responsibility: the local tables behind the index manager and their
//! single-writer transaction boundary.
//! Does not own: row semantics; callers decide what each table holds.
//! Boundary: every index write goes through `Persistence::run_transaction`.

#[cfg(test)]
mod tests;

use crate::{
    db::index::{IndexEntry, IndexEntryStore, IndexState},
    error::InternalError,
    model::path::ResourcePath,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{trace, warn};

///
/// Tables
///
/// Index definitions are stored as serialized rows keyed by index id;
/// progress states are keyed by `(index_id, uid)`.
///

#[derive(Debug, Default)]
pub struct Tables {
    index_configs: BTreeMap<i32, Vec<u8>>,
    index_states: BTreeMap<(i32, String), IndexState>,
    entries: IndexEntryStore,
    collection_parents: BTreeMap<String, BTreeSet<ResourcePath>>,
}

impl Tables {
    #[must_use]
    pub const fn index_configs(&self) -> &BTreeMap<i32, Vec<u8>> {
        &self.index_configs
    }

    #[must_use]
    pub fn index_state(&self, index_id: i32, uid: &str) -> Option<&IndexState> {
        self.index_states.get(&(index_id, uid.to_string()))
    }

    /// Every progress state stored for `uid`.
    pub fn index_states_for(&self, uid: &str) -> impl Iterator<Item = (i32, &IndexState)> {
        self.index_states
            .iter()
            .filter(move |((_, state_uid), _)| state_uid == uid)
            .map(|((index_id, _), state)| (*index_id, state))
    }

    #[must_use]
    pub const fn entries(&self) -> &IndexEntryStore {
        &self.entries
    }

    #[must_use]
    pub fn collection_parents(&self, collection_id: &str) -> Vec<ResourcePath> {
        self.collection_parents
            .get(collection_id)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }
}

///
/// UndoOp
///
/// Inverse of one applied write. Replayed in reverse order on rollback.
///

#[derive(Debug)]
enum UndoOp {
    RestoreConfig { index_id: i32, row: Option<Vec<u8>> },
    RestoreState { key: (i32, String), state: Option<IndexState> },
    InsertEntry(IndexEntry),
    RemoveEntry(IndexEntry),
    RemoveCollectionParent { collection_id: String, parent: ResourcePath },
}

///
/// Transaction
///
/// Exclusive write access to the tables for the duration of one
/// `run_transaction` call. Every mutator records its own inverse; a
/// transaction dropped before it finishes (the closure panicked) replays
/// them.
///

pub struct Transaction<'a> {
    tables: &'a mut Tables,
    undo: Vec<UndoOp>,
    finished: bool,
}

impl Transaction<'_> {
    #[must_use]
    pub const fn tables(&self) -> &Tables {
        self.tables
    }

    pub fn put_index_config(&mut self, index_id: i32, row: Vec<u8>) {
        let previous = self.tables.index_configs.insert(index_id, row);
        self.undo.push(UndoOp::RestoreConfig {
            index_id,
            row: previous,
        });
    }

    pub fn delete_index_config(&mut self, index_id: i32) {
        if let Some(previous) = self.tables.index_configs.remove(&index_id) {
            self.undo.push(UndoOp::RestoreConfig {
                index_id,
                row: Some(previous),
            });
        }
    }

    pub fn put_index_state(&mut self, index_id: i32, uid: &str, state: IndexState) {
        let key = (index_id, uid.to_string());
        let previous = self.tables.index_states.insert(key.clone(), state);
        self.undo.push(UndoOp::RestoreState {
            key,
            state: previous,
        });
    }

    /// Remove the states of `index_id` for every user.
    pub fn delete_index_states(&mut self, index_id: i32) {
        let keys: Vec<(i32, String)> = self
            .tables
            .index_states
            .keys()
            .filter(|(id, _)| *id == index_id)
            .cloned()
            .collect();

        for key in keys {
            if let Some(previous) = self.tables.index_states.remove(&key) {
                self.undo.push(UndoOp::RestoreState {
                    key,
                    state: Some(previous),
                });
            }
        }
    }

    /// Insert an entry; returns `false` if it already existed.
    pub fn insert_entry(&mut self, entry: IndexEntry) -> bool {
        debug_assert!(
            self.tables.index_configs.contains_key(&entry.index_id),
            "index entry for unknown field index {}",
            entry.index_id
        );
        if !self.tables.entries.insert(entry.clone()) {
            return false;
        }
        self.undo.push(UndoOp::RemoveEntry(entry));

        true
    }

    /// Remove an entry; returns `false` if it was absent.
    pub fn remove_entry(&mut self, entry: &IndexEntry) -> bool {
        if !self.tables.entries.remove(entry) {
            return false;
        }
        self.undo.push(UndoOp::InsertEntry(entry.clone()));

        true
    }

    /// Record `parent` as a parent path of `collection_id`; returns `false`
    /// if it was already known.
    pub fn add_collection_parent(&mut self, collection_id: &str, parent: ResourcePath) -> bool {
        let parents = self
            .tables
            .collection_parents
            .entry(collection_id.to_string())
            .or_default();
        if !parents.insert(parent.clone()) {
            return false;
        }
        self.undo.push(UndoOp::RemoveCollectionParent {
            collection_id: collection_id.to_string(),
            parent,
        });

        true
    }

    /// Undo every recorded write, newest first. Returns the number undone.
    fn rollback(&mut self) -> usize {
        let count = self.undo.len();

        while let Some(op) = self.undo.pop() {
            match op {
                UndoOp::RestoreConfig { index_id, row } => {
                    match row {
                        Some(row) => self.tables.index_configs.insert(index_id, row),
                        None => self.tables.index_configs.remove(&index_id),
                    };
                }
                UndoOp::RestoreState { key, state } => {
                    match state {
                        Some(state) => self.tables.index_states.insert(key, state),
                        None => self.tables.index_states.remove(&key),
                    };
                }
                UndoOp::InsertEntry(entry) => {
                    self.tables.entries.insert(entry);
                }
                UndoOp::RemoveEntry(entry) => {
                    self.tables.entries.remove(&entry);
                }
                UndoOp::RemoveCollectionParent {
                    collection_id,
                    parent,
                } => {
                    if let Some(parents) = self.tables.collection_parents.get_mut(&collection_id) {
                        parents.remove(&parent);
                        if parents.is_empty() {
                            self.tables.collection_parents.remove(&collection_id);
                        }
                    }
                }
            }
        }

        count
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let undone = self.rollback();
        warn!(undone, "persistence.txn.unwind");
    }
}

///
/// Persistence
///
/// In-process tables behind a reader/writer lock. Writers are serialized by
/// the lock; a failed or panicking transaction leaves the tables exactly as
/// it found them.
///

#[derive(Debug, Default)]
pub struct Persistence {
    tables: RwLock<Tables>,
}

impl Persistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` as one atomic write. On `Err`, every write `f` made is undone
    /// before the error is returned; a panic in `f` undoes them while
    /// unwinding.
    pub fn run_transaction<T>(
        &self,
        label: &'static str,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let mut tables = self.tables.write();
        let mut txn = Transaction {
            tables: &mut tables,
            undo: Vec::new(),
            finished: false,
        };

        let result = f(&mut txn);
        match &result {
            Ok(_) => {
                trace!(label, writes = txn.undo.len(), "persistence.txn.commit");
            }
            Err(err) => {
                let undone = txn.rollback();
                warn!(label, undone, error = %err, "persistence.txn.rollback");
            }
        }
        txn.finished = true;

        result
    }

    /// Run `f` against a consistent snapshot shared with other readers.
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.tables.read())
    }
}
