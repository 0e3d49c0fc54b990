//! Module: index::manager
//! Responsibility: index definitions, per-user progress, entry maintenance,
//! and serving targets from the entry store.
//! Does not own: document or overlay reads; callers hand documents in.
//! Boundary: reads go through `Persistence::read`, writes through
//! `Persistence::run_transaction`. The `*_in` variants let a caller compose
//! several steps into one transaction.


use crate::{
    db::{
        Direction, User,
        codec::{encode_value, encode_value_into},
        index::{
            FieldIndexRow, TargetIndexMatcher,
            bound::plan_scans,
            definition::{FieldIndex, IndexOffset, IndexState, IndexType},
            entry::IndexEntry,
        },
        persistence::{Persistence, Tables, Transaction},
        query::Target,
    },
    error::InternalError,
    model::{document::Document, key::DocumentKey, path::ResourcePath},
    obs::sink::{MetricsEvent, record},
    serialize::{deserialize, serialize},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::debug;

///
/// IndexManager
///
/// Index operations on behalf of one user. Definitions are shared by all
/// users; progress states and entries belong to `user`. Switching identity
/// means building a new manager over the same persistence.
///

#[derive(Clone, Debug)]
pub struct IndexManager {
    persistence: Arc<Persistence>,
    user: User,
}

impl IndexManager {
    #[must_use]
    pub const fn new(persistence: Arc<Persistence>, user: User) -> Self {
        Self { persistence, user }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn persistence(&self) -> &Arc<Persistence> {
        &self.persistence
    }

    // ------------------------------------------------------------------
    // Collection parents
    // ------------------------------------------------------------------

    /// Remember the parent path of a collection so collection-group
    /// queries can enumerate every collection with that id.
    pub fn add_to_collection_parent_index(
        &self,
        collection_path: &ResourcePath,
    ) -> Result<(), InternalError> {
        let Some(collection_id) = collection_path.last_segment() else {
            return Err(InternalError::index_invariant(
                "collection parent index needs a non-empty collection path",
            ));
        };
        let parent = collection_path.pop_last();

        self.persistence
            .run_transaction("add_collection_parent", |txn| {
                txn.add_collection_parent(collection_id, parent);
                Ok(())
            })
    }

    #[must_use]
    pub fn get_collection_parents(&self, collection_id: &str) -> Vec<ResourcePath> {
        self.persistence
            .read(|tables| tables.collection_parents(collection_id))
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Persist `index`. A definition with identical segments that already
    /// exists is returned unchanged, progress included.
    pub fn add_field_index(&self, index: &FieldIndex) -> Result<FieldIndex, InternalError> {
        self.persistence
            .run_transaction("add_field_index", |txn| self.add_field_index_in(txn, index))
    }

    /// Delete `index` with its progress states (for all users) and entries.
    pub fn delete_field_index(&self, index: &FieldIndex) -> Result<(), InternalError> {
        self.persistence.run_transaction("delete_field_index", |txn| {
            let indexes = self.load_indexes(txn.tables())?;
            let Some(stored) = indexes.iter().find(|stored| {
                stored.index_id == index.index_id || stored.same_definition(index)
            }) else {
                return Ok(());
            };

            delete_index_in(txn, stored.index_id);
            debug!(index = %stored, "index.delete");

            Ok(())
        })
    }

    pub fn delete_all_field_indexes(&self) -> Result<(), InternalError> {
        self.persistence
            .run_transaction("delete_all_field_indexes", |txn| {
                let ids: Vec<i32> = txn.tables().index_configs().keys().copied().collect();
                for index_id in &ids {
                    delete_index_in(txn, *index_id);
                }
                debug!(count = ids.len(), "index.delete_all");

                Ok(())
            })
    }

    /// Indexes defined on `collection_group`, with this user's progress.
    pub fn get_field_indexes(
        &self,
        collection_group: &str,
    ) -> Result<Vec<FieldIndex>, InternalError> {
        self.persistence
            .read(|tables| self.indexes_for_group(tables, collection_group))
    }

    /// Every index definition, with this user's progress.
    pub fn get_field_indexes_all(&self) -> Result<Vec<FieldIndex>, InternalError> {
        self.persistence.read(|tables| self.load_indexes(tables))
    }

    /// Add, for every sub-target not fully served today, the index that
    /// would serve it. Returns the indexes that now back those sub-targets.
    pub fn create_target_indexes(&self, target: &Target) -> Result<Vec<FieldIndex>, InternalError> {
        self.persistence
            .run_transaction("create_target_indexes", |txn| {
                let mut created = Vec::new();
                for sub_target in target.sub_targets() {
                    let index_type = self.index_type_in(txn.tables(), &sub_target)?;
                    if index_type == IndexType::Full {
                        continue;
                    }
                    let Some(index) = TargetIndexMatcher::new(&sub_target).build_target_index()
                    else {
                        continue;
                    };
                    created.push(self.add_field_index_in(txn, &index)?);
                }

                Ok(created)
            })
    }

    // ------------------------------------------------------------------
    // Planning
    // ------------------------------------------------------------------

    /// How well the configured indexes serve `target`.
    ///
    /// `None` when some sub-target has no usable index, `Partial` when an
    /// index covers fewer segments than the sub-target needs (or when a
    /// limited target has several sub-targets), otherwise `Full`.
    pub fn get_index_type(&self, target: &Target) -> Result<IndexType, InternalError> {
        self.persistence
            .read(|tables| self.index_type_in(tables, target))
    }

    /// The usable index with the most segments for a conjunctive target.
    pub fn get_field_index(&self, target: &Target) -> Result<Option<FieldIndex>, InternalError> {
        self.persistence
            .read(|tables| self.field_index_in(tables, target))
    }

    /// Keys of documents whose index entries match `target`, or `None` when
    /// some sub-target has no usable index.
    ///
    /// Sub-target results are unioned without duplicates. The keys are a
    /// superset of the matching documents unless the scan is exact.
    pub fn get_documents_matching_target(
        &self,
        target: &Target,
    ) -> Result<Option<Vec<DocumentKey>>, InternalError> {
        self.persistence
            .read(|tables| self.documents_matching_target_in(tables, target))
    }

    /// Oldest offset among the indexes serving `target`, carrying the
    /// largest batch id any of them has seen.
    pub fn get_min_offset(&self, target: &Target) -> Result<IndexOffset, InternalError> {
        self.persistence.read(|tables| {
            let mut indexes = Vec::new();
            for sub_target in target.sub_targets() {
                if let Some(index) = self.field_index_in(tables, &sub_target)? {
                    indexes.push(index);
                }
            }

            min_offset(&indexes)
        })
    }

    /// Oldest offset among the indexes of `collection_group`.
    pub fn get_min_offset_for_group(
        &self,
        collection_group: &str,
    ) -> Result<IndexOffset, InternalError> {
        self.persistence
            .read(|tables| self.min_offset_for_group_in(tables, collection_group))
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Bring the entries of `documents` up to date in every index of their
    /// collection group, writing only the difference.
    pub fn update_index_entries(&self, documents: &[Document]) -> Result<(), InternalError> {
        self.persistence
            .run_transaction("update_index_entries", |txn| {
                self.update_index_entries_in(txn, documents)
            })
    }

    /// Collection group whose indexes were updated least recently; ties go
    /// to the smaller group name.
    pub fn get_next_collection_group_to_update(&self) -> Result<Option<String>, InternalError> {
        self.persistence
            .read(|tables| self.next_collection_group_in(tables))
    }

    /// Move every index of `collection_group` to `offset` and give them the
    /// next sequence number, which rotates the group to the back of the
    /// backfill queue.
    pub fn update_collection_group(
        &self,
        collection_group: &str,
        offset: IndexOffset,
    ) -> Result<(), InternalError> {
        self.persistence
            .run_transaction("update_collection_group", |txn| {
                self.update_collection_group_in(txn, collection_group, offset)
            })
    }

    // ------------------------------------------------------------------
    // Transaction-scoped operations
    // ------------------------------------------------------------------

    pub(crate) fn add_field_index_in(
        &self,
        txn: &mut Transaction<'_>,
        index: &FieldIndex,
    ) -> Result<FieldIndex, InternalError> {
        let indexes = self.load_indexes(txn.tables())?;
        if let Some(existing) = indexes.iter().find(|existing| existing.same_definition(index)) {
            debug!(index = %existing, "index.add.exists");
            return Ok(existing.clone());
        }

        let index_id = indexes
            .iter()
            .map(|existing| existing.index_id)
            .max()
            .map_or(1, |max| max + 1);
        let row = serialize(&FieldIndexRow {
            collection_group: index.collection_group.clone(),
            segments: index.segments.clone(),
        })?;
        txn.put_index_config(index_id, row);
        if index.state != IndexState::INITIAL {
            txn.put_index_state(index_id, self.user.storage_uid(), index.state.clone());
        }

        let added = FieldIndex {
            index_id,
            ..index.clone()
        };
        debug!(index = %added, "index.add");
        record(MetricsEvent::IndexCreated {
            collection_group: added.collection_group.clone(),
        });

        Ok(added)
    }

    pub(crate) fn update_index_entries_in(
        &self,
        txn: &mut Transaction<'_>,
        documents: &[Document],
    ) -> Result<(), InternalError> {
        let uid = self.user.storage_uid();
        let indexes = self.load_indexes(txn.tables())?;
        let mut inserts = 0u64;
        let mut removes = 0u64;

        for doc in documents {
            let Some(collection_group) = doc.key().collection_group() else {
                continue;
            };

            for index in indexes
                .iter()
                .filter(|index| index.collection_group == collection_group)
            {
                let existing = txn
                    .tables()
                    .entries()
                    .entries_for_document(index.index_id, uid, doc.key());
                let computed = compute_index_entries(doc, index, uid);

                for stale in existing.difference(&computed) {
                    if txn.remove_entry(stale) {
                        removes += 1;
                    }
                }
                for fresh in computed.difference(&existing) {
                    if txn.insert_entry(fresh.clone()) {
                        inserts += 1;
                    }
                }
            }
        }

        if inserts > 0 || removes > 0 {
            debug!(
                documents = documents.len(),
                inserts, removes, "index.entries.update"
            );
            record(MetricsEvent::IndexDelta { inserts, removes });
        }

        Ok(())
    }

    pub(crate) fn update_collection_group_in(
        &self,
        txn: &mut Transaction<'_>,
        collection_group: &str,
        offset: IndexOffset,
    ) -> Result<(), InternalError> {
        let uid = self.user.storage_uid();
        let sequence_number = txn
            .tables()
            .index_states_for(uid)
            .map(|(_, state)| state.sequence_number)
            .max()
            .unwrap_or(IndexState::INITIAL_SEQUENCE_NUMBER)
            + 1;
        let indexes = self.indexes_for_group(txn.tables(), collection_group)?;

        // an index already past `offset` keeps its own position
        for index in &indexes {
            txn.put_index_state(
                index.index_id,
                uid,
                IndexState::new(sequence_number, index.state.offset.advanced_to(&offset)),
            );
        }
        debug!(
            collection_group,
            sequence_number,
            indexes = indexes.len(),
            read_time = %offset.read_time,
            "index.collection_group.update"
        );

        Ok(())
    }

    pub(crate) fn next_collection_group_in(
        &self,
        tables: &Tables,
    ) -> Result<Option<String>, InternalError> {
        let indexes = self.load_indexes(tables)?;

        Ok(indexes
            .into_iter()
            .min_by(|left, right| {
                (left.state.sequence_number, &left.collection_group)
                    .cmp(&(right.state.sequence_number, &right.collection_group))
            })
            .map(|index| index.collection_group))
    }

    pub(crate) fn min_offset_for_group_in(
        &self,
        tables: &Tables,
        collection_group: &str,
    ) -> Result<IndexOffset, InternalError> {
        min_offset(&self.indexes_for_group(tables, collection_group)?)
    }

    pub(crate) fn index_type_in(
        &self,
        tables: &Tables,
        target: &Target,
    ) -> Result<IndexType, InternalError> {
        let sub_targets = target.sub_targets();
        let mut index_type = IndexType::Full;

        for sub_target in &sub_targets {
            let Some(index) = self.field_index_in(tables, sub_target)? else {
                index_type = IndexType::None;
                break;
            };
            if index.segments.len() < sub_target.segment_count() {
                index_type = IndexType::Partial;
            }
        }

        // limits over a union are applied in memory after sorting
        if target.has_limit() && sub_targets.len() > 1 && index_type == IndexType::Full {
            index_type = IndexType::Partial;
        }

        Ok(index_type)
    }

    fn field_index_in(
        &self,
        tables: &Tables,
        target: &Target,
    ) -> Result<Option<FieldIndex>, InternalError> {
        let matcher = TargetIndexMatcher::new(target);
        let indexes = self.indexes_for_group(tables, matcher.collection_id())?;

        Ok(indexes
            .into_iter()
            .filter(|index| matcher.served_by_index(index))
            .reduce(|best, index| {
                if index.segments.len() > best.segments.len() {
                    index
                } else {
                    best
                }
            }))
    }

    fn documents_matching_target_in(
        &self,
        tables: &Tables,
        target: &Target,
    ) -> Result<Option<Vec<DocumentKey>>, InternalError> {
        let uid = self.user.storage_uid();
        let sub_targets = target.sub_targets();
        let mut keys: BTreeSet<DocumentKey> = BTreeSet::new();

        for sub_target in &sub_targets {
            let Some(index) = self.field_index_in(tables, sub_target)? else {
                return Ok(None);
            };
            let plan = plan_scans(sub_target, &index);

            // A single exact scan in key-ascending order is already sorted
            // the way the target is, so the limit can stop the scan early.
            let limit = target.limit().filter(|_| {
                sub_targets.len() == 1
                    && plan.exact
                    && plan.scans.len() == 1
                    && target.key_order() == Direction::Asc
                    && index.segments.len() >= sub_target.segment_count()
            });

            if let Some(limit) = limit {
                let ordered: Vec<DocumentKey> = plan
                    .scans
                    .iter()
                    .flat_map(|scan| {
                        tables.entries().scan(
                            index.index_id,
                            uid,
                            &scan.array_value,
                            &scan.lower,
                            scan.upper.as_deref(),
                        )
                    })
                    .take(usize::try_from(limit).unwrap_or(usize::MAX))
                    .map(|entry| entry.document_key.clone())
                    .collect();
                debug!(index = %index, keys = ordered.len(), limit, "index.scan.limited");

                return Ok(Some(ordered));
            }

            for scan in &plan.scans {
                let hits = tables.entries().scan(
                    index.index_id,
                    uid,
                    &scan.array_value,
                    &scan.lower,
                    scan.upper.as_deref(),
                );
                keys.extend(hits.map(|entry| entry.document_key.clone()));
            }
            debug!(
                index = %index,
                scans = plan.scans.len(),
                exact = plan.exact,
                "index.scan"
            );
        }

        Ok(Some(keys.into_iter().collect()))
    }

    fn indexes_for_group(
        &self,
        tables: &Tables,
        collection_group: &str,
    ) -> Result<Vec<FieldIndex>, InternalError> {
        let mut indexes = self.load_indexes(tables)?;
        indexes.retain(|index| index.collection_group == collection_group);

        Ok(indexes)
    }

    /// Decode every stored definition and attach this user's progress;
    /// indexes this user never advanced start from the initial state.
    fn load_indexes(&self, tables: &Tables) -> Result<Vec<FieldIndex>, InternalError> {
        let uid = self.user.storage_uid();
        let states: BTreeMap<i32, &IndexState> = tables.index_states_for(uid).collect();

        tables
            .index_configs()
            .iter()
            .map(|(index_id, row)| {
                let row: FieldIndexRow = deserialize(row).map_err(|err| {
                    InternalError::index_corruption(format!("field index {index_id}: {err}"))
                })?;

                Ok(FieldIndex {
                    index_id: *index_id,
                    collection_group: row.collection_group,
                    segments: row.segments,
                    state: states
                        .get(index_id)
                        .map_or(IndexState::INITIAL, |state| (*state).clone()),
                })
            })
            .collect()
    }
}

fn delete_index_in(txn: &mut Transaction<'_>, index_id: i32) {
    let entries = txn.tables().entries().entries_for_index(index_id);
    for entry in &entries {
        txn.remove_entry(entry);
    }
    txn.delete_index_states(index_id);
    txn.delete_index_config(index_id);
}

fn min_offset(indexes: &[FieldIndex]) -> Result<IndexOffset, InternalError> {
    let mut offsets = indexes.iter().map(|index| &index.state.offset);
    let Some(first) = offsets.next() else {
        return Err(InternalError::index_invariant(
            "no field index to take a minimum offset from",
        ));
    };

    let (min, largest_batch_id) = offsets.fold(
        (first, first.largest_batch_id),
        |(min, largest_batch_id), offset| {
            (
                if offset < min { offset } else { min },
                largest_batch_id.max(offset.largest_batch_id),
            )
        },
    );

    Ok(IndexOffset::new(
        min.read_time,
        min.document_key.clone(),
        largest_batch_id,
    ))
}

/// Entries `doc` contributes to `index`: none unless every directional
/// field is present; one per distinct element when the index has a
/// contains segment and the field holds an array.
pub(crate) fn compute_index_entries(
    doc: &Document,
    index: &FieldIndex,
    uid: &str,
) -> BTreeSet<IndexEntry> {
    let mut entries = BTreeSet::new();
    if !doc.is_found_document() {
        return entries;
    }

    let mut directional_value = Vec::new();
    for segment in index.directional_segments() {
        let (Some(value), Some(direction)) = (doc.field(&segment.field), segment.kind.direction())
        else {
            return entries;
        };
        encode_value_into(&mut directional_value, &value, direction);
    }

    let entry = |array_value: Vec<u8>| {
        IndexEntry::new(
            index.index_id,
            uid.to_string(),
            array_value,
            directional_value.clone(),
            doc.key().clone(),
        )
    };

    match index.array_segment() {
        None => {
            entries.insert(entry(Vec::new()));
        }
        Some(segment) => {
            let field = doc.field(&segment.field);
            if let Some(values) = field.as_deref().and_then(|value| value.as_array()) {
                entries.extend(
                    values
                        .iter()
                        .map(|value| entry(encode_value(value, Direction::Asc))),
                );
            }
        }
    }

    entries
}
