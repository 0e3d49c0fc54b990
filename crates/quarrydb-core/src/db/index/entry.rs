use crate::model::key::DocumentKey;
use std::{collections::BTreeSet, ops::Bound};

///
/// IndexEntry
///
/// One row of a field index. Entries order by
/// `(index_id, uid, array_value, directional_value, document_key)`, so a
/// single contiguous range covers every document whose encoded directional
/// tuple falls between two byte strings.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IndexEntry {
    pub index_id: i32,
    pub uid: String,
    /// Ascending encoding of one array element; empty for indexes without a
    /// contains segment.
    pub array_value: Vec<u8>,
    /// Concatenated encodings of the directional segment values.
    pub directional_value: Vec<u8>,
    pub document_key: DocumentKey,
}

impl IndexEntry {
    #[must_use]
    pub const fn new(
        index_id: i32,
        uid: String,
        array_value: Vec<u8>,
        directional_value: Vec<u8>,
        document_key: DocumentKey,
    ) -> Self {
        Self {
            index_id,
            uid,
            array_value,
            directional_value,
            document_key,
        }
    }

    fn document_order_key(&self) -> DocumentOrderKey {
        DocumentOrderKey {
            index_id: self.index_id,
            uid: self.uid.clone(),
            document_key: self.document_key.clone(),
            array_value: self.array_value.clone(),
            directional_value: self.directional_value.clone(),
        }
    }
}

///
/// DocumentOrderKey
///
/// Secondary ordering of entries by owning document.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct DocumentOrderKey {
    index_id: i32,
    uid: String,
    document_key: DocumentKey,
    array_value: Vec<u8>,
    directional_value: Vec<u8>,
}

impl DocumentOrderKey {
    fn into_entry(self) -> IndexEntry {
        IndexEntry::new(
            self.index_id,
            self.uid,
            self.array_value,
            self.directional_value,
            self.document_key,
        )
    }
}

///
/// IndexEntryStore
///
/// Ordered entry set plus a by-document view used to diff a document's
/// entries on update. Both views always hold the same entries.
///

#[derive(Clone, Debug, Default)]
pub struct IndexEntryStore {
    by_value: BTreeSet<IndexEntry>,
    by_document: BTreeSet<DocumentOrderKey>,
}

impl IndexEntryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            by_value: BTreeSet::new(),
            by_document: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entry: &IndexEntry) -> bool {
        self.by_value.contains(entry)
    }

    /// Insert `entry`; returns `false` if it was already present.
    pub fn insert(&mut self, entry: IndexEntry) -> bool {
        let by_document = entry.document_order_key();
        if !self.by_value.insert(entry) {
            return false;
        }
        self.by_document.insert(by_document);

        true
    }

    /// Remove `entry`; returns `false` if it was absent.
    pub fn remove(&mut self, entry: &IndexEntry) -> bool {
        if !self.by_value.remove(entry) {
            return false;
        }
        self.by_document.remove(&entry.document_order_key());

        true
    }

    /// Every entry of `document_key` in one index for one user.
    #[must_use]
    pub fn entries_for_document(
        &self,
        index_id: i32,
        uid: &str,
        document_key: &DocumentKey,
    ) -> BTreeSet<IndexEntry> {
        let start = DocumentOrderKey {
            index_id,
            uid: uid.to_string(),
            document_key: document_key.clone(),
            array_value: Vec::new(),
            directional_value: Vec::new(),
        };

        self.by_document
            .range(start..)
            .take_while(|key| {
                key.index_id == index_id && key.uid == uid && &key.document_key == document_key
            })
            .cloned()
            .map(DocumentOrderKey::into_entry)
            .collect()
    }

    /// Every entry of one index, across all users.
    #[must_use]
    pub fn entries_for_index(&self, index_id: i32) -> Vec<IndexEntry> {
        self.by_value
            .iter()
            .filter(|entry| entry.index_id == index_id)
            .cloned()
            .collect()
    }

    /// Entries of one index, user and array value whose directional value
    /// lies in `[lower, upper)`; `upper = None` leaves the range open.
    /// Results come back in entry order.
    pub fn scan<'a>(
        &'a self,
        index_id: i32,
        uid: &'a str,
        array_value: &'a [u8],
        lower: &[u8],
        upper: Option<&'a [u8]>,
    ) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        let start = IndexEntry::new(
            index_id,
            uid.to_string(),
            array_value.to_vec(),
            lower.to_vec(),
            DocumentKey::empty(),
        );

        self.by_value
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(move |entry| {
                entry.index_id == index_id
                    && entry.uid == uid
                    && entry.array_value == array_value
                    && upper.is_none_or(|upper| entry.directional_value.as_slice() < upper)
            })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::key;

    fn entry(index_id: i32, directional: &[u8], path: &str) -> IndexEntry {
        IndexEntry::new(index_id, String::new(), Vec::new(), directional.to_vec(), key(path))
    }

    #[test]
    fn scan_is_half_open_and_scoped_to_one_index() {
        let mut store = IndexEntryStore::new();
        store.insert(entry(1, &[1], "coll/a"));
        store.insert(entry(1, &[2], "coll/b"));
        store.insert(entry(1, &[2, 0], "coll/c"));
        store.insert(entry(1, &[3], "coll/d"));
        store.insert(entry(2, &[2], "coll/e"));

        let keys: Vec<String> = store
            .scan(1, "", &[], &[2], Some(&[3]))
            .map(|entry| entry.document_key.to_string())
            .collect();

        assert_eq!(keys, vec!["coll/b", "coll/c"]);
        assert_eq!(store.scan(1, "", &[], &[], None).count(), 4);
    }

    #[test]
    fn document_view_tracks_inserts_and_removes() {
        let mut store = IndexEntryStore::new();
        let first = entry(1, &[1], "coll/a");
        let second = entry(1, &[2], "coll/a");

        assert!(store.insert(first.clone()));
        assert!(!store.insert(first.clone()));
        store.insert(second.clone());
        store.insert(entry(1, &[1], "coll/b"));

        assert_eq!(store.entries_for_document(1, "", &key("coll/a")).len(), 2);
        assert!(store.remove(&first));
        assert!(!store.remove(&first));

        let remaining = store.entries_for_document(1, "", &key("coll/a"));
        assert_eq!(remaining.into_iter().collect::<Vec<_>>(), vec![second]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn users_do_not_share_entries() {
        let mut store = IndexEntryStore::new();
        store.insert(IndexEntry::new(1, "alice".into(), Vec::new(), vec![1], key("coll/a")));

        assert_eq!(store.scan(1, "bob", &[], &[], None).count(), 0);
        assert!(store.entries_for_document(1, "bob", &key("coll/a")).is_empty());
        assert_eq!(store.entries_for_index(1).len(), 1);
    }
}
