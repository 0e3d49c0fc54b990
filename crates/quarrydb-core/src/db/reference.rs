//! Document key to owner-id bookkeeping, used to track which targets or
//! mutation batches keep a document alive.

use crate::model::key::DocumentKey;
use std::collections::BTreeSet;

///
/// ReferenceSet
///
/// Pairs of (document key, owner id) indexed both ways so either side can
/// be enumerated in order.
///

#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
    by_key: BTreeSet<(DocumentKey, i32)>,
    by_id: BTreeSet<(i32, DocumentKey)>,
}

impl ReferenceSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            by_key: BTreeSet::new(),
            by_id: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn add_reference(&mut self, key: DocumentKey, id: i32) {
        self.by_id.insert((id, key.clone()));
        self.by_key.insert((key, id));
    }

    pub fn add_references(&mut self, keys: impl IntoIterator<Item = DocumentKey>, id: i32) {
        for key in keys {
            self.add_reference(key, id);
        }
    }

    pub fn remove_reference(&mut self, key: &DocumentKey, id: i32) {
        self.by_key.remove(&(key.clone(), id));
        self.by_id.remove(&(id, key.clone()));
    }

    pub fn remove_references<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a DocumentKey>,
        id: i32,
    ) {
        for key in keys {
            self.remove_reference(key, id);
        }
    }

    /// Drop every reference held by `id`; returns the released keys.
    pub fn remove_references_for_id(&mut self, id: i32) -> Vec<DocumentKey> {
        let keys = self.references_for_id(id);
        for key in &keys {
            self.remove_reference(key, id);
        }

        keys
    }

    pub fn remove_all_references(&mut self) {
        self.by_key.clear();
        self.by_id.clear();
    }

    /// Keys referenced by `id`, in key order.
    #[must_use]
    pub fn references_for_id(&self, id: i32) -> Vec<DocumentKey> {
        self.by_id
            .range((id, DocumentKey::empty())..)
            .take_while(|(owner, _)| *owner == id)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Whether any owner references `key`.
    #[must_use]
    pub fn contains_key(&self, key: &DocumentKey) -> bool {
        self.by_key
            .range((key.clone(), i32::MIN)..)
            .next()
            .is_some_and(|(found, _)| found == key)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::key;

    #[test]
    fn references_are_tracked_per_owner() {
        let mut set = ReferenceSet::new();
        set.add_references([key("coll/a"), key("coll/b")], 1);
        set.add_reference(key("coll/b"), 2);

        assert_eq!(set.references_for_id(1), vec![key("coll/a"), key("coll/b")]);
        assert_eq!(set.references_for_id(2), vec![key("coll/b")]);
        assert!(set.references_for_id(3).is_empty());

        set.remove_reference(&key("coll/b"), 1);
        assert!(set.contains_key(&key("coll/b")));
        assert_eq!(set.references_for_id(1), vec![key("coll/a")]);
    }

    #[test]
    fn removing_an_owner_releases_its_keys() {
        let mut set = ReferenceSet::new();
        set.add_references([key("coll/a"), key("coll/b")], 7);
        set.add_reference(key("coll/a"), 8);

        let released = set.remove_references_for_id(7);

        assert_eq!(released, vec![key("coll/a"), key("coll/b")]);
        assert!(set.contains_key(&key("coll/a")));
        assert!(!set.contains_key(&key("coll/b")));

        set.remove_references(&[key("coll/a")], 8);
        assert!(set.is_empty());
    }

    #[test]
    fn clearing_drops_everything() {
        let mut set = ReferenceSet::new();
        set.add_reference(key("coll/a"), 1);
        set.remove_all_references();

        assert!(set.is_empty());
        assert!(!set.contains_key(&key("coll/a")));
    }
}
