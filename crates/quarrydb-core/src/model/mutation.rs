use crate::model::{
    document::Document, key::DocumentKey, object::ObjectValue, path::FieldPath,
};

///
/// Mutation
///
/// A pending local write against one document.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Replace the document with `value`.
    Set { key: DocumentKey, value: ObjectValue },

    /// Merge the `mask` fields of `value` into an existing document; a
    /// masked field absent from `value` is deleted.
    Patch {
        key: DocumentKey,
        value: ObjectValue,
        mask: Vec<FieldPath>,
    },

    Delete { key: DocumentKey },
}

impl Mutation {
    #[must_use]
    pub const fn key(&self) -> &DocumentKey {
        match self {
            Self::Set { key, .. } | Self::Patch { key, .. } | Self::Delete { key } => key,
        }
    }

    /// Apply this mutation to the local view of `document`.
    ///
    /// Patches only apply to documents that exist locally.
    pub fn apply_to_local_view(&self, document: &mut Document) {
        match self {
            Self::Set { value, .. } => {
                let version = document.version();
                document.convert_to_found(version, value.clone());
                document.set_has_local_mutations();
            }
            Self::Patch { value, mask, .. } => {
                if !document.is_found_document() {
                    return;
                }

                let mut data = document.data().clone();
                for path in mask {
                    match value.get(path) {
                        Some(field) => data.set(path, field.clone()),
                        None => data.delete(path),
                    }
                }

                let version = document.version();
                document.convert_to_found(version, data);
                document.set_has_local_mutations();
            }
            Self::Delete { .. } => {
                let version = document.version();
                document.convert_to_no_document(version);
                document.set_has_local_mutations();
            }
        }
    }
}

///
/// Overlay
///
/// Net effect of every pending mutation for one document, tagged with the
/// largest batch id that contributed to it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub largest_batch_id: i32,
    pub mutation: Mutation,
}

impl Overlay {
    #[must_use]
    pub const fn new(largest_batch_id: i32, mutation: Mutation) -> Self {
        Self {
            largest_batch_id,
            mutation,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &DocumentKey {
        self.mutation.key()
    }
}
