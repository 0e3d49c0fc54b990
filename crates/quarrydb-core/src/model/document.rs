use crate::{
    model::{key::DocumentKey, object::ObjectValue, path::FieldPath},
    types::Timestamp,
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

///
/// SnapshotVersion
///
/// Server commit version of a document or a consistent query snapshot.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct SnapshotVersion(Timestamp);

impl SnapshotVersion {
    pub const NONE: Self = Self(Timestamp::EPOCH);

    #[must_use]
    pub const fn new(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }

    /// Version from whole microseconds, the granularity tests use.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(Timestamp::from_micros(micros))
    }

    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.0
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

///
/// DocumentType
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentType {
    /// Placeholder for a key whose state is not known locally.
    Invalid,
    FoundDocument,
    NoDocument,
    /// Known to exist remotely, contents not available.
    UnknownDocument,
}

///
/// DocumentState
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentState {
    Synced,
    HasLocalMutations,
    HasCommittedMutations,
}

///
/// Document
///
/// Local snapshot of one document: existence, commit version, the read time
/// at which this replica was written, and pending-write state.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    key: DocumentKey,
    document_type: DocumentType,
    version: SnapshotVersion,
    read_time: SnapshotVersion,
    data: ObjectValue,
    state: DocumentState,
}

impl Document {
    #[must_use]
    pub const fn invalid(key: DocumentKey) -> Self {
        Self {
            key,
            document_type: DocumentType::Invalid,
            version: SnapshotVersion::NONE,
            read_time: SnapshotVersion::NONE,
            data: ObjectValue::new(),
            state: DocumentState::Synced,
        }
    }

    #[must_use]
    pub const fn found(key: DocumentKey, version: SnapshotVersion, data: ObjectValue) -> Self {
        Self {
            key,
            document_type: DocumentType::FoundDocument,
            version,
            read_time: SnapshotVersion::NONE,
            data,
            state: DocumentState::Synced,
        }
    }

    #[must_use]
    pub const fn no_document(key: DocumentKey, version: SnapshotVersion) -> Self {
        Self {
            key,
            document_type: DocumentType::NoDocument,
            version,
            read_time: SnapshotVersion::NONE,
            data: ObjectValue::new(),
            state: DocumentState::Synced,
        }
    }

    #[must_use]
    pub const fn unknown(key: DocumentKey, version: SnapshotVersion) -> Self {
        Self {
            key,
            document_type: DocumentType::UnknownDocument,
            version,
            read_time: SnapshotVersion::NONE,
            data: ObjectValue::new(),
            state: DocumentState::HasCommittedMutations,
        }
    }

    #[must_use]
    pub fn with_read_time(mut self, read_time: SnapshotVersion) -> Self {
        self.read_time = read_time;
        self
    }

    #[must_use]
    pub fn with_local_mutations(mut self) -> Self {
        self.state = DocumentState::HasLocalMutations;
        self
    }

    #[must_use]
    pub fn with_committed_mutations(mut self) -> Self {
        self.state = DocumentState::HasCommittedMutations;
        self
    }

    pub(crate) fn convert_to_found(&mut self, version: SnapshotVersion, data: ObjectValue) {
        self.document_type = DocumentType::FoundDocument;
        self.version = version;
        self.data = data;
        self.state = DocumentState::Synced;
    }

    pub(crate) fn convert_to_no_document(&mut self, version: SnapshotVersion) {
        self.document_type = DocumentType::NoDocument;
        self.version = version;
        self.data = ObjectValue::new();
        self.state = DocumentState::Synced;
    }

    pub(crate) const fn set_has_local_mutations(&mut self) {
        self.state = DocumentState::HasLocalMutations;
    }

    #[must_use]
    pub const fn key(&self) -> &DocumentKey {
        &self.key
    }

    #[must_use]
    pub const fn document_type(&self) -> DocumentType {
        self.document_type
    }

    #[must_use]
    pub const fn version(&self) -> SnapshotVersion {
        self.version
    }

    #[must_use]
    pub const fn read_time(&self) -> SnapshotVersion {
        self.read_time
    }

    #[must_use]
    pub const fn data(&self) -> &ObjectValue {
        &self.data
    }

    #[must_use]
    pub const fn state(&self) -> DocumentState {
        self.state
    }

    #[must_use]
    pub const fn is_found_document(&self) -> bool {
        matches!(self.document_type, DocumentType::FoundDocument)
    }

    #[must_use]
    pub const fn is_no_document(&self) -> bool {
        matches!(self.document_type, DocumentType::NoDocument)
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !matches!(self.document_type, DocumentType::Invalid)
    }

    #[must_use]
    pub const fn has_local_mutations(&self) -> bool {
        matches!(self.state, DocumentState::HasLocalMutations)
    }

    #[must_use]
    pub const fn has_pending_writes(&self) -> bool {
        !matches!(self.state, DocumentState::Synced)
    }

    /// Field value at `path`; the key path resolves to a reference to this
    /// document.
    #[must_use]
    pub fn field(&self, path: &FieldPath) -> Option<Cow<'_, Value>> {
        if path.is_key_field() {
            return Some(Cow::Owned(Value::Reference(self.key.path().clone())));
        }

        self.data.get(path).map(Cow::Borrowed)
    }
}
