use crate::{error::InternalError, model::path::ResourcePath};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// DocumentKey
///
/// Path of a document: an even, non-zero number of segments. The empty key
/// exists only as the minimum sentinel used by offsets and range scans.
///

#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct DocumentKey(ResourcePath);

impl DocumentKey {
    /// The key that sorts before every real document key.
    #[must_use]
    pub const fn empty() -> Self {
        Self(ResourcePath::empty())
    }

    pub fn from_path(path: ResourcePath) -> Result<Self, InternalError> {
        if Self::is_document_path(&path) {
            Ok(Self(path))
        } else {
            Err(InternalError::query_unsupported(format!(
                "invalid document key '{path}': expected an even number of segments"
            )))
        }
    }

    /// Parse `"coll/doc"`.
    pub fn parse(path: &str) -> Result<Self, InternalError> {
        Self::from_path(ResourcePath::parse(path))
    }

    #[must_use]
    pub fn is_document_path(path: &ResourcePath) -> bool {
        !path.is_empty() && path.len() % 2 == 0
    }

    #[must_use]
    pub const fn path(&self) -> &ResourcePath {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Id of the collection directly containing this document.
    #[must_use]
    pub fn collection_group(&self) -> Option<&str> {
        let segments = self.0.segments();
        segments
            .len()
            .checked_sub(2)
            .map(|index| segments[index].as_str())
    }

    #[must_use]
    pub fn collection_path(&self) -> ResourcePath {
        self.0.pop_last()
    }

    #[must_use]
    pub fn has_collection_id(&self, collection_id: &str) -> bool {
        self.collection_group() == Some(collection_id)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
