use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ResourcePath
///
/// Slash-separated path to a collection or document. Ordered segment by
/// segment, a shorter path sorting before any path it prefixes.
///

#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parse `"rooms/a/messages"` into segments, ignoring empty segments.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn last_segment(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[must_use]
    pub fn pop_last(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();

        Self(segments)
    }

    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());

        Self(segments)
    }

    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    #[must_use]
    pub fn is_immediate_parent_of(&self, other: &Self) -> bool {
        other.len() == self.len() + 1 && self.is_prefix_of(other)
    }

    #[must_use]
    pub fn canonical_string(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

///
/// FieldPath
///
/// Dotted path to a field inside a document. The reserved `__name__` path
/// addresses the document key itself.
///

#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub const KEY_FIELD_NAME: &'static str = "__name__";

    /// Parse `"a.b.c"`; the literal `"__name__"` yields the key path.
    #[must_use]
    pub fn from_dotted(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn key_path() -> Self {
        Self(vec![Self::KEY_FIELD_NAME.to_string()])
    }

    #[must_use]
    pub fn is_key_field(&self) -> bool {
        self.0.len() == 1 && self.0[0] == Self::KEY_FIELD_NAME
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn canonical_string(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}
