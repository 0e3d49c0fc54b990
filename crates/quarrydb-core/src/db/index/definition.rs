use crate::{
    db::Direction,
    model::{
        document::{Document, SnapshotVersion},
        key::DocumentKey,
        path::FieldPath,
    },
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// SegmentKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum SegmentKind {
    Ascending,
    Descending,
    /// Array membership; one entry per array element.
    Contains,
}

impl SegmentKind {
    /// Direction of a directional segment; `None` for `Contains`.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Ascending => Some(Direction::Asc),
            Self::Descending => Some(Direction::Desc),
            Self::Contains => None,
        }
    }

    #[must_use]
    pub const fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Self::Ascending,
            Direction::Desc => Self::Descending,
        }
    }
}

///
/// Segment
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Segment {
    pub field: FieldPath,
    pub kind: SegmentKind,
}

impl Segment {
    #[must_use]
    pub const fn new(field: FieldPath, kind: SegmentKind) -> Self {
        Self { field, kind }
    }

    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self::new(FieldPath::from_dotted(field), SegmentKind::Ascending)
    }

    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self::new(FieldPath::from_dotted(field), SegmentKind::Descending)
    }

    #[must_use]
    pub fn contains(field: &str) -> Self {
        Self::new(FieldPath::from_dotted(field), SegmentKind::Contains)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            SegmentKind::Ascending => "asc",
            SegmentKind::Descending => "desc",
            SegmentKind::Contains => "contains",
        };

        write!(f, "{} {kind}", self.field)
    }
}

///
/// IndexOffset
///
/// Resume point for incremental indexing: every document read at or before
/// `read_time` (ties broken by key) and every mutation batch up to
/// `largest_batch_id` is already reflected in the index.
///

#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct IndexOffset {
    pub read_time: SnapshotVersion,
    pub document_key: DocumentKey,
    pub largest_batch_id: i32,
}

impl IndexOffset {
    pub const INITIAL_LARGEST_BATCH_ID: i32 = -1;

    pub const NONE: Self = Self {
        read_time: SnapshotVersion::NONE,
        document_key: DocumentKey::empty(),
        largest_batch_id: Self::INITIAL_LARGEST_BATCH_ID,
    };

    #[must_use]
    pub const fn new(
        read_time: SnapshotVersion,
        document_key: DocumentKey,
        largest_batch_id: i32,
    ) -> Self {
        Self {
            read_time,
            document_key,
            largest_batch_id,
        }
    }

    /// Offset that sorts after every document read at `read_time`.
    #[must_use]
    pub const fn create_successor(read_time: SnapshotVersion, largest_batch_id: i32) -> Self {
        Self::new(
            SnapshotVersion::new(read_time.timestamp().successor()),
            DocumentKey::empty(),
            largest_batch_id,
        )
    }

    /// The further of the two document positions, carrying the larger
    /// batch id of either.
    #[must_use]
    pub fn advanced_to(&self, other: &Self) -> Self {
        let furthest = if (other.read_time, &other.document_key)
            > (self.read_time, &self.document_key)
        {
            other
        } else {
            self
        };

        Self::new(
            furthest.read_time,
            furthest.document_key.clone(),
            self.largest_batch_id.max(other.largest_batch_id),
        )
    }

    /// Offset positioned exactly at `doc`.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        Self::new(
            doc.read_time(),
            doc.key().clone(),
            Self::INITIAL_LARGEST_BATCH_ID,
        )
    }
}

///
/// IndexState
///
/// Per-user backfill progress of one index.
///

#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct IndexState {
    pub sequence_number: i64,
    pub offset: IndexOffset,
}

impl IndexState {
    pub const INITIAL_SEQUENCE_NUMBER: i64 = 0;

    pub const INITIAL: Self = Self {
        sequence_number: Self::INITIAL_SEQUENCE_NUMBER,
        offset: IndexOffset::NONE,
    };

    #[must_use]
    pub const fn new(sequence_number: i64, offset: IndexOffset) -> Self {
        Self {
            sequence_number,
            offset,
        }
    }
}

///
/// FieldIndex
///
/// Index definition over one collection group plus the current user's
/// progress state. Definitions are shared; state is per user.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldIndex {
    pub index_id: i32,
    pub collection_group: String,
    pub segments: Vec<Segment>,
    pub state: IndexState,
}

impl FieldIndex {
    /// Id of a definition that has not been persisted yet.
    pub const UNKNOWN_ID: i32 = -1;

    #[must_use]
    pub fn new(collection_group: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            index_id: Self::UNKNOWN_ID,
            collection_group: collection_group.into(),
            segments,
            state: IndexState::INITIAL,
        }
    }

    /// The `Contains` segment, if any. An index holds at most one.
    #[must_use]
    pub fn array_segment(&self) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|segment| segment.kind == SegmentKind::Contains)
    }

    /// Ascending and descending segments, in index order.
    #[must_use]
    pub fn directional_segments(&self) -> Vec<&Segment> {
        self.segments
            .iter()
            .filter(|segment| segment.kind != SegmentKind::Contains)
            .collect()
    }

    /// Whether `other` defines the same index, ignoring id and state.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.collection_group == other.collection_group && self.segments == other.segments
    }
}

impl fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}(", self.collection_group, self.index_id)?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str(")")
    }
}

///
/// IndexType
///
/// How well the configured indexes serve a target.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum IndexType {
    /// No index serves the target; a full scan is required.
    None,
    /// An index pre-filters a superset; results are re-filtered and sorted
    /// in memory before any limit.
    Partial,
    /// Every filter and ordering is covered.
    Full,
}

///
/// FieldIndexRow
///
/// Persisted shape of an index definition.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct FieldIndexRow {
    pub(crate) collection_group: String,
    pub(crate) segments: Vec<Segment>,
}
