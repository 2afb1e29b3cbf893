use std::fmt;
use thiserror::Error;
use waymap_model::{AnnotationState, ContentError, DigestError, SnapshotKind, WaypointId};

/// Record kinds named by [`MapError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Waypoint,
    Edge,
    Snapshot(SnapshotKind),
    WorldObject,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Waypoint => f.write_str("waypoint"),
            RecordKind::Edge => f.write_str("edge"),
            RecordKind::Snapshot(kind) => write!(f, "{kind}"),
            RecordKind::WorldObject => f.write_str("world object"),
        }
    }
}

/// Errors raised by the map stores.
///
/// Every mutation returning an error has left its store unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("waypoint {0} already exists")]
    DuplicateId(WaypointId),
    #[error("an edge between {0} and {1} already exists")]
    DuplicateEdge(WaypointId, WaypointId),
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },
    #[error("{kind} {id} already stored with different content")]
    IdentityConflict { kind: SnapshotKind, id: String },
    #[error("annotation {field} is flagged {state} but its payload contradicts the flag")]
    AnnotationContradiction {
        field: &'static str,
        state: AnnotationState,
    },
    #[error("invalid annotation {field}: {reason}")]
    InvalidAnnotation { field: &'static str, reason: String },
    #[error("invalid field mask path {path:?}: {reason}")]
    InvalidFieldMask { path: String, reason: String },
    #[error("edge from {0} to itself")]
    SelfLoop(WaypointId),
    #[error("{0} id must not be empty")]
    EmptyId(RecordKind),
    #[error("{0} is not anchored")]
    Unanchored(String),
    #[error("cannot remove waypoint {waypoint}: {reason}")]
    CascadeFailure {
        waypoint: WaypointId,
        reason: String,
    },
    #[error("invalid query configuration: {0}")]
    InvalidConfig(String),
    #[error("snapshot encoding failed: {0}")]
    Encoding(String),
}

impl MapError {
    pub fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        MapError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Validation failures the caller can correct by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MapError::DuplicateId(_)
                | MapError::DuplicateEdge(..)
                | MapError::IdentityConflict { .. }
                | MapError::AnnotationContradiction { .. }
                | MapError::InvalidAnnotation { .. }
                | MapError::InvalidFieldMask { .. }
                | MapError::SelfLoop(_)
                | MapError::EmptyId(_)
        )
    }
}

impl From<DigestError> for MapError {
    fn from(err: DigestError) -> Self {
        MapError::Encoding(err.to_string())
    }
}

impl From<ContentError> for MapError {
    fn from(err: ContentError) -> Self {
        MapError::InvalidAnnotation {
            field: err.field,
            reason: format!("{}: {}", err.kind, err.reason),
        }
    }
}

pub type MapResult<T> = Result<T, MapError>;
