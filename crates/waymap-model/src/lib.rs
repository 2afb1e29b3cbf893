//! Waymap data model
//!
//! Record types for a robot navigation map:
//!
//! ```text
//!   Graph ──┬── Waypoint ─── snapshot_id ──► WaypointSnapshot   (separate store)
//!           ├── Edge ─────── snapshot_id ──► EdgeSnapshot       (separate store)
//!           └── Anchoring ── waypoint / object poses in the seed frame
//! ```
//!
//! The graph never embeds snapshot payloads. Waypoints and edges refer to
//! snapshots by id so topology and sensor data can be loaded and evicted
//! independently.
//!
//! This crate only defines the records plus a few pure helpers (pose algebra,
//! content digests). Invariant enforcement lives in `waymap-graph`.

pub mod annotation;
pub mod anchoring;
pub mod digest;
pub mod edge;
pub mod graph;
pub mod ids;
pub mod mobility;
pub mod pose;
pub mod snapshot;
pub mod waypoint;

pub use annotation::{AnnotationState, LocalizeRegion, Region, StairData, StraightStaircase};
pub use anchoring::{Anchor, AnchoredWorldObject, Anchoring};
pub use digest::{content_digest, is_content_digest, DigestError, SNAPSHOT_DIGEST_PREFIX};
pub use edge::{DirectionConstraint, Edge, EdgeAnnotations, EdgeSource};
pub use graph::Graph;
pub use ids::{EdgeId, PairKey, SnapshotId, WaypointId, WorldObjectId};
pub use mobility::{
    FieldMask, GratedSurfacesMode, LocomotionHint, MobilityParams, ObstacleParams, SwingHeight,
    TerrainParams,
};
pub use pose::{SE2Velocity, SE2VelocityLimit, SE3Covariance, SE3Pose};
pub use snapshot::{
    ContentError, EdgeSnapshot, FootContact, FootState, LocalGrid, OpaquePayload, PointCloud, SensorImage,
    Snapshot, SnapshotKind, Stance, VersionedSnapshot, WaypointSnapshot, WorldObject,
};
pub use waypoint::{Waypoint, WaypointAnnotations, WaypointSource};
