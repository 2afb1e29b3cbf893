//! Immutable sensor-data bundles attached to waypoints and edges.
//!
//! Snapshots are identified by content: any change to a payload field must
//! produce a new id. Sensor payloads (images, clouds, robot state, grids) are
//! opaque to the map store and kept as encoded bytes.

use crate::ids::{SnapshotId, WorldObjectId};
use crate::pose::SE3Pose;
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Encoded bytes plus the name of their encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaquePayload {
    pub encoding: String,
    pub data: Vec<u8>,
}

impl OpaquePayload {
    pub fn new(encoding: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            encoding: encoding.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorImage {
    /// Camera source name.
    pub source: String,
    pub payload: OpaquePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCloud {
    pub source: String,
    pub num_points: u32,
    pub payload: OpaquePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: WorldObjectId,
    pub name: String,
    pub acquisition_time: Option<DateTime<Utc>>,
    /// Detection-specific properties (fiducial tag data etc.).
    pub properties: OpaquePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalGrid {
    /// Grid type name, e.g. `terrain` or `no_step`.
    pub local_grid_type_name: String,
    pub payload: OpaquePayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    Waypoint,
    Edge,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Waypoint => f.write_str("waypoint snapshot"),
            SnapshotKind::Edge => f.write_str("edge snapshot"),
        }
    }
}

/// A snapshot payload that breaks a structural rule of its kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} field {field}: {reason}")]
pub struct ContentError {
    pub kind: SnapshotKind,
    pub field: &'static str,
    pub reason: String,
}

/// Common surface of snapshot records held by a snapshot store.
pub trait Snapshot: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: SnapshotKind;

    fn id(&self) -> &SnapshotId;

    fn set_id(&mut self, id: SnapshotId);

    /// Structural checks on the payload, run before a snapshot is stored.
    fn check_content(&self) -> Result<(), ContentError> {
        Ok(())
    }
}

/// Snapshots that can be re-derived into processed versions.
pub trait VersionedSnapshot: Snapshot {
    /// Id of the snapshot this one was derived from. Empty for a raw snapshot.
    fn version_id(&self) -> &SnapshotId;

    fn set_version_id(&mut self, id: SnapshotId);

    fn is_raw(&self) -> bool {
        self.version_id().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointSnapshot {
    pub id: SnapshotId,
    pub images: Vec<SensorImage>,
    pub point_cloud: Option<PointCloud>,
    pub objects: Vec<WorldObject>,
    pub robot_state: Option<OpaquePayload>,
    pub robot_local_grids: Vec<LocalGrid>,
    pub is_point_cloud_processed: bool,
    pub version_id: SnapshotId,
    pub has_remote_point_cloud_sensor: bool,
    pub body_tform_remote_point_cloud_sensor: Option<SE3Pose>,
}

impl Snapshot for WaypointSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Waypoint;

    fn id(&self) -> &SnapshotId {
        &self.id
    }

    fn set_id(&mut self, id: SnapshotId) {
        self.id = id;
    }
}

impl VersionedSnapshot for WaypointSnapshot {
    fn version_id(&self) -> &SnapshotId {
        &self.version_id
    }

    fn set_version_id(&mut self, id: SnapshotId) {
        self.version_id = id;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FootContact {
    #[default]
    Unknown,
    MadeContact,
    LostContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootState {
    pub foot_position_rt_body: Vector3<f64>,
    pub contact: FootContact,
}

/// Robot stance sampled while an edge was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stance {
    pub timestamp: DateTime<Utc>,
    pub foot_states: Vec<FootState>,
    pub ko_tform_body: SE3Pose,
    pub vision_tform_body: SE3Pose,
    /// Ground under the feet was judged planar.
    pub planar_ground: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: SnapshotId,
    /// Ordered by timestamp.
    pub stances: Vec<Stance>,
}

impl EdgeSnapshot {
    pub fn is_time_ordered(&self) -> bool {
        self.stances
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }
}

impl Snapshot for EdgeSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Edge;

    fn id(&self) -> &SnapshotId {
        &self.id
    }

    fn set_id(&mut self, id: SnapshotId) {
        self.id = id;
    }

    fn check_content(&self) -> Result<(), ContentError> {
        if let Some(i) = self
            .stances
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(ContentError {
                kind: SnapshotKind::Edge,
                field: "stances",
                reason: format!("stance {} is earlier than stance {i}", i + 1),
            });
        }
        Ok(())
    }
}
