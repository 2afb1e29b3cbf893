use crate::annotation::LocalizeRegion;
use crate::ids::{SnapshotId, WaypointId};
use crate::pose::{SE3Covariance, SE3Pose};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a waypoint came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaypointSource {
    #[default]
    Unknown,
    /// Dropped automatically while recording.
    RobotPath,
    /// Created on an explicit operator request.
    UserRequest,
    /// Added by alternate route finding.
    AlternateRouteFinding,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointAnnotations {
    /// Human-readable name; not required to be unique.
    pub name: String,
    pub creation_time: Option<DateTime<Utc>>,
    /// Estimated ICP covariance at this waypoint.
    pub icp_variance: Option<SE3Covariance>,
    pub scan_match_region: LocalizeRegion,
    pub waypoint_source: WaypointSource,
    /// Free-form metadata supplied by the recording client.
    pub client_metadata: BTreeMap<String, String>,
}

/// A located, annotated node of the navigation graph.
///
/// `id` is the identity of the record. Every other field may be edited in
/// place through the graph store without changing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    pub snapshot_id: SnapshotId,
    /// Waypoint pose relative to the kinematic odometry frame at recording time.
    pub waypoint_tform_ko: SE3Pose,
    pub annotations: WaypointAnnotations,
}

impl Waypoint {
    pub fn new(id: impl Into<WaypointId>) -> Self {
        Self {
            id: id.into(),
            snapshot_id: SnapshotId::default(),
            waypoint_tform_ko: SE3Pose::identity(),
            annotations: WaypointAnnotations::default(),
        }
    }

    pub fn with_snapshot(mut self, snapshot_id: impl Into<SnapshotId>) -> Self {
        self.snapshot_id = snapshot_id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.annotations.name = name.into();
        self
    }

    pub fn with_pose(mut self, waypoint_tform_ko: SE3Pose) -> Self {
        self.waypoint_tform_ko = waypoint_tform_ko;
        self
    }

    pub fn has_snapshot(&self) -> bool {
        !self.snapshot_id.is_empty()
    }
}
