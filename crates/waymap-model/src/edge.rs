use crate::annotation::StairData;
use crate::ids::{EdgeId, SnapshotId, WaypointId};
use crate::mobility::{FieldMask, MobilityParams};
use crate::pose::{SE2VelocityLimit, SE3Pose};
use serde::{Deserialize, Serialize};

/// Which way the robot may face while traversing an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionConstraint {
    #[default]
    Unknown,
    /// No constraint.
    None,
    /// Keep facing the recorded direction; no turning in place.
    NoTurn,
    /// Traverse facing forward along the stored direction.
    Forward,
    /// Traverse facing backward along the stored direction.
    Reverse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeSource {
    #[default]
    Unknown,
    Odometry,
    SmallLoopClosure,
    FiducialLoopClosure,
    AlternateRouteFinding,
    UserRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeAnnotations {
    /// Deprecated: superseded by `mobility_params.vel_limit`.
    pub vel_limit: Option<SE2VelocityLimit>,
    pub stairs: StairData,
    pub direction_constraint: DirectionConstraint,
    pub require_alignment: bool,
    pub flat_ground: bool,
    /// Deprecated: superseded by `mobility_params.terrain_params.ground_mu_hint`.
    pub ground_mu_hint: Option<f64>,
    /// Deprecated: superseded by `mobility_params.terrain_params.grated_surfaces_mode`.
    pub grated_floor: bool,
    /// Which fields of `mobility_params` this edge overrides. Empty selects all.
    pub override_mobility_params: FieldMask,
    pub mobility_params: Option<MobilityParams>,
    /// Traversal cost for route planning. `None` uses the planner default.
    pub cost: Option<f64>,
    pub edge_source: EdgeSource,
    /// Exclude this edge when searching for alternate routes.
    pub disable_alternate_route_finding: bool,
}

/// Directed-stored, undirected-traversable connection between two waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub snapshot_id: SnapshotId,
    /// Pose of the `to` waypoint in the `from` waypoint's frame.
    pub from_tform_to: SE3Pose,
    pub annotations: EdgeAnnotations,
}

impl Edge {
    pub fn new(from: impl Into<WaypointId>, to: impl Into<WaypointId>) -> Self {
        Self {
            id: EdgeId::new(from, to),
            snapshot_id: SnapshotId::default(),
            from_tform_to: SE3Pose::identity(),
            annotations: EdgeAnnotations::default(),
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.annotations.cost = Some(cost);
        self
    }

    pub fn with_transform(mut self, from_tform_to: SE3Pose) -> Self {
        self.from_tform_to = from_tform_to;
        self
    }

    pub fn with_snapshot(mut self, snapshot_id: impl Into<SnapshotId>) -> Self {
        self.snapshot_id = snapshot_id.into();
        self
    }

    pub fn has_snapshot(&self) -> bool {
        !self.snapshot_id.is_empty()
    }

    /// Transform from `at` to the opposite endpoint, inverting when the edge
    /// is walked against its stored direction.
    pub fn transform_from(&self, at: &WaypointId) -> Option<SE3Pose> {
        if &self.id.from_waypoint == at {
            Some(self.from_tform_to)
        } else if &self.id.to_waypoint == at {
            Some(self.from_tform_to.inverse())
        } else {
            None
        }
    }
}
