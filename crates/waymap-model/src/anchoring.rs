use crate::ids::{WaypointId, WorldObjectId};
use crate::pose::SE3Pose;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Waypoint placed in the seed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: WaypointId,
    pub seed_tform_waypoint: SE3Pose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredWorldObject {
    pub id: WorldObjectId,
    pub seed_tform_object: SE3Pose,
}

/// Placement of graph elements in a shared seed frame (not necessarily
/// metric). Empty when the graph is unanchored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchoring {
    pub anchors: BTreeMap<WaypointId, Anchor>,
    pub objects: BTreeMap<WorldObjectId, AnchoredWorldObject>,
}

impl Anchoring {
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty() && self.objects.is_empty()
    }
}
