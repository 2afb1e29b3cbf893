use crate::anchoring::Anchoring;
use crate::edge::Edge;
use crate::waypoint::Waypoint;
use serde::{Deserialize, Serialize};

/// Map topology without payload data: the exchange unit for graphs.
///
/// Snapshots travel separately, indexed by the `snapshot_id` fields of the
/// waypoints and edges. A `Graph` is unchecked; build a graph store from it to
/// enforce the map invariants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub waypoints: Vec<Waypoint>,
    pub edges: Vec<Edge>,
    pub anchoring: Anchoring,
}
