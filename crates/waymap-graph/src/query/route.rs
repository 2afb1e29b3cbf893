//! Shortest-cost routes over edge `cost` annotations.

use crate::config::QueryConfig;
use crate::error::{MapError, MapResult, RecordKind};
use crate::graph_store::GraphStore;
use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use waymap_model::{Edge, EdgeId, SE3Pose, WaypointId};

/// Which edges a search may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteMode {
    /// Every edge.
    #[default]
    Standard,
    /// Skip edges flagged `disable_alternate_route_finding`.
    AlternateRoute,
}

impl RouteMode {
    fn admits(self, edge: &Edge) -> bool {
        match self {
            RouteMode::Standard => true,
            RouteMode::AlternateRoute => !edge.annotations.disable_alternate_route_finding,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Waypoints from start to goal, inclusive.
    pub waypoints: Vec<WaypointId>,
    /// Stored ids of the traversed edges, in traversal order.
    pub edges: Vec<EdgeId>,
    pub total_cost: f64,
}

impl Route {
    pub fn start(&self) -> &WaypointId {
        &self.waypoints[0]
    }

    pub fn goal(&self) -> &WaypointId {
        &self.waypoints[self.waypoints.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Heap entry; ordered so `BinaryHeap` pops the cheapest, ties by id.
#[derive(Debug, Clone)]
struct SearchState {
    cost: f64,
    node: WaypointId,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchState {}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Weight of an edge: its annotated cost or the configured default.
pub fn edge_weight(edge: &Edge, config: &QueryConfig) -> f64 {
    edge.annotations.cost.unwrap_or(config.default_edge_cost)
}

/// Dijkstra search from `start` to `goal`.
///
/// Edges are traversable in both directions. Returns `Ok(None)` when the goal
/// cannot be reached under `mode`, and `NotFound` when either endpoint is not
/// in the graph.
pub fn shortest_path(
    graph: &GraphStore,
    start: &WaypointId,
    goal: &WaypointId,
    mode: RouteMode,
    config: &QueryConfig,
) -> MapResult<Option<Route>> {
    config.validate()?;
    for id in [start, goal] {
        if !graph.contains_waypoint(id) {
            return Err(MapError::not_found(RecordKind::Waypoint, id));
        }
    }

    if start == goal {
        return Ok(Some(Route {
            waypoints: vec![start.clone()],
            edges: Vec::new(),
            total_cost: 0.0,
        }));
    }

    let mut dist: AHashMap<WaypointId, f64> = AHashMap::new();
    let mut prev: AHashMap<WaypointId, WaypointId> = AHashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(start.clone(), 0.0);
    heap.push(SearchState {
        cost: 0.0,
        node: start.clone(),
    });

    while let Some(SearchState { cost, node }) = heap.pop() {
        if dist.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }
        if &node == goal {
            break;
        }

        for edge in graph.incident_edges(&node)? {
            if !mode.admits(edge) {
                continue;
            }
            let Some(neighbor) = edge.id.other(&node) else {
                continue;
            };
            let next_cost = cost + edge_weight(edge, config);
            let improves = dist.get(neighbor).map_or(true, |&best| next_cost < best);
            if improves {
                dist.insert(neighbor.clone(), next_cost);
                prev.insert(neighbor.clone(), node.clone());
                heap.push(SearchState {
                    cost: next_cost,
                    node: neighbor.clone(),
                });
            }
        }
    }

    let Some(&total_cost) = dist.get(goal) else {
        tracing::debug!(start = %start, goal = %goal, ?mode, "no route");
        return Ok(None);
    };

    let mut waypoints = vec![goal.clone()];
    let mut current = goal;
    while current != start {
        let Some(p) = prev.get(current) else {
            return Ok(None);
        };
        waypoints.push(p.clone());
        current = p;
    }
    waypoints.reverse();

    let mut edges = Vec::with_capacity(waypoints.len() - 1);
    for pair in waypoints.windows(2) {
        let edge = graph
            .edge_between(&pair[0], &pair[1])
            .ok_or_else(|| MapError::not_found(RecordKind::Edge, EdgeId::new(pair[0].clone(), pair[1].clone())))?;
        edges.push(edge.id.clone());
    }

    tracing::debug!(start = %start, goal = %goal, hops = edges.len(), total_cost, "found route");
    Ok(Some(Route {
        waypoints,
        edges,
        total_cost,
    }))
}

/// Compose the edge transforms along a route into `start_tform_goal`.
///
/// Edges walked against their stored direction contribute their inverse.
pub fn route_transform(graph: &GraphStore, route: &Route) -> MapResult<SE3Pose> {
    let mut start_tform_current = SE3Pose::identity();
    for pair in route.waypoints.windows(2) {
        let edge = graph
            .edge_between(&pair[0], &pair[1])
            .ok_or_else(|| MapError::not_found(RecordKind::Edge, EdgeId::new(pair[0].clone(), pair[1].clone())))?;
        let step = edge
            .transform_from(&pair[0])
            .ok_or_else(|| MapError::not_found(RecordKind::Edge, &edge.id))?;
        start_tform_current = start_tform_current.compose(&step);
    }
    Ok(start_tform_current)
}
