//! In-memory navigation graph with topology invariants.
//!
//! Invariants held at all times:
//! - waypoint ids are unique;
//! - every edge's endpoints are present;
//! - at most one edge per unordered waypoint pair, whatever its stored
//!   direction;
//! - `adjacency` mirrors `edges` exactly (both directions);
//! - every anchor names a present waypoint.
//!
//! Mutations check everything they need before touching state, so an error
//! always leaves the store as it was.

use crate::error::{MapError, MapResult, RecordKind};
use crate::validate;
use ahash::AHashMap;
use std::collections::BTreeSet;
use waymap_model::{
    Anchoring, Edge, EdgeAnnotations, EdgeId, Graph, PairKey, Waypoint, WaypointId,
};

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    waypoints: AHashMap<WaypointId, Waypoint>,
    edges: AHashMap<PairKey, Edge>,
    adjacency: AHashMap<WaypointId, BTreeSet<WaypointId>>,
    pub(crate) anchoring: Anchoring,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    // ========================================================================
    // Waypoints
    // ========================================================================

    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> MapResult<()> {
        validate::validate_waypoint(&waypoint)?;
        if self.waypoints.contains_key(&waypoint.id) {
            return Err(MapError::DuplicateId(waypoint.id));
        }
        tracing::debug!(waypoint = %waypoint.id, "added waypoint");
        self.adjacency.insert(waypoint.id.clone(), BTreeSet::new());
        self.waypoints.insert(waypoint.id.clone(), waypoint);
        Ok(())
    }

    /// Replace the record stored under `waypoint.id`. The id itself is the
    /// identity and is never rewritten.
    pub fn update_waypoint(&mut self, waypoint: Waypoint) -> MapResult<Waypoint> {
        validate::validate_waypoint(&waypoint)?;
        let slot = self
            .waypoints
            .get_mut(&waypoint.id)
            .ok_or_else(|| MapError::not_found(RecordKind::Waypoint, &waypoint.id))?;
        tracing::debug!(waypoint = %waypoint.id, "updated waypoint");
        Ok(std::mem::replace(slot, waypoint))
    }

    pub fn get_waypoint(&self, id: &WaypointId) -> MapResult<&Waypoint> {
        self.waypoints
            .get(id)
            .ok_or_else(|| MapError::not_found(RecordKind::Waypoint, id))
    }

    pub fn contains_waypoint(&self, id: &WaypointId) -> bool {
        self.waypoints.contains_key(id)
    }

    /// Remove a waypoint together with all incident edges and its anchor.
    ///
    /// All incident edges are resolved before anything is removed; if any of
    /// them cannot be, nothing changes and `CascadeFailure` is returned.
    pub fn remove_waypoint(&mut self, id: &WaypointId) -> MapResult<(Waypoint, Vec<Edge>)> {
        if !self.waypoints.contains_key(id) {
            return Err(MapError::not_found(RecordKind::Waypoint, id));
        }

        let neighbors = self.adjacency.get(id).cloned().unwrap_or_default();
        let mut incident = Vec::with_capacity(neighbors.len());
        for neighbor in &neighbors {
            let key = PairKey::new(id, neighbor);
            if !self.edges.contains_key(&key) {
                return Err(MapError::CascadeFailure {
                    waypoint: id.clone(),
                    reason: format!("adjacency lists {neighbor} but no edge is stored"),
                });
            }
            if !self
                .adjacency
                .get(neighbor)
                .is_some_and(|set| set.contains(id))
            {
                return Err(MapError::CascadeFailure {
                    waypoint: id.clone(),
                    reason: format!("neighbor {neighbor} does not list it back"),
                });
            }
            incident.push(key);
        }

        let mut removed_edges = Vec::with_capacity(incident.len());
        for key in incident {
            if let Some(edge) = self.edges.remove(&key) {
                removed_edges.push(edge);
            }
        }
        for neighbor in &neighbors {
            if let Some(set) = self.adjacency.get_mut(neighbor) {
                set.remove(id);
            }
        }
        self.adjacency.remove(id);
        self.anchoring.anchors.remove(id);
        let waypoint = self
            .waypoints
            .remove(id)
            .ok_or_else(|| MapError::not_found(RecordKind::Waypoint, id))?;

        removed_edges.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::debug!(waypoint = %id, edges = removed_edges.len(), "removed waypoint");
        Ok((waypoint, removed_edges))
    }

    // ========================================================================
    // Edges
    // ========================================================================

    pub fn add_edge(&mut self, edge: Edge) -> MapResult<()> {
        validate::validate_edge(&edge)?;
        for endpoint in [&edge.id.from_waypoint, &edge.id.to_waypoint] {
            if !self.waypoints.contains_key(endpoint) {
                return Err(MapError::not_found(RecordKind::Waypoint, endpoint));
            }
        }
        let key = edge.id.key();
        if self.edges.contains_key(&key) {
            return Err(MapError::DuplicateEdge(
                edge.id.from_waypoint.clone(),
                edge.id.to_waypoint.clone(),
            ));
        }

        let from = edge.id.from_waypoint.clone();
        let to = edge.id.to_waypoint.clone();
        self.adjacency.entry(from.clone()).or_default().insert(to.clone());
        self.adjacency.entry(to.clone()).or_default().insert(from.clone());
        tracing::debug!(from = %from, to = %to, "added edge");
        self.edges.insert(key, edge);
        Ok(())
    }

    /// Look up an edge by id in either direction.
    pub fn get_edge(&self, id: &EdgeId) -> MapResult<&Edge> {
        self.edges
            .get(&id.key())
            .ok_or_else(|| MapError::not_found(RecordKind::Edge, id))
    }

    pub fn edge_between(&self, a: &WaypointId, b: &WaypointId) -> Option<&Edge> {
        self.edges.get(&PairKey::new(a, b))
    }

    pub fn update_edge_annotations(
        &mut self,
        id: &EdgeId,
        annotations: EdgeAnnotations,
    ) -> MapResult<EdgeAnnotations> {
        validate::validate_edge_annotations(&annotations)?;
        let edge = self
            .edges
            .get_mut(&id.key())
            .ok_or_else(|| MapError::not_found(RecordKind::Edge, id))?;
        tracing::debug!(edge = %edge.id, "updated edge annotations");
        Ok(std::mem::replace(&mut edge.annotations, annotations))
    }

    /// Remove the edge joining the endpoints of `id`, in either direction.
    pub fn remove_edge(&mut self, id: &EdgeId) -> MapResult<Edge> {
        let edge = self
            .edges
            .remove(&id.key())
            .ok_or_else(|| MapError::not_found(RecordKind::Edge, id))?;
        if let Some(set) = self.adjacency.get_mut(&edge.id.from_waypoint) {
            set.remove(&edge.id.to_waypoint);
        }
        if let Some(set) = self.adjacency.get_mut(&edge.id.to_waypoint) {
            set.remove(&edge.id.from_waypoint);
        }
        tracing::debug!(edge = %edge.id, "removed edge");
        Ok(edge)
    }

    /// Waypoints joined to `id` by an edge, regardless of stored direction.
    /// Sorted by id.
    pub fn neighbors(&self, id: &WaypointId) -> MapResult<Vec<&WaypointId>> {
        self.adjacency
            .get(id)
            .map(|set| set.iter().collect())
            .ok_or_else(|| MapError::not_found(RecordKind::Waypoint, id))
    }

    /// Edges touching `id`, sorted by neighbor id.
    pub fn incident_edges(&self, id: &WaypointId) -> MapResult<Vec<&Edge>> {
        let neighbors = self
            .adjacency
            .get(id)
            .ok_or_else(|| MapError::not_found(RecordKind::Waypoint, id))?;
        Ok(neighbors
            .iter()
            .filter_map(|n| self.edges.get(&PairKey::new(id, n)))
            .collect())
    }

    /// All waypoints, sorted by id.
    pub fn waypoints(&self) -> Vec<&Waypoint> {
        let mut out: Vec<&Waypoint> = self.waypoints.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// All edges, sorted by stored id.
    pub fn edges(&self) -> Vec<&Edge> {
        let mut out: Vec<&Edge> = self.edges.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn anchoring(&self) -> &Anchoring {
        &self.anchoring
    }

    // ========================================================================
    // Exchange format
    // ========================================================================

    /// Build a store from an exchanged graph, enforcing every invariant.
    pub fn from_graph(graph: Graph) -> MapResult<Self> {
        let mut store = GraphStore::new();
        for waypoint in graph.waypoints {
            store.add_waypoint(waypoint)?;
        }
        for edge in graph.edges {
            store.add_edge(edge)?;
        }
        for (id, anchor) in graph.anchoring.anchors {
            if anchor.id != id {
                return Err(MapError::InvalidAnnotation {
                    field: "anchoring",
                    reason: format!("anchor keyed {id} names waypoint {}", anchor.id),
                });
            }
            store.anchor(&id, anchor.seed_tform_waypoint)?;
        }
        for (id, object) in graph.anchoring.objects {
            if object.id != id {
                return Err(MapError::InvalidAnnotation {
                    field: "anchoring",
                    reason: format!("object keyed {id} names object {}", object.id),
                });
            }
            store.anchor_object(&id, object.seed_tform_object)?;
        }
        Ok(store)
    }

    /// Export in deterministic order. Ids are carried over unchanged.
    pub fn to_graph(&self) -> Graph {
        Graph {
            waypoints: self.waypoints().into_iter().cloned().collect(),
            edges: self.edges().into_iter().cloned().collect(),
            anchoring: self.anchoring.clone(),
        }
    }
}
