//! Thread-shared map state.
//!
//! Readers hold a read guard for the whole of a query and so see one
//! consistent graph. Every structural mutation, including the waypoint
//! removal cascade, happens under a single write guard.
//!
//! When more than one lock is needed they are taken in the order
//! graph, waypoint snapshots, edge snapshots.

use crate::check::{check_graph, GraphReport};
use crate::config::QueryConfig;
use crate::error::MapResult;
use crate::graph_store::GraphStore;
use crate::query::{shortest_path, Route, RouteMode};
use crate::snapshot_store::SnapshotStore;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use waymap_model::{
    Edge, EdgeSnapshot, SnapshotId, Waypoint, WaypointId, WaypointSnapshot,
};

#[derive(Clone, Default)]
pub struct SharedMap {
    graph: Arc<RwLock<GraphStore>>,
    waypoint_snapshots: Arc<RwLock<SnapshotStore<WaypointSnapshot>>>,
    edge_snapshots: Arc<RwLock<SnapshotStore<EdgeSnapshot>>>,
}

impl SharedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        graph: GraphStore,
        waypoint_snapshots: SnapshotStore<WaypointSnapshot>,
        edge_snapshots: SnapshotStore<EdgeSnapshot>,
    ) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
            waypoint_snapshots: Arc::new(RwLock::new(waypoint_snapshots)),
            edge_snapshots: Arc::new(RwLock::new(edge_snapshots)),
        }
    }

    pub fn graph(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.graph.read()
    }

    pub fn graph_mut(&self) -> RwLockWriteGuard<'_, GraphStore> {
        self.graph.write()
    }

    pub fn waypoint_snapshots(&self) -> RwLockReadGuard<'_, SnapshotStore<WaypointSnapshot>> {
        self.waypoint_snapshots.read()
    }

    pub fn waypoint_snapshots_mut(&self) -> RwLockWriteGuard<'_, SnapshotStore<WaypointSnapshot>> {
        self.waypoint_snapshots.write()
    }

    pub fn edge_snapshots(&self) -> RwLockReadGuard<'_, SnapshotStore<EdgeSnapshot>> {
        self.edge_snapshots.read()
    }

    pub fn edge_snapshots_mut(&self) -> RwLockWriteGuard<'_, SnapshotStore<EdgeSnapshot>> {
        self.edge_snapshots.write()
    }

    /// Replace the graph wholesale, returning the previous one.
    pub fn replace_graph(&self, graph: GraphStore) -> GraphStore {
        std::mem::replace(&mut *self.graph.write(), graph)
    }

    pub fn add_waypoint(&self, waypoint: Waypoint) -> MapResult<()> {
        self.graph.write().add_waypoint(waypoint)
    }

    pub fn add_edge(&self, edge: Edge) -> MapResult<()> {
        self.graph.write().add_edge(edge)
    }

    pub fn remove_waypoint(&self, id: &WaypointId) -> MapResult<(Waypoint, Vec<Edge>)> {
        self.graph.write().remove_waypoint(id)
    }

    pub fn put_waypoint_snapshot(&self, snapshot: WaypointSnapshot) -> MapResult<SnapshotId> {
        self.waypoint_snapshots.write().put(snapshot)
    }

    pub fn put_edge_snapshot(&self, snapshot: EdgeSnapshot) -> MapResult<SnapshotId> {
        self.edge_snapshots.write().put(snapshot)
    }

    pub fn shortest_path(
        &self,
        start: &WaypointId,
        goal: &WaypointId,
        mode: RouteMode,
        config: &QueryConfig,
    ) -> MapResult<Option<Route>> {
        shortest_path(&self.graph.read(), start, goal, mode, config)
    }

    pub fn check(&self) -> GraphReport {
        let graph = self.graph.read();
        let waypoint_snapshots = self.waypoint_snapshots.read();
        let edge_snapshots = self.edge_snapshots.read();
        check_graph(&graph.to_graph(), &(&*waypoint_snapshots, &*edge_snapshots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn clones_share_state() {
        let map = SharedMap::new();
        let other = map.clone();
        map.add_waypoint(Waypoint::new("a")).unwrap();
        assert!(other.graph().contains_waypoint(&"a".into()));
    }

    #[test]
    fn readers_never_see_half_removed_waypoints() {
        let map = SharedMap::new();
        map.add_waypoint(Waypoint::new("hub")).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let map = map.clone();
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        let graph = map.graph();
                        for edge in graph.edges() {
                            assert!(graph.contains_waypoint(&edge.id.from_waypoint));
                            assert!(graph.contains_waypoint(&edge.id.to_waypoint));
                        }
                    }
                })
            })
            .collect();

        for i in 0..200 {
            let id = WaypointId::from(format!("spoke-{i}"));
            map.add_waypoint(Waypoint::new(id.clone())).unwrap();
            map.add_edge(Edge::new("hub", id.clone())).unwrap();
            if i % 2 == 0 {
                let (_, edges) = map.remove_waypoint(&id).unwrap();
                assert_eq!(edges.len(), 1);
            }
        }
        done.store(true, Ordering::Release);
        for r in readers {
            r.join().unwrap();
        }

        let graph = map.graph();
        assert_eq!(graph.waypoint_count(), 101);
        assert_eq!(graph.edge_count(), 100);
    }

    #[test]
    fn check_sees_stored_snapshots() {
        let map = SharedMap::new();
        let id = map.put_waypoint_snapshot(WaypointSnapshot::default()).unwrap();
        map.add_waypoint(Waypoint::new("a").with_snapshot(id)).unwrap();
        map.add_waypoint(Waypoint::new("b").with_snapshot("gone")).unwrap();

        let report = map.check();
        assert_eq!(report.snapshots.dangling_waypoint_snapshots.len(), 1);
        assert_eq!(report.snapshots.dangling_waypoint_snapshots[0].1.as_str(), "gone");
    }
}
