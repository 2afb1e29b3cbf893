//! Whole-graph consistency report.
//!
//! Unlike the mutation API, which rejects the first problem it sees, the
//! checker walks an exchanged [`Graph`] end to end and collects everything
//! that is wrong with it. It does not fail fast.

use crate::error::{MapError, RecordKind};
use crate::graph_store::GraphStore;
use crate::snapshot_store::SnapshotStore;
use crate::validate;
use std::collections::BTreeSet;
use waymap_model::{
    EdgeId, EdgeSnapshot, Graph, PairKey, SnapshotId, WaypointId, WaypointSnapshot,
};

/// Answers whether a snapshot id resolves to stored content.
pub trait SnapshotCatalog {
    fn has_waypoint_snapshot(&self, id: &SnapshotId) -> bool;
    fn has_edge_snapshot(&self, id: &SnapshotId) -> bool;
}

impl SnapshotCatalog for (&SnapshotStore<WaypointSnapshot>, &SnapshotStore<EdgeSnapshot>) {
    fn has_waypoint_snapshot(&self, id: &SnapshotId) -> bool {
        self.0.contains(id)
    }

    fn has_edge_snapshot(&self, id: &SnapshotId) -> bool {
        self.1.contains(id)
    }
}

/// A catalog with no snapshots; every non-empty reference dangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshots;

impl SnapshotCatalog for NoSnapshots {
    fn has_waypoint_snapshot(&self, _id: &SnapshotId) -> bool {
        false
    }

    fn has_edge_snapshot(&self, _id: &SnapshotId) -> bool {
        false
    }
}

/// One problem, attributed to the record it was found on.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub subject: String,
    pub error: MapError,
}

#[derive(Debug, Clone, Default)]
pub struct TopologyReport {
    pub checked_waypoints: usize,
    pub checked_edges: usize,
    pub errors: Vec<Finding>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationReport {
    pub errors: Vec<Finding>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotReferenceReport {
    pub checked_references: usize,
    pub dangling_waypoint_snapshots: Vec<(WaypointId, SnapshotId)>,
    pub dangling_edge_snapshots: Vec<(EdgeId, SnapshotId)>,
}

#[derive(Debug, Clone, Default)]
pub struct AnchoringReport {
    pub checked_anchors: usize,
    pub orphan_anchors: Vec<WaypointId>,
    pub errors: Vec<Finding>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphReport {
    pub topology: TopologyReport,
    pub annotations: AnnotationReport,
    pub snapshots: SnapshotReferenceReport,
    pub anchoring: AnchoringReport,
}

impl GraphReport {
    pub fn ok(&self) -> bool {
        self.problem_count() == 0
    }

    pub fn problem_count(&self) -> usize {
        self.topology.errors.len()
            + self.annotations.errors.len()
            + self.snapshots.dangling_waypoint_snapshots.len()
            + self.snapshots.dangling_edge_snapshots.len()
            + self.anchoring.orphan_anchors.len()
            + self.anchoring.errors.len()
    }

    /// Human-readable lines, one per problem.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.problem_count());
        let findings = self
            .topology
            .errors
            .iter()
            .chain(&self.annotations.errors)
            .chain(&self.anchoring.errors);
        for f in findings {
            out.push(format!("{}: {}", f.subject, f.error));
        }
        for (waypoint, snapshot) in &self.snapshots.dangling_waypoint_snapshots {
            out.push(format!("waypoint {waypoint}: missing waypoint snapshot {snapshot}"));
        }
        for (edge, snapshot) in &self.snapshots.dangling_edge_snapshots {
            out.push(format!("edge {edge}: missing edge snapshot {snapshot}"));
        }
        for waypoint in &self.anchoring.orphan_anchors {
            out.push(format!("anchor {waypoint}: waypoint is not in the graph"));
        }
        out
    }
}

fn finding(subject: impl Into<String>, error: MapError) -> Finding {
    Finding {
        subject: subject.into(),
        error,
    }
}

/// Check a graph against every store invariant and the snapshot catalog.
pub fn check_graph(graph: &Graph, snapshots: &dyn SnapshotCatalog) -> GraphReport {
    let mut report = GraphReport::default();
    let mut waypoint_ids: BTreeSet<&WaypointId> = BTreeSet::new();

    for waypoint in &graph.waypoints {
        report.topology.checked_waypoints += 1;
        let subject = format!("waypoint {}", waypoint.id);
        if waypoint.id.is_empty() {
            report
                .topology
                .errors
                .push(finding(&subject, MapError::EmptyId(RecordKind::Waypoint)));
        } else if !waypoint_ids.insert(&waypoint.id) {
            report
                .topology
                .errors
                .push(finding(&subject, MapError::DuplicateId(waypoint.id.clone())));
        }
        if let Err(e) = validate::check_pose("waypoint_tform_ko", &waypoint.waypoint_tform_ko) {
            report.annotations.errors.push(finding(&subject, e));
        }
        for issue in validate::waypoint_annotation_issues(&waypoint.annotations) {
            report.annotations.errors.push(finding(&subject, issue));
        }
        if waypoint.has_snapshot() {
            report.snapshots.checked_references += 1;
            if !snapshots.has_waypoint_snapshot(&waypoint.snapshot_id) {
                tracing::warn!(waypoint = %waypoint.id, snapshot = %waypoint.snapshot_id, "dangling waypoint snapshot");
                report
                    .snapshots
                    .dangling_waypoint_snapshots
                    .push((waypoint.id.clone(), waypoint.snapshot_id.clone()));
            }
        }
    }

    let mut pairs: BTreeSet<PairKey> = BTreeSet::new();
    for edge in &graph.edges {
        report.topology.checked_edges += 1;
        let subject = format!("edge {}", edge.id);
        let from = &edge.id.from_waypoint;
        let to = &edge.id.to_waypoint;

        if from.is_empty() || to.is_empty() {
            report
                .topology
                .errors
                .push(finding(&subject, MapError::EmptyId(RecordKind::Edge)));
        } else if edge.id.is_self_loop() {
            report
                .topology
                .errors
                .push(finding(&subject, MapError::SelfLoop(from.clone())));
        } else {
            for endpoint in [from, to] {
                if !waypoint_ids.contains(endpoint) {
                    report.topology.errors.push(finding(
                        &subject,
                        MapError::not_found(RecordKind::Waypoint, endpoint),
                    ));
                }
            }
            if !pairs.insert(edge.id.key()) {
                report.topology.errors.push(finding(
                    &subject,
                    MapError::DuplicateEdge(from.clone(), to.clone()),
                ));
            }
        }

        if let Err(e) = validate::check_pose("from_tform_to", &edge.from_tform_to) {
            report.annotations.errors.push(finding(&subject, e));
        }
        for issue in validate::edge_annotation_issues(&edge.annotations) {
            report.annotations.errors.push(finding(&subject, issue));
        }
        if edge.has_snapshot() {
            report.snapshots.checked_references += 1;
            if !snapshots.has_edge_snapshot(&edge.snapshot_id) {
                tracing::warn!(edge = %edge.id, snapshot = %edge.snapshot_id, "dangling edge snapshot");
                report
                    .snapshots
                    .dangling_edge_snapshots
                    .push((edge.id.clone(), edge.snapshot_id.clone()));
            }
        }
    }

    for (key, anchor) in &graph.anchoring.anchors {
        report.anchoring.checked_anchors += 1;
        if !waypoint_ids.contains(key) {
            report.anchoring.orphan_anchors.push(key.clone());
        }
        if &anchor.id != key {
            report.anchoring.errors.push(finding(
                format!("anchor {key}"),
                MapError::InvalidAnnotation {
                    field: "anchoring",
                    reason: format!("keyed {key} but names waypoint {}", anchor.id),
                },
            ));
        }
        if let Err(e) = validate::check_pose("seed_tform_waypoint", &anchor.seed_tform_waypoint) {
            report.anchoring.errors.push(finding(format!("anchor {key}"), e));
        }
    }
    for (key, object) in &graph.anchoring.objects {
        report.anchoring.checked_anchors += 1;
        if &object.id != key {
            report.anchoring.errors.push(finding(
                format!("object {key}"),
                MapError::InvalidAnnotation {
                    field: "anchoring",
                    reason: format!("keyed {key} but names object {}", object.id),
                },
            ));
        }
    }

    report
}

impl GraphStore {
    /// Check this store's snapshot references and annotations.
    pub fn check(&self, snapshots: &dyn SnapshotCatalog) -> GraphReport {
        check_graph(&self.to_graph(), snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymap_model::{Anchor, Edge, SE3Pose, Waypoint};

    fn graph() -> Graph {
        Graph {
            waypoints: vec![
                Waypoint::new("a").with_snapshot("snap-a"),
                Waypoint::new("b"),
            ],
            edges: vec![Edge::new("a", "b").with_snapshot("edge-ab")],
            ..Graph::default()
        }
    }

    #[test]
    fn clean_graph_with_stored_snapshots() {
        let mut waypoint_snapshots = SnapshotStore::<WaypointSnapshot>::new();
        waypoint_snapshots
            .put(WaypointSnapshot {
                id: "snap-a".into(),
                ..WaypointSnapshot::default()
            })
            .unwrap();
        let mut edge_snapshots = SnapshotStore::<EdgeSnapshot>::new();
        edge_snapshots
            .put(EdgeSnapshot {
                id: "edge-ab".into(),
                ..EdgeSnapshot::default()
            })
            .unwrap();

        let report = check_graph(&graph(), &(&waypoint_snapshots, &edge_snapshots));
        assert!(report.ok(), "{:?}", report.problems());
        assert_eq!(report.snapshots.checked_references, 2);
    }

    #[test]
    fn collects_every_problem() {
        let mut g = graph();
        g.waypoints.push(Waypoint::new("a"));
        g.edges.push(Edge::new("b", "a"));
        g.edges.push(Edge::new("b", "ghost"));
        g.edges.push(Edge::new("b", "b").with_cost(-1.0));
        g.anchoring.anchors.insert(
            "ghost".into(),
            Anchor {
                id: "ghost".into(),
                seed_tform_waypoint: SE3Pose::identity(),
            },
        );

        let report = check_graph(&g, &NoSnapshots);
        assert!(!report.ok());
        // duplicate waypoint, duplicate pair, missing endpoint, self loop
        assert_eq!(report.topology.errors.len(), 4);
        assert_eq!(report.annotations.errors.len(), 1);
        assert_eq!(report.snapshots.dangling_waypoint_snapshots.len(), 1);
        assert_eq!(report.snapshots.dangling_edge_snapshots.len(), 1);
        assert_eq!(report.anchoring.orphan_anchors, vec![WaypointId::from("ghost")]);
        assert_eq!(report.problems().len(), report.problem_count());
    }

    #[test]
    fn non_finite_poses_are_reported() {
        let mut g = graph();
        g.edges[0].from_tform_to = SE3Pose::from_translation(f64::NAN, 0.0, 0.0);
        g.waypoints[1].waypoint_tform_ko = SE3Pose::from_translation(0.0, 0.0, f64::INFINITY);

        let report = check_graph(&g, &NoSnapshots);
        let fields: Vec<&str> = report
            .annotations
            .errors
            .iter()
            .filter_map(|f| match &f.error {
                MapError::InvalidAnnotation { field, .. } => Some(*field),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["waypoint_tform_ko", "from_tform_to"]);
        assert!(GraphStore::from_graph(g).is_err());
    }

    #[test]
    fn store_check_reports_dangling_references() {
        let store = GraphStore::from_graph(graph()).unwrap();
        let report = store.check(&NoSnapshots);
        assert_eq!(report.problem_count(), 2);
    }
}
