use proptest::prelude::*;
use std::collections::BTreeSet;
use waymap_graph::{shortest_path, GraphStore, MapError, QueryConfig, RouteMode, SnapshotStore};
use waymap_model::{
    is_content_digest, Edge, EdgeId, OpaquePayload, WaypointId, WaypointSnapshot, Waypoint,
};

const MAX_WAYPOINTS: usize = 12;
const MAX_EDGES: usize = 40;

fn wp(i: usize) -> WaypointId {
    WaypointId::from(format!("wp-{i:02}"))
}

/// Waypoint count plus candidate edges (some duplicate, some self loops)
/// with integer costs.
fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize, u8)>)> {
    (2usize..=MAX_WAYPOINTS).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n, 1u8..20), 0..MAX_EDGES),
        )
    })
}

fn build(n: usize, candidates: &[(usize, usize, u8)]) -> GraphStore {
    let mut g = GraphStore::new();
    for i in 0..n {
        g.add_waypoint(Waypoint::new(wp(i))).unwrap();
    }
    for &(a, b, cost) in candidates {
        // Duplicates and self loops are expected to be rejected.
        let _ = g.add_edge(Edge::new(wp(a), wp(b)).with_cost(f64::from(cost)));
    }
    g
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn neighbors_are_symmetric((n, candidates) in graph_strategy()) {
        let g = build(n, &candidates);
        let mut degree_sum = 0;
        for i in 0..n {
            let id = wp(i);
            let neighbors = g.neighbors(&id).unwrap();
            degree_sum += neighbors.len();
            for other in neighbors {
                prop_assert!(g.neighbors(other).unwrap().contains(&&id));
                prop_assert!(g.edge_between(&id, other).is_some());
            }
        }
        prop_assert_eq!(degree_sum, 2 * g.edge_count());
    }

    #[test]
    fn at_most_one_edge_per_pair((n, candidates) in graph_strategy()) {
        let mut g = GraphStore::new();
        for i in 0..n {
            g.add_waypoint(Waypoint::new(wp(i))).unwrap();
        }
        let mut pairs = BTreeSet::new();
        for (a, b, _) in candidates {
            let result = g.add_edge(Edge::new(wp(a), wp(b)));
            let key = (a.min(b), a.max(b));
            if a == b {
                prop_assert!(matches!(result, Err(MapError::SelfLoop(_))));
            } else if pairs.insert(key) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(MapError::DuplicateEdge(..))), "expected duplicate edge");
            }
        }
        prop_assert_eq!(g.edge_count(), pairs.len());
    }

    #[test]
    fn cascade_removes_exactly_incident_edges(
        (n, candidates) in graph_strategy(),
        victim in 0usize..MAX_WAYPOINTS,
    ) {
        let mut g = build(n, &candidates);
        let victim = wp(victim % n);
        let before: BTreeSet<EdgeId> = g.edges().into_iter().map(|e| e.id.clone()).collect();
        let incident: BTreeSet<EdgeId> = before
            .iter()
            .filter(|id| id.touches(&victim))
            .cloned()
            .collect();

        let (_, removed) = g.remove_waypoint(&victim).unwrap();
        let removed: BTreeSet<EdgeId> = removed.into_iter().map(|e| e.id).collect();
        prop_assert_eq!(&removed, &incident);

        let after: BTreeSet<EdgeId> = g.edges().into_iter().map(|e| e.id.clone()).collect();
        let expected: BTreeSet<EdgeId> = before.difference(&incident).cloned().collect();
        prop_assert_eq!(after, expected);
        for i in 0..n {
            if wp(i) != victim {
                prop_assert!(!g.neighbors(&wp(i)).unwrap().contains(&&victim));
            }
        }
    }

    #[test]
    fn route_never_costs_more_than_a_direct_edge((n, candidates) in graph_strategy()) {
        let g = build(n, &candidates);
        let config = QueryConfig::default();
        for edge in g.edges() {
            let direct = edge.annotations.cost.unwrap_or(config.default_edge_cost);
            let route = shortest_path(
                &g,
                &edge.id.from_waypoint,
                &edge.id.to_waypoint,
                RouteMode::Standard,
                &config,
            )
            .unwrap()
            .unwrap();
            prop_assert!(route.total_cost <= direct);
            prop_assert_eq!(route.waypoints.len(), route.edges.len() + 1);
        }
    }

    #[test]
    fn snapshot_ids_follow_content(
        a in prop::collection::vec(any::<u8>(), 0..64),
        b in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let snapshot = |data: Vec<u8>| WaypointSnapshot {
            robot_state: Some(OpaquePayload::new("raw", data)),
            ..WaypointSnapshot::default()
        };
        let mut store = SnapshotStore::<WaypointSnapshot>::new();
        let id_a = store.put(snapshot(a.clone())).unwrap();
        let again = store.put(snapshot(a.clone())).unwrap();
        prop_assert_eq!(&id_a, &again);
        prop_assert!(is_content_digest(&id_a));

        let id_b = store.put(snapshot(b.clone())).unwrap();
        prop_assert_eq!(id_a == id_b, a == b);
        prop_assert_eq!(store.len(), if a == b { 1 } else { 2 });
    }
}
