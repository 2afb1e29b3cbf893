//! Integration tests for the complete Waymap pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Record a map in memory → Save to a map directory → Reload
//! - Reload → Route / anchoring / scan-match / mobility queries
//! - Concurrent readers while a writer edits the shared map
//!
//! Run with: cargo test --test integration_tests

use approx::assert_relative_eq;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;
use waymap_graph::{
    check_graph, effective_mobility_params, route_transform, scan_match_at, GraphStore,
    MapError, QueryConfig, RouteMode, ScanMatch, SharedMap,
};
use waymap_model::{
    Edge, EdgeId, EdgeSnapshot, FieldMask, LocalizeRegion, MobilityParams, OpaquePayload,
    Region, SE3Pose, SnapshotKind, Waypoint, WaypointId, WaypointSnapshot,
};
use waymap_storage::{GraphFormat, MapStorage, StorageConfig, StorageError};

/// Square loop a-b-c-d recorded counter-clockwise, 2m sides, with a
/// snapshot on every waypoint and on the a-b edge.
fn record_loop(map: &SharedMap) {
    let corners = [("a", 0.0, 0.0), ("b", 2.0, 0.0), ("c", 2.0, 2.0), ("d", 0.0, 2.0)];
    for (i, (name, x, y)) in corners.iter().enumerate() {
        let snapshot = WaypointSnapshot {
            robot_state: Some(OpaquePayload::new("state", vec![i as u8; 8])),
            ..WaypointSnapshot::default()
        };
        let snapshot_id = map.put_waypoint_snapshot(snapshot).unwrap();
        let mut waypoint = Waypoint::new(*name)
            .with_name(format!("corner-{name}"))
            .with_snapshot(snapshot_id);
        if *name == "c" {
            waypoint.annotations.scan_match_region =
                LocalizeRegion::set(Region::Circle2D { dist_2d: 1.0 });
        }
        map.add_waypoint(waypoint).unwrap();
        map.graph_mut()
            .anchor(&(*name).into(), SE3Pose::from_xy_yaw(*x, *y, 0.0))
            .unwrap();
    }

    let edge_snapshot = map.put_edge_snapshot(EdgeSnapshot::default()).unwrap();
    map.add_edge(
        Edge::new("a", "b")
            .with_snapshot(edge_snapshot)
            .with_transform(SE3Pose::from_translation(2.0, 0.0, 0.0)),
    )
    .unwrap();
    map.add_edge(Edge::new("b", "c").with_transform(SE3Pose::from_translation(0.0, 2.0, 0.0)))
        .unwrap();
    map.add_edge(Edge::new("c", "d").with_transform(SE3Pose::from_translation(-2.0, 0.0, 0.0)))
        .unwrap();

    // Loop closure recorded d -> a, flagged off-limits to alternate routing.
    let mut closure = Edge::new("d", "a")
        .with_cost(0.5)
        .with_transform(SE3Pose::from_translation(0.0, -2.0, 0.0));
    closure.annotations.disable_alternate_route_finding = true;
    closure.annotations.override_mobility_params = FieldMask::new(["stair_hint"]);
    closure.annotations.mobility_params = Some(MobilityParams {
        stair_hint: true,
        ..MobilityParams::default()
    });
    map.add_edge(closure).unwrap();
}

fn open(dir: &std::path::Path, format: GraphFormat) -> MapStorage {
    MapStorage::open(StorageConfig {
        map_dir: dir.join("site"),
        graph_format: format,
        create_dirs: true,
    })
    .unwrap()
}

// ============================================================================
// Storage → Graph → Query
// ============================================================================

#[test]
fn test_recorded_map_survives_reload() {
    let dir = tempdir().unwrap();
    let storage = open(dir.path(), GraphFormat::Binary);

    let recorded = SharedMap::new();
    record_loop(&recorded);
    storage.save_map(&recorded).unwrap();

    let reloaded = SharedMap::new();
    let report = storage.load_into(&reloaded).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.waypoints, 4);
    assert_eq!(report.edges, 4);
    assert_eq!(report.waypoint_snapshots, 4);
    assert_eq!(report.edge_snapshots, 1);

    assert_eq!(reloaded.graph().to_graph(), recorded.graph().to_graph());
    assert!(reloaded.check().ok());
}

#[test]
fn test_routes_on_reloaded_map() {
    let dir = tempdir().unwrap();
    let storage = open(dir.path(), GraphFormat::Binary);
    let recorded = SharedMap::new();
    record_loop(&recorded);
    storage.save_map(&recorded).unwrap();
    let graph = storage.load_graph().unwrap();
    let config = QueryConfig::default();

    // a -> d: the loop closure is cheaper than going around.
    let direct = waymap_graph::shortest_path(
        &graph,
        &"a".into(),
        &"d".into(),
        RouteMode::Standard,
        &config,
    )
    .unwrap()
    .unwrap();
    assert_eq!(direct.edges, vec![EdgeId::new("d", "a")]);
    assert_relative_eq!(direct.total_cost, 0.5);

    let around = waymap_graph::shortest_path(
        &graph,
        &"a".into(),
        &"d".into(),
        RouteMode::AlternateRoute,
        &config,
    )
    .unwrap()
    .unwrap();
    let hops: Vec<&str> = around.waypoints.iter().map(|w| w.as_str()).collect();
    assert_eq!(hops, vec!["a", "b", "c", "d"]);
    assert_relative_eq!(around.total_cost, 3.0);

    // Both routes land on d's anchored pose relative to a.
    let a_tform_d = graph.compose_anchors(&"a".into(), &"d".into()).unwrap();
    for route in [&direct, &around] {
        let by_edges = route_transform(&graph, route).unwrap();
        assert!(by_edges.approx_eq(&a_tform_d, 1e-9));
    }
}

#[test]
fn test_queries_on_json_map() {
    let dir = tempdir().unwrap();
    let storage = open(dir.path(), GraphFormat::Json);
    let recorded = SharedMap::new();
    record_loop(&recorded);
    storage.save_map(&recorded).unwrap();
    let graph = storage.load_graph().unwrap();

    assert_eq!(scan_match_at(&graph, &"c".into(), 0.5).unwrap(), ScanMatch::Run);
    assert_eq!(scan_match_at(&graph, &"c".into(), 1.5).unwrap(), ScanMatch::Skip);
    assert_eq!(
        scan_match_at(&graph, &"a".into(), 1.5).unwrap(),
        ScanMatch::UseDefault
    );

    let closure = graph.get_edge(&EdgeId::new("a", "d")).unwrap();
    let effective = effective_mobility_params(closure, &MobilityParams::default()).unwrap();
    assert!(effective.stair_hint);

    let b_tform_d = graph.compose_anchors(&"b".into(), &"d".into()).unwrap();
    assert_relative_eq!(b_tform_d.position.x, -2.0, epsilon = 1e-12);
    assert_relative_eq!(b_tform_d.position.y, 2.0, epsilon = 1e-12);
}

#[test]
fn test_removed_waypoint_leaves_consistent_map_on_disk() {
    let dir = tempdir().unwrap();
    let storage = open(dir.path(), GraphFormat::Binary);
    let map = SharedMap::new();
    record_loop(&map);

    let (removed, edges) = map.remove_waypoint(&"b".into()).unwrap();
    assert_eq!(removed.id.as_str(), "b");
    assert_eq!(edges.len(), 2);
    storage.save_map(&map).unwrap();

    let graph = storage.read_graph().unwrap();
    let report = check_graph(&graph, &storage);
    assert!(report.ok(), "{:?}", report.problems());
    assert_eq!(graph.waypoints.len(), 3);
    assert_eq!(graph.edges.len(), 2);
    assert!(!graph.anchoring.anchors.contains_key(&WaypointId::from("b")));

    // b's snapshot file is still on disk; snapshots are never deleted by
    // graph edits.
    assert_eq!(storage.list_snapshots(SnapshotKind::Waypoint).unwrap().len(), 4);
    assert!(matches!(
        waymap_graph::shortest_path(
            &GraphStore::from_graph(graph).unwrap(),
            &"a".into(),
            &"b".into(),
            RouteMode::Standard,
            &QueryConfig::default(),
        ),
        Err(MapError::NotFound { .. })
    ));
}

#[test]
fn test_snapshot_rewrite_is_refused_across_sessions() {
    let dir = tempdir().unwrap();
    let first = open(dir.path(), GraphFormat::Binary);
    let id = first
        .write_edge_snapshot(&EdgeSnapshot {
            id: "edge-0001".into(),
            ..EdgeSnapshot::default()
        })
        .unwrap();
    drop(first);

    let second = open(dir.path(), GraphFormat::Binary);
    let mut altered = EdgeSnapshot {
        id: id.clone(),
        ..EdgeSnapshot::default()
    };
    altered.stances.push(waymap_model::Stance {
        timestamp: Default::default(),
        foot_states: Vec::new(),
        ko_tform_body: SE3Pose::identity(),
        vision_tform_body: SE3Pose::identity(),
        planar_ground: false,
    });
    assert!(matches!(
        second.write_edge_snapshot(&altered),
        Err(StorageError::Map(MapError::IdentityConflict { .. }))
    ));
    assert!(second.load_edge_snapshot(&id).unwrap().stances.is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_routing_during_edits() {
    let map = SharedMap::new();
    record_loop(&map);
    let config = Arc::new(QueryConfig::default());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let map = map.clone();
            let config = Arc::clone(&config);
            thread::spawn(move || {
                for _ in 0..200 {
                    // a and c are never removed, so a route must always exist.
                    let route = map
                        .shortest_path(&"a".into(), &"c".into(), RouteMode::Standard, &config)
                        .unwrap()
                        .unwrap();
                    assert!(route.total_cost <= 2.0);
                }
            })
        })
        .collect();

    for round in 0..50 {
        let id = format!("detour-{round}");
        map.add_waypoint(Waypoint::new(id.as_str())).unwrap();
        map.add_edge(Edge::new("a", id.as_str()).with_cost(0.1)).unwrap();
        map.add_edge(Edge::new(id.as_str(), "c").with_cost(0.1)).unwrap();
        map.remove_waypoint(&id.as_str().into()).unwrap();
    }

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(map.graph().waypoint_count(), 4);
    assert_eq!(map.graph().edge_count(), 4);
}
