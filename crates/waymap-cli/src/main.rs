//! Waymap CLI
//!
//! Usage:
//!   waymap info <map_dir>
//!   waymap check <map_dir>
//!   waymap route <map_dir> <from> <to> [--alternate] [--default-cost X] [--config FILE]
//!   waymap compose <map_dir> <a> <b>
//!   waymap scan-match <map_dir> <waypoint> <distance>
//!   waymap export-json <map_dir> <out>

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use waymap_graph::{
    route_transform, scan_match_at, shortest_path, GraphStore, QueryConfig, RouteMode,
};
use waymap_model::{SE3Pose, SnapshotKind, WaypointId};
use waymap_storage::{GraphFormat, MapStorage, StorageConfig};

#[derive(Parser)]
#[command(name = "waymap")]
#[command(author, version, about = "Waymap: robot navigation graph maps")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. `info`, `waymap_graph=debug`)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print waypoint, edge, anchor and snapshot counts.
    Info { map_dir: PathBuf },

    /// Check graph invariants and snapshot references; non-zero exit on problems.
    Check { map_dir: PathBuf },

    /// Cheapest route between two waypoints.
    Route {
        map_dir: PathBuf,
        from: String,
        to: String,
        /// Skip edges excluded from alternate route finding
        #[arg(long)]
        alternate: bool,
        /// Cost of edges without a cost annotation
        #[arg(long)]
        default_cost: Option<f64>,
        /// Query config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Relative pose `a_tform_b` from the anchoring.
    Compose {
        map_dir: PathBuf,
        a: String,
        b: String,
    },

    /// Scan-match decision for a robot `distance` meters from a waypoint.
    ScanMatch {
        map_dir: PathBuf,
        waypoint: String,
        distance: f64,
        /// Query config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the graph as JSON.
    ExportJson { map_dir: PathBuf, out: PathBuf },
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid --log-level {level:?}"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn open_existing(map_dir: &Path) -> Result<MapStorage> {
    let config = StorageConfig {
        map_dir: map_dir.to_path_buf(),
        create_dirs: false,
        ..StorageConfig::default()
    };
    MapStorage::open(config).with_context(|| format!("failed to open map {}", map_dir.display()))
}

fn load_graph(storage: &MapStorage) -> Result<GraphStore> {
    storage
        .load_graph()
        .with_context(|| format!("failed to load graph from {}", storage.graph_path().display()))
}

fn query_config(path: Option<&PathBuf>) -> Result<QueryConfig> {
    match path {
        Some(path) => QueryConfig::from_json_file(path),
        None => Ok(QueryConfig::default()),
    }
}

fn format_pose(pose: &SE3Pose) -> String {
    let p = pose.position;
    let (roll, pitch, yaw) = pose.rotation.euler_angles();
    format!(
        "xyz=({:.3}, {:.3}, {:.3}) rpy=({:.4}, {:.4}, {:.4})",
        p.x, p.y, p.z, roll, pitch, yaw
    )
}

fn cmd_info(map_dir: &Path) -> Result<()> {
    let storage = open_existing(map_dir)?;
    let graph = load_graph(&storage)?;
    let waypoint_snapshots = storage.list_snapshots(SnapshotKind::Waypoint)?;
    let edge_snapshots = storage.list_snapshots(SnapshotKind::Edge)?;

    println!("{} {}", "map".bold(), map_dir.display());
    println!("  waypoints:          {}", graph.waypoint_count());
    println!("  edges:              {}", graph.edge_count());
    println!("  anchored waypoints: {}", graph.anchoring().anchors.len());
    println!("  anchored objects:   {}", graph.anchoring().objects.len());
    println!("  waypoint snapshots: {}", waypoint_snapshots.len());
    println!("  edge snapshots:     {}", edge_snapshots.len());
    Ok(())
}

fn cmd_check(map_dir: &Path) -> Result<()> {
    let storage = open_existing(map_dir)?;
    let graph = storage
        .read_graph()
        .with_context(|| format!("failed to read {}", storage.graph_path().display()))?;
    let report = waymap_graph::check_graph(&graph, &storage);

    eprintln!(
        "checked waypoints={} edges={} snapshot_refs={} anchors={}",
        report.topology.checked_waypoints,
        report.topology.checked_edges,
        report.snapshots.checked_references,
        report.anchoring.checked_anchors,
    );
    if report.ok() {
        eprintln!("{} map is consistent", "ok".green().bold());
        return Ok(());
    }
    for problem in report.problems() {
        println!("{} {problem}", "error:".red().bold());
    }
    bail!("{} problem(s) found", report.problem_count())
}

fn cmd_route(
    map_dir: &Path,
    from: &str,
    to: &str,
    alternate: bool,
    default_cost: Option<f64>,
    config: Option<&PathBuf>,
) -> Result<()> {
    let mut config = query_config(config)?;
    if let Some(cost) = default_cost {
        config.default_edge_cost = cost;
    }
    let mode = if alternate {
        RouteMode::AlternateRoute
    } else {
        RouteMode::Standard
    };
    let storage = open_existing(map_dir)?;
    let graph = load_graph(&storage)?;
    debug!(?mode, default_cost = config.default_edge_cost, "routing");

    let (from, to) = (WaypointId::from(from), WaypointId::from(to));
    let Some(route) = shortest_path(&graph, &from, &to, mode, &config)? else {
        bail!("no route from {from} to {to}");
    };

    let hops: Vec<&str> = route.waypoints.iter().map(|w| w.as_str()).collect();
    println!("{}", hops.join(" -> "));
    println!("cost: {:.3} ({} edges)", route.total_cost, route.len());
    let start_tform_goal = route_transform(&graph, &route)?;
    println!("start_tform_goal: {}", format_pose(&start_tform_goal));
    Ok(())
}

fn cmd_compose(map_dir: &Path, a: &str, b: &str) -> Result<()> {
    let storage = open_existing(map_dir)?;
    let graph = load_graph(&storage)?;
    let a_tform_b = graph.compose_anchors(&a.into(), &b.into())?;
    println!("{a}_tform_{b}: {}", format_pose(&a_tform_b));
    Ok(())
}

fn cmd_scan_match(
    map_dir: &Path,
    waypoint: &str,
    distance: f64,
    config: Option<&PathBuf>,
) -> Result<()> {
    let config = query_config(config)?;
    let storage = open_existing(map_dir)?;
    let graph = load_graph(&storage)?;
    let decision = scan_match_at(&graph, &waypoint.into(), distance)?;
    let run = decision.resolve(config.default_scan_match);
    println!(
        "{decision} ({})",
        if run { "scan match".green() } else { "skip".yellow() }
    );
    Ok(())
}

fn cmd_export_json(map_dir: &Path, out: &Path) -> Result<()> {
    let storage = open_existing(map_dir)?;
    let graph = load_graph(&storage)?;
    let bytes = waymap_storage::format::encode_graph(&graph.to_graph(), GraphFormat::Json)?;
    std::fs::write(out, bytes).with_context(|| format!("failed to write {}", out.display()))?;
    eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Info { map_dir } => cmd_info(&map_dir),
        Commands::Check { map_dir } => cmd_check(&map_dir),
        Commands::Route {
            map_dir,
            from,
            to,
            alternate,
            default_cost,
            config,
        } => cmd_route(&map_dir, &from, &to, alternate, default_cost, config.as_ref()),
        Commands::Compose { map_dir, a, b } => cmd_compose(&map_dir, &a, &b),
        Commands::ScanMatch {
            map_dir,
            waypoint,
            distance,
            config,
        } => cmd_scan_match(&map_dir, &waypoint, distance, config.as_ref()),
        Commands::ExportJson { map_dir, out } => cmd_export_json(&map_dir, &out),
    }
}
