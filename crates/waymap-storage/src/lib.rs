//! Waymap map directory storage
//!
//! A map lives in one directory:
//!
//! ```text
//! <map_dir>/
//! ├── graph                      WMAP header + bincode, or JSON
//! ├── waypoint_snapshots/<id>    one bincode file per snapshot
//! └── edge_snapshots/<id>
//! ```
//!
//! ## Key Features
//!
//! - **Lazy**: the graph loads without touching snapshot files; snapshots
//!   are read one at a time on request.
//! - **Immutable**: a snapshot file is never rewritten with different bytes.
//! - **Verified**: snapshots stored under a content digest are re-hashed on
//!   load.

pub mod format;


use crate::format::{decode_graph, decode_snapshot, encode_graph, encode_snapshot};
pub use crate::format::GraphFormat;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use waymap_graph::{GraphStore, MapError, RecordKind, SharedMap, SnapshotCatalog};
use waymap_model::{
    content_digest, is_content_digest, EdgeId, EdgeSnapshot, Graph, Snapshot, SnapshotId,
    SnapshotKind, WaypointId, WaypointSnapshot,
};

pub const GRAPH_FILE: &str = "graph";
pub const WAYPOINT_SNAPSHOT_DIR: &str = "waypoint_snapshots";
pub const EDGE_SNAPSHOT_DIR: &str = "edge_snapshots";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("binary codec error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a waymap graph file")]
    BadMagic,
    #[error("unsupported graph file version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("graph file is truncated")]
    Truncated,
    #[error("snapshot id {0:?} is not a safe file name")]
    UnsafeSnapshotId(String),
    #[error("{kind} file {id} does not match its content digest")]
    DigestMismatch { kind: SnapshotKind, id: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ============================================================================
// Storage Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the map directory
    pub map_dir: PathBuf,
    /// Encoding used when writing the graph file
    pub graph_format: GraphFormat,
    /// Create the directory layout on open
    pub create_dirs: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            map_dir: PathBuf::from("./map"),
            graph_format: GraphFormat::Binary,
            create_dirs: true,
        }
    }
}

impl StorageConfig {
    pub fn for_dir(map_dir: impl Into<PathBuf>) -> Self {
        Self {
            map_dir: map_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read storage config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse storage config {}", path.display()))
    }
}

/// What [`MapStorage::load_into`] brought into memory.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub waypoints: usize,
    pub edges: usize,
    pub waypoint_snapshots: usize,
    pub edge_snapshots: usize,
    pub missing_waypoint_snapshots: Vec<(WaypointId, SnapshotId)>,
    pub missing_edge_snapshots: Vec<(EdgeId, SnapshotId)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.missing_waypoint_snapshots.is_empty() && self.missing_edge_snapshots.is_empty()
    }
}

// ============================================================================
// Map Storage
// ============================================================================

pub struct MapStorage {
    config: StorageConfig,
}

impl MapStorage {
    pub fn open(config: StorageConfig) -> StorageResult<Self> {
        let dirs = [
            config.map_dir.clone(),
            config.map_dir.join(WAYPOINT_SNAPSHOT_DIR),
            config.map_dir.join(EDGE_SNAPSHOT_DIR),
        ];
        for dir in &dirs {
            if config.create_dirs {
                std::fs::create_dir_all(dir).map_err(io_error(dir))?;
            } else if !dir.is_dir() {
                return Err(StorageError::Io {
                    path: dir.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "map directory is missing",
                    ),
                });
            }
        }
        tracing::debug!(map_dir = %config.map_dir.display(), "opened map storage");
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn map_dir(&self) -> &Path {
        &self.config.map_dir
    }

    pub fn graph_path(&self) -> PathBuf {
        self.config.map_dir.join(GRAPH_FILE)
    }

    fn snapshot_dir(&self, kind: SnapshotKind) -> PathBuf {
        let dir = match kind {
            SnapshotKind::Waypoint => WAYPOINT_SNAPSHOT_DIR,
            SnapshotKind::Edge => EDGE_SNAPSHOT_DIR,
        };
        self.config.map_dir.join(dir)
    }

    pub fn snapshot_path(&self, kind: SnapshotKind, id: &SnapshotId) -> StorageResult<PathBuf> {
        check_file_name(id)?;
        Ok(self.snapshot_dir(kind).join(id.as_str()))
    }

    // ========================================================================
    // Graph
    // ========================================================================

    pub fn save_graph(&self, graph: &GraphStore) -> StorageResult<()> {
        let bytes = encode_graph(&graph.to_graph(), self.config.graph_format)?;
        let path = self.graph_path();
        write_atomically(&path, &bytes)?;
        tracing::debug!(
            path = %path.display(),
            waypoints = graph.waypoint_count(),
            edges = graph.edge_count(),
            format = ?self.config.graph_format,
            "saved graph"
        );
        Ok(())
    }

    /// Decode the graph file without enforcing store invariants.
    pub fn read_graph(&self) -> StorageResult<Graph> {
        let path = self.graph_path();
        let bytes = std::fs::read(&path).map_err(io_error(&path))?;
        decode_graph(&bytes)
    }

    pub fn load_graph(&self) -> StorageResult<GraphStore> {
        let graph = GraphStore::from_graph(self.read_graph()?)?;
        tracing::debug!(
            waypoints = graph.waypoint_count(),
            edges = graph.edge_count(),
            "loaded graph"
        );
        Ok(graph)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn write_waypoint_snapshot(&self, snapshot: &WaypointSnapshot) -> StorageResult<SnapshotId> {
        self.write_snapshot(snapshot)
    }

    pub fn write_edge_snapshot(&self, snapshot: &EdgeSnapshot) -> StorageResult<SnapshotId> {
        self.write_snapshot(snapshot)
    }

    pub fn load_waypoint_snapshot(&self, id: &SnapshotId) -> StorageResult<WaypointSnapshot> {
        self.load_snapshot(id)
    }

    pub fn load_edge_snapshot(&self, id: &SnapshotId) -> StorageResult<EdgeSnapshot> {
        self.load_snapshot(id)
    }

    pub fn has_snapshot(&self, kind: SnapshotKind, id: &SnapshotId) -> bool {
        self.snapshot_path(kind, id)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Snapshot ids stored on disk, sorted.
    pub fn list_snapshots(&self, kind: SnapshotKind) -> StorageResult<Vec<SnapshotId>> {
        let dir = self.snapshot_dir(kind);
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_error(&dir))? {
            let entry = entry.map_err(io_error(&dir))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.ends_with(".tmp") {
                    ids.push(SnapshotId::from(name));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Write a snapshot file. An empty id is replaced by the content digest.
    ///
    /// Re-writing identical bytes is a no-op; different bytes under an
    /// existing id are rejected.
    fn write_snapshot<S: Snapshot>(&self, snapshot: &S) -> StorageResult<SnapshotId> {
        snapshot.check_content().map_err(MapError::from)?;
        let mut snapshot = snapshot.clone();
        let digest = content_digest(&snapshot).map_err(MapError::from)?;
        if snapshot.id().is_empty() {
            snapshot.set_id(digest.clone());
        }
        let id = snapshot.id().clone();
        if is_content_digest(&id) && id != digest {
            tracing::warn!(kind = %S::KIND, snapshot = %id, "refusing snapshot whose id is not its digest");
            return Err(MapError::IdentityConflict {
                kind: S::KIND,
                id: id.to_string(),
            }
            .into());
        }
        let path = self.snapshot_path(S::KIND, &id)?;
        let bytes = encode_snapshot(&snapshot)?;

        if path.exists() {
            let existing = std::fs::read(&path).map_err(io_error(&path))?;
            if existing == bytes {
                tracing::debug!(kind = %S::KIND, snapshot = %id, "snapshot file already present");
                return Ok(id);
            }
            tracing::warn!(kind = %S::KIND, snapshot = %id, "refusing to overwrite snapshot file");
            return Err(MapError::IdentityConflict {
                kind: S::KIND,
                id: id.to_string(),
            }
            .into());
        }

        write_atomically(&path, &bytes)?;
        tracing::debug!(kind = %S::KIND, snapshot = %id, bytes = bytes.len(), "wrote snapshot");
        Ok(id)
    }

    fn load_snapshot<S: Snapshot>(&self, id: &SnapshotId) -> StorageResult<S> {
        let path = self.snapshot_path(S::KIND, id)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MapError::not_found(RecordKind::Snapshot(S::KIND), id).into());
            }
            Err(e) => return Err(io_error(&path)(e)),
        };
        let snapshot: S = decode_snapshot(&bytes)?;

        let mismatch = || StorageError::DigestMismatch {
            kind: S::KIND,
            id: id.to_string(),
        };
        if snapshot.id() != id {
            return Err(mismatch());
        }
        if is_content_digest(id) && &content_digest(&snapshot).map_err(MapError::from)? != id {
            tracing::warn!(kind = %S::KIND, snapshot = %id, "snapshot file failed digest check");
            return Err(mismatch());
        }
        snapshot.check_content().map_err(MapError::from)?;
        Ok(snapshot)
    }

    // ========================================================================
    // Whole map
    // ========================================================================

    /// Persist the graph and every snapshot held by `map`.
    pub fn save_map(&self, map: &SharedMap) -> StorageResult<()> {
        let graph = map.graph();
        let waypoint_snapshots = map.waypoint_snapshots();
        let edge_snapshots = map.edge_snapshots();
        for snapshot in waypoint_snapshots.iter() {
            self.write_waypoint_snapshot(snapshot)?;
        }
        for snapshot in edge_snapshots.iter() {
            self.write_edge_snapshot(snapshot)?;
        }
        self.save_graph(&graph)
    }

    /// Load the graph and every snapshot it references into `map`.
    ///
    /// A referenced snapshot with no file is logged and listed in the
    /// report; the rest of the map still loads. On error `map` is left as
    /// it was.
    pub fn load_into(&self, map: &SharedMap) -> StorageResult<LoadReport> {
        let graph = self.load_graph()?;
        let mut report = LoadReport {
            waypoints: graph.waypoint_count(),
            edges: graph.edge_count(),
            ..LoadReport::default()
        };

        let mut waypoint_snapshots = Vec::new();
        for waypoint in graph.waypoints() {
            if !waypoint.has_snapshot() {
                continue;
            }
            match self.load_waypoint_snapshot(&waypoint.snapshot_id) {
                Ok(snapshot) => waypoint_snapshots.push(snapshot),
                Err(StorageError::Map(MapError::NotFound { .. })) => {
                    tracing::warn!(waypoint = %waypoint.id, snapshot = %waypoint.snapshot_id, "waypoint snapshot file missing");
                    report
                        .missing_waypoint_snapshots
                        .push((waypoint.id.clone(), waypoint.snapshot_id.clone()));
                }
                Err(e) => return Err(e),
            }
        }

        let mut edge_snapshots = Vec::new();
        for edge in graph.edges() {
            if !edge.has_snapshot() {
                continue;
            }
            match self.load_edge_snapshot(&edge.snapshot_id) {
                Ok(snapshot) => edge_snapshots.push(snapshot),
                Err(StorageError::Map(MapError::NotFound { .. })) => {
                    tracing::warn!(edge = %edge.id, snapshot = %edge.snapshot_id, "edge snapshot file missing");
                    report
                        .missing_edge_snapshots
                        .push((edge.id.clone(), edge.snapshot_id.clone()));
                }
                Err(e) => return Err(e),
            }
        }

        let mut graph_slot = map.graph_mut();
        let mut waypoint_store = map.waypoint_snapshots_mut();
        let mut edge_store = map.edge_snapshots_mut();
        // Both batches are checked before either store is touched.
        waypoint_store.check_put_all(&waypoint_snapshots)?;
        edge_store.check_put_all(&edge_snapshots)?;
        waypoint_store.put_all(waypoint_snapshots)?;
        edge_store.put_all(edge_snapshots)?;
        *graph_slot = graph;
        report.waypoint_snapshots = waypoint_store.len();
        report.edge_snapshots = edge_store.len();

        tracing::debug!(
            waypoints = report.waypoints,
            edges = report.edges,
            missing = report.missing_waypoint_snapshots.len() + report.missing_edge_snapshots.len(),
            "loaded map"
        );
        Ok(report)
    }
}

impl SnapshotCatalog for MapStorage {
    fn has_waypoint_snapshot(&self, id: &SnapshotId) -> bool {
        self.has_snapshot(SnapshotKind::Waypoint, id)
    }

    fn has_edge_snapshot(&self, id: &SnapshotId) -> bool {
        self.has_snapshot(SnapshotKind::Edge, id)
    }
}

/// Snapshot ids become file names, so they must be a single path component.
pub fn check_file_name(id: &SnapshotId) -> StorageResult<()> {
    let name = id.as_str();
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.ends_with(".tmp")
        || name.chars().any(|c| c == '/' || c == '\\' || c == '\0');
    if unsafe_name {
        return Err(StorageError::UnsafeSnapshotId(name.to_string()));
    }
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_error(path))
}
