//! Waymap graph layer
//!
//! In-memory stores and queries over the records of `waymap-model`:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          SharedMap                           │
//! │  ┌──────────────┐  ┌──────────────────────────────────────┐  │
//! │  │  GraphStore  │  │ SnapshotStore<WaypointSnapshot>      │  │
//! │  │  waypoints   │  │ SnapshotStore<EdgeSnapshot>          │  │
//! │  │  edges       │  └──────────────────────────────────────┘  │
//! │  │  anchoring   │                                            │
//! │  └──────┬───────┘                                            │
//! │         │ read guards                                        │
//! │         ▼                                                    │
//! │   query: shortest_path · scan match · mobility overrides     │
//! │   check: whole-graph consistency report                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! No I/O happens here. Persistence lives in `waymap-storage`.

pub mod anchoring;
pub mod check;
pub mod config;
pub mod error;
pub mod graph_store;
pub mod query;
pub mod shared;
pub mod snapshot_store;
pub mod validate;

pub use check::{check_graph, Finding, GraphReport, NoSnapshots, SnapshotCatalog};
pub use config::QueryConfig;
pub use error::{MapError, MapResult, RecordKind};
pub use graph_store::GraphStore;
pub use query::{
    apply_field_mask, effective_mobility_params, evaluate_scan_match, route_transform,
    scan_match_at, shortest_path, Route, RouteMode, ScanMatch,
};
pub use shared::SharedMap;
pub use snapshot_store::SnapshotStore;
