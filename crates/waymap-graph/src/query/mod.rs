//! Read-only queries over a [`GraphStore`](crate::GraphStore).

pub mod field_mask;
pub mod mobility;
pub mod route;
pub mod scan_match;

pub use field_mask::{apply_field_mask, validate_field_mask};
pub use mobility::effective_mobility_params;
pub use route::{edge_weight, route_transform, shortest_path, Route, RouteMode};
pub use scan_match::{evaluate_scan_match, scan_match_at, ScanMatch};
