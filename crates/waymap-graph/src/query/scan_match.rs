//! Scan-match region decisions.

use crate::error::MapResult;
use crate::graph_store::GraphStore;
use std::fmt;
use waymap_model::{AnnotationState, Region, Waypoint, WaypointId};

/// Whether the localizer should scan match against a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMatch {
    Run,
    Skip,
    /// The waypoint expresses no preference.
    UseDefault,
}

impl ScanMatch {
    /// Collapse `UseDefault` into the localizer's default policy.
    pub fn resolve(self, default: bool) -> bool {
        match self {
            ScanMatch::Run => true,
            ScanMatch::Skip => false,
            ScanMatch::UseDefault => default,
        }
    }
}

impl fmt::Display for ScanMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanMatch::Run => "run",
            ScanMatch::Skip => "skip",
            ScanMatch::UseDefault => "default",
        };
        f.write_str(s)
    }
}

/// Decide scan matching for a robot `distance_2d` meters from `waypoint`.
pub fn evaluate_scan_match(waypoint: &Waypoint, distance_2d: f64) -> ScanMatch {
    let region = &waypoint.annotations.scan_match_region;
    if region.state != AnnotationState::Set {
        return ScanMatch::UseDefault;
    }
    match region.region {
        None | Some(Region::Default) => ScanMatch::UseDefault,
        Some(Region::Empty) => ScanMatch::Skip,
        Some(Region::Circle2D { dist_2d }) => {
            if dist_2d < 0.0 {
                ScanMatch::Skip
            } else if dist_2d == 0.0 || distance_2d <= dist_2d {
                ScanMatch::Run
            } else {
                ScanMatch::Skip
            }
        }
    }
}

pub fn scan_match_at(graph: &GraphStore, id: &WaypointId, distance_2d: f64) -> MapResult<ScanMatch> {
    graph
        .get_waypoint(id)
        .map(|w| evaluate_scan_match(w, distance_2d))
}
