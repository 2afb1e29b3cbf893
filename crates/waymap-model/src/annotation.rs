//! Completeness-flagged annotation variants.
//!
//! A flagged annotation keeps its [`AnnotationState`] next to the optional
//! payload instead of deriving it from whether the payload is present. That
//! keeps "explicitly nothing here" (`None`) distinct from "nobody said"
//! (`Unknown`). Consistency between flag and payload is checked by the
//! validator in `waymap-graph`.

use crate::pose::SE3Pose;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationState {
    /// No assertion made.
    #[default]
    Unknown,
    /// Payload is asserted present.
    Set,
    /// Asserted absent.
    None,
}

impl fmt::Display for AnnotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnnotationState::Unknown => "unknown",
            AnnotationState::Set => "set",
            AnnotationState::None => "none",
        };
        f.write_str(s)
    }
}

/// Region in which scan matching is allowed around a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Region {
    /// Defer to the localizer's default policy.
    Default,
    /// Never scan match.
    Empty,
    /// Circle around the waypoint. `dist_2d > 0` is a radius in meters,
    /// `dist_2d < 0` disables scan matching, `0` places no limit.
    Circle2D { dist_2d: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizeRegion {
    pub state: AnnotationState,
    pub region: Option<Region>,
}

impl LocalizeRegion {
    pub fn set(region: Region) -> Self {
        Self {
            state: AnnotationState::Set,
            region: Some(region),
        }
    }

    pub fn none() -> Self {
        Self {
            state: AnnotationState::None,
            region: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StraightStaircase {
    pub from_ko_tform_stairs: SE3Pose,
    pub stair_count: u32,
    /// Rise of a single step, meters.
    pub rise: f64,
    /// Run of a single step, meters.
    pub run: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StairData {
    pub state: AnnotationState,
    pub straight_staircase: Option<StraightStaircase>,
}

impl StairData {
    pub fn set(staircase: StraightStaircase) -> Self {
        Self {
            state: AnnotationState::Set,
            straight_staircase: Some(staircase),
        }
    }

    pub fn none() -> Self {
        Self {
            state: AnnotationState::None,
            straight_staircase: None,
        }
    }
}
