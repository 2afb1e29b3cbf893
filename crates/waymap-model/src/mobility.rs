//! Mobility parameters an edge can override, and the field mask selecting them.

use crate::pose::SE2VelocityLimit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocomotionHint {
    #[default]
    Unknown,
    Auto,
    Trot,
    Speed,
    Crawl,
    Amble,
    Jog,
    Hop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingHeight {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GratedSurfacesMode {
    #[default]
    Unknown,
    Off,
    On,
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleParams {
    pub disable_vision_foot_obstacle_avoidance: bool,
    pub disable_vision_foot_constraint_avoidance: bool,
    pub disable_vision_body_obstacle_avoidance: bool,
    /// Meters of padding kept around obstacles.
    pub obstacle_avoidance_padding: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Expected ground friction coefficient.
    pub ground_mu_hint: Option<f64>,
    pub grated_surfaces_mode: GratedSurfacesMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MobilityParams {
    pub vel_limit: Option<SE2VelocityLimit>,
    pub locomotion_hint: LocomotionHint,
    pub stair_hint: bool,
    pub allow_degraded_perception: bool,
    pub swing_height: SwingHeight,
    /// Body height offset from nominal, meters.
    pub body_height: f64,
    pub obstacle_params: ObstacleParams,
    pub terrain_params: TerrainParams,
    pub disallow_stair_tracker: bool,
    pub disable_nearmap_cliff_avoidance: bool,
}

impl MobilityParams {
    /// Every optional sub-message present, so that each field path of the
    /// structure is reachable when the value is serialized.
    pub fn fully_populated() -> Self {
        Self {
            vel_limit: Some(SE2VelocityLimit::default()),
            terrain_params: TerrainParams {
                ground_mu_hint: Some(0.0),
                ..TerrainParams::default()
            },
            ..Self::default()
        }
    }
}

/// Dotted field paths (`"stair_hint"`, `"terrain_params.ground_mu_hint"`).
///
/// An empty mask selects every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether the mask selects `path` (by equality, ancestor or descendant).
    pub fn selects(&self, path: &str) -> bool {
        if self.paths.is_empty() {
            return true;
        }
        self.paths.iter().any(|p| {
            p == path
                || path
                    .strip_prefix(p.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
                || p.strip_prefix(path).is_some_and(|rest| rest.starts_with('.'))
        })
    }
}
