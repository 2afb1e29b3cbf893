//! Opaque string identifiers.
//!
//! Ids are compared byte-wise. Nothing in the store interprets their content,
//! with one exception: snapshot ids produced by [`crate::content_digest`]
//! carry a recognizable prefix so they can be re-verified on load.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Globally unique waypoint id. Stable across annotation edits.
    WaypointId
);

string_id!(
    /// Snapshot id. Empty means "no snapshot attached".
    SnapshotId
);

string_id!(
    /// Id of a world object (fiducial, dock, ...) placed by anchoring.
    WorldObjectId
);

impl WaypointId {
    /// Fresh random id for a newly recorded waypoint.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Stored identity of an edge: the ordered pair of endpoints.
///
/// The stored direction only matters for interpreting `from_tform_to`; for
/// traversal and uniqueness an edge is identified by its [`PairKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    pub from_waypoint: WaypointId,
    pub to_waypoint: WaypointId,
}

impl EdgeId {
    pub fn new(from: impl Into<WaypointId>, to: impl Into<WaypointId>) -> Self {
        Self {
            from_waypoint: from.into(),
            to_waypoint: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from_waypoint: self.to_waypoint.clone(),
            to_waypoint: self.from_waypoint.clone(),
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.from_waypoint, &self.to_waypoint)
    }

    pub fn touches(&self, waypoint: &WaypointId) -> bool {
        &self.from_waypoint == waypoint || &self.to_waypoint == waypoint
    }

    /// The endpoint opposite `waypoint`, if `waypoint` is an endpoint.
    pub fn other(&self, waypoint: &WaypointId) -> Option<&WaypointId> {
        if &self.from_waypoint == waypoint {
            Some(&self.to_waypoint)
        } else if &self.to_waypoint == waypoint {
            Some(&self.from_waypoint)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_waypoint == self.to_waypoint
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from_waypoint, self.to_waypoint)
    }
}

/// Unordered endpoint pair (endpoints sorted).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    lo: WaypointId,
    hi: WaypointId,
}

impl PairKey {
    pub fn new(a: &WaypointId, b: &WaypointId) -> Self {
        if a <= b {
            Self {
                lo: a.clone(),
                hi: b.clone(),
            }
        } else {
            Self {
                lo: b.clone(),
                hi: a.clone(),
            }
        }
    }

    pub fn endpoints(&self) -> (&WaypointId, &WaypointId) {
        (&self.lo, &self.hi)
    }
}
