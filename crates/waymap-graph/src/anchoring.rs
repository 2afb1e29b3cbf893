//! Anchoring of waypoints and world objects in the seed frame.
//!
//! Only seed-frame poses are stored. Relative poses between anchored
//! elements are recomputed from the anchors on every call so they cannot
//! drift from them. A missing anchor is reported as `Unanchored`, never
//! replaced by an identity pose.

use crate::error::{MapError, MapResult, RecordKind};
use crate::graph_store::GraphStore;
use crate::validate::check_pose;
use waymap_model::{Anchor, AnchoredWorldObject, Anchoring, SE3Pose, WaypointId, WorldObjectId};

/// `seed_tform_waypoint` for an anchored waypoint.
pub fn resolve(anchoring: &Anchoring, waypoint: &WaypointId) -> MapResult<SE3Pose> {
    anchoring
        .anchors
        .get(waypoint)
        .map(|a| a.seed_tform_waypoint)
        .ok_or_else(|| MapError::Unanchored(waypoint.to_string()))
}

pub fn resolve_object(anchoring: &Anchoring, object: &WorldObjectId) -> MapResult<SE3Pose> {
    anchoring
        .objects
        .get(object)
        .map(|o| o.seed_tform_object)
        .ok_or_else(|| MapError::Unanchored(object.to_string()))
}

/// `a_tform_b = inverse(seed_tform_a) * seed_tform_b`.
pub fn compose(anchoring: &Anchoring, a: &WaypointId, b: &WaypointId) -> MapResult<SE3Pose> {
    let seed_tform_a = resolve(anchoring, a)?;
    let seed_tform_b = resolve(anchoring, b)?;
    Ok(seed_tform_a.inverse().compose(&seed_tform_b))
}

/// Pose of a world object in a waypoint's frame.
pub fn waypoint_tform_object(
    anchoring: &Anchoring,
    waypoint: &WaypointId,
    object: &WorldObjectId,
) -> MapResult<SE3Pose> {
    let seed_tform_waypoint = resolve(anchoring, waypoint)?;
    let seed_tform_object = resolve_object(anchoring, object)?;
    Ok(seed_tform_waypoint.inverse().compose(&seed_tform_object))
}

impl GraphStore {
    /// Anchor a waypoint, overwriting any previous anchor. Returns the
    /// previous pose.
    pub fn anchor(
        &mut self,
        waypoint: &WaypointId,
        seed_tform_waypoint: SE3Pose,
    ) -> MapResult<Option<SE3Pose>> {
        if !self.contains_waypoint(waypoint) {
            return Err(MapError::not_found(RecordKind::Waypoint, waypoint));
        }
        check_pose("seed_tform_waypoint", &seed_tform_waypoint)?;
        let previous = self.anchoring.anchors.insert(
            waypoint.clone(),
            Anchor {
                id: waypoint.clone(),
                seed_tform_waypoint,
            },
        );
        tracing::debug!(waypoint = %waypoint, overwrote = previous.is_some(), "anchored waypoint");
        Ok(previous.map(|a| a.seed_tform_waypoint))
    }

    pub fn unanchor(&mut self, waypoint: &WaypointId) -> MapResult<SE3Pose> {
        self.anchoring
            .anchors
            .remove(waypoint)
            .map(|a| a.seed_tform_waypoint)
            .ok_or_else(|| MapError::Unanchored(waypoint.to_string()))
    }

    pub fn anchor_object(
        &mut self,
        object: &WorldObjectId,
        seed_tform_object: SE3Pose,
    ) -> MapResult<Option<SE3Pose>> {
        if object.is_empty() {
            return Err(MapError::EmptyId(RecordKind::WorldObject));
        }
        check_pose("seed_tform_object", &seed_tform_object)?;
        let previous = self.anchoring.objects.insert(
            object.clone(),
            AnchoredWorldObject {
                id: object.clone(),
                seed_tform_object,
            },
        );
        tracing::debug!(object = %object, "anchored world object");
        Ok(previous.map(|o| o.seed_tform_object))
    }

    pub fn is_anchored(&self, waypoint: &WaypointId) -> bool {
        self.anchoring.anchors.contains_key(waypoint)
    }

    pub fn resolve_anchor(&self, waypoint: &WaypointId) -> MapResult<SE3Pose> {
        if !self.contains_waypoint(waypoint) {
            return Err(MapError::not_found(RecordKind::Waypoint, waypoint));
        }
        resolve(&self.anchoring, waypoint)
    }

    pub fn resolve_object(&self, object: &WorldObjectId) -> MapResult<SE3Pose> {
        resolve_object(&self.anchoring, object)
    }

    /// Relative pose `a_tform_b` derived from the two anchors.
    pub fn compose_anchors(&self, a: &WaypointId, b: &WaypointId) -> MapResult<SE3Pose> {
        for id in [a, b] {
            if !self.contains_waypoint(id) {
                return Err(MapError::not_found(RecordKind::Waypoint, id));
            }
        }
        compose(&self.anchoring, a, b)
    }

    pub fn waypoint_tform_object(
        &self,
        waypoint: &WaypointId,
        object: &WorldObjectId,
    ) -> MapResult<SE3Pose> {
        waypoint_tform_object(&self.anchoring, waypoint, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;
    use waymap_model::Waypoint;

    fn store() -> GraphStore {
        let mut g = GraphStore::new();
        g.add_waypoint(Waypoint::new("a")).unwrap();
        g.add_waypoint(Waypoint::new("b")).unwrap();
        g
    }

    #[test]
    fn unanchored_is_a_typed_absence() {
        let g = store();
        assert_eq!(
            g.resolve_anchor(&"a".into()),
            Err(MapError::Unanchored("a".to_string()))
        );
        assert!(matches!(
            g.resolve_anchor(&"missing".into()),
            Err(MapError::NotFound { .. })
        ));
    }

    #[test]
    fn compose_is_derived_from_anchors() {
        let mut g = store();
        g.anchor(&"a".into(), SE3Pose::from_xy_yaw(1.0, 0.0, FRAC_PI_2))
            .unwrap();
        g.anchor(&"b".into(), SE3Pose::from_xy_yaw(1.0, 2.0, FRAC_PI_2))
            .unwrap();

        let a_tform_b = g.compose_anchors(&"a".into(), &"b".into()).unwrap();
        // b is 2m along seed +y, which is a's +x.
        assert_relative_eq!(a_tform_b.position.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(a_tform_b.position.y, 0.0, epsilon = 1e-12);

        // Re-anchoring b updates the relative pose immediately.
        let previous = g
            .anchor(&"b".into(), SE3Pose::from_xy_yaw(1.0, 3.0, FRAC_PI_2))
            .unwrap();
        assert!(previous.is_some());
        let a_tform_b = g.compose_anchors(&"a".into(), &"b".into()).unwrap();
        assert_relative_eq!(a_tform_b.position.x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn compose_requires_both_anchors() {
        let mut g = store();
        g.anchor(&"a".into(), SE3Pose::identity()).unwrap();
        assert_eq!(
            g.compose_anchors(&"a".into(), &"b".into()),
            Err(MapError::Unanchored("b".to_string()))
        );
    }

    #[test]
    fn anchoring_unknown_waypoint_fails() {
        let mut g = store();
        assert!(g.anchor(&"zz".into(), SE3Pose::identity()).is_err());
        assert!(g.anchoring().is_empty());
    }

    #[test]
    fn non_finite_pose_is_rejected() {
        let mut g = store();
        let bad = SE3Pose::from_translation(f64::NAN, 0.0, 0.0);
        assert!(g.anchor(&"a".into(), bad).is_err());
        assert!(!g.is_anchored(&"a".into()));
    }

    #[test]
    fn object_relative_to_waypoint() {
        let mut g = store();
        g.anchor(&"a".into(), SE3Pose::from_translation(1.0, 1.0, 0.0))
            .unwrap();
        g.anchor_object(&"dock".into(), SE3Pose::from_translation(4.0, 1.0, 0.0))
            .unwrap();
        let pose = g.waypoint_tform_object(&"a".into(), &"dock".into()).unwrap();
        assert_relative_eq!(pose.position.x, 3.0, epsilon = 1e-12);
        assert!(g.resolve_object(&"fiducial_7".into()).is_err());
    }

    #[test]
    fn unanchor_removes() {
        let mut g = store();
        g.anchor(&"a".into(), SE3Pose::identity()).unwrap();
        g.unanchor(&"a".into()).unwrap();
        assert!(!g.is_anchored(&"a".into()));
        assert!(g.unanchor(&"a".into()).is_err());
    }
}
