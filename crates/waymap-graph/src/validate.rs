//! Annotation validation.
//!
//! Flagged annotations contradict themselves when the flag is `Set` without a
//! payload or `None` with one. `Unknown` asserts nothing and always passes.
//!
//! The `*_issues` functions collect every problem (for reports); the
//! `validate_*` functions return the first one (for mutations).

use crate::error::{MapError, MapResult, RecordKind};
use crate::query::field_mask::validate_field_mask;
use waymap_model::{
    AnnotationState, Edge, EdgeAnnotations, MobilityParams, Region, SE3Pose, Waypoint,
    WaypointAnnotations,
};

/// Check one completeness flag against the presence of its payload.
pub fn check_state(field: &'static str, state: AnnotationState, has_payload: bool) -> MapResult<()> {
    match (state, has_payload) {
        (AnnotationState::Set, false) | (AnnotationState::None, true) => {
            Err(MapError::AnnotationContradiction { field, state })
        }
        _ => Ok(()),
    }
}

pub fn waypoint_annotation_issues(annotations: &WaypointAnnotations) -> Vec<MapError> {
    let mut issues = Vec::new();
    let region = &annotations.scan_match_region;

    if let Err(e) = check_state("scan_match_region", region.state, region.region.is_some()) {
        issues.push(e);
    }
    if let Some(Region::Circle2D { dist_2d }) = region.region {
        if !dist_2d.is_finite() {
            issues.push(MapError::InvalidAnnotation {
                field: "scan_match_region",
                reason: format!("circle radius {dist_2d} is not finite"),
            });
        }
    }
    if let Some(cov) = &annotations.icp_variance {
        if !cov.is_valid() {
            issues.push(MapError::InvalidAnnotation {
                field: "icp_variance",
                reason: "covariance must be finite, symmetric, with a non-negative diagonal"
                    .to_string(),
            });
        }
    }
    issues
}

pub fn edge_annotation_issues(annotations: &EdgeAnnotations) -> Vec<MapError> {
    let mut issues = Vec::new();
    let stairs = &annotations.stairs;

    if let Err(e) = check_state("stairs", stairs.state, stairs.straight_staircase.is_some()) {
        issues.push(e);
    }
    if let Some(staircase) = &stairs.straight_staircase {
        if staircase.stair_count == 0 {
            issues.push(MapError::InvalidAnnotation {
                field: "stairs",
                reason: "staircase has no steps".to_string(),
            });
        }
        if !(staircase.rise.is_finite() && staircase.run.is_finite()) {
            issues.push(MapError::InvalidAnnotation {
                field: "stairs",
                reason: "rise and run must be finite".to_string(),
            });
        }
    }
    if let Some(cost) = annotations.cost {
        if !cost.is_finite() || cost < 0.0 {
            issues.push(MapError::InvalidAnnotation {
                field: "cost",
                reason: format!("cost {cost} must be finite and non-negative"),
            });
        }
    }
    if let Some(mu) = annotations.ground_mu_hint {
        if !mu.is_finite() || mu <= 0.0 {
            issues.push(MapError::InvalidAnnotation {
                field: "ground_mu_hint",
                reason: format!("friction hint {mu} must be positive"),
            });
        }
    }

    let mask = &annotations.override_mobility_params;
    if !mask.is_empty() {
        match &annotations.mobility_params {
            Some(_) => {
                if let Err(e) = validate_field_mask(&MobilityParams::fully_populated(), mask) {
                    issues.push(e);
                }
            }
            None => issues.push(MapError::InvalidFieldMask {
                path: mask.paths.join(","),
                reason: "mask set without mobility params to override from".to_string(),
            }),
        }
    }
    issues
}

/// Record poses must be finite to be composed along routes and anchors.
pub fn check_pose(field: &'static str, pose: &SE3Pose) -> MapResult<()> {
    if pose.is_finite() {
        Ok(())
    } else {
        Err(MapError::InvalidAnnotation {
            field,
            reason: "pose has non-finite components".to_string(),
        })
    }
}

pub fn validate_waypoint(waypoint: &Waypoint) -> MapResult<()> {
    if waypoint.id.is_empty() {
        return Err(MapError::EmptyId(RecordKind::Waypoint));
    }
    check_pose("waypoint_tform_ko", &waypoint.waypoint_tform_ko)?;
    validate_waypoint_annotations(&waypoint.annotations)
}

pub fn validate_waypoint_annotations(annotations: &WaypointAnnotations) -> MapResult<()> {
    first(waypoint_annotation_issues(annotations))
}

pub fn validate_edge(edge: &Edge) -> MapResult<()> {
    if edge.id.from_waypoint.is_empty() || edge.id.to_waypoint.is_empty() {
        return Err(MapError::EmptyId(RecordKind::Edge));
    }
    if edge.id.is_self_loop() {
        return Err(MapError::SelfLoop(edge.id.from_waypoint.clone()));
    }
    check_pose("from_tform_to", &edge.from_tform_to)?;
    validate_edge_annotations(&edge.annotations)
}

pub fn validate_edge_annotations(annotations: &EdgeAnnotations) -> MapResult<()> {
    first(edge_annotation_issues(annotations))
}

fn first(issues: Vec<MapError>) -> MapResult<()> {
    match issues.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
