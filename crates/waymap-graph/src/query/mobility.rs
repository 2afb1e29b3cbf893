//! Effective mobility parameters for traversing an edge.

use crate::error::{MapError, MapResult};
use crate::query::field_mask::apply_field_mask;
use waymap_model::{Edge, GratedSurfacesMode, MobilityParams};

/// Mobility parameters the robot should use on `edge`, starting from the
/// caller's `baseline`.
///
/// Paths selected by the edge's override mask come from its
/// `mobility_params`. The deprecated `vel_limit`, `ground_mu_hint` and
/// `grated_floor` annotations then fill their counterparts, but only where
/// the mask left them to the baseline.
pub fn effective_mobility_params(edge: &Edge, baseline: &MobilityParams) -> MapResult<MobilityParams> {
    let annotations = &edge.annotations;
    let mask = &annotations.override_mobility_params;

    let mut effective = match &annotations.mobility_params {
        Some(overrides) => apply_field_mask(baseline, overrides, mask)?,
        None if mask.is_empty() => *baseline,
        None => {
            return Err(MapError::InvalidFieldMask {
                path: mask.paths.join(","),
                reason: "mask set without mobility params to override from".to_string(),
            })
        }
    };
    let overridden = |path: &str| annotations.mobility_params.is_some() && mask.selects(path);

    if annotations.vel_limit.is_some() && !overridden("vel_limit") {
        effective.vel_limit = annotations.vel_limit;
    }
    if annotations.ground_mu_hint.is_some() && !overridden("terrain_params.ground_mu_hint") {
        effective.terrain_params.ground_mu_hint = annotations.ground_mu_hint;
    }
    if annotations.grated_floor && !overridden("terrain_params.grated_surfaces_mode") {
        effective.terrain_params.grated_surfaces_mode = GratedSurfacesMode::On;
    }

    tracing::debug!(edge = %edge.id, masked = mask.paths.len(), "resolved mobility params");
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymap_model::{FieldMask, SE2Velocity, SE2VelocityLimit, SwingHeight};

    fn limit(x: f64) -> SE2VelocityLimit {
        SE2VelocityLimit {
            max_vel: SE2Velocity {
                x,
                y: x,
                angular: 1.0,
            },
            min_vel: SE2Velocity::default(),
        }
    }

    fn baseline() -> MobilityParams {
        MobilityParams {
            swing_height: SwingHeight::Medium,
            body_height: 0.02,
            ..MobilityParams::default()
        }
    }

    #[test]
    fn masked_stair_hint_only() {
        let mut edge = Edge::new("a", "b");
        edge.annotations.override_mobility_params = FieldMask::new(["stair_hint"]);
        edge.annotations.mobility_params = Some(MobilityParams {
            stair_hint: true,
            body_height: 0.3,
            ..MobilityParams::default()
        });

        let effective = effective_mobility_params(&edge, &baseline()).unwrap();
        assert_eq!(
            effective,
            MobilityParams {
                stair_hint: true,
                ..baseline()
            }
        );
    }

    #[test]
    fn no_overrides_keeps_baseline() {
        let edge = Edge::new("a", "b");
        assert_eq!(effective_mobility_params(&edge, &baseline()).unwrap(), baseline());
    }

    #[test]
    fn deprecated_fields_fill_unmasked_counterparts() {
        let mut edge = Edge::new("a", "b");
        edge.annotations.vel_limit = Some(limit(0.5));
        edge.annotations.ground_mu_hint = Some(0.6);
        edge.annotations.grated_floor = true;

        let effective = effective_mobility_params(&edge, &baseline()).unwrap();
        assert_eq!(effective.vel_limit, Some(limit(0.5)));
        assert_eq!(effective.terrain_params.ground_mu_hint, Some(0.6));
        assert_eq!(
            effective.terrain_params.grated_surfaces_mode,
            GratedSurfacesMode::On
        );
        assert_eq!(effective.swing_height, SwingHeight::Medium);
    }

    #[test]
    fn masked_values_win_over_deprecated() {
        let mut edge = Edge::new("a", "b");
        edge.annotations.vel_limit = Some(limit(0.5));
        edge.annotations.ground_mu_hint = Some(0.6);
        edge.annotations.override_mobility_params = FieldMask::new(["vel_limit"]);
        edge.annotations.mobility_params = Some(MobilityParams {
            vel_limit: Some(limit(1.2)),
            ..MobilityParams::default()
        });

        let effective = effective_mobility_params(&edge, &baseline()).unwrap();
        assert_eq!(effective.vel_limit, Some(limit(1.2)));
        // Not masked, so the deprecated hint still applies.
        assert_eq!(effective.terrain_params.ground_mu_hint, Some(0.6));
    }

    #[test]
    fn mask_without_params_is_rejected() {
        let mut edge = Edge::new("a", "b");
        edge.annotations.override_mobility_params = FieldMask::new(["stair_hint"]);
        assert!(matches!(
            effective_mobility_params(&edge, &baseline()),
            Err(MapError::InvalidFieldMask { .. })
        ));
    }
}
