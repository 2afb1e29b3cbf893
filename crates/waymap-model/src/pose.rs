//! Rigid transforms, covariances and planar velocities.
//!
//! Naming follows the `a_tform_b` convention: a pose named `a_tform_b` maps
//! coordinates expressed in frame `b` into frame `a`. Composition chains
//! matching inner frames: `a_tform_c = a_tform_b.compose(&b_tform_c)`.

use nalgebra::{Isometry3, Matrix6, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Symmetry tolerance used by [`SE3Covariance::is_valid`].
const COVARIANCE_SYMMETRY_TOLERANCE: f64 = 1e-9;

/// 3D rigid transform (rotation + translation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SE3Pose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl SE3Pose {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    pub fn from_parts(position: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::from_parts(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Planar pose: translation in x/y plus a yaw about +z.
    pub fn from_xy_yaw(x: f64, y: f64, yaw: f64) -> Self {
        Self::from_parts(
            Vector3::new(x, y, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        )
    }

    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self {
            position: iso.translation.vector,
            rotation: iso.rotation,
        }
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.rotation)
    }

    pub fn inverse(&self) -> Self {
        Self::from_isometry(&self.to_isometry().inverse())
    }

    pub fn compose(&self, other: &SE3Pose) -> Self {
        Self::from_isometry(&(self.to_isometry() * other.to_isometry()))
    }

    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.position
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
    }

    /// Translation distance and rotation angle both within `tolerance`.
    pub fn approx_eq(&self, other: &SE3Pose, tolerance: f64) -> bool {
        (self.position - other.position).norm() <= tolerance
            && self.rotation.angle_to(&other.rotation) <= tolerance
    }
}

impl Default for SE3Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for SE3Pose {
    type Output = SE3Pose;

    fn mul(self, rhs: SE3Pose) -> SE3Pose {
        self.compose(&rhs)
    }
}

/// 6x6 covariance over (x, y, z, rx, ry, rz), plus a separate yaw variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SE3Covariance {
    pub matrix: Matrix6<f64>,
    pub yaw_variance: f64,
}

impl SE3Covariance {
    pub fn zeros() -> Self {
        Self {
            matrix: Matrix6::zeros(),
            yaw_variance: 0.0,
        }
    }

    pub fn from_diagonal(diagonal: [f64; 6]) -> Self {
        let mut matrix = Matrix6::zeros();
        for (i, v) in diagonal.iter().enumerate() {
            matrix[(i, i)] = *v;
        }
        Self {
            matrix,
            yaw_variance: diagonal[5],
        }
    }

    /// Finite, symmetric, with a non-negative diagonal.
    pub fn is_valid(&self) -> bool {
        if !self.matrix.iter().all(|v| v.is_finite()) || !self.yaw_variance.is_finite() {
            return false;
        }
        if self.yaw_variance < 0.0 {
            return false;
        }
        for i in 0..6 {
            if self.matrix[(i, i)] < 0.0 {
                return false;
            }
            for j in (i + 1)..6 {
                if (self.matrix[(i, j)] - self.matrix[(j, i)]).abs() > COVARIANCE_SYMMETRY_TOLERANCE {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for SE3Covariance {
    fn default() -> Self {
        Self::zeros()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SE2Velocity {
    pub x: f64,
    pub y: f64,
    pub angular: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SE2VelocityLimit {
    pub max_vel: SE2Velocity,
    pub min_vel: SE2Velocity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn compose_with_inverse_is_identity() {
        let pose = SE3Pose::from_parts(
            Vector3::new(1.0, -2.0, 0.5),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let id = pose.compose(&pose.inverse());
        assert!(id.approx_eq(&SE3Pose::identity(), 1e-9));
    }

    #[test]
    fn compose_applies_rotation_before_translation() {
        // a_tform_b: b is 1m ahead of a and rotated 90 degrees left.
        let a_tform_b = SE3Pose::from_xy_yaw(1.0, 0.0, FRAC_PI_2);
        // b_tform_c: c is 1m ahead of b (in b's frame).
        let b_tform_c = SE3Pose::from_translation(1.0, 0.0, 0.0);
        let a_tform_c = a_tform_b * b_tform_c;
        assert_relative_eq!(a_tform_c.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(a_tform_c.position.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn transform_point_matches_isometry() {
        let pose = SE3Pose::from_xy_yaw(2.0, 3.0, 0.7);
        let p = Vector3::new(0.3, -1.0, 2.0);
        let expected = pose.to_isometry() * nalgebra::Point3::from(p);
        let got = pose.transform_point(&p);
        assert_relative_eq!(got, expected.coords, epsilon = 1e-12);
    }

    #[test]
    fn covariance_validity() {
        assert!(SE3Covariance::from_diagonal([0.1; 6]).is_valid());

        let mut asym = SE3Covariance::zeros();
        asym.matrix[(0, 1)] = 0.5;
        assert!(!asym.is_valid());

        let negative = SE3Covariance::from_diagonal([0.1, -0.1, 0.1, 0.1, 0.1, 0.1]);
        assert!(!negative.is_valid());

        let mut nan = SE3Covariance::zeros();
        nan.matrix[(2, 2)] = f64::NAN;
        assert!(!nan.is_valid());
    }

    #[test]
    fn pose_survives_json() {
        let pose = SE3Pose::from_xy_yaw(1.5, -0.25, 1.0);
        let text = serde_json::to_string(&pose).unwrap();
        let back: SE3Pose = serde_json::from_str(&text).unwrap();
        assert!(back.approx_eq(&pose, 1e-12));
    }
}
