//! View and projection setup
//!
//! Built once per render: translate the look-at point to the origin, rotate
//! into the camera basis, then apply a single-coefficient perspective divide.

use super::math::{Mat4, Vec3};
use super::types::ScreenPoint;
use crate::config::CameraConfig;

/// Camera state. The view basis lives in the columns of `rotation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub translation: Mat4,
    pub rotation: Mat4,
    pub projection: Mat4,
}

impl Camera {
    /// Build the basis from a right and an up reference direction.
    ///
    /// forward = right x up; up is then recomputed as forward x right so the
    /// basis stays orthonormal even for slightly skewed inputs.
    pub fn new(right: Vec3, up: Vec3, center: Vec3, distance: f64) -> Self {
        let basis_x = right.normalize();
        let basis_z = basis_x.cross(up.normalize()).normalize();
        let basis_y = basis_z.cross(basis_x).normalize();

        Self {
            translation: Mat4::translation(-center),
            rotation: Mat4::from_basis_columns(basis_x, basis_y, basis_z),
            projection: Mat4::perspective(distance),
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.right, config.up, config.center, config.distance)
    }

    /// World position to screen pixel plus 8-bit depth.
    ///
    /// NDC [-1, 1] is mapped to [0, width] / [0, height] / [0, 255] and
    /// truncated toward zero.
    pub fn project(&self, v: Vec3, width: usize, height: usize) -> ScreenPoint {
        let p = v.to_point();
        let p = self.translation * p;
        let p = self.rotation * p;
        let ndc = (self.projection * p).dehomogenize();

        ScreenPoint {
            x: ((ndc.x + 1.0) * width as f64 / 2.0) as i32,
            y: ((ndc.y + 1.0) * height as f64 / 2.0) as i32,
            z: ((ndc.z + 1.0) * 255.0 / 2.0) as i32,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
