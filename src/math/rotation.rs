// Copyright @yucwang 2026

use super::constants::{Float, Matrix3f, Vector3f};

/// Rotation about the x axis, then y, then z, composed as `Rx * Ry * Rz`.
pub fn rotation_xyz(angles: &Vector3f) -> Matrix3f {
    rotation_x(angles.x) * rotation_y(angles.y) * rotation_z(angles.z)
}

pub fn rotation_x(theta: Float) -> Matrix3f {
    let (s, c) = theta.sin_cos();
    Matrix3f::new(1.0, 0.0, 0.0,
                  0.0, c, -s,
                  0.0, s, c)
}

pub fn rotation_y(theta: Float) -> Matrix3f {
    let (s, c) = theta.sin_cos();
    Matrix3f::new(c, 0.0, s,
                  0.0, 1.0, 0.0,
                  -s, 0.0, c)
}

pub fn rotation_z(theta: Float) -> Matrix3f {
    let (s, c) = theta.sin_cos();
    Matrix3f::new(c, -s, 0.0,
                  s, c, 0.0,
                  0.0, 0.0, 1.0)
}

/* Test for rotations */
