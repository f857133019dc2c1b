//! Homogeneous rigid-body transforms.
//!
//! A [`Transform`] is a 4×4 matrix whose upper-left 3×3 block is a rotation
//! and whose last column holds a translation in millimetres.  Transforms
//! compose by matrix multiplication: if `a` is the pose of frame B in frame A
//! and `b` is the pose of frame C in frame B, then `a * b` is the pose of C
//! in A.
//!
//! # Example
//!
//! ```rust
//! use kinos_kinematics::transform::Transform;
//! use kinos_types::Axis;
//! use nalgebra::Vector3;
//!
//! // Shoulder sits 98 mm left and 100 mm above the torso origin.
//! let shoulder = Transform::from_translation(Vector3::new(0.0, 98.0, 100.0));
//! // Elbow is 105 mm forward of the shoulder, rotated 90° about Z.
//! let elbow = Transform::from_axis_rotation(
//!     Axis::Z,
//!     std::f64::consts::FRAC_PI_2,
//!     Vector3::new(105.0, 0.0, 0.0),
//! );
//!
//! let t = shoulder * elbow;
//! assert!((t.translation().x - 105.0).abs() < 1e-9);
//! assert!((t.translation().y - 98.0).abs() < 1e-9);
//! ```

use std::ops::Mul;

use kinos_types::Axis;
use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Elementary rotations
// ────────────────────────────────────────────────────────────────────────────

/// Rotation matrix for `angle` radians about a body-frame axis.
pub fn elementary_rotation(axis: Axis, angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    match axis {
        #[rustfmt::skip]
        Axis::X => Matrix3::new(
            1.0, 0.0, 0.0,
            0.0,   c,  -s,
            0.0,   s,   c,
        ),
        #[rustfmt::skip]
        Axis::Y => Matrix3::new(
              c, 0.0,   s,
            0.0, 1.0, 0.0,
             -s, 0.0,   c,
        ),
        #[rustfmt::skip]
        Axis::Z => Matrix3::new(
              c,  -s, 0.0,
              s,   c, 0.0,
            0.0, 0.0, 1.0,
        ),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform
// ────────────────────────────────────────────────────────────────────────────

/// A 4×4 homogeneous transform (rotation + translation + `[0 0 0 1]` row).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform(Matrix4<f64>);

impl Transform {
    /// The identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// A pure translation.
    pub fn from_translation(offset: Vector3<f64>) -> Self {
        Self(Matrix4::new_translation(&offset))
    }

    /// Rotation by `angle` about `axis`, followed by placement at `offset`
    /// in the parent frame.
    ///
    /// This is the local transform of a revolute joint: the rotation block
    /// is [`elementary_rotation`] and the translation column is the joint's
    /// fixed offset from its parent.
    pub fn from_axis_rotation(axis: Axis, angle: f64, offset: Vector3<f64>) -> Self {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&elementary_rotation(axis, angle));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
        Self(m)
    }

    /// Wrap a raw homogeneous matrix.  The caller is responsible for the
    /// bottom row being `[0 0 0 1]` and the rotation block being orthonormal.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self(matrix)
    }

    /// The underlying 4×4 matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// The 3×3 rotation block.
    pub fn rotation(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column, in millimetres.
    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Compose two transforms: `self` applied first, then `other` expressed in
    /// `self`'s frame.  Equivalent to `self * other`.
    pub fn compose(&self, other: &Self) -> Self {
        Self(self.0 * other.0)
    }

    /// Row-major copy of the matrix, the form used on the wire.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.0[(r, c)];
            }
        }
        rows
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
