// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal column-major 4×4 transform.
//!
//! This type covers the subset of 3-D affine transforms that anchors and scene
//! nodes need (identity, multiply, translation access, rigidity check) without
//! pulling in a full linear-algebra crate.

use core::ops::Mul;

/// Why a transform is not a well-formed rigid pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum TransformDefect {
    /// At least one element is NaN or infinite.
    #[error("transform has a non-finite element")]
    NonFinite,
    /// The bottom row is not `[0, 0, 0, 1]`.
    #[error("transform is not affine (bottom row is not [0, 0, 0, 1])")]
    NotAffine,
    /// The rotation columns are not unit length or not mutually perpendicular.
    #[error("rotation part is not orthonormal")]
    NotOrthonormal,
    /// The rotation part is orthonormal but mirrors space.
    #[error("rotation part is a reflection")]
    Reflection,
}

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// used by GPU APIs and the `simd_float4x4` poses reported by tracking
/// frameworks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    ///
    /// Scales other than 1 are not rigid and fail [`check_rigid`](Self::check_rigid).
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y (up) axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Returns the translation (position) part as `[x, y, z]`.
    #[inline]
    #[must_use]
    pub const fn translation(&self) -> [f64; 3] {
        let t = self.cols[3];
        [t[0], t[1], t[2]]
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Checks that this is a well-formed rigid pose: finite, affine, with an
    /// orthonormal, non-reflecting rotation part.
    ///
    /// `tolerance` bounds the absolute error accepted on each unit-length,
    /// perpendicularity and bottom-row comparison. Poses from single-precision
    /// trackers drift by around `1e-6` per element, so values in the `1e-4` to
    /// `1e-2` range are typical.
    pub fn check_rigid(&self, tolerance: f64) -> Result<(), TransformDefect> {
        if !self.is_finite() {
            return Err(TransformDefect::NonFinite);
        }
        let c = &self.cols;
        let bottom_ok = (0..3).all(|i| c[i][3].abs() <= tolerance)
            && (c[3][3] - 1.0).abs() <= tolerance;
        if !bottom_ok {
            return Err(TransformDefect::NotAffine);
        }

        let axes = [axis(c[0]), axis(c[1]), axis(c[2])];
        for i in 0..3 {
            if (dot(axes[i], axes[i]) - 1.0).abs() > tolerance {
                return Err(TransformDefect::NotOrthonormal);
            }
            for j in (i + 1)..3 {
                if dot(axes[i], axes[j]).abs() > tolerance {
                    return Err(TransformDefect::NotOrthonormal);
                }
            }
        }

        if dot(axes[0], cross(axes[1], axes[2])) < 0.0 {
            return Err(TransformDefect::Reflection);
        }
        Ok(())
    }
}

fn axis(col: [f64; 4]) -> [f64; 3] {
    [col[0], col[1], col[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, out_col) in out.iter_mut().enumerate() {
            for (i, v) in out_col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}
