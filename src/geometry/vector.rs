//! Point, color and affine-matrix types shared by the whole rasterization core.
//!
//! The CPU reference path works in double precision; the GPU dispatch path
//! packs the same quantities as 32-bit floats before upload. Both share
//! these aliases so conversions at the dispatch boundary are the only place
//! precision is narrowed.

use nalgebra::{Matrix3, Vector2, Vector4};

/// A 2D point or direction, double precision on the CPU reference path.
pub type Vec2 = Vector2<f64>;

/// An RGBA color or homogeneous 2D point, double precision.
pub type Vec4 = Vector4<f64>;

/// A 3x3 affine matrix acting on [`Vec2`] in homogeneous coordinates.
pub type Mat3 = Matrix3<f64>;

/// Single-precision mirrors of the above, used only at the GPU dispatch
/// boundary (buffers uploaded to a workgroup dispatch).
pub type Vec2f = Vector2<f32>;
pub type Vec4f = Vector4<f32>;
pub type Mat3f = Matrix3<f32>;

/// Applies `m` to the 2D point `p`, treating it as `(x, y, 1)`.
#[inline]
pub fn transform_point(m: &Mat3, p: Vec2) -> Vec2 {
    let v = m * Vec4::new(p.x, p.y, 1.0, 1.0).xyz();
    Vec2::new(v.x / v.z, v.y / v.z)
}

/// Applies the linear part of `m` to the direction `d` (no translation).
#[inline]
pub fn transform_direction(m: &Mat3, d: Vec2) -> Vec2 {
    let v = m.fixed_view::<2, 2>(0, 0) * d;
    Vec2::new(v.x, v.y)
}

/// `signedScale`: determinant sign times a uniform-scale approximation,
/// i.e. `sign(det) * sqrt(|det|)`. Used to decide e.g. whether a transform
/// flips winding and by roughly how much it scales lengths.
#[inline]
pub fn signed_scale(m: &Mat3) -> f64 {
    let det = m.fixed_view::<2, 2>(0, 0).determinant();
    det.signum() * det.abs().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        let m = Mat3::identity();
        let p = Vec2::new(3.0, -2.0);
        assert_eq!(transform_point(&m, p), p);
        assert_eq!(signed_scale(&m), 1.0);
    }

    #[test]
    fn reflection_has_negative_signed_scale() {
        let m = Mat3::new(
            -1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
        );
        assert!(signed_scale(&m) < 0.0);
    }

    #[test]
    fn uniform_scale_matches_factor() {
        let m = Mat3::new(
            2.0, 0.0, 0.0,
            0.0, 2.0, 0.0,
            0.0, 0.0, 1.0,
        );
        assert!((signed_scale(&m) - 2.0).abs() < 1e-9);
    }
}
