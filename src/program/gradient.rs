//! Blend-ratio math shared by `LinearBlend`/`LinearGradient`,
//! `RadialBlend`/`RadialGradient`, `BarycentricBlend`, and `Phong`/`Light`.

use crate::geometry::{Mat3, Vec2, Vec4};

/// `t = (p - from) . dir / |dir|^2`, the projection of `p` onto the
/// `from -> to` axis, unclamped (clamping happens at the `LinearBlend`
/// instruction itself, not here, so gradients can inspect the raw ratio).
pub fn linear_ratio(from: Vec2, to: Vec2, p: Vec2) -> f64 {
    let dir = to - from;
    let len_sq = dir.dot(&dir);
    if len_sq < 1e-12 {
        return 0.0;
    }
    (p - from).dot(&dir) / len_sq
}

/// `t = (|T^-1 . p| - r0) / (r1 - r0)`, the radial analogue: `transform`
/// maps the unit circle centered at the gradient's focus onto world space.
pub fn radial_ratio(transform: &Mat3, r0: f64, r1: f64, p: Vec2) -> f64 {
    let local = transform.try_inverse().map(|inv| crate::geometry::transform_point(&inv, p)).unwrap_or(p);
    let denom = r1 - r0;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (local.norm() - r0) / denom
}

/// Evaluates a piecewise-linear color ramp at (clamped) ratio `t`.
/// `stops` is assumed sorted by its `f64` key; out-of-range `t` clamps to
/// the nearest end stop.
pub fn evaluate_stops(stops: &[(f64, Vec4)], t: f64) -> Vec4 {
    if stops.is_empty() {
        return Vec4::zeros();
    }
    if t <= stops[0].0 {
        return stops[0].1;
    }
    if t >= stops[stops.len() - 1].0 {
        return stops[stops.len() - 1].1;
    }
    for w in stops.windows(2) {
        let (t0, c0) = w[0];
        let (t1, c1) = w[1];
        if t >= t0 && t <= t1 {
            let span = t1 - t0;
            let local_t = if span.abs() < 1e-12 { 0.0 } else { (t - t0) / span };
            return c0 * (1.0 - local_t) + c1 * local_t;
        }
    }
    stops[stops.len() - 1].1
}

/// 2D (affine) barycentric weights of `p` with respect to triangle `(p0,p1,p2)`.
pub fn barycentric_2d(p0: Vec2, p1: Vec2, p2: Vec2, p: Vec2) -> (f64, f64, f64) {
    let v0 = p1 - p0;
    let v1 = p2 - p0;
    let v2 = p - p0;
    let den = v0.x * v1.y - v1.x * v0.y;
    if den.abs() < 1e-12 {
        return (1.0, 0.0, 0.0);
    }
    let v = (v2.x * v1.y - v1.x * v2.y) / den;
    let w = (v0.x * v2.y - v2.x * v0.y) / den;
    let u = 1.0 - v - w;
    (u, v, w)
}

/// Perspective-correct barycentric weights given per-vertex reciprocal-`w`
/// values; the `"Accurate"` shading mode's interpolation, preserved as the
/// literal perspective-divide correction, not extended with any further
/// (unspecified) refinement.
pub fn barycentric_perspective(p0: Vec2, p1: Vec2, p2: Vec2, w0: f64, w1: f64, w2: f64, p: Vec2) -> (f64, f64, f64) {
    let (u, v, w) = barycentric_2d(p0, p1, p2, p);
    let iw0 = if w0.abs() > 1e-12 { 1.0 / w0 } else { 0.0 };
    let iw1 = if w1.abs() > 1e-12 { 1.0 / w1 } else { 0.0 };
    let iw2 = if w2.abs() > 1e-12 { 1.0 / w2 } else { 0.0 };
    let denom = u * iw0 + v * iw1 + w * iw2;
    if denom.abs() < 1e-12 {
        return (u, v, w);
    }
    (u * iw0 / denom, v * iw1 / denom, w * iw2 / denom)
}

/// Single-light Lambertian + Blinn-Phong specular term for the `Phong`/`Light`
/// node. `normal` and `view` are unit vectors in the same space as
/// `light_dir`; `base_color` is straight RGB. This is a minimal single-light
/// model, not a full shading pipeline — the host shader framework that would
/// drive multiple lights is out of scope here.
#[allow(clippy::too_many_arguments)]
pub fn phong_shade(
    normal: Vec4,
    light_dir: Vec4,
    view_dir: Vec4,
    base_color: Vec4,
    light_color: Vec4,
    ambient: f64,
    diffuse: f64,
    specular: f64,
    shininess: f64,
) -> Vec4 {
    let n = normalize3(normal);
    let l = normalize3(light_dir);
    let v = normalize3(view_dir);
    let n_dot_l = dot3(n, l).max(0.0);
    let half = normalize3(n.zip_map(&l, |a, b| a + b));
    let n_dot_h = dot3(n, half).max(0.0);
    let spec = if n_dot_l > 0.0 { n_dot_h.powf(shininess.max(1.0)) } else { 0.0 };

    let lit = ambient + diffuse * n_dot_l;
    Vec4::new(
        base_color.x * (lit * light_color.x) + specular * spec * light_color.x,
        base_color.y * (lit * light_color.y) + specular * spec * light_color.y,
        base_color.z * (lit * light_color.z) + specular * spec * light_color.z,
        base_color.w,
    )
}

fn normalize3(v: Vec4) -> Vec4 {
    let len = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
    if len < 1e-12 {
        v
    } else {
        Vec4::new(v.x / len, v.y / len, v.z / len, v.w)
    }
}

fn dot3(a: Vec4, b: Vec4) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ratio_is_zero_at_from_and_one_at_to() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(10.0, 0.0);
        assert!((linear_ratio(from, to, from) - 0.0).abs() < 1e-9);
        assert!((linear_ratio(from, to, to) - 1.0).abs() < 1e-9);
        assert!((linear_ratio(from, to, Vec2::new(5.0, 0.0)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn stops_clamp_outside_range() {
        let stops = vec![(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0)), (1.0, Vec4::new(0.0, 0.0, 1.0, 1.0))];
        assert_eq!(evaluate_stops(&stops, -5.0), stops[0].1);
        assert_eq!(evaluate_stops(&stops, 5.0), stops[1].1);
        let mid = evaluate_stops(&stops, 0.5);
        assert!((mid.x - 0.5).abs() < 1e-9 && (mid.z - 0.5).abs() < 1e-9);
    }

    #[test]
    fn barycentric_weights_sum_to_one_and_recover_vertices() {
        let (p0, p1, p2) = (Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        let (u, v, w) = barycentric_2d(p0, p1, p2, p0);
        assert!((u - 1.0).abs() < 1e-9 && v.abs() < 1e-9 && w.abs() < 1e-9);
        let (u, v, w) = barycentric_2d(p0, p1, p2, Vec2::new(1.0 / 3.0, 1.0 / 3.0));
        assert!((u + v + w - 1.0).abs() < 1e-9);
    }
}
