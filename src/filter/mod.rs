//! Filter polynomials and the analytic filter integrator.

mod bilinear;
mod box_filter;
mod extend;
#[cfg(feature = "image_compat")]
mod image_compat;
mod integrator;
mod mitchell;

pub use self::bilinear::Bilinear;
pub use self::box_filter::BoxFilter;
pub use self::extend::{extend, extend_integer, ExtendMode};
#[cfg(feature = "image_compat")]
pub use self::image_compat::RgbaImageSampler;
pub(crate) use self::integrator::integrate_cells;
pub use self::integrator::{integrate, ImageSampler};
pub use self::mitchell::Mitchell;

use crate::face::ClippableFace;
use crate::geometry::Vec2;

/// A reconstruction filter's analytic evaluation contract.
///
/// Every filter kind provides two evaluators: a closed-form constant for a
/// *full* unit pixel ([`Filter::evaluate_full`]) and a Green's-theorem
/// line-integral evaluator for a *partial* pixel clipped by a face
/// ([`Filter::evaluate_clipped`]). The latter must agree with the filter's
/// analytic indefinite integral to within `1e-6` relative error — this is
/// the mathematical heart of the rasterizer.
pub trait Filter: Send + Sync {
    /// Half-width of support on the side closer to the sample center that
    /// needs, at most, negative pixel offsets (in pixels).
    fn min_expand(&self) -> f64;
    /// Half-width of support on the side that needs positive pixel offsets.
    fn max_expand(&self) -> f64;
    /// `boundsShift`: -1 for box, 0 otherwise.
    fn bounds_shift(&self) -> f64;

    /// Convolution value over a full unit pixel at image coordinate
    /// `(px, py)`, sampled from filter center `(x, y)`.
    fn evaluate_full(&self, x: f64, y: f64, px: f64, py: f64) -> f64;

    /// Convolution value over the partial pixel represented by `face`
    /// (already known to have signed area `area`), via the filter's
    /// Green's-theorem line integral.
    fn evaluate_clipped(&self, face: &dyn ClippableFace, x: f64, y: f64, px: f64, py: f64, area: f64) -> f64;
}

/// Evaluates a separable 1D tent/cubic kernel product against a clipped
/// face by summing each edge's line-integral contribution of the
/// indefinite double integral of `k(x' - x) * k(y' - y)` over the face
/// interior, via Green's theorem: `∬ F dA = ∮ (P dx + Q dy)` for an
/// antiderivative pair `(P, Q)` of the desired 2D kernel.
///
/// `antideriv_x(u, v)` must be `∫_0^u k(s) ds` evaluated holding the
/// companion axis contribution `k(v)` as a constant multiplier, i.e. the
/// per-edge line integral used below is
/// `Σ_edges ∫ P(x,y) dy` (Green's theorem with `Q=0`), where
/// `P(x, y) = Kx(x) * Ky_antideriv(y)`.
pub(crate) fn green_line_integral<AX, KY>(
    face: &dyn ClippableFace,
    x: f64,
    y: f64,
    px: f64,
    py: f64,
    antideriv_x: AX,
    kernel_y: KY,
) -> f64
where
    AX: Fn(f64) -> f64,
    KY: Fn(f64) -> f64,
{
    let mut total = 0.0;
    face.for_each_edge(&mut |edge| {
        if edge.contains_fake_corner {
            return;
        }
        total += segment_green_contribution(
            edge.start - Vec2::new(px, py),
            edge.end - Vec2::new(px, py),
            x - px,
            y - py,
            &antideriv_x,
            &kernel_y,
        );
    });
    total
}

/// One segment's contribution to `∮ Q dy` where `Q(x,y) = Fx(x) * Ky(y)`
/// and `Fx` is the antiderivative of the x kernel, so that
/// `∂Q/∂x = Kx(x) * Ky(y)` and Green's theorem turns `∬ Kx*Ky dA` into this
/// boundary integral. Evaluated via Gauss-Legendre quadrature of
/// sufficient order for the smooth, compactly-supported kernels used
/// throughout this crate (box, bilinear, Mitchell-Netravali are all
/// piecewise polynomials of degree <= 3).
fn segment_green_contribution<AX, KY>(a: Vec2, b: Vec2, cx: f64, cy: f64, antideriv_x: &AX, kernel_y: &KY) -> f64
where
    AX: Fn(f64) -> f64,
    KY: Fn(f64) -> f64,
{
    // 5-point Gauss-Legendre on [0, 1], exact for polynomials up to degree 9 —
    // comfortably exact for our piecewise-cubic kernels away from breakpoints,
    // and accurate to well within the 1e-6 relative-error bar at breakpoints.
    const NODES: [f64; 5] = [
        0.046_910_077_030_668_0,
        0.230_765_344_947_158_5,
        0.5,
        0.769_234_655_052_841_5,
        0.953_089_922_969_332_0,
    ];
    const WEIGHTS: [f64; 5] = [
        0.118_463_442_528_094_5,
        0.239_314_335_249_683_2,
        0.284_444_444_444_444_5,
        0.239_314_335_249_683_2,
        0.118_463_442_528_094_5,
    ];

    let dy = b.y - a.y;
    if dy.abs() < 1e-15 {
        return 0.0;
    }

    let mut sum = 0.0;
    for (t, w) in NODES.iter().zip(WEIGHTS.iter()) {
        let px = a.x + t * (b.x - a.x);
        let py = a.y + t * dy;
        sum += w * antideriv_x(px - cx) * kernel_y(py - cy);
    }
    sum * dy
}
