//! RenderProgram tree, evaluation context and reference evaluator. A
//! RenderProgram is a rooted tree of typed, immutable nodes; `simplify()`
//! rewrites it to a semantically equivalent, smaller tree.
//!
//! Two execution paths share these node semantics: the recursive
//! [`RenderProgram::evaluate`] below is the reference (non-GPU) path
//! applied directly per pixel; [`instruction`] compiles the same tree to
//! the flat stack-machine bytecode the two-pass fine pass replays.
//!
//! Nodes reference each other by `Box`, not by arena index — `simplify()`
//! builds a new tree bottom-up by value, so owned subtrees already give
//! it the freedom to replace them without an index arena's bookkeeping.

pub mod blend;
pub mod colorspace;
mod gradient;
pub mod instruction;
mod path;

pub use blend::{BlendMode, Compose};
pub use colorspace::ColorSpace;
pub use path::{FillRule, RenderPath};

use std::sync::Arc;

use crate::error::{RasterError, RasterResult};
use crate::face::{Bounds, ClippableFace};
use crate::filter::{BoxFilter, Bilinear, ExtendMode, Filter, ImageSampler, Mitchell};
use crate::geometry::{transform_point, Mat3, Vec2, Vec4};

/// Selects which [`Filter`] implementation an `Image` node samples with.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Box,
    Bilinear,
    Mitchell,
}

impl FilterKind {
    pub(crate) fn build(self, scale: f64) -> Box<dyn Filter> {
        match self {
            FilterKind::Box => Box::new(BoxFilter::new(scale)),
            FilterKind::Bilinear => Box::new(Bilinear::new(scale)),
            FilterKind::Mitchell => Box::new(Mitchell::new(scale)),
        }
    }
}

/// A row-major 4x4 matrix, used only by the `Filter` (color-matrix) node.
pub type ColorMatrix = [[f64; 4]; 4];

fn apply_color_matrix(m: &ColorMatrix, c: Vec4) -> Vec4 {
    let v = [c.x, c.y, c.z, c.w];
    let out: Vec<f64> = (0..4).map(|row| (0..4).map(|col| m[row][col] * v[col]).sum()).collect();
    Vec4::new(out[0], out[1], out[2], out[3])
}

/// Registry the evaluator consults for `Image` nodes, keyed by the small
/// integer id a node stores (trees stay plain data / serializable; the
/// sampler objects themselves live alongside the frame, not in the tree).
pub trait ImageResources: Send + Sync {
    fn get(&self, image_id: u32) -> Option<&Arc<dyn ImageSampler>>;
}

/// The evaluation context passed down through a RenderProgram evaluation:
/// the face being shaded, its area/centroid, and its bounds.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    face: Option<crate::face::EdgedClippedFace>,
    area: f64,
    centroid: Option<Vec2>,
    bounds: Bounds,
}

impl EvaluationContext {
    pub fn new(face: &dyn ClippableFace) -> Self {
        let bounds = face.bounds();
        let mut edges = Vec::new();
        face.for_each_edge(&mut |e| edges.push(*e));
        let edged = crate::face::EdgedClippedFace::new(edges, bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y, 0, 0, 0, 0);
        EvaluationContext {
            face: Some(edged),
            area: face.area(),
            centroid: Some(face.centroid()),
            bounds,
        }
    }

    /// A context with no face at all — "entire bounds".
    pub fn from_bounds(bounds: Bounds) -> Self {
        EvaluationContext {
            face: None,
            area: bounds.width() * bounds.height(),
            centroid: Some(bounds.center()),
            bounds,
        }
    }

    /// Lazily constructs a bounds rectangle when no face is set.
    pub fn get_face(&self) -> crate::face::EdgedClippedFace {
        self.face.clone().unwrap_or_else(|| crate::face::EdgedClippedFace::full_rect(self.bounds.min_x, self.bounds.min_y, self.bounds.max_x, self.bounds.max_y))
    }

    pub fn get_center_x(&self) -> f64 {
        self.centroid.map(|c| c.x).unwrap_or_else(|| self.bounds.center().x)
    }

    pub fn get_center_y(&self) -> f64 {
        self.centroid.map(|c| c.y).unwrap_or_else(|| self.bounds.center().y)
    }

    pub fn has_centroid(&self) -> bool {
        self.centroid.is_some()
    }

    pub fn write_bounds_centroid(&self, out: &mut Vec2) {
        *out = Vec2::new(self.get_center_x(), self.get_center_y());
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// A rooted tree of typed, immutable program nodes. Serializes as a
/// recursive, `type`-tagged JSON object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderProgram {
    /// The constant-folded empty program: fully transparent everywhere.
    Transparent,
    Color {
        color: Vec4,
    },
    Alpha {
        child: Box<RenderProgram>,
        alpha: f64,
    },
    /// A sequential Porter-Duff-Over paint stack, back-to-front; the
    /// simplifier's target for `BlendCompose(Over, Normal)` chains.
    Stack {
        children: Vec<RenderProgram>,
    },
    BlendCompose {
        compose: Compose,
        blend: BlendMode,
        a: Box<RenderProgram>,
        b: Box<RenderProgram>,
    },
    PathBoolean {
        path: RenderPath,
        inside: Box<RenderProgram>,
        outside: Box<RenderProgram>,
    },
    LinearBlend {
        from: Vec2,
        to: Vec2,
        zero: Box<RenderProgram>,
        one: Box<RenderProgram>,
    },
    LinearGradient {
        from: Vec2,
        to: Vec2,
        stops: Vec<(f64, Vec4)>,
    },
    RadialBlend {
        transform: Mat3,
        r0: f64,
        r1: f64,
        zero: Box<RenderProgram>,
        one: Box<RenderProgram>,
    },
    RadialGradient {
        transform: Mat3,
        r0: f64,
        r1: f64,
        stops: Vec<(f64, Vec4)>,
    },
    BarycentricBlend {
        p0: Vec2,
        p1: Vec2,
        p2: Vec2,
        /// `Some((w0, w1, w2))` selects the perspective-correct variant.
        perspective_weights: Option<(f64, f64, f64)>,
        c0: Box<RenderProgram>,
        c1: Box<RenderProgram>,
        c2: Box<RenderProgram>,
    },
    Image {
        transform: Mat3,
        image_id: u32,
        filter: FilterKind,
        filter_scale: f64,
        extend_x: ExtendMode,
        extend_y: ExtendMode,
    },
    ColorSpaceConvert {
        from: ColorSpace,
        to: ColorSpace,
        child: Box<RenderProgram>,
    },
    Premultiply {
        child: Box<RenderProgram>,
    },
    Unpremultiply {
        child: Box<RenderProgram>,
    },
    Filter {
        matrix: ColorMatrix,
        child: Box<RenderProgram>,
    },
    NormalDebug {
        child: Box<RenderProgram>,
    },
    Phong {
        light_dir: Vec4,
        view_dir: Vec4,
        light_color: Vec4,
        ambient: f64,
        diffuse: f64,
        specular: f64,
        shininess: f64,
        normal: Box<RenderProgram>,
        base: Box<RenderProgram>,
    },
}

impl RenderProgram {
    /// Whether evaluating this node needs [`EvaluationContext::centroid`].
    pub fn needs_centroid(&self) -> bool {
        matches!(
            self,
            RenderProgram::LinearBlend { .. }
                | RenderProgram::RadialBlend { .. }
                | RenderProgram::LinearGradient { .. }
                | RenderProgram::RadialGradient { .. }
                | RenderProgram::BarycentricBlend { .. }
                | RenderProgram::Image { .. }
                | RenderProgram::PathBoolean { .. }
        )
    }

    /// Whether every point covered by this node yields the same fully
    /// transparent color (a constant-folding hook for the simplifier).
    pub fn is_fully_transparent(&self) -> bool {
        match self {
            RenderProgram::Transparent => true,
            RenderProgram::Color { color } => color.w == 0.0,
            RenderProgram::Alpha { child, alpha } => *alpha == 0.0 || child.is_fully_transparent(),
            _ => false,
        }
    }

    /// Whether every point covered by this node yields a fully opaque color.
    pub fn is_fully_opaque(&self) -> bool {
        match self {
            RenderProgram::Color { color } => color.w >= 1.0,
            RenderProgram::Stack { children } => children.iter().any(|c| c.is_fully_opaque()),
            _ => false,
        }
    }

    /// Serializes this tree to the tagged JSON form its `serde` derive
    /// produces, for handing a program across a process boundary (a tool
    /// front-end, a saved test fixture) without a binary format.
    pub fn to_json(&self) -> RasterResult<String> {
        serde_json::to_string(self).map_err(|e| RasterError::Configuration(format!("program JSON encode failed: {e}")))
    }

    /// Parses a tree previously produced by [`RenderProgram::to_json`].
    pub fn from_json(json: &str) -> RasterResult<RenderProgram> {
        serde_json::from_str(json).map_err(|e| RasterError::Configuration(format!("program JSON decode failed: {e}")))
    }

    /// Evaluates this node against `ctx`, looking up images through `images`.
    /// This is the reference (non-GPU) path applied directly per pixel; the
    /// two-pass pipeline instead replays the compiled instruction stream.
    pub fn evaluate(&self, ctx: &EvaluationContext, point: Vec2, images: &dyn ImageResources) -> RasterResult<Vec4> {
        match self {
            RenderProgram::Transparent => Ok(Vec4::zeros()),
            RenderProgram::Color { color } => Ok(*color),
            RenderProgram::Alpha { child, alpha } => {
                let c = child.evaluate(ctx, point, images)?;
                Ok(c * *alpha)
            }
            RenderProgram::Stack { children } => {
                let mut acc = Vec4::zeros();
                for child in children {
                    let c = child.evaluate(ctx, point, images)?;
                    acc = blend::compose(Compose::Over, BlendMode::Normal, c, acc);
                }
                Ok(acc)
            }
            RenderProgram::BlendCompose { compose: op, blend: mode, a, b } => {
                let ca = a.evaluate(ctx, point, images)?;
                let cb = b.evaluate(ctx, point, images)?;
                Ok(blend::compose(*op, *mode, ca, cb))
            }
            RenderProgram::PathBoolean { path, inside, outside } => {
                if !ctx.has_centroid() {
                    return Err(RasterError::Configuration("PathBoolean requires a centroid in the evaluation context".into()));
                }
                let centroid = Vec2::new(ctx.get_center_x(), ctx.get_center_y());
                if path.contains_point(centroid) {
                    inside.evaluate(ctx, point, images)
                } else {
                    outside.evaluate(ctx, point, images)
                }
            }
            RenderProgram::LinearBlend { from, to, zero, one } => {
                let t = gradient::linear_ratio(*from, *to, point).clamp(0.0, 1.0);
                evaluate_blend(t, zero, one, ctx, point, images)
            }
            RenderProgram::LinearGradient { from, to, stops } => {
                let t = gradient::linear_ratio(*from, *to, point);
                Ok(gradient::evaluate_stops(stops, t))
            }
            RenderProgram::RadialBlend { transform, r0, r1, zero, one } => {
                let t = gradient::radial_ratio(transform, *r0, *r1, point).clamp(0.0, 1.0);
                evaluate_blend(t, zero, one, ctx, point, images)
            }
            RenderProgram::RadialGradient { transform, r0, r1, stops } => {
                let t = gradient::radial_ratio(transform, *r0, *r1, point);
                Ok(gradient::evaluate_stops(stops, t))
            }
            RenderProgram::BarycentricBlend { p0, p1, p2, perspective_weights, c0, c1, c2 } => {
                let (u, v, w) = match perspective_weights {
                    Some((w0, w1, w2)) => gradient::barycentric_perspective(*p0, *p1, *p2, *w0, *w1, *w2, point),
                    None => gradient::barycentric_2d(*p0, *p1, *p2, point),
                };
                let ca = c0.evaluate(ctx, point, images)?;
                let cb = c1.evaluate(ctx, point, images)?;
                let cc = c2.evaluate(ctx, point, images)?;
                Ok(ca * u + cb * v + cc * w)
            }
            RenderProgram::Image { transform, image_id, filter, filter_scale, extend_x, extend_y } => {
                let sampler = images
                    .get(*image_id)
                    .ok_or_else(|| RasterError::Configuration(format!("unknown image id {image_id}")))?;
                let local = transform
                    .try_inverse()
                    .map(|inv| transform_point(&inv, point))
                    .ok_or_else(|| RasterError::Configuration("Image transform is not invertible".into()))?;
                let clipped = ctx.get_face();
                let filter_obj = filter.build(*filter_scale);
                Ok(crate::filter::integrate(&clipped, filter_obj.as_ref(), local.x, local.y, sampler.as_ref(), *extend_x, *extend_y))
            }
            RenderProgram::ColorSpaceConvert { from, to, child } => {
                let c = child.evaluate(ctx, point, images)?;
                Ok(from.convert(*to, c))
            }
            RenderProgram::Premultiply { child } => Ok(colorspace::premultiply(child.evaluate(ctx, point, images)?)),
            RenderProgram::Unpremultiply { child } => Ok(colorspace::unpremultiply(child.evaluate(ctx, point, images)?)),
            RenderProgram::Filter { matrix, child } => Ok(apply_color_matrix(matrix, child.evaluate(ctx, point, images)?)),
            RenderProgram::NormalDebug { child } => {
                let c = child.evaluate(ctx, point, images)?;
                Ok(Vec4::new(c.x * 0.5 + 0.5, c.y * 0.5 + 0.5, c.z * 0.5 + 0.5, c.w))
            }
            RenderProgram::Phong {
                light_dir,
                view_dir,
                light_color,
                ambient,
                diffuse,
                specular,
                shininess,
                normal,
                base,
            } => {
                let n = normal.evaluate(ctx, point, images)?;
                let b = base.evaluate(ctx, point, images)?;
                Ok(gradient::phong_shade(n, *light_dir, *view_dir, b, *light_color, *ambient, *diffuse, *specular, *shininess))
            }
        }
    }

    /// Rewrites this tree to a semantically equivalent, simplified form:
    /// constant folding, path-booleans over trivially empty paths,
    /// and `BlendCompose(Over, Normal)` chains flattening into `Stack`.
    /// Runs bottom-up to a fixed point.
    pub fn simplify(self) -> RenderProgram {
        let once = self.simplify_once();
        if once.structurally_equal_shape(&self) {
            once
        } else {
            once.simplify()
        }
    }

    fn simplify_once(self) -> RenderProgram {
        match self {
            RenderProgram::Alpha { child, alpha } => {
                let child = child.simplify_once();
                if alpha == 1.0 {
                    child
                } else if alpha == 0.0 || child.is_fully_transparent() {
                    RenderProgram::Transparent
                } else {
                    RenderProgram::Alpha { child: Box::new(child), alpha }
                }
            }
            RenderProgram::Stack { children } => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    let child = child.simplify_once();
                    if child.is_fully_transparent() {
                        continue;
                    }
                    match child {
                        RenderProgram::Stack { children: inner } => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                if let Some(idx) = flat.iter().rposition(|c| c.is_fully_opaque()) {
                    flat.drain(..idx);
                }
                match flat.len() {
                    0 => RenderProgram::Transparent,
                    1 => flat.into_iter().next().unwrap(),
                    _ => RenderProgram::Stack { children: flat },
                }
            }
            RenderProgram::BlendCompose { compose: op, blend: mode, a, b } => {
                let a = Box::new(a.simplify_once());
                let b = Box::new(b.simplify_once());
                if op == Compose::Over && mode == BlendMode::Normal {
                    return RenderProgram::Stack { children: vec![*a, *b] }.simplify_once();
                }
                if a.is_fully_transparent() {
                    match op {
                        Compose::Over | Compose::Xor => return *b,
                        _ => return RenderProgram::Transparent,
                    }
                }
                if b.is_fully_transparent() && matches!(op, Compose::Over | Compose::In | Compose::Plus | Compose::PlusLighter) {
                    return *a;
                }
                RenderProgram::BlendCompose { compose: op, blend: mode, a, b }
            }
            RenderProgram::PathBoolean { path, inside, outside } => {
                if path.is_trivially_empty() {
                    return outside.simplify_once();
                }
                RenderProgram::PathBoolean {
                    path,
                    inside: Box::new(inside.simplify_once()),
                    outside: Box::new(outside.simplify_once()),
                }
            }
            RenderProgram::LinearBlend { from, to, zero, one } => RenderProgram::LinearBlend {
                from,
                to,
                zero: Box::new(zero.simplify_once()),
                one: Box::new(one.simplify_once()),
            },
            RenderProgram::RadialBlend { transform, r0, r1, zero, one } => RenderProgram::RadialBlend {
                transform,
                r0,
                r1,
                zero: Box::new(zero.simplify_once()),
                one: Box::new(one.simplify_once()),
            },
            RenderProgram::BarycentricBlend { p0, p1, p2, perspective_weights, c0, c1, c2 } => RenderProgram::BarycentricBlend {
                p0,
                p1,
                p2,
                perspective_weights,
                c0: Box::new(c0.simplify_once()),
                c1: Box::new(c1.simplify_once()),
                c2: Box::new(c2.simplify_once()),
            },
            RenderProgram::ColorSpaceConvert { from, to, child } => {
                if from == to {
                    return child.simplify_once();
                }
                RenderProgram::ColorSpaceConvert { from, to, child: Box::new(child.simplify_once()) }
            }
            RenderProgram::Premultiply { child } => RenderProgram::Premultiply { child: Box::new(child.simplify_once()) },
            RenderProgram::Unpremultiply { child } => RenderProgram::Unpremultiply { child: Box::new(child.simplify_once()) },
            RenderProgram::Filter { matrix, child } => RenderProgram::Filter { matrix, child: Box::new(child.simplify_once()) },
            RenderProgram::NormalDebug { child } => RenderProgram::NormalDebug { child: Box::new(child.simplify_once()) },
            RenderProgram::Phong { normal, base, light_dir, view_dir, light_color, ambient, diffuse, specular, shininess } => {
                RenderProgram::Phong {
                    normal: Box::new(normal.simplify_once()),
                    base: Box::new(base.simplify_once()),
                    light_dir,
                    view_dir,
                    light_color,
                    ambient,
                    diffuse,
                    specular,
                    shininess,
                }
            }
            other => other,
        }
    }

    /// A cheap, shallow "did the shape of this node change" check used to
    /// detect the simplification fixed point without a full tree diff.
    fn structurally_equal_shape(&self, other: &RenderProgram) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other) && self.child_count() == other.child_count()
    }

    fn child_count(&self) -> usize {
        match self {
            RenderProgram::Transparent | RenderProgram::Color { .. } | RenderProgram::LinearGradient { .. } | RenderProgram::RadialGradient { .. } | RenderProgram::Image { .. } => 0,
            RenderProgram::Alpha { .. } | RenderProgram::Premultiply { .. } | RenderProgram::Unpremultiply { .. } | RenderProgram::Filter { .. } | RenderProgram::NormalDebug { .. } | RenderProgram::ColorSpaceConvert { .. } => 1,
            RenderProgram::BlendCompose { .. } | RenderProgram::LinearBlend { .. } | RenderProgram::RadialBlend { .. } | RenderProgram::Phong { .. } => 2,
            RenderProgram::PathBoolean { .. } | RenderProgram::BarycentricBlend { .. } => 3,
            RenderProgram::Stack { children } => children.len(),
        }
    }
}

fn evaluate_blend(
    t: f64,
    zero: &RenderProgram,
    one: &RenderProgram,
    ctx: &EvaluationContext,
    point: Vec2,
    images: &dyn ImageResources,
) -> RasterResult<Vec4> {
    if t <= 0.0 {
        zero.evaluate(ctx, point, images)
    } else if t >= 1.0 {
        one.evaluate(ctx, point, images)
    } else {
        let c0 = zero.evaluate(ctx, point, images)?;
        let c1 = one.evaluate(ctx, point, images)?;
        Ok(c0 * (1.0 - t) + c1 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoImages;
    impl ImageResources for NoImages {
        fn get(&self, _id: u32) -> Option<&Arc<dyn ImageSampler>> {
            None
        }
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::from_bounds(Bounds { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 })
    }

    fn color(c: Vec4) -> RenderProgram {
        RenderProgram::Color { color: c }
    }

    #[test]
    fn json_round_trip_preserves_tree_shape() {
        let program = RenderProgram::Alpha { child: Box::new(color(Vec4::new(0.1, 0.2, 0.3, 1.0))), alpha: 0.5 };
        let json = program.to_json().unwrap();
        assert!(json.contains("\"type\":\"alpha\""), "json={json}");
        let decoded = RenderProgram::from_json(&json).unwrap();
        match decoded {
            RenderProgram::Alpha { child, alpha } => {
                assert_eq!(alpha, 0.5);
                assert!(matches!(*child, RenderProgram::Color { .. }));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn color_node_evaluates_to_its_constant() {
        let prog = color(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let out = prog.evaluate(&ctx(), Vec2::new(0.5, 0.5), &NoImages).unwrap();
        assert_eq!(out, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn linear_blend_interpolates_between_endpoints() {
        let prog = RenderProgram::LinearBlend {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(1.0, 0.0),
            zero: Box::new(color(Vec4::new(1.0, 0.0, 0.0, 1.0))),
            one: Box::new(color(Vec4::new(0.0, 0.0, 1.0, 1.0))),
        };
        let out = prog.evaluate(&ctx(), Vec2::new(0.5, 0.0), &NoImages).unwrap();
        assert!((out.x - 0.5).abs() < 1e-9 && (out.z - 0.5).abs() < 1e-9);
    }

    #[test]
    fn simplify_folds_alpha_one_away() {
        let prog = RenderProgram::Alpha { child: Box::new(color(Vec4::new(1.0, 1.0, 1.0, 1.0))), alpha: 1.0 };
        let simplified = prog.simplify();
        assert!(matches!(simplified, RenderProgram::Color { .. }));
    }

    #[test]
    fn simplify_path_boolean_with_empty_path_keeps_outside() {
        let outside = color(Vec4::new(0.0, 1.0, 0.0, 1.0));
        let prog = RenderProgram::PathBoolean {
            path: RenderPath::new(FillRule::NonZero, vec![]),
            inside: Box::new(color(Vec4::new(1.0, 0.0, 0.0, 1.0))),
            outside: Box::new(outside.clone()),
        };
        let simplified = prog.simplify();
        match simplified {
            RenderProgram::Color { color: c } => assert_eq!(c, Vec4::new(0.0, 1.0, 0.0, 1.0)),
            other => panic!("expected Color, got {other:?}"),
        }
    }

    #[test]
    fn simplify_collapses_blend_over_normal_into_stack() {
        let prog = RenderProgram::BlendCompose {
            compose: Compose::Over,
            blend: BlendMode::Normal,
            a: Box::new(color(Vec4::new(1.0, 0.0, 0.0, 0.5))),
            b: Box::new(color(Vec4::new(0.0, 0.0, 1.0, 1.0))),
        };
        let simplified = prog.simplify();
        assert!(!matches!(simplified, RenderProgram::BlendCompose { .. }));
    }

    #[test]
    fn path_boolean_selects_branch_by_centroid_winding() {
        let square = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let prog = RenderProgram::PathBoolean {
            path: RenderPath::new(FillRule::NonZero, vec![square]),
            inside: Box::new(color(Vec4::new(1.0, 0.0, 0.0, 1.0))),
            outside: Box::new(color(Vec4::new(0.0, 1.0, 0.0, 1.0))),
        };
        let inside_ctx = EvaluationContext::from_bounds(Bounds { min_x: 0.2, min_y: 0.2, max_x: 0.8, max_y: 0.8 });
        let out = prog.evaluate(&inside_ctx, Vec2::new(0.5, 0.5), &NoImages).unwrap();
        assert_eq!(out, Vec4::new(1.0, 0.0, 0.0, 1.0));

        let outside_ctx = EvaluationContext::from_bounds(Bounds { min_x: 2.0, min_y: 2.0, max_x: 3.0, max_y: 3.0 });
        let out = prog.evaluate(&outside_ctx, Vec2::new(2.5, 2.5), &NoImages).unwrap();
        assert_eq!(out, Vec4::new(0.0, 1.0, 0.0, 1.0));
    }
}
