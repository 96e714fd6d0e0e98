//! The flat, little-endian bytecode a [`super::RenderProgram`] compiles to.
//!
//! The reference evaluator in [`super`] walks the `RenderProgram` tree with
//! ordinary Rust recursion; this module compiles the same tree to a
//! sequential `Vec<u32>` the two-pass fine pass can replay on a fixed stack
//! of `Vec4` slots without Rust-level recursion, matching a GPU dispatch
//! contract where the executor can't recurse — subprograms are called via
//! explicit call/return pointers instead.
//!
//! Each instruction's first word carries its [`Opcode`] in the low 8 bits;
//! immediate operands (colors, transforms, jump targets) fill the words
//! that follow. [`Opcode::length_words`] gives the total word count of an
//! instruction with a given opcode: decoding walks the stream by that
//! length rather than needing a length prefix.
//!
//! Variable-length data (path loops) does not fit fixed-width words, so
//! [`RenderPath`]s referenced by `PathBoolean` live in a side table
//! (`CompiledProgram::paths`) indexed by a `u32`, the same way a constant
//! pool sits alongside real bytecode.

use arrayvec::ArrayVec;

use crate::error::{RasterError, RasterResult};
use crate::geometry::{transform_point, Mat3, Vec2, Vec4};

use super::blend::{self, BlendMode, Compose};
use super::colorspace::{self, ColorSpace};
use super::gradient;
use super::path::RenderPath;
use super::{apply_color_matrix, ColorMatrix, EvaluationContext, FilterKind, ImageResources};
use super::RenderProgram;

/// Maximum operand-stack depth a single evaluation may use (stack depth
/// is bounded statically by program depth); comfortably above any
/// `RenderProgram` tree this crate expects to compile.
const STACK_CAPACITY: usize = 64;
/// Maximum nested `Call` depth, i.e. maximum tree depth.
const CALL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    PushColor = 0,
    Return = 1,
    Call = 2,
    Jump = 3,
    JumpIfRatioLe = 4,
    JumpIfRatioGe = 5,
    ComputeLinearRatio = 6,
    ComputeRadialRatio = 7,
    LinearBlend = 8,
    BlendCompose = 9,
    BarycentricBlend = 10,
    Image = 11,
    PathBoolean = 12,
    Alpha = 13,
    Premultiply = 14,
    Unpremultiply = 15,
    ColorSpaceConvert = 16,
    FilterMatrix = 17,
    NormalDebug = 18,
    PhongLight = 19,
    LinearGradient = 20,
    RadialGradient = 21,
}

impl Opcode {
    fn from_u8(b: u8) -> RasterResult<Opcode> {
        Ok(match b {
            0 => Opcode::PushColor,
            1 => Opcode::Return,
            2 => Opcode::Call,
            3 => Opcode::Jump,
            4 => Opcode::JumpIfRatioLe,
            5 => Opcode::JumpIfRatioGe,
            6 => Opcode::ComputeLinearRatio,
            7 => Opcode::ComputeRadialRatio,
            8 => Opcode::LinearBlend,
            9 => Opcode::BlendCompose,
            10 => Opcode::BarycentricBlend,
            11 => Opcode::Image,
            12 => Opcode::PathBoolean,
            13 => Opcode::Alpha,
            14 => Opcode::Premultiply,
            15 => Opcode::Unpremultiply,
            16 => Opcode::ColorSpaceConvert,
            17 => Opcode::FilterMatrix,
            18 => Opcode::NormalDebug,
            19 => Opcode::PhongLight,
            20 => Opcode::LinearGradient,
            21 => Opcode::RadialGradient,
            other => return Err(RasterError::Configuration(format!("unknown opcode {other}"))),
        })
    }

    /// Total word count of an instruction with this opcode, including the
    /// opcode word itself.
    pub fn length_words(self) -> usize {
        match self {
            Opcode::PushColor => 5,          // op + 4 f32
            Opcode::Return => 1,
            Opcode::Call => 2,               // op + target
            Opcode::Jump => 2,               // op + target
            Opcode::JumpIfRatioLe | Opcode::JumpIfRatioGe => 3, // op + threshold + target
            Opcode::ComputeLinearRatio => 5, // op + from(2) + to(2)
            Opcode::ComputeRadialRatio => 12, // op + mat3(9) + r0 + r1
            Opcode::LinearBlend => 1,
            Opcode::BlendCompose => 2,       // op + (compose<<8 | blend)
            Opcode::BarycentricBlend => 11,  // op + p0,p1,p2(6) + flag + w0,w1,w2(3) (unused slots zeroed)
            Opcode::Image => 13,             // op + mat3(9) + image_id + filter/extend flags + filter_scale
            Opcode::PathBoolean => 5,        // op + path_index + inside_target + outside_target + after_target
            Opcode::Alpha => 2,              // op + alpha
            Opcode::Premultiply | Opcode::Unpremultiply | Opcode::NormalDebug => 1,
            Opcode::ColorSpaceConvert => 2,  // op + (from<<8 | to)
            Opcode::FilterMatrix => 17,      // op + 16 f32
            Opcode::PhongLight => 17,        // op + light_dir(4)+view_dir(4)+light_color(4)+ambient+diffuse+specular+shininess
            Opcode::LinearGradient => 6,     // op + from(2) + to(2) + stops_index
            Opcode::RadialGradient => 13,    // op + mat3(9) + r0 + r1 + stops_index
        }
    }
}

fn push_f32(out: &mut Vec<u32>, v: f64) {
    out.push((v as f32).to_bits());
}

fn read_f32(words: &[u32], at: usize) -> f64 {
    f32::from_bits(words[at]) as f64
}

fn push_vec2(out: &mut Vec<u32>, v: Vec2) {
    push_f32(out, v.x);
    push_f32(out, v.y);
}

fn read_vec2(words: &[u32], at: usize) -> Vec2 {
    Vec2::new(read_f32(words, at), read_f32(words, at + 1))
}

fn push_mat3(out: &mut Vec<u32>, m: &Mat3) {
    for row in 0..3 {
        for col in 0..3 {
            push_f32(out, m[(row, col)]);
        }
    }
}

fn read_mat3(words: &[u32], at: usize) -> Mat3 {
    let mut m = Mat3::zeros();
    for row in 0..3 {
        for col in 0..3 {
            m[(row, col)] = read_f32(words, at + row * 3 + col);
        }
    }
    m
}

fn color_space_to_u8(c: ColorSpace) -> u8 {
    match c {
        ColorSpace::Xyz => 0,
        ColorSpace::XyY => 1,
        ColorSpace::Srgb => 2,
        ColorSpace::LinearSrgb => 3,
        ColorSpace::DisplayP3 => 4,
        ColorSpace::LinearDisplayP3 => 5,
        ColorSpace::Oklab => 6,
    }
}

fn color_space_from_u8(b: u8) -> RasterResult<ColorSpace> {
    Ok(match b {
        0 => ColorSpace::Xyz,
        1 => ColorSpace::XyY,
        2 => ColorSpace::Srgb,
        3 => ColorSpace::LinearSrgb,
        4 => ColorSpace::DisplayP3,
        5 => ColorSpace::LinearDisplayP3,
        6 => ColorSpace::Oklab,
        other => return Err(RasterError::Configuration(format!("unknown color space tag {other}"))),
    })
}

fn compose_to_u8(c: Compose) -> u8 {
    match c {
        Compose::Over => 0,
        Compose::In => 1,
        Compose::Out => 2,
        Compose::Atop => 3,
        Compose::Xor => 4,
        Compose::Plus => 5,
        Compose::PlusLighter => 6,
    }
}

fn compose_from_u8(b: u8) -> RasterResult<Compose> {
    Ok(match b {
        0 => Compose::Over,
        1 => Compose::In,
        2 => Compose::Out,
        3 => Compose::Atop,
        4 => Compose::Xor,
        5 => Compose::Plus,
        6 => Compose::PlusLighter,
        other => return Err(RasterError::Configuration(format!("unknown compose tag {other}"))),
    })
}

fn blend_mode_to_u8(b: BlendMode) -> u8 {
    match b {
        BlendMode::Normal => 0,
        BlendMode::Multiply => 1,
        BlendMode::Screen => 2,
        BlendMode::Overlay => 3,
        BlendMode::Darken => 4,
        BlendMode::Lighten => 5,
        BlendMode::ColorDodge => 6,
        BlendMode::ColorBurn => 7,
        BlendMode::HardLight => 8,
        BlendMode::SoftLight => 9,
        BlendMode::Difference => 10,
        BlendMode::Exclusion => 11,
        BlendMode::Hue => 12,
        BlendMode::Saturation => 13,
        BlendMode::Color => 14,
        BlendMode::Luminosity => 15,
    }
}

fn blend_mode_from_u8(b: u8) -> RasterResult<BlendMode> {
    Ok(match b {
        0 => BlendMode::Normal,
        1 => BlendMode::Multiply,
        2 => BlendMode::Screen,
        3 => BlendMode::Overlay,
        4 => BlendMode::Darken,
        5 => BlendMode::Lighten,
        6 => BlendMode::ColorDodge,
        7 => BlendMode::ColorBurn,
        8 => BlendMode::HardLight,
        9 => BlendMode::SoftLight,
        10 => BlendMode::Difference,
        11 => BlendMode::Exclusion,
        12 => BlendMode::Hue,
        13 => BlendMode::Saturation,
        14 => BlendMode::Color,
        15 => BlendMode::Luminosity,
        other => return Err(RasterError::Configuration(format!("unknown blend mode tag {other}"))),
    })
}

fn filter_kind_to_u8(f: FilterKind) -> u8 {
    match f {
        FilterKind::Box => 0,
        FilterKind::Bilinear => 1,
        FilterKind::Mitchell => 2,
    }
}

fn filter_kind_from_u8(b: u8) -> RasterResult<FilterKind> {
    Ok(match b {
        0 => FilterKind::Box,
        1 => FilterKind::Bilinear,
        2 => FilterKind::Mitchell,
        other => return Err(RasterError::Configuration(format!("unknown filter kind tag {other}"))),
    })
}

fn extend_mode_to_u8(e: crate::filter::ExtendMode) -> u8 {
    match e {
        crate::filter::ExtendMode::Pad => 0,
        crate::filter::ExtendMode::Repeat => 1,
        crate::filter::ExtendMode::Reflect => 2,
    }
}

fn extend_mode_from_u8(b: u8) -> RasterResult<crate::filter::ExtendMode> {
    Ok(match b {
        0 => crate::filter::ExtendMode::Pad,
        1 => crate::filter::ExtendMode::Repeat,
        2 => crate::filter::ExtendMode::Reflect,
        other => return Err(RasterError::Configuration(format!("unknown extend mode tag {other}"))),
    })
}

/// A compiled `RenderProgram`: the flat instruction stream plus the side
/// tables of variable-length data (`RenderPath` loops, gradient stop
/// tables) that don't fit fixed-width words — the same role a constant
/// pool plays alongside real bytecode.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub code: Vec<u32>,
    pub paths: Vec<RenderPath>,
    pub stops: Vec<Vec<(f64, Vec4)>>,
}

impl CompiledProgram {
    /// Compiles `program` to bytecode. Mirrors
    /// [`RenderProgram::evaluate`]'s recursive structure exactly; the two
    /// must stay in lockstep since both are valid evaluators of the same
    /// tree and tests check them against each other.
    pub fn compile(program: &RenderProgram) -> CompiledProgram {
        let mut out = CompiledProgram::default();
        let mut code = std::mem::take(&mut out.code);
        compile_node(program, &mut code, &mut out.paths, &mut out.stops);
        code.push(Opcode::Return as u32);
        out.code = code;
        out
    }

    /// Replays this bytecode against `ctx`, returning the same result
    /// [`RenderProgram::evaluate`] would for the tree it was compiled from.
    pub fn execute(&self, ctx: &EvaluationContext, point: Vec2, images: &dyn ImageResources) -> RasterResult<Vec4> {
        let mut vm = Vm {
            code: &self.code,
            paths: &self.paths,
            stops: &self.stops,
            stack: ArrayVec::new(),
            call_stack: ArrayVec::new(),
            ratio: 0.0,
            pc_next: 0,
            ctx,
            point,
            images,
        };
        vm.run()
    }
}

fn compile_node(program: &RenderProgram, out: &mut Vec<u32>, paths: &mut Vec<RenderPath>, stops: &mut Vec<Vec<(f64, Vec4)>>) {
    match program {
        RenderProgram::Transparent => {
            out.push(Opcode::PushColor as u32);
            push_f32(out, 0.0);
            push_f32(out, 0.0);
            push_f32(out, 0.0);
            push_f32(out, 0.0);
        }
        RenderProgram::Color { color } => {
            out.push(Opcode::PushColor as u32);
            push_f32(out, color.x);
            push_f32(out, color.y);
            push_f32(out, color.z);
            push_f32(out, color.w);
        }
        RenderProgram::Alpha { child, alpha } => {
            compile_node(child, out, paths, stops);
            out.push(Opcode::Alpha as u32);
            push_f32(out, *alpha);
        }
        RenderProgram::Stack { children } => {
            if children.is_empty() {
                compile_node(&RenderProgram::Transparent, out, paths, stops);
                return;
            }
            compile_node(&children[0], out, paths, stops);
            for child in &children[1..] {
                compile_node(child, out, paths, stops);
                out.push(Opcode::BlendCompose as u32);
                out.push(((compose_to_u8(Compose::Over) as u32) << 8) | blend_mode_to_u8(BlendMode::Normal) as u32);
            }
        }
        RenderProgram::BlendCompose { compose, blend, a, b } => {
            compile_node(a, out, paths, stops);
            compile_node(b, out, paths, stops);
            out.push(Opcode::BlendCompose as u32);
            out.push(((compose_to_u8(*compose) as u32) << 8) | blend_mode_to_u8(*blend) as u32);
        }
        RenderProgram::PathBoolean { path, inside, outside } => {
            let path_index = paths.len() as u32;
            paths.push(path.clone());

            // `after_target` is carried as an explicit operand, not inferred
            // from the program counter at call time: the PC right after this
            // header is `inside_target` itself (the inside block is laid
            // down immediately following it), so using it as the return
            // address would jump the `Return` straight back into the inside
            // block instead of past the whole construct.
            let header_pos = out.len();
            out.push(Opcode::PathBoolean as u32);
            out.push(path_index);
            out.push(0); // inside_target, patched below
            out.push(0); // outside_target, patched below
            out.push(0); // after_target, patched below

            let inside_target = out.len() as u32;
            compile_node(inside, out, paths, stops);
            out.push(Opcode::Return as u32);

            let outside_target = out.len() as u32;
            compile_node(outside, out, paths, stops);
            out.push(Opcode::Return as u32);

            let after_target = out.len() as u32;
            out[header_pos + 2] = inside_target;
            out[header_pos + 3] = outside_target;
            out[header_pos + 4] = after_target;
        }
        RenderProgram::LinearBlend { from, to, zero, one } => {
            out.push(Opcode::ComputeLinearRatio as u32);
            push_vec2(out, *from);
            push_vec2(out, *to);
            compile_blend_branches(zero, one, out, paths, stops);
        }
        RenderProgram::LinearGradient { from, to, stops: prog_stops } => {
            let stops_index = stops.len() as u32;
            stops.push(prog_stops.clone());
            out.push(Opcode::LinearGradient as u32);
            push_vec2(out, *from);
            push_vec2(out, *to);
            out.push(stops_index);
        }
        RenderProgram::RadialBlend { transform, r0, r1, zero, one } => {
            out.push(Opcode::ComputeRadialRatio as u32);
            push_mat3(out, transform);
            push_f32(out, *r0);
            push_f32(out, *r1);
            compile_blend_branches(zero, one, out, paths, stops);
        }
        RenderProgram::RadialGradient { transform, r0, r1, stops: prog_stops } => {
            let stops_index = stops.len() as u32;
            stops.push(prog_stops.clone());
            out.push(Opcode::RadialGradient as u32);
            push_mat3(out, transform);
            push_f32(out, *r0);
            push_f32(out, *r1);
            out.push(stops_index);
        }
        RenderProgram::BarycentricBlend { p0, p1, p2, perspective_weights, c0, c1, c2 } => {
            compile_node(c0, out, paths, stops);
            compile_node(c1, out, paths, stops);
            compile_node(c2, out, paths, stops);
            out.push(Opcode::BarycentricBlend as u32);
            push_vec2(out, *p0);
            push_vec2(out, *p1);
            push_vec2(out, *p2);
            match perspective_weights {
                Some((w0, w1, w2)) => {
                    out.push(1);
                    push_f32(out, *w0);
                    push_f32(out, *w1);
                    push_f32(out, *w2);
                }
                None => {
                    out.push(0);
                    push_f32(out, 0.0);
                    push_f32(out, 0.0);
                    push_f32(out, 0.0);
                }
            }
        }
        RenderProgram::Image { transform, image_id, filter, filter_scale, extend_x, extend_y } => {
            out.push(Opcode::Image as u32);
            push_mat3(out, transform);
            out.push(*image_id);
            out.push(((filter_kind_to_u8(*filter) as u32) << 16) | ((extend_mode_to_u8(*extend_x) as u32) << 8) | extend_mode_to_u8(*extend_y) as u32);
            push_f32(out, *filter_scale);
        }
        RenderProgram::ColorSpaceConvert { from, to, child } => {
            compile_node(child, out, paths, stops);
            out.push(Opcode::ColorSpaceConvert as u32);
            out.push(((color_space_to_u8(*from) as u32) << 8) | color_space_to_u8(*to) as u32);
        }
        RenderProgram::Premultiply { child } => {
            compile_node(child, out, paths, stops);
            out.push(Opcode::Premultiply as u32);
        }
        RenderProgram::Unpremultiply { child } => {
            compile_node(child, out, paths, stops);
            out.push(Opcode::Unpremultiply as u32);
        }
        RenderProgram::Filter { matrix, child } => {
            compile_node(child, out, paths, stops);
            out.push(Opcode::FilterMatrix as u32);
            for row in matrix {
                for v in row {
                    push_f32(out, *v);
                }
            }
        }
        RenderProgram::NormalDebug { child } => {
            compile_node(child, out, paths, stops);
            out.push(Opcode::NormalDebug as u32);
        }
        RenderProgram::Phong { light_dir, view_dir, light_color, ambient, diffuse, specular, shininess, normal, base } => {
            compile_node(normal, out, paths, stops);
            compile_node(base, out, paths, stops);
            out.push(Opcode::PhongLight as u32);
            for v in [light_dir.x, light_dir.y, light_dir.z, light_dir.w] {
                push_f32(out, v);
            }
            for v in [view_dir.x, view_dir.y, view_dir.z, view_dir.w] {
                push_f32(out, v);
            }
            for v in [light_color.x, light_color.y, light_color.z, light_color.w] {
                push_f32(out, v);
            }
            push_f32(out, *ambient);
            push_f32(out, *diffuse);
            push_f32(out, *specular);
            push_f32(out, *shininess);
        }
    }
}

/// Shared tail for `LinearBlend`/`RadialBlend`: the caller has just set the
/// ratio register. Mirrors [`super::evaluate_blend`]'s short-circuit at the
/// clamped boundaries exactly — `zero` is compiled (and evaluated) alone
/// when the ratio is `<= 0`, `one` alone when `>= 1`, and both only for the
/// interior, so a branch that errors (e.g. an `Image` referencing a missing
/// id) never fires outside the range where the reference evaluator would
/// have reached it either.
fn compile_blend_branches(
    zero: &RenderProgram,
    one: &RenderProgram,
    out: &mut Vec<u32>,
    paths: &mut Vec<RenderPath>,
    stops: &mut Vec<Vec<(f64, Vec4)>>,
) {
    let le_pos = out.len();
    out.push(Opcode::JumpIfRatioLe as u32);
    push_f32(out, 0.0);
    out.push(0); // zero-only target, patched below

    let ge_pos = out.len();
    out.push(Opcode::JumpIfRatioGe as u32);
    push_f32(out, 1.0);
    out.push(0); // one-only target, patched below

    // interior: blend both branches
    compile_node(zero, out, paths, stops);
    compile_node(one, out, paths, stops);
    out.push(Opcode::LinearBlend as u32);
    let jump_end_a = out.len();
    out.push(Opcode::Jump as u32);
    out.push(0); // patched below

    let zero_only_target = out.len() as u32;
    out[le_pos + 2] = zero_only_target;
    compile_node(zero, out, paths, stops);
    let jump_end_b = out.len();
    out.push(Opcode::Jump as u32);
    out.push(0); // patched below

    let one_only_target = out.len() as u32;
    out[ge_pos + 2] = one_only_target;
    compile_node(one, out, paths, stops);

    let end_target = out.len() as u32;
    out[jump_end_a + 1] = end_target;
    out[jump_end_b + 1] = end_target;
}

struct Vm<'a> {
    code: &'a [u32],
    paths: &'a [RenderPath],
    stops: &'a [Vec<(f64, Vec4)>],
    stack: ArrayVec<Vec4, STACK_CAPACITY>,
    call_stack: ArrayVec<u32, CALL_CAPACITY>,
    ratio: f64,
    pc_next: u32,
    ctx: &'a EvaluationContext,
    point: Vec2,
    images: &'a dyn ImageResources,
}

impl<'a> Vm<'a> {
    fn push(&mut self, v: Vec4) -> RasterResult<()> {
        self.stack.try_push(v).map_err(|_| RasterError::ResourceExhausted("instruction operand stack overflow".into()))
    }

    fn pop(&mut self) -> RasterResult<Vec4> {
        self.stack.pop().ok_or_else(|| RasterError::InvariantViolation("instruction operand stack underflow".into()))
    }

    fn call(&mut self, target: u32, return_to: u32) -> RasterResult<()> {
        self.call_stack
            .try_push(return_to)
            .map_err(|_| RasterError::ResourceExhausted("instruction call-stack overflow".into()))?;
        self.jump_to(target);
        Ok(())
    }

    fn jump_to(&mut self, target: u32) {
        self.pc_next = target;
    }

    fn run(&mut self) -> RasterResult<Vec4> {
        self.pc_next = 0;
        loop {
            let pc = self.pc_next as usize;
            if pc >= self.code.len() {
                return Err(RasterError::InvariantViolation(format!("program counter {pc} out of range")));
            }
            let opcode = Opcode::from_u8((self.code[pc] & 0xFF) as u8)?;
            let len = opcode.length_words();
            self.pc_next = (pc + len) as u32;

            match opcode {
                Opcode::PushColor => {
                    let c = Vec4::new(read_f32(self.code, pc + 1), read_f32(self.code, pc + 2), read_f32(self.code, pc + 3), read_f32(self.code, pc + 4));
                    self.push(c)?;
                }
                Opcode::Return => {
                    if let Some(ret) = self.call_stack.pop() {
                        self.pc_next = ret;
                    } else {
                        return self.pop();
                    }
                }
                Opcode::Call => {
                    let target = self.code[pc + 1];
                    let ret = self.pc_next;
                    self.call(target, ret)?;
                }
                Opcode::Jump => {
                    let target = self.code[pc + 1];
                    self.jump_to(target);
                }
                Opcode::JumpIfRatioLe => {
                    let threshold = read_f32(self.code, pc + 1);
                    let target = self.code[pc + 2];
                    if self.ratio <= threshold {
                        self.jump_to(target);
                    }
                }
                Opcode::JumpIfRatioGe => {
                    let threshold = read_f32(self.code, pc + 1);
                    let target = self.code[pc + 2];
                    if self.ratio >= threshold {
                        self.jump_to(target);
                    }
                }
                Opcode::ComputeLinearRatio => {
                    let from = read_vec2(self.code, pc + 1);
                    let to = read_vec2(self.code, pc + 3);
                    self.ratio = gradient::linear_ratio(from, to, self.point);
                }
                Opcode::ComputeRadialRatio => {
                    let m = read_mat3(self.code, pc + 1);
                    let r0 = read_f32(self.code, pc + 10);
                    let r1 = read_f32(self.code, pc + 11);
                    self.ratio = gradient::radial_ratio(&m, r0, r1, self.point);
                }
                Opcode::LinearBlend => {
                    let one = self.pop()?;
                    let zero = self.pop()?;
                    let t = self.ratio.clamp(0.0, 1.0);
                    self.push(zero * (1.0 - t) + one * t)?;
                }
                Opcode::BlendCompose => {
                    let packed = self.code[pc + 1];
                    let compose = compose_from_u8((packed >> 8) as u8)?;
                    let mode = blend_mode_from_u8((packed & 0xFF) as u8)?;
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(blend::compose(compose, mode, a, b))?;
                }
                Opcode::BarycentricBlend => {
                    let p0 = read_vec2(self.code, pc + 1);
                    let p1 = read_vec2(self.code, pc + 3);
                    let p2 = read_vec2(self.code, pc + 5);
                    let is_perspective = self.code[pc + 7] != 0;
                    let w0 = read_f32(self.code, pc + 8);
                    let w1 = read_f32(self.code, pc + 9);
                    let w2 = read_f32(self.code, pc + 10);
                    let (u, v, w) = if is_perspective {
                        gradient::barycentric_perspective(p0, p1, p2, w0, w1, w2, self.point)
                    } else {
                        gradient::barycentric_2d(p0, p1, p2, self.point)
                    };
                    let c2 = self.pop()?;
                    let c1 = self.pop()?;
                    let c0 = self.pop()?;
                    self.push(c0 * u + c1 * v + c2 * w)?;
                }
                Opcode::Image => {
                    let m = read_mat3(self.code, pc + 1);
                    let image_id = self.code[pc + 10];
                    let packed = self.code[pc + 11];
                    let filter = filter_kind_from_u8(((packed >> 16) & 0xFF) as u8)?;
                    let extend_x = extend_mode_from_u8(((packed >> 8) & 0xFF) as u8)?;
                    let extend_y = extend_mode_from_u8((packed & 0xFF) as u8)?;
                    let filter_scale = read_f32(self.code, pc + 12);

                    let sampler = self
                        .images
                        .get(image_id)
                        .ok_or_else(|| RasterError::Configuration(format!("unknown image id {image_id}")))?;
                    let local = m
                        .try_inverse()
                        .map(|inv| transform_point(&inv, self.point))
                        .ok_or_else(|| RasterError::Configuration("Image transform is not invertible".into()))?;
                    let clipped = self.ctx.get_face();
                    let filter_obj = filter.build(filter_scale);
                    let color = crate::filter::integrate(&clipped, filter_obj.as_ref(), local.x, local.y, sampler.as_ref(), extend_x, extend_y);
                    self.push(color)?;
                }
                Opcode::PathBoolean => {
                    let path_index = self.code[pc + 1] as usize;
                    let inside_target = self.code[pc + 2];
                    let outside_target = self.code[pc + 3];
                    let after_target = self.code[pc + 4];
                    let path = self
                        .paths
                        .get(path_index)
                        .ok_or_else(|| RasterError::InvariantViolation(format!("path index {path_index} out of range")))?;
                    if !self.ctx.has_centroid() {
                        return Err(RasterError::Configuration("PathBoolean requires a centroid in the evaluation context".into()));
                    }
                    let centroid = Vec2::new(self.ctx.get_center_x(), self.ctx.get_center_y());
                    let target = if path.contains_point(centroid) { inside_target } else { outside_target };
                    self.call(target, after_target)?;
                }
                Opcode::Alpha => {
                    let alpha = read_f32(self.code, pc + 1);
                    let c = self.pop()?;
                    self.push(c * alpha)?;
                }
                Opcode::Premultiply => {
                    let c = self.pop()?;
                    self.push(colorspace::premultiply(c))?;
                }
                Opcode::Unpremultiply => {
                    let c = self.pop()?;
                    self.push(colorspace::unpremultiply(c))?;
                }
                Opcode::ColorSpaceConvert => {
                    let packed = self.code[pc + 1];
                    let from = color_space_from_u8((packed >> 8) as u8)?;
                    let to = color_space_from_u8((packed & 0xFF) as u8)?;
                    let c = self.pop()?;
                    self.push(from.convert(to, c))?;
                }
                Opcode::FilterMatrix => {
                    let mut m: ColorMatrix = [[0.0; 4]; 4];
                    for row in 0..4 {
                        for col in 0..4 {
                            m[row][col] = read_f32(self.code, pc + 1 + row * 4 + col);
                        }
                    }
                    let c = self.pop()?;
                    self.push(apply_color_matrix(&m, c))?;
                }
                Opcode::NormalDebug => {
                    let c = self.pop()?;
                    self.push(Vec4::new(c.x * 0.5 + 0.5, c.y * 0.5 + 0.5, c.z * 0.5 + 0.5, c.w))?;
                }
                Opcode::PhongLight => {
                    let light_dir = Vec4::new(read_f32(self.code, pc + 1), read_f32(self.code, pc + 2), read_f32(self.code, pc + 3), read_f32(self.code, pc + 4));
                    let view_dir = Vec4::new(read_f32(self.code, pc + 5), read_f32(self.code, pc + 6), read_f32(self.code, pc + 7), read_f32(self.code, pc + 8));
                    let light_color = Vec4::new(read_f32(self.code, pc + 9), read_f32(self.code, pc + 10), read_f32(self.code, pc + 11), read_f32(self.code, pc + 12));
                    let ambient = read_f32(self.code, pc + 13);
                    let diffuse = read_f32(self.code, pc + 14);
                    let specular = read_f32(self.code, pc + 15);
                    let shininess = read_f32(self.code, pc + 16);
                    let base = self.pop()?;
                    let normal = self.pop()?;
                    self.push(gradient::phong_shade(normal, light_dir, view_dir, base, light_color, ambient, diffuse, specular, shininess))?;
                }
                Opcode::LinearGradient => {
                    let from = read_vec2(self.code, pc + 1);
                    let to = read_vec2(self.code, pc + 3);
                    let stops_index = self.code[pc + 5] as usize;
                    let t = gradient::linear_ratio(from, to, self.point);
                    let stops = self
                        .stops
                        .get(stops_index)
                        .ok_or_else(|| RasterError::InvariantViolation(format!("stops index {stops_index} out of range")))?;
                    self.push(gradient::evaluate_stops(stops, t))?;
                }
                Opcode::RadialGradient => {
                    let m = read_mat3(self.code, pc + 1);
                    let r0 = read_f32(self.code, pc + 10);
                    let r1 = read_f32(self.code, pc + 11);
                    let stops_index = self.code[pc + 12] as usize;
                    let t = gradient::radial_ratio(&m, r0, r1, self.point);
                    let stops = self
                        .stops
                        .get(stops_index)
                        .ok_or_else(|| RasterError::InvariantViolation(format!("stops index {stops_index} out of range")))?;
                    self.push(gradient::evaluate_stops(stops, t))?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::face::Bounds;
    use crate::filter::ImageSampler;
    use super::path::FillRule;

    struct NoImages;
    impl ImageResources for NoImages {
        fn get(&self, _id: u32) -> Option<&Arc<dyn ImageSampler>> {
            None
        }
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::from_bounds(Bounds { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 })
    }

    /// Checks that the compiled bytecode reproduces the reference
    /// evaluator's result at a handful of sample points, for `prog`.
    fn assert_lockstep(prog: &RenderProgram, points: &[Vec2]) {
        let compiled = CompiledProgram::compile(prog);
        for &p in points {
            let expected = prog.evaluate(&ctx(), p, &NoImages).unwrap();
            let actual = compiled.execute(&ctx(), p, &NoImages).unwrap();
            assert!((expected - actual).norm() < 1e-6, "point={p:?} expected={expected:?} actual={actual:?}");
        }
    }

    #[test]
    fn color_compiles_to_a_single_push() {
        let prog = RenderProgram::Color { color: Vec4::new(0.2, 0.4, 0.6, 1.0) };
        assert_lockstep(&prog, &[Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.5)]);
    }

    #[test]
    fn alpha_scales_the_child() {
        let prog = RenderProgram::Alpha {
            child: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 1.0, 1.0, 1.0) }),
            alpha: 0.25,
        };
        assert_lockstep(&prog, &[Vec2::new(0.1, 0.1)]);
    }

    #[test]
    fn stack_matches_reference_porter_duff_over() {
        let prog = RenderProgram::Stack {
            children: vec![
                RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) },
                RenderProgram::Alpha {
                    child: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 1.0, 0.0, 1.0) }),
                    alpha: 0.5,
                },
            ],
        };
        assert_lockstep(&prog, &[Vec2::new(0.3, 0.3)]);
    }

    #[test]
    fn blend_compose_matches_reference_for_every_mode() {
        let a = Box::new(RenderProgram::Color { color: Vec4::new(0.8, 0.2, 0.4, 0.9) });
        let b = Box::new(RenderProgram::Color { color: Vec4::new(0.1, 0.6, 0.3, 0.7) });
        let prog = RenderProgram::BlendCompose { compose: Compose::Atop, blend: BlendMode::Multiply, a, b };
        assert_lockstep(&prog, &[Vec2::new(0.4, 0.4)]);
    }

    #[test]
    fn path_boolean_picks_the_branch_containing_the_centroid() {
        let path = RenderPath {
            fill_rule: FillRule::NonZero,
            loops: vec![vec![Vec2::new(0.2, 0.2), Vec2::new(0.8, 0.2), Vec2::new(0.8, 0.8), Vec2::new(0.2, 0.8)]],
        };
        let prog = RenderProgram::PathBoolean {
            path,
            inside: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) }),
            outside: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 0.0, 1.0, 1.0) }),
        };
        // the evaluation context's centroid, not the sample point, decides the
        // branch, so the outcome should be the same at both points.
        assert_lockstep(&prog, &[Vec2::new(0.5, 0.5), Vec2::new(0.9, 0.9)]);
    }

    #[test]
    fn linear_blend_matches_at_and_beyond_the_clamped_boundaries() {
        let prog = RenderProgram::LinearBlend {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(1.0, 0.0),
            zero: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) }),
            one: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 0.0, 1.0, 1.0) }),
        };
        assert_lockstep(&prog, &[Vec2::new(-1.0, 0.0), Vec2::new(0.25, 0.0), Vec2::new(0.5, 0.0), Vec2::new(0.75, 0.0), Vec2::new(2.0, 0.0)]);
    }

    #[test]
    fn linear_gradient_samples_the_stop_table() {
        let prog = RenderProgram::LinearGradient {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(1.0, 0.0),
            stops: vec![(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0)), (1.0, Vec4::new(0.0, 1.0, 0.0, 1.0))],
        };
        assert_lockstep(&prog, &[Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0)]);
    }

    #[test]
    fn radial_blend_matches_at_and_beyond_the_clamped_boundaries() {
        let prog = RenderProgram::RadialBlend {
            transform: Mat3::identity(),
            r0: 0.0,
            r1: 1.0,
            zero: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 1.0, 0.0, 1.0) }),
            one: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 1.0, 1.0, 1.0) }),
        };
        assert_lockstep(&prog, &[Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0), Vec2::new(3.0, 0.0)]);
    }

    #[test]
    fn barycentric_blend_matches_reference() {
        let prog = RenderProgram::BarycentricBlend {
            p0: Vec2::new(0.0, 0.0),
            p1: Vec2::new(1.0, 0.0),
            p2: Vec2::new(0.0, 1.0),
            perspective_weights: None,
            c0: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) }),
            c1: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 1.0, 0.0, 1.0) }),
            c2: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 0.0, 1.0, 1.0) }),
        };
        assert_lockstep(&prog, &[Vec2::new(0.25, 0.25), Vec2::new(0.1, 0.1)]);
    }

    #[test]
    fn premultiply_unpremultiply_and_color_space_convert_round_trip() {
        let prog = RenderProgram::Unpremultiply {
            child: Box::new(RenderProgram::Premultiply {
                child: Box::new(RenderProgram::ColorSpaceConvert {
                    from: ColorSpace::Srgb,
                    to: ColorSpace::LinearSrgb,
                    child: Box::new(RenderProgram::Color { color: Vec4::new(0.6, 0.3, 0.9, 0.8) }),
                }),
            }),
        };
        assert_lockstep(&prog, &[Vec2::new(0.0, 0.0)]);
    }

    #[test]
    fn nested_stack_inside_blend_compose_stays_in_lockstep() {
        let inner = RenderProgram::Stack {
            children: vec![
                RenderProgram::Color { color: Vec4::new(0.5, 0.5, 0.5, 1.0) },
                RenderProgram::Alpha { child: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) }), alpha: 0.3 },
            ],
        };
        let prog = RenderProgram::BlendCompose {
            compose: Compose::Xor,
            blend: BlendMode::Screen,
            a: Box::new(inner),
            b: Box::new(RenderProgram::Color { color: Vec4::new(0.1, 0.2, 0.3, 0.5) }),
        };
        assert_lockstep(&prog, &[Vec2::new(0.2, 0.7)]);
    }

    #[test]
    fn opcode_round_trips_through_its_own_u8_tag() {
        for raw in 0..=21u8 {
            assert_eq!(Opcode::from_u8(raw).unwrap() as u8, raw);
        }
        assert!(Opcode::from_u8(22).is_err());
    }
}
