//! Analytic 2D vector-graphics rasterization core.
//!
//! A `RenderProgram` tree (colors, gradients, images, blends, path-boolean
//! fills) is partitioned into `(face, program)` pairs, each face clipped to
//! bins and evaluated pixel-by-pixel through an analytic filter integrator
//! driving either the recursive reference evaluator or the compiled
//! bytecode interpreter.

pub mod codec;
pub mod error;
pub mod face;
pub mod filter;
pub mod geometry;
pub mod numeric;
pub mod parallel;
pub mod partition;
pub mod program;
pub mod raster;

pub use error::{RasterError, RasterResult};
