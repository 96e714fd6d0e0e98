//! Error taxonomy.
//!
//! Degenerate input and numeric over/underflow are handled locally and
//! never surface as a [`RasterError`]: callers see
//! either a filtered result (empty edge list, skipped face) or a clamped
//! value. Everything else — configuration errors, invariant violations,
//! and resource exhaustion — bubbles up as this single typed failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    /// A zero-length edge was constructed explicitly via a checked
    /// constructor. Pipeline-internal code paths filter these silently
    /// instead; this variant exists for callers building edges directly.
    #[error("degenerate edge: start == end")]
    DegenerateEdge,

    /// Unknown filter kind, unknown resample/extend type, or a program
    /// node requiring centroid/area information the evaluation context
    /// does not carry. Not recoverable within the current frame.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A programmer-error invariant failed outside of a debug assertion
    /// (released builds must not silently continue past these): an
    /// out-of-range side count, a `nextAddress` past the face-array
    /// length, or a bin index overflow.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A per-bin face list or instruction buffer exceeded its allocated
    /// capacity. Reported to the caller; not recoverable within the frame.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

pub type RasterResult<T> = Result<T, RasterError>;
