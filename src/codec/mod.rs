//! Binary codecs: the fixed little-endian layouts of the two-pass
//! pipeline's intermediate records.
//!
//! Every record here is `#[repr(C)]` plus `bytemuck::{Pod, Zeroable}`, so
//! encoding is `bytemuck::bytes_of` and decoding is `bytemuck::from_bytes`
//! — no manual byte-twiddling for the plain fixed-width fields, matching
//! how this pack's other GPU-adjacent crates (`sierra`'s uniform structs)
//! push bytes into upload buffers. Sub-word bitfields (an index packed
//! with flags into one `u32`) get explicit pack/unpack helpers instead,
//! since `bytemuck` has no bitfield support of its own.

use bytemuck::{Pod, Zeroable};

use crate::error::{RasterError, RasterResult};

/// Packs a 24-bit index with up to 8 bits of flags into one `u32`:
/// `RasterClippedChunk`'s `programIndex` + flag bits, `RasterChunkReduceData`'s
/// `clippedChunkIndex` + `isFirstEdge`/`isLastEdge`.
#[inline]
pub fn pack_index_flags(index: u32, flags: u32) -> u32 {
    debug_assert!(index < (1 << 24), "index {index} does not fit in 24 bits");
    (index & 0x00FF_FFFF) | (flags << 24)
}

#[inline]
pub fn unpack_index(word: u32) -> u32 {
    word & 0x00FF_FFFF
}

#[inline]
pub fn unpack_flag(word: u32, bit: u32) -> bool {
    debug_assert!(bit < 8, "flag bit {bit} is out of the 8 high bits");
    (word >> (24 + bit)) & 1 != 0
}

#[inline]
pub fn set_flag(word: u32, bit: u32, value: bool) -> u32 {
    debug_assert!(bit < 8);
    let mask = 1u32 << (24 + bit);
    if value {
        word | mask
    } else {
        word & !mask
    }
}

/// A contiguous run of edges sharing a program and bounds. Variable-length
/// edge data lives in a side array; this header just bounds the slice and
/// records the originating program.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterChunk {
    pub program_index: u32,
    pub edges_index: u32,
    pub num_edges: u32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// One directed edge of a [`RasterChunk`], GPU-upload layout (single
/// precision, matching the narrower float width the GPU dispatch path
/// uses).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterEdge {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

/// One half of a [`RasterChunk`] after one level of binary clipping. `bits`
/// packs `programIndex` (low 24) with
/// `isReducible`/`isComplete`/`isFullArea`/`needsFace`/`isConstant` in the
/// high 8.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterClippedChunk {
    pub bits: u32,
    pub area: f32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub min_x_count: i32,
    pub min_y_count: i32,
    pub max_x_count: i32,
    pub max_y_count: i32,
}

/// Bit offsets for [`RasterClippedChunk::bits`], relative to bit 24 (the
/// flag region) rather than the record's absolute bit position.
pub mod clipped_chunk_flags {
    pub const IS_REDUCIBLE: u32 = 3;
    pub const IS_COMPLETE: u32 = 4;
    pub const IS_FULL_AREA: u32 = 5;
    pub const NEEDS_FACE: u32 = 6;
    pub const IS_CONSTANT: u32 = 7;
}

impl RasterClippedChunk {
    pub fn new(program_index: u32, is_reducible: bool, is_complete: bool, is_full_area: bool, needs_face: bool, is_constant: bool) -> Self {
        let mut bits = pack_index_flags(program_index, 0);
        bits = set_flag(bits, clipped_chunk_flags::IS_REDUCIBLE, is_reducible);
        bits = set_flag(bits, clipped_chunk_flags::IS_COMPLETE, is_complete);
        bits = set_flag(bits, clipped_chunk_flags::IS_FULL_AREA, is_full_area);
        bits = set_flag(bits, clipped_chunk_flags::NEEDS_FACE, needs_face);
        bits = set_flag(bits, clipped_chunk_flags::IS_CONSTANT, is_constant);
        RasterClippedChunk {
            bits,
            area: 0.0,
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            min_x_count: 0,
            min_y_count: 0,
            max_x_count: 0,
            max_y_count: 0,
        }
    }

    pub fn program_index(&self) -> u32 {
        unpack_index(self.bits)
    }
    pub fn is_reducible(&self) -> bool {
        unpack_flag(self.bits, clipped_chunk_flags::IS_REDUCIBLE)
    }
    pub fn is_complete(&self) -> bool {
        unpack_flag(self.bits, clipped_chunk_flags::IS_COMPLETE)
    }
    pub fn is_full_area(&self) -> bool {
        unpack_flag(self.bits, clipped_chunk_flags::IS_FULL_AREA)
    }
    pub fn needs_face(&self) -> bool {
        unpack_flag(self.bits, clipped_chunk_flags::NEEDS_FACE)
    }
    pub fn is_constant(&self) -> bool {
        unpack_flag(self.bits, clipped_chunk_flags::IS_CONSTANT)
    }
}

/// One edge contributed to a clipped chunk by a grid/binary clip.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterEdgeClip {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub contains_fake_corner: u32,
}

/// A segment-associative aggregate consumed by the segmented scan over
/// chunk IDs. `bits` packs `clippedChunkIndex` (low 24) with `isFirstEdge`
/// (bit 30) / `isLastEdge` (bit 31) — i.e. bits 6/7 of the flag byte this
/// module's helpers address relative to bit 24.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterChunkReduceData {
    pub bits: u32,
    pub area: f32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub min_x_count: i32,
    pub min_y_count: i32,
    pub max_x_count: i32,
    pub max_y_count: i32,
}

pub mod reduce_data_flags {
    pub const IS_FIRST_EDGE: u32 = 6;
    pub const IS_LAST_EDGE: u32 = 7;
}

impl RasterChunkReduceData {
    pub fn clipped_chunk_index(&self) -> u32 {
        unpack_index(self.bits)
    }
    pub fn is_first_edge(&self) -> bool {
        unpack_flag(self.bits, reduce_data_flags::IS_FIRST_EDGE)
    }
    pub fn is_last_edge(&self) -> bool {
        unpack_flag(self.bits, reduce_data_flags::IS_LAST_EDGE)
    }
}

/// A pair of adjacent [`RasterChunkReduceData`] entries combined by one
/// level of the segmented reduce tree's "write one value per workgroup"
/// intermediate, specialized to this pipeline's record type.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterChunkReducePair {
    pub a: RasterChunkReduceData,
    pub b: RasterChunkReduceData,
}

/// Four combined entries, one further reduction level up from
/// [`RasterChunkReducePair`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterChunkReduceQuad {
    pub entries: [RasterChunkReduceData; 4],
}

/// A split-level reduce record: the area/count correction produced when a
/// chunk is divided by one binary clip, paired with the index of the
/// clipped chunk it corrects.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterSplitReduceData {
    pub clipped_chunk_index: u32,
    pub area_correction: f32,
    pub min_x_count_delta: i32,
    pub min_y_count_delta: i32,
    pub max_x_count_delta: i32,
    pub max_y_count_delta: i32,
}

/// The two-pass pipeline's per-frame configuration header.
/// `filter_kind`/`target_color_space` are small enum tags rather than the
/// `Filter`/`ColorSpace` trait objects themselves, matching the rest of
/// this module's "plain numeric fields, `Pod`-derived" layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TwoPassConfig {
    pub raster_width: u32,
    pub raster_height: u32,
    pub tile_width_count: u32,
    pub tile_height_count: u32,
    pub bin_width: u32,
    pub bin_height: u32,
    pub tile_size: f32,
    pub bin_size: f32,
    pub filter_kind: u32,
    pub filter_scale: f32,
    pub target_color_space: u32,
}

/// `0xFFFFFFFF` terminates a per-bin linked list.
pub const NEXT_ADDRESS_NONE: u32 = 0xFFFF_FFFF;

/// A renderable face as seen by the fine pass: one node of a per-bin
/// linked list.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TwoPassFineRenderableFace {
    pub program_index: u32,
    pub flags: u32,
    pub edges_index: u32,
    pub num_edges: u32,
    pub min_x_count: i32,
    pub min_y_count: i32,
    pub max_x_count: i32,
    pub max_y_count: i32,
    pub next_address: u32,
}

pub mod fine_face_flags {
    pub const NEEDS_CENTROID: u32 = 0;
    pub const NEEDS_FACE: u32 = 1;
    pub const IS_CONSTANT: u32 = 2;
    pub const IS_FULL_AREA: u32 = 3;
}

impl TwoPassFineRenderableFace {
    pub fn needs_centroid(&self) -> bool {
        self.flags & (1 << fine_face_flags::NEEDS_CENTROID) != 0
    }
    pub fn needs_face(&self) -> bool {
        self.flags & (1 << fine_face_flags::NEEDS_FACE) != 0
    }
    pub fn is_constant(&self) -> bool {
        self.flags & (1 << fine_face_flags::IS_CONSTANT) != 0
    }
    pub fn is_full_area(&self) -> bool {
        self.flags & (1 << fine_face_flags::IS_FULL_AREA) != 0
    }
}

/// Encodes any `Pod` record to its little-endian byte representation.
/// (All fields above are plain `u32`/`i32`/`f32`, which are already
/// little-endian-identical to their in-memory `Pod` form on every
/// architecture this crate targets; this wrapper exists so call sites
/// read as "encode"/"decode" rather than reaching for `bytemuck`
/// directly, and so a future big-endian target has one place to fix.)
pub fn encode<T: Pod>(value: &T) -> Vec<u8> {
    bytemuck::bytes_of(value).to_vec()
}

/// Decodes a `Pod` record from a byte slice, failing with
/// [`RasterError::Configuration`] if `bytes` is the wrong length for `T`:
/// a malformed buffer is a configuration error, not a panic.
pub fn decode<T: Pod>(bytes: &[u8]) -> RasterResult<T> {
    bytemuck::try_from_bytes::<T>(bytes)
        .copied()
        .map_err(|e| RasterError::Configuration(format!("binary record decode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_flags_round_trip() {
        let word = pack_index_flags(0x00AB_CDEF & 0x00FF_FFFF, 0);
        let word = set_flag(word, 3, true);
        let word = set_flag(word, 7, true);
        assert_eq!(unpack_index(word), 0x00AB_CDEF);
        assert!(unpack_flag(word, 3));
        assert!(unpack_flag(word, 7));
        assert!(!unpack_flag(word, 0));
    }

    #[test]
    fn raster_chunk_round_trips_through_encode_decode() {
        let chunk = RasterChunk {
            program_index: 7,
            edges_index: 100,
            num_edges: 4,
            min_x: 0.0,
            min_y: 0.0,
            max_x: 16.0,
            max_y: 16.0,
        };
        let bytes = encode(&chunk);
        assert_eq!(bytes.len(), std::mem::size_of::<RasterChunk>());
        let decoded: RasterChunk = decode(&bytes).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn clipped_chunk_is_forty_bytes_and_round_trips() {
        assert_eq!(std::mem::size_of::<RasterClippedChunk>(), 40);
        let mut chunk = RasterClippedChunk::new(12345, true, false, true, false, true);
        chunk.area = 1.5;
        chunk.max_x_count = -1;
        let decoded: RasterClippedChunk = decode(&encode(&chunk)).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(decoded.program_index(), 12345);
        assert!(decoded.is_reducible());
        assert!(!decoded.is_complete());
        assert!(decoded.is_full_area());
        assert!(!decoded.needs_face());
        assert!(decoded.is_constant());
    }

    #[test]
    fn reduce_data_is_forty_bytes() {
        assert_eq!(std::mem::size_of::<RasterChunkReduceData>(), 40);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let bytes = vec![0u8; 3];
        let result: RasterResult<RasterChunk> = decode(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn next_address_none_terminates_list() {
        let face = TwoPassFineRenderableFace {
            program_index: 0,
            flags: 0,
            edges_index: 0,
            num_edges: 0,
            min_x_count: 0,
            min_y_count: 0,
            max_x_count: 0,
            max_y_count: 0,
            next_address: NEXT_ADDRESS_NONE,
        };
        assert_eq!(face.next_address, 0xFFFF_FFFF);
    }
}
