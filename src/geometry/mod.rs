//! Shader-independent 2D geometry: points, matrices and directed edges.

pub mod edge;
pub mod vector;

pub use self::edge::{
    edges_from_polygon, edges_from_polygons, polygons_to_shape, winding_number_edges,
    winding_number_polygons, LinearEdge,
};
pub use self::vector::{signed_scale, transform_direction, transform_point, Mat3, Mat3f, Vec2, Vec2f, Vec4, Vec4f};
