//! Ray-vs-primitive intersection and normal computation.

mod circle;
mod polygon;
mod segment;
mod types;


pub(crate) use circle::{circle_contains, circle_normals, intersect_circle};
pub(crate) use polygon::{intersect_polygon, polygon_contains};
pub(crate) use segment::{intersect_segment, segment_normals};
pub(crate) use types::SurfaceNormals;
