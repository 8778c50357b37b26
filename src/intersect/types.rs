//! Shared types for intersection queries.

use crate::math::Vec2;

/// The pair of unit normals at a hit point.
///
/// The reflection normal points into the half-space containing the reversed
/// incoming direction; the refraction normal is its opposite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct SurfaceNormals {
    /// Normal on the incoming side of the surface.
    pub(crate) reflection: Vec2,
    /// Normal on the far side of the surface.
    pub(crate) refraction: Vec2,
}
