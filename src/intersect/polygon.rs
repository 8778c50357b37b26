//! Ray-vs-polygon intersection and containment.

use crate::math::Vec2;
use crate::scene::{PolygonShape, ShapeSegment};

use super::segment::intersect_segment;

/// Heading used for the containment parity cast. Chosen off-axis so the cast
/// does not run parallel to axis-aligned edges.
const PARITY_CAST_DIRECTION: Vec2 = Vec2::new(1.0, 0.577_35);

/// A polygon hit with the intersected edge carried for normal selection.
#[derive(Debug, Copy, Clone)]
pub(crate) struct PolygonHit {
    /// Hit point on the edge.
    pub(crate) point: Vec2,
    /// The edge that produced the hit.
    pub(crate) edge: ShapeSegment,
}

/// Intersect a forward ray with a polygon, returning the closest edge hit.
pub(crate) fn intersect_polygon(
    origin: Vec2,
    direction: Vec2,
    polygon: &PolygonShape,
) -> Option<PolygonHit> {
    let mut closest: Option<(f32, PolygonHit)> = None;
    for edge in &polygon.edges {
        if let Some(point) = intersect_segment(origin, direction, edge) {
            let distance_squared = origin.distance_squared(point);
            let replace = match closest {
                Some((best, _)) => distance_squared < best,
                None => true,
            };
            if replace {
                closest = Some((distance_squared, PolygonHit { point, edge: *edge }));
            }
        }
    }
    closest.map(|(_, hit)| hit)
}

/// Whether `point` lies inside the polygon, by ray-cast parity.
///
/// A cast from the point crosses the boundary an odd number of times iff the
/// point is interior. Points within the padded range of a vertex may resolve
/// either way.
pub(crate) fn polygon_contains(polygon: &PolygonShape, point: Vec2) -> bool {
    let mut crossings = 0usize;
    for edge in &polygon.edges {
        if intersect_segment(point, PARITY_CAST_DIRECTION, edge).is_some() {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}
