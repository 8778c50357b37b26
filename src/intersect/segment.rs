//! Ray-vs-segment intersection via slope/intercept solves.

use crate::math::{safe_divide, Vec2};
use crate::scene::ShapeSegment;

use super::types::SurfaceNormals;

/// Slopes closer than this are treated as parallel.
const PARALLEL_EPSILON: f32 = 1.0e-4;

/// Intersect a forward ray with a segment.
///
/// Returns the hit point, or `None` when the lines are (near-)parallel, the
/// crossing lies behind the ray, or it falls outside the segment's padded
/// ranges.
pub(crate) fn intersect_segment(
    origin: Vec2,
    direction: Vec2,
    segment: &ShapeSegment,
) -> Option<Vec2> {
    let ray_slope = safe_divide(direction.y, direction.x);
    if (ray_slope - segment.slope).abs() < PARALLEL_EPSILON {
        return None;
    }
    let ray_intercept = origin.y - ray_slope * origin.x;

    let x = (segment.y_intercept - ray_intercept) / (ray_slope - segment.slope);
    // Evaluate y on the shallower line; the steeper one amplifies error in x.
    let y = if ray_slope.abs() <= segment.slope.abs() {
        ray_slope * x + ray_intercept
    } else {
        segment.slope * x + segment.y_intercept
    };
    let hit = Vec2::new(x, y);

    if !forward(x - origin.x, direction.x) || !forward(y - origin.y, direction.y) {
        return None;
    }
    if !segment.contains_padded(hit) {
        return None;
    }
    Some(hit)
}

/// Whether a displacement lies on the forward side of a direction component.
fn forward(delta: f32, component: f32) -> bool {
    if component > 0.0 {
        delta > 0.0
    } else if component < 0.0 {
        delta < 0.0
    } else {
        true
    }
}

/// Select reflection/refraction normals for a segment hit.
///
/// Of the two precomputed candidates, the one within a quarter turn of the
/// reversed incoming direction reflects; the other refracts.
pub(crate) fn segment_normals(segment: &ShapeSegment, direction: Vec2) -> SurfaceNormals {
    let (a, b) = segment.normals;
    if a.dot(direction.reversed()) >= 0.0 {
        SurfaceNormals {
            reflection: a,
            refraction: b,
        }
    } else {
        SurfaceNormals {
            reflection: b,
            refraction: a,
        }
    }
}
