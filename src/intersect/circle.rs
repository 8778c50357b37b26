//! Ray-vs-circle intersection.

use crate::math::Vec2;

use super::types::SurfaceNormals;

/// Distance to the synthetic far endpoint used to parameterize the ray.
const FAR_DISTANCE: f32 = 1.0e5;

/// Intersect a forward ray with a circle.
///
/// The ray is extended to a far endpoint and the crossing is solved as a
/// quadratic in the segment parameter. A negative discriminant is a miss;
/// among positive roots the smaller wins.
pub(crate) fn intersect_circle(
    origin: Vec2,
    direction: Vec2,
    center: Vec2,
    radius: f32,
) -> Option<Vec2> {
    let far = origin + direction.normalized() * FAR_DISTANCE;
    let delta = far - origin;
    let offset = origin - center;

    let a = delta.length_squared();
    let b = 2.0 * (delta.x * offset.x + delta.y * offset.y);
    let c = offset.length_squared() - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);

    let t = if t1 > 0.0 {
        t1
    } else if t2 > 0.0 {
        t2
    } else {
        return None;
    };
    Some(origin + delta * t)
}

/// Select reflection/refraction normals for a circle hit.
///
/// Rays arriving from outside reflect off the normal pointing away from the
/// center; rays traveling inside the volume reflect off the inward normal.
pub(crate) fn circle_normals(origin: Vec2, hit: Vec2, center: Vec2, radius: f32) -> SurfaceNormals {
    let toward_center = (center - hit).normalized();
    let away_from_center = toward_center.reversed();
    if origin.distance_squared(center) > radius * radius {
        SurfaceNormals {
            reflection: away_from_center,
            refraction: toward_center,
        }
    } else {
        SurfaceNormals {
            reflection: toward_center,
            refraction: away_from_center,
        }
    }
}

/// Whether `point` lies inside the circle (boundary inclusive).
pub(crate) fn circle_contains(center: Vec2, radius: f32, point: Vec2) -> bool {
    point.distance_squared(center) <= radius * radius
}
