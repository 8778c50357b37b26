//! Ray and segment value types.

use crate::color::LightColor;
use crate::math::Vec2;
use crate::scene::{ShapeAttributes, ShapeId};

/// A lit line segment, the tracer's unit of output.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightSegment {
    /// Segment start (ray origin).
    pub pos1: Vec2,
    /// Segment end (hit point).
    pub pos2: Vec2,
    /// Light color carried along the segment.
    pub color: LightColor,
}

/// A ray in flight between surface interactions.
///
/// `direction` always has positive magnitude. `medium` holds the optical
/// attributes of the volume the ray currently traverses (free space unless
/// the ray refracted into a translucent shape).
#[derive(Debug, Copy, Clone)]
pub(crate) struct LightRay {
    /// The shape the ray most recently left, if any. Used to avoid
    /// immediately re-hitting the surface that spawned the ray.
    pub(crate) source_id: Option<ShapeId>,
    /// Ray origin.
    pub(crate) origin: Vec2,
    /// Ray heading (unit length).
    pub(crate) direction: Vec2,
    /// Light color carried by the ray.
    pub(crate) color: LightColor,
    /// Optical medium the ray travels through.
    pub(crate) medium: ShapeAttributes,
}
