//! The tracer main loop.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_8, TAU};
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;

use crate::intersect::{
    circle_contains, circle_normals, intersect_circle, intersect_polygon, intersect_segment,
    polygon_contains, segment_normals, SurfaceNormals,
};
use crate::math::Vec2;
use crate::ring::RingQueue;
use crate::scene::{
    CircleShape, PolygonShape, ShapeAttributes, ShapeId, SimulationLayout, SimulationSize, Wall,
};

use super::fresnel::fresnel_reflectance;
use super::ray::{LightRay, LightSegment};

/// Rays dimmer than this aggregate intensity are discarded.
const MIN_RAY_INTENSITY: u16 = 50;
/// Distance a ray origin is advanced before re-testing its source shape.
const SELF_HIT_NUDGE: f32 = 0.1;
/// Distance past the hit point probed to find the refraction medium.
const MEDIUM_PROBE_DISTANCE: f32 = 0.1;
/// Absorption level treated as fully opaque.
const FULL_ABSORPTION: f32 = 0.99;
/// Widest diffuse perturbation, reached at diffusion = 1.
const MAX_DIFFUSE_ANGLE: f32 = FRAC_PI_8;
/// Angular margin kept between a diffused ray and the surface tangent.
const DIFFUSE_TANGENT_MARGIN: f32 = 0.1;
/// Containment wall inset from the simulation border, in pixels.
const CONTAINMENT_INSET: f32 = 1.0;

/// Trace up to `segments_to_trace` lit segments through `layout`.
///
/// Pure apart from `rng` and the cooperative `cancel` flag, so any number of
/// invocations may run concurrently over the same layout. On cancellation the
/// partial batch is returned; the caller is expected to discard it.
///
/// # Panics
///
/// Panics when `layout.lights` is empty. Callers must guard.
pub(crate) fn trace(
    layout: &SimulationLayout,
    size: SimulationSize,
    segments_to_trace: usize,
    cancel: &AtomicBool,
    rng: &mut impl Rng,
) -> Vec<LightSegment> {
    assert!(!layout.lights.is_empty(), "trace requires at least one light");

    let bounds = ContainmentBounds::new(size);
    if !layout.lights.iter().any(|light| bounds.contains(light.pos)) {
        // Every root ray would be discarded at the containment check.
        return Vec::new();
    }
    let surfaces = collect_surfaces(layout, &bounds);

    let mut pending = RingQueue::new(segments_to_trace);
    let mut produced = Vec::with_capacity(segments_to_trace);

    while produced.len() < segments_to_trace {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let ray = match pending.pop() {
            Some(ray) => ray,
            None => root_ray(layout, rng),
        };
        if ray.color.intensity() < MIN_RAY_INTENSITY {
            continue;
        }
        if !bounds.contains(ray.origin) {
            continue;
        }
        let hit = match closest_hit(&surfaces, &ray) {
            Some(hit) => hit,
            None => continue,
        };

        produced.push(LightSegment {
            pos1: ray.origin,
            pos2: hit.point,
            color: ray.color,
        });

        if hit.attrs.absorption.all_at_least(FULL_ABSORPTION) {
            continue;
        }
        let transmitted = ray.color.filtered(hit.attrs.absorption.complement());

        let reversed = ray.direction.reversed();
        let incidence = hit.normals.reflection.signed_angle_to(reversed);

        let mut reflected_direction = reversed.rotated(-2.0 * incidence);
        if hit.attrs.diffusion > 0.0 {
            let limit = diffuse_offset_limit(hit.attrs.diffusion, incidence);
            if limit > 0.0 {
                reflected_direction = reflected_direction.rotated(rng.gen_range(-limit..=limit));
            }
        }

        let mut reflected_color = transmitted;
        if hit.attrs.translucent {
            let probe = hit.point + ray.direction * MEDIUM_PROBE_DISTANCE;
            let medium = medium_at(layout, probe);
            let reflectance = fresnel_reflectance(
                incidence.abs(),
                ray.medium.index_of_refraction,
                medium.index_of_refraction,
            );
            reflected_color = transmitted.scaled(reflectance);

            let sin_refracted = (ray.medium.index_of_refraction / medium.index_of_refraction)
                * incidence.sin();
            let refracted_angle = sin_refracted.clamp(-1.0, 1.0).asin();
            pending.push(LightRay {
                source_id: Some(hit.id),
                origin: hit.point,
                direction: hit.normals.refraction.rotated(refracted_angle),
                color: transmitted.scaled(1.0 - reflectance),
                medium,
            });
        }
        pending.push(LightRay {
            source_id: Some(hit.id),
            origin: hit.point,
            direction: reflected_direction,
            color: reflected_color,
            medium: ray.medium,
        });
    }
    produced
}

/// Widest angular perturbation allowed for a diffuse reflection.
///
/// Bounded both by the shape's diffusion setting and by the clearance to the
/// surface tangent, so a perturbed ray cannot graze back into the surface.
pub(crate) fn diffuse_offset_limit(diffusion: f32, incidence_angle: f32) -> f32 {
    let tangent_clearance = FRAC_PI_2 - incidence_angle.abs() - DIFFUSE_TANGENT_MARGIN;
    (MAX_DIFFUSE_ANGLE * diffusion).min(tangent_clearance).max(0.0)
}

/// The absorbing rectangle that encloses every scene.
struct ContainmentBounds {
    min: Vec2,
    max: Vec2,
}

impl ContainmentBounds {
    fn new(size: SimulationSize) -> Self {
        Self {
            min: Vec2::new(CONTAINMENT_INSET, CONTAINMENT_INSET),
            max: Vec2::new(
                size.width as f32 - 2.0 * CONTAINMENT_INSET,
                size.height as f32 - 2.0 * CONTAINMENT_INSET,
            ),
        }
    }

    fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    fn walls(&self) -> [Wall; 4] {
        let attrs = ShapeAttributes::opaque_absorber();
        let (min, max) = (self.min, self.max);
        [
            Wall::new(min, Vec2::new(max.x, min.y), attrs),
            Wall::new(Vec2::new(max.x, min.y), max, attrs),
            Wall::new(max, Vec2::new(min.x, max.y), attrs),
            Wall::new(Vec2::new(min.x, max.y), min, attrs),
        ]
    }
}

/// One intersectable surface, user-supplied or containment.
enum Surface<'a> {
    Wall(Wall),
    Circle(&'a CircleShape),
    Polygon(&'a PolygonShape),
}

impl Surface<'_> {
    fn id(&self) -> ShapeId {
        match self {
            Surface::Wall(wall) => wall.id,
            Surface::Circle(circle) => circle.id,
            Surface::Polygon(polygon) => polygon.id,
        }
    }

    fn attrs(&self) -> ShapeAttributes {
        match self {
            Surface::Wall(wall) => wall.attrs,
            Surface::Circle(circle) => circle.attrs,
            Surface::Polygon(polygon) => polygon.attrs,
        }
    }

    fn intersect(&self, origin: Vec2, direction: Vec2) -> Option<(Vec2, SurfaceNormals)> {
        match self {
            Surface::Wall(wall) => intersect_segment(origin, direction, &wall.segment)
                .map(|point| (point, segment_normals(&wall.segment, direction))),
            Surface::Circle(circle) => {
                intersect_circle(origin, direction, circle.center, circle.radius).map(|point| {
                    (
                        point,
                        circle_normals(origin, point, circle.center, circle.radius),
                    )
                })
            }
            Surface::Polygon(polygon) => intersect_polygon(origin, direction, polygon)
                .map(|hit| (hit.point, segment_normals(&hit.edge, direction))),
        }
    }
}

/// Containment walls first, then user primitives in layout order.
fn collect_surfaces<'a>(layout: &'a SimulationLayout, bounds: &ContainmentBounds) -> Vec<Surface<'a>> {
    let mut surfaces = Vec::with_capacity(
        4 + layout.walls.len() + layout.circles.len() + layout.polygons.len(),
    );
    surfaces.extend(bounds.walls().into_iter().map(Surface::Wall));
    surfaces.extend(layout.walls.iter().copied().map(Surface::Wall));
    surfaces.extend(layout.circles.iter().map(Surface::Circle));
    surfaces.extend(layout.polygons.iter().map(Surface::Polygon));
    surfaces
}

struct SurfaceHit {
    point: Vec2,
    distance_squared: f32,
    id: ShapeId,
    attrs: ShapeAttributes,
    normals: SurfaceNormals,
}

/// Closest intersection by squared distance; ties keep the first surface.
fn closest_hit(surfaces: &[Surface<'_>], ray: &LightRay) -> Option<SurfaceHit> {
    let mut best: Option<SurfaceHit> = None;
    for surface in surfaces {
        // Leaving a surface: nudge the origin forward so the test does not
        // re-hit the surface the ray just left.
        let origin = if ray.source_id == Some(surface.id()) {
            ray.origin.advanced(ray.direction, SELF_HIT_NUDGE)
        } else {
            ray.origin
        };
        let Some((point, normals)) = surface.intersect(origin, ray.direction) else {
            continue;
        };
        let distance_squared = ray.origin.distance_squared(point);
        if best
            .as_ref()
            .map_or(true, |current| distance_squared < current.distance_squared)
        {
            best = Some(SurfaceHit {
                point,
                distance_squared,
                id: surface.id(),
                attrs: surface.attrs(),
                normals,
            });
        }
    }
    best
}

/// Optical attributes of the volume containing `probe`, free space if none.
fn medium_at(layout: &SimulationLayout, probe: Vec2) -> ShapeAttributes {
    for circle in &layout.circles {
        if circle.attrs.translucent && circle_contains(circle.center, circle.radius, probe) {
            return circle.attrs;
        }
    }
    for polygon in &layout.polygons {
        if polygon.attrs.translucent && polygon_contains(polygon, probe) {
            return polygon.attrs;
        }
    }
    ShapeAttributes::VACUUM
}

/// A freshly minted ray leaving a randomly chosen light.
fn root_ray(layout: &SimulationLayout, rng: &mut impl Rng) -> LightRay {
    let light = layout.lights[rng.gen_range(0..layout.lights.len())];
    LightRay {
        source_id: None,
        origin: light.pos,
        direction: Vec2::from_angle(rng.gen_range(0.0..TAU)),
        color: light.color,
        medium: ShapeAttributes::VACUUM,
    }
}
