//! lumen2d: interactive 2D light-transport simulation.
//!
//! A scene of point lights and obstacle shapes (walls, circles, and polygons,
//! each with optical attributes) is progressively photon-traced: parallel
//! tracer workers cast rays that reflect, refract, and are absorbed at
//! surfaces, and every traced segment accumulates into a shared light grid
//! that tone-maps its running sums into RGB snapshots as batches land.
//!
//! ```no_run
//! use lumen2d::{
//!     Light, LightColor, SimulationLayout, SimulationSize, Simulator, SimulatorOptions, Vec2,
//! };
//!
//! let simulator = Simulator::new(
//!     SimulationSize::new(640, 480),
//!     0.55,
//!     SimulatorOptions::default(),
//!     |snapshot| println!("{} segments traced", snapshot.total_segments_traced),
//! );
//!
//! let mut layout = SimulationLayout::new(1);
//! layout.lights.push(Light::new(Vec2::new(320.0, 240.0), LightColor::WHITE));
//! simulator.restart(layout, false);
//! ```

mod color;
mod grid;
mod intersect;
mod math;
mod ring;
mod scene;
mod simulator;
mod tracer;

pub use color::{FractionalLightColor, LightColor};
pub use grid::{ImageBuffer, SimulationSnapshot};
pub use math::Vec2;
pub use scene::{
    CircleShape, Light, PolygonShape, ShapeAttributes, ShapeId, ShapeSegment, SimulationLayout,
    SimulationSize, Wall,
};
pub use simulator::{Simulator, SimulatorOptions};
pub use tracer::LightSegment;
