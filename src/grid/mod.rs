//! Accumulation grid: rasterization of lit segments and tone-mapped output.

mod grid;
mod raster;
mod types;

#[cfg(test)]
mod tests;

pub use types::{ImageBuffer, RenderProperties, SimulationSnapshot, SnapshotHandler};

pub(crate) use grid::LightGrid;
