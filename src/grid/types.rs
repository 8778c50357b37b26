//! Public render properties and snapshot types.

use std::sync::Arc;

/// Render-time properties of the grid.
///
/// `exposure` is the effective exposure: the user-facing exposure control
/// already folded together with the scene's light count, so snapshot
/// brightness stays comparable across scenes and segment budgets.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderProperties {
    /// Effective exposure multiplier applied per snapshot.
    pub exposure: f32,
}

/// 32-bit-per-pixel RGB image, row-major, one ignored alpha byte per pixel.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel bytes in RGBX order, length = width * height * 4.
    pub pixels: Vec<u8>,
}

impl ImageBuffer {
    /// RGB channels of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let base = 4 * (y as usize * self.width as usize + x as usize);
        (self.pixels[base], self.pixels[base + 1], self.pixels[base + 2])
    }

    /// Row stride in bytes.
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * 4
    }
}

/// One rendered view of the accumulated light field.
#[derive(Debug, Clone)]
pub struct SimulationSnapshot {
    /// Tone-mapped image of the light field.
    pub image: ImageBuffer,
    /// Total segments aggregated since the last reset.
    pub total_segments_traced: u64,
}

/// Callback receiving each new snapshot.
///
/// Invoked on whatever thread triggered the emitting mutation; consumers
/// marshal to their own thread as needed.
pub type SnapshotHandler = Arc<dyn Fn(SimulationSnapshot) + Send + Sync>;
