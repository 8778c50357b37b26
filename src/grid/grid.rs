//! The shared accumulation grid.

use std::sync::{Mutex, MutexGuard};

use log::trace;

use crate::scene::{SimulationLayout, SimulationSize};
use crate::tracer::LightSegment;

use super::raster;
use super::types::{ImageBuffer, RenderProperties, SimulationSnapshot, SnapshotHandler};

/// Thread-safe accumulation buffer for traced light segments.
///
/// Per-channel running sums live behind a single lock, which is held for the
/// duration of one batch rasterization or one snapshot render. Snapshots are
/// emitted while the lock is held, so emissions are totally ordered; each
/// snapshot owns its pixel buffer, so consumers never observe tearing.
pub(crate) struct LightGrid {
    size: SimulationSize,
    state: Mutex<GridState>,
    handler: SnapshotHandler,
}

struct GridState {
    /// Per-channel running sums, 3 per pixel, row-major.
    sums: Vec<u32>,
    total_segment_count: u64,
    latest_layout_version: u64,
    properties: RenderProperties,
}

impl LightGrid {
    /// Allocate a zeroed grid.
    pub(crate) fn new(
        size: SimulationSize,
        properties: RenderProperties,
        handler: SnapshotHandler,
    ) -> Self {
        let pixel_count = size.width as usize * size.height as usize;
        Self {
            size,
            state: Mutex::new(GridState {
                sums: vec![0; 3 * pixel_count],
                total_segment_count: 0,
                latest_layout_version: 0,
                properties,
            }),
            handler,
        }
    }

    /// Zero all sums and the segment count. Emits a snapshot of the now-black
    /// image when `update_image` is set.
    pub(crate) fn reset(&self, update_image: bool) {
        let mut state = self.lock();
        state.sums.fill(0);
        state.total_segment_count = 0;
        if update_image {
            self.emit(&state);
        }
    }

    /// Raise the version gate so batches for older layouts are rejected even
    /// before the first batch of the new layout lands.
    pub(crate) fn advance_layout_version(&self, version: u64) {
        let mut state = self.lock();
        if version > state.latest_layout_version {
            state.latest_layout_version = version;
        }
    }

    /// Rasterize one batch of segments and emit a snapshot.
    ///
    /// Batches carrying a layout older than the newest one seen are dropped
    /// without touching the sums; this is the authoritative filter for work
    /// that outlived a restart.
    pub(crate) fn draw_segments(
        &self,
        layout: &SimulationLayout,
        segments: &[LightSegment],
        low_quality: bool,
    ) {
        let mut state = self.lock();
        if layout.version < state.latest_layout_version {
            trace!(
                "dropping stale batch: layout v{} behind grid v{}",
                layout.version,
                state.latest_layout_version
            );
            return;
        }
        state.latest_layout_version = layout.version;

        let (width, height) = (self.size.width, self.size.height);
        for segment in segments {
            if low_quality {
                raster::draw_segment_fast(&mut state.sums, width, height, segment);
            } else {
                raster::draw_segment_smooth(&mut state.sums, width, height, segment);
            }
        }
        state.total_segment_count += segments.len() as u64;
        self.emit(&state);
    }

    /// Swap render properties and re-emit the current image under the new
    /// exposure, without re-rasterizing.
    pub(crate) fn set_render_properties(&self, properties: RenderProperties) {
        let mut state = self.lock();
        state.properties = properties;
        self.emit(&state);
    }

    /// Swap render properties without emitting. Used while a restart is
    /// rebuilding the session and a reset snapshot may follow anyway.
    pub(crate) fn update_render_properties(&self, properties: RenderProperties) {
        self.lock().properties = properties;
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().expect("light grid lock poisoned")
    }

    fn emit(&self, state: &GridState) {
        (self.handler)(self.render(state));
    }

    /// Tone-map the sums into an owned RGBX image.
    fn render(&self, state: &GridState) -> SimulationSnapshot {
        let brightness = if state.total_segment_count == 0 {
            0.0
        } else {
            state.properties.exposure / state.total_segment_count as f32
        };
        let pixel_count = self.size.width as usize * self.size.height as usize;
        let mut pixels = vec![0u8; 4 * pixel_count];
        for (index, pixel) in pixels.chunks_exact_mut(4).enumerate() {
            let base = 3 * index;
            pixel[0] = tone_map(state.sums[base], brightness);
            pixel[1] = tone_map(state.sums[base + 1], brightness);
            pixel[2] = tone_map(state.sums[base + 2], brightness);
            // The fourth byte is ignored by consumers.
        }
        SimulationSnapshot {
            image: ImageBuffer {
                width: self.size.width,
                height: self.size.height,
                pixels,
            },
            total_segments_traced: state.total_segment_count,
        }
    }
}

fn tone_map(sum: u32, brightness: f32) -> u8 {
    (sum as f32 * brightness).clamp(0.0, 255.0) as u8
}
