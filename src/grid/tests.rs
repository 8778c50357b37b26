use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::raster::{draw_segment_fast, draw_segment_smooth};
use super::*;
use crate::color::LightColor;
use crate::math::Vec2;
use crate::scene::{Light, SimulationLayout, SimulationSize};
use crate::tracer::{trace, LightSegment};

type Collected = Arc<Mutex<Vec<SimulationSnapshot>>>;

fn collecting_grid(size: SimulationSize, exposure: f32) -> (LightGrid, Collected) {
    let collected: Collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let grid = LightGrid::new(
        size,
        RenderProperties { exposure },
        Arc::new(move |snapshot| sink.lock().unwrap().push(snapshot)),
    );
    (grid, collected)
}

fn white_segment(x0: f32, y0: f32, x1: f32, y1: f32) -> LightSegment {
    LightSegment {
        pos1: Vec2::new(x0, y0),
        pos2: Vec2::new(x1, y1),
        color: LightColor::WHITE,
    }
}

#[test]
fn test_reset_zeroes_and_is_idempotent() {
    let (grid, collected) = collecting_grid(SimulationSize::new(32, 32), 1.0);
    let layout = SimulationLayout::new(1);
    grid.draw_segments(&layout, &[white_segment(2.0, 3.0, 20.0, 3.0)], true);

    grid.reset(true);
    {
        let snapshots = collected.lock().unwrap();
        let last = snapshots.last().unwrap();
        assert_eq!(last.total_segments_traced, 0);
        assert!(last.image.pixels.iter().all(|&byte| byte == 0));
    }

    // A second reset observes the same all-zero state.
    grid.reset(true);
    let snapshots = collected.lock().unwrap();
    let last = snapshots.last().unwrap();
    assert_eq!(last.total_segments_traced, 0);
    assert!(last.image.pixels.iter().all(|&byte| byte == 0));
}

#[test]
fn test_version_gate_drops_stale_batches() {
    let (grid, collected) = collecting_grid(SimulationSize::new(32, 32), 1.0);
    let newer = SimulationLayout::new(2);
    let older = SimulationLayout::new(1);

    grid.draw_segments(&newer, &[white_segment(2.0, 3.0, 20.0, 3.0)], true);
    assert_eq!(collected.lock().unwrap().len(), 1);

    // A batch for the older layout is dropped silently: no snapshot, no sums.
    grid.draw_segments(&older, &[white_segment(2.0, 10.0, 20.0, 10.0)], true);
    assert_eq!(collected.lock().unwrap().len(), 1);
    assert_eq!(collected.lock().unwrap()[0].total_segments_traced, 1);

    grid.draw_segments(&newer, &[white_segment(2.0, 3.0, 20.0, 3.0)], true);
    assert_eq!(collected.lock().unwrap().last().unwrap().total_segments_traced, 2);
}

#[test]
fn test_advance_layout_version_gates_ahead_of_first_batch() {
    let (grid, collected) = collecting_grid(SimulationSize::new(32, 32), 1.0);
    grid.advance_layout_version(5);

    let stale = SimulationLayout::new(4);
    grid.draw_segments(&stale, &[white_segment(2.0, 3.0, 20.0, 3.0)], true);
    assert!(collected.lock().unwrap().is_empty());
}

#[test]
fn test_segment_count_accumulates_batch_sizes() {
    let (grid, collected) = collecting_grid(SimulationSize::new(32, 32), 1.0);
    let layout = SimulationLayout::new(1);
    for batch_size in [3usize, 5, 7] {
        let segments: Vec<_> = (0..batch_size)
            .map(|i| white_segment(1.0, 1.0 + i as f32, 20.0, 1.0 + i as f32))
            .collect();
        grid.draw_segments(&layout, &segments, true);
    }
    assert_eq!(collected.lock().unwrap().last().unwrap().total_segments_traced, 15);
}

#[test]
fn test_exposure_linearity() {
    let (grid, collected) = collecting_grid(SimulationSize::new(32, 32), 0.1);
    let layout = SimulationLayout::new(1);
    grid.draw_segments(&layout, &[white_segment(2.0, 3.0, 20.0, 3.0)], true);
    let dim = collected.lock().unwrap().last().unwrap().image.pixel(10, 3);

    grid.set_render_properties(RenderProperties { exposure: 0.2 });
    let bright = collected.lock().unwrap().last().unwrap().image.pixel(10, 3);

    // Doubling the exposure doubles each pre-clamp channel value.
    assert!(dim.0 > 0);
    assert!((bright.0 as i32 - 2 * dim.0 as i32).abs() <= 1);
}

#[test]
fn test_set_render_properties_reemits_without_redraw() {
    let (grid, collected) = collecting_grid(SimulationSize::new(32, 32), 1.0);
    let layout = SimulationLayout::new(1);
    grid.draw_segments(&layout, &[white_segment(2.0, 3.0, 20.0, 3.0)], true);
    grid.set_render_properties(RenderProperties { exposure: 2.0 });

    let snapshots = collected.lock().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].total_segments_traced, snapshots[1].total_segments_traced);
}

#[test]
fn test_bresenham_horizontal_full_color() {
    let mut sums = vec![0u32; 3 * 16 * 16];
    draw_segment_fast(&mut sums, 16, 16, &white_segment(2.0, 3.0, 6.0, 3.0));
    for x in 2..=6usize {
        assert_eq!(sums[3 * (3 * 16 + x)], 255);
    }
    assert_eq!(sums.iter().filter(|&&sum| sum > 0).count(), 5 * 3);
}

#[test]
fn test_bresenham_diagonal_compensation() {
    let mut sums = vec![0u32; 3 * 16 * 16];
    draw_segment_fast(&mut sums, 16, 16, &white_segment(0.0, 0.0, 7.0, 7.0));
    // Diagonal steps are brightened by sqrt(2), capped at 2.
    let expected = (255.0 * core::f32::consts::SQRT_2) as u32;
    assert_eq!(sums[3 * (3 * 16 + 3)], expected);
}

#[test]
fn test_bresenham_clips_offscreen() {
    let mut sums = vec![0u32; 3 * 8 * 8];
    draw_segment_fast(&mut sums, 8, 8, &white_segment(-5.0, 3.0, 20.0, 3.0));
    // Only the on-grid span is plotted.
    assert_eq!(sums.iter().filter(|&&sum| sum > 0).count(), 8 * 3);
}

#[test]
fn test_wu_horizontal_coverage() {
    let mut sums = vec![0u32; 3 * 16 * 16];
    draw_segment_smooth(&mut sums, 16, 16, &white_segment(2.0, 3.0, 8.0, 3.0));
    // Interior pixels carry full coverage, endpoints half, off-row nothing.
    assert_eq!(sums[3 * (3 * 16 + 5)], 255);
    assert_eq!(sums[3 * (3 * 16 + 2)], 127);
    assert_eq!(sums[3 * (4 * 16 + 5)], 0);
}

#[test]
fn test_wu_steep_line_swaps_axes() {
    let mut sums = vec![0u32; 3 * 16 * 16];
    draw_segment_smooth(&mut sums, 16, 16, &white_segment(5.0, 2.0, 5.0, 9.0));
    assert_eq!(sums[3 * (5 * 16 + 5)], 255);
    assert_eq!(sums[3 * (2 * 16 + 5)], 127);
    assert_eq!(sums[3 * (5 * 16 + 6)], 0);
}

#[test]
fn test_wu_splits_coverage_between_rows() {
    let mut sums = vec![0u32; 3 * 16 * 16];
    draw_segment_smooth(&mut sums, 16, 16, &white_segment(2.0, 3.5, 8.0, 3.5));
    // A line between pixel centers splits its energy across both rows.
    let upper = sums[3 * (3 * 16 + 5)];
    let lower = sums[3 * (4 * 16 + 5)];
    assert_eq!(upper, 127);
    assert_eq!(lower, 127);
}

#[test]
fn test_closed_room_lights_every_containment_edge() {
    let size = SimulationSize::new(100, 100);
    let (grid, collected) = collecting_grid(size, 10_000.0);
    let mut layout = SimulationLayout::new(1);
    layout.lights.push(Light::new(Vec2::new(50.0, 50.0), LightColor::WHITE));

    let cancel = AtomicBool::new(false);
    let mut rng = SmallRng::seed_from_u64(21);
    let segments = trace(&layout, size, 10_000, &cancel, &mut rng);
    grid.draw_segments(&layout, &segments, true);

    let snapshots = collected.lock().unwrap();
    let image = &snapshots.last().unwrap().image;
    assert_eq!(snapshots.last().unwrap().total_segments_traced, 10_000);

    let lit = |x: u32, y: u32| {
        let (r, g, b) = image.pixel(x, y);
        r > 0 || g > 0 || b > 0
    };
    assert!((1..=98).any(|x| lit(x, 1)), "top containment edge unlit");
    assert!((1..=98).any(|x| lit(x, 98)), "bottom containment edge unlit");
    assert!((1..=98).any(|y| lit(1, y)), "left containment edge unlit");
    assert!((1..=98).any(|y| lit(98, y)), "right containment edge unlit");
}
