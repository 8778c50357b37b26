use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::color::LightColor;
use crate::grid::SimulationSnapshot;
use crate::math::Vec2;
use crate::scene::{Light, SimulationLayout, SimulationSize};

type Collected = Arc<Mutex<Vec<SimulationSnapshot>>>;

fn collecting_simulator(options: SimulatorOptions) -> (Simulator, Collected) {
    let _ = env_logger::builder().is_test(true).try_init();
    let collected: Collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let simulator = Simulator::new(
        SimulationSize::new(100, 100),
        0.5,
        options,
        move |snapshot| sink.lock().unwrap().push(snapshot),
    );
    (simulator, collected)
}

fn small_options() -> SimulatorOptions {
    SimulatorOptions {
        interactive_segments: 200,
        final_segment_budget: 1_000,
        tracer_batch_size: 300,
        concurrency: 2,
        seed: 0,
    }
}

fn lit_layout(version: u64) -> SimulationLayout {
    let mut layout = SimulationLayout::new(version);
    layout.lights.push(Light::new(Vec2::new(50.0, 50.0), LightColor::WHITE));
    layout
}

fn wait_until(collected: &Collected, what: &str, predicate: impl Fn(&[SimulationSnapshot]) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if predicate(&collected.lock().unwrap()) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_restart_without_lights_presents_black() {
    let (simulator, collected) = collecting_simulator(small_options());
    simulator.restart(SimulationLayout::new(1), false);

    wait_until(&collected, "the reset snapshot", |snapshots| !snapshots.is_empty());
    let snapshots = collected.lock().unwrap();
    let snapshot = snapshots.last().unwrap();
    assert_eq!(snapshot.total_segments_traced, 0);
    assert_eq!(snapshot.image.width, 100);
    assert_eq!(snapshot.image.height, 100);
    assert_eq!(snapshot.image.bytes_per_row(), 400);
    assert!(snapshot.image.pixels.iter().all(|&byte| byte == 0));
}

#[test]
fn test_interactive_restart_delivers_one_quick_batch() {
    let (simulator, collected) = collecting_simulator(small_options());
    simulator.restart(lit_layout(1), true);

    wait_until(&collected, "the interactive snapshot", |snapshots| {
        snapshots.iter().any(|s| s.total_segments_traced == 200)
    });
    // The single interactive job is the only work dispatched.
    thread::sleep(Duration::from_millis(50));
    let snapshots = collected.lock().unwrap();
    assert!(snapshots.iter().all(|s| s.total_segments_traced <= 200));
}

#[test]
fn test_final_pass_exhausts_the_budget_exactly() {
    let (simulator, collected) = collecting_simulator(small_options());
    simulator.restart(lit_layout(1), false);

    wait_until(&collected, "the final pass to finish", |snapshots| {
        snapshots.last().map_or(false, |s| s.total_segments_traced == 1_000)
    });
    let snapshots = collected.lock().unwrap();
    // Totals only grow, and never overshoot the configured budget.
    let mut previous = 0;
    for snapshot in snapshots.iter() {
        assert!(snapshot.total_segments_traced >= previous);
        assert!(snapshot.total_segments_traced <= 1_000);
        previous = snapshot.total_segments_traced;
    }
}

#[test]
fn test_restart_supersedes_previous_session() {
    let (simulator, collected) = collecting_simulator(SimulatorOptions {
        final_segment_budget: 1_000_000,
        tracer_batch_size: 10_000,
        ..small_options()
    });
    simulator.restart(lit_layout(1), false);
    simulator.restart(SimulationLayout::new(2), false);

    wait_until(&collected, "the superseding black snapshot", |snapshots| {
        snapshots.last().map_or(false, |s| s.total_segments_traced == 0)
    });
    // Late batches from the first session are version-gated: once the empty
    // layout's snapshot lands, nothing accumulates after it.
    thread::sleep(Duration::from_millis(200));
    let snapshots = collected.lock().unwrap();
    let black_at = snapshots
        .iter()
        .position(|s| s.total_segments_traced == 0)
        .unwrap();
    assert!(snapshots[black_at..].iter().all(|s| s.total_segments_traced == 0));
}

#[test]
fn test_set_exposure_reemits_snapshot() {
    let (simulator, collected) = collecting_simulator(small_options());
    simulator.restart(lit_layout(1), true);
    wait_until(&collected, "the interactive snapshot", |snapshots| {
        snapshots.iter().any(|s| s.total_segments_traced == 200)
    });

    let before = collected.lock().unwrap().len();
    simulator.set_exposure(0.9);
    wait_until(&collected, "the exposure re-emit", |snapshots| snapshots.len() > before);
    let snapshots = collected.lock().unwrap();
    assert_eq!(snapshots.last().unwrap().total_segments_traced, 200);
}

#[test]
fn test_stop_halts_refilling() {
    let (simulator, collected) = collecting_simulator(SimulatorOptions {
        final_segment_budget: 100_000_000,
        tracer_batch_size: 5_000,
        ..small_options()
    });
    simulator.restart(lit_layout(1), false);
    wait_until(&collected, "the first batches", |snapshots| snapshots.len() >= 2);
    simulator.stop();

    // Let in-flight work drain, then confirm accumulation has stopped.
    thread::sleep(Duration::from_millis(200));
    let count_after_stop = collected
        .lock()
        .unwrap()
        .last()
        .map_or(0, |s| s.total_segments_traced);
    thread::sleep(Duration::from_millis(200));
    let final_count = collected
        .lock()
        .unwrap()
        .last()
        .map_or(0, |s| s.total_segments_traced);
    assert_eq!(count_after_stop, final_count);
}
