//! The public simulator driving progressive tracing sessions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, trace};

use crate::grid::{LightGrid, RenderProperties, SimulationSnapshot, SnapshotHandler};
use crate::scene::{SimulationLayout, SimulationSize};

use super::pool::{JobOutcome, TraceJob, TracerPool};

/// Tunable scheduling parameters.
#[derive(Debug, Copy, Clone)]
pub struct SimulatorOptions {
    /// Segment budget of the single job issued for an interactive pass.
    pub interactive_segments: usize,
    /// Total segment budget of a final pass.
    pub final_segment_budget: u64,
    /// Segment budget handed to each final tracer job.
    pub tracer_batch_size: usize,
    /// Worker thread count of the tracer pool.
    pub concurrency: usize,
    /// Base seed for per-job PRNG streams. Fixed seeds reproduce runs.
    pub seed: u64,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            interactive_segments: 200,
            final_segment_budget: 10_000_000,
            tracer_batch_size: 100_000,
            concurrency: num_cpus::get(),
            seed: 0,
        }
    }
}

/// Commands accepted by the orchestration thread.
enum Command {
    Restart {
        layout: SimulationLayout,
        interactive: bool,
    },
    SetExposure(f32),
    Stop,
    Shutdown,
}

/// Drives progressive light simulation over a mutable scene.
///
/// Owns one accumulation grid and two worker tiers: a serial orchestration
/// thread processing commands in order, and a tracer pool of CPU-bound
/// workers. Snapshots flow to the caller-supplied handler as batches land.
///
/// `restart`, `stop`, and `set_exposure` are intended to be called from a
/// single editor thread.
pub struct Simulator {
    commands: Sender<Command>,
    orchestrator: Option<JoinHandle<()>>,
}

impl Simulator {
    /// Create a simulator for a fixed simulation size.
    ///
    /// `exposure` is the user-facing control in [0, 1]; `snapshot_handler`
    /// receives every rendered snapshot, on whatever thread produced it.
    pub fn new(
        size: SimulationSize,
        exposure: f32,
        options: SimulatorOptions,
        snapshot_handler: impl Fn(SimulationSnapshot) + Send + Sync + 'static,
    ) -> Self {
        let handler: SnapshotHandler = Arc::new(snapshot_handler);
        let grid = Arc::new(LightGrid::new(
            size,
            RenderProperties {
                exposure: effective_exposure(exposure, 0),
            },
            handler,
        ));

        let (commands, command_rx) = unbounded();
        let orchestrator = thread::spawn(move || {
            run_orchestrator(grid, size, exposure, options, command_rx);
        });

        Self {
            commands,
            orchestrator: Some(orchestrator),
        }
    }

    /// Replace the scene and start a new tracing session.
    ///
    /// In-flight tracer work for the previous layout is cancelled; its late
    /// batches are discarded by the grid's layout-version gate. Pass
    /// `interactive` while the user is mid-gesture to get one quick
    /// low-quality frame instead of a full final pass.
    pub fn restart(&self, layout: SimulationLayout, interactive: bool) {
        let _ = self.commands.send(Command::Restart { layout, interactive });
    }

    /// Cancel all tracing without touching the accumulated image.
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// Update the exposure control, re-emitting a snapshot of the current
    /// accumulation under the new brightness.
    pub fn set_exposure(&self, exposure: f32) {
        let _ = self.commands.send(Command::SetExposure(exposure));
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(orchestrator) = self.orchestrator.take() {
            let _ = orchestrator.join();
        }
    }
}

/// Effective exposure folded together with the light count, keeping images
/// comparable across scenes and segment budgets.
fn effective_exposure(user_exposure: f32, light_count: usize) -> f32 {
    (1.0 + 10.0 * user_exposure).exp() * light_count as f32
}

fn run_orchestrator(
    grid: Arc<LightGrid>,
    size: SimulationSize,
    exposure: f32,
    options: SimulatorOptions,
    command_rx: Receiver<Command>,
) {
    let (outcome_tx, outcome_rx) = unbounded();
    let pool = TracerPool::new(options.concurrency, Arc::clone(&grid), outcome_tx);
    let mut orchestrator = Orchestrator {
        grid,
        pool,
        options,
        size,
        layout: Arc::new(SimulationLayout::default()),
        cancel: Arc::new(AtomicBool::new(false)),
        generation: 0,
        user_exposure: exposure,
        remaining_budget: 0,
        in_flight: 0,
        final_pass: false,
        seed_counter: 0,
    };

    loop {
        crossbeam_channel::select! {
            recv(command_rx) -> command => match command {
                Ok(Command::Restart { layout, interactive }) => {
                    orchestrator.restart(layout, interactive);
                }
                Ok(Command::SetExposure(exposure)) => orchestrator.set_exposure(exposure),
                Ok(Command::Stop) => orchestrator.stop(),
                Ok(Command::Shutdown) | Err(_) => break,
            },
            recv(outcome_rx) -> outcome => match outcome {
                Ok(outcome) => orchestrator.handle_outcome(outcome),
                Err(_) => break,
            },
        }
    }
    // The pool drops here, closing the job lanes and joining the workers.
}

/// Serial orchestration state, owned by the orchestration thread.
struct Orchestrator {
    grid: Arc<LightGrid>,
    pool: TracerPool,
    options: SimulatorOptions,
    size: SimulationSize,
    layout: Arc<SimulationLayout>,
    cancel: Arc<AtomicBool>,
    generation: u64,
    user_exposure: f32,
    remaining_budget: u64,
    in_flight: usize,
    final_pass: bool,
    seed_counter: u64,
}

impl Orchestrator {
    fn restart(&mut self, layout: SimulationLayout, interactive: bool) {
        debug!(
            "restart: layout v{} with {} lights, interactive={}",
            layout.version,
            layout.lights.len(),
            interactive
        );
        self.cancel_session();
        self.layout = Arc::new(layout);

        self.grid.update_render_properties(RenderProperties {
            exposure: effective_exposure(self.user_exposure, self.layout.lights.len()),
        });
        self.grid.advance_layout_version(self.layout.version);

        if self.layout.lights.is_empty() {
            self.grid.reset(true);
            return;
        }
        // Keep the previous image visible until fresh batches land.
        self.grid.reset(false);

        if interactive {
            self.dispatch(self.options.interactive_segments, true, true);
        } else {
            self.final_pass = true;
            self.remaining_budget = self.options.final_segment_budget;
            self.refill();
        }
    }

    fn stop(&mut self) {
        debug!("stop: cancelling session generation {}", self.generation);
        self.cancel_session();
    }

    fn set_exposure(&mut self, exposure: f32) {
        self.user_exposure = exposure;
        self.grid.set_render_properties(RenderProperties {
            exposure: effective_exposure(exposure, self.layout.lights.len()),
        });
    }

    /// Trip the session cancel token and forget all in-flight accounting.
    fn cancel_session(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.cancel = Arc::new(AtomicBool::new(false));
        self.generation += 1;
        self.in_flight = 0;
        self.remaining_budget = 0;
        self.final_pass = false;
    }

    /// Top the pool back up to full concurrency while budget remains.
    fn refill(&mut self) {
        while self.in_flight < self.options.concurrency.max(1) && self.remaining_budget > 0 {
            let batch = self
                .options
                .tracer_batch_size
                .max(1)
                .min(self.remaining_budget as usize);
            self.remaining_budget -= batch as u64;
            self.dispatch(batch, false, false);
        }
    }

    fn dispatch(&mut self, segments_to_trace: usize, low_quality: bool, interactive_lane: bool) {
        let job = TraceJob {
            generation: self.generation,
            layout: Arc::clone(&self.layout),
            size: self.size,
            segments_to_trace,
            low_quality,
            cancel: Arc::clone(&self.cancel),
            seed: self.next_seed(),
        };
        trace!(
            "dispatch: {} segments, generation {}, interactive={}",
            segments_to_trace,
            self.generation,
            interactive_lane
        );
        if interactive_lane {
            self.pool.submit_interactive(job);
        } else {
            self.pool.submit_final(job);
        }
        self.in_flight += 1;
    }

    fn handle_outcome(&mut self, outcome: JobOutcome) {
        if outcome.generation != self.generation {
            return;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        // Cancelled tracers never refill the pool.
        if outcome.cancelled || !self.final_pass {
            return;
        }
        self.refill();
        if self.remaining_budget == 0 && self.in_flight == 0 {
            debug!(
                "final pass complete: segment budget exhausted for generation {}",
                self.generation
            );
            self.final_pass = false;
        }
    }

    fn next_seed(&mut self) -> u64 {
        let seed = self.options.seed.wrapping_add(self.seed_counter);
        self.seed_counter += 1;
        seed
    }
}
