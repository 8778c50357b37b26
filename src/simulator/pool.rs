//! Tracer worker pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::trace;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::grid::LightGrid;
use crate::scene::{SimulationLayout, SimulationSize};
use crate::tracer;

/// One unit of tracing work.
pub(crate) struct TraceJob {
    /// Session generation the job belongs to; outcomes from older generations
    /// are ignored by the orchestrator.
    pub(crate) generation: u64,
    pub(crate) layout: Arc<SimulationLayout>,
    pub(crate) size: SimulationSize,
    pub(crate) segments_to_trace: usize,
    pub(crate) low_quality: bool,
    pub(crate) cancel: Arc<AtomicBool>,
    pub(crate) seed: u64,
}

/// Completion report for one job.
pub(crate) struct JobOutcome {
    pub(crate) generation: u64,
    pub(crate) cancelled: bool,
}

/// Fixed set of worker threads fed by a two-lane job queue.
///
/// The interactive lane is drained ahead of the final lane so the single
/// low-quality job issued during an editing gesture is picked up first. This
/// is a scheduling preference, not a correctness property.
pub(crate) struct TracerPool {
    interactive_tx: Option<Sender<TraceJob>>,
    final_tx: Option<Sender<TraceJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl TracerPool {
    /// Spawn `worker_count` tracer threads drawing into `grid`.
    pub(crate) fn new(
        worker_count: usize,
        grid: Arc<LightGrid>,
        outcomes: Sender<JobOutcome>,
    ) -> Self {
        let (interactive_tx, interactive_rx) = unbounded();
        let (final_tx, final_rx) = unbounded();
        let workers = (0..worker_count.max(1))
            .map(|index| {
                let interactive_rx = interactive_rx.clone();
                let final_rx = final_rx.clone();
                let grid = Arc::clone(&grid);
                let outcomes = outcomes.clone();
                thread::spawn(move || run_worker(index, interactive_rx, final_rx, grid, outcomes))
            })
            .collect();
        Self {
            interactive_tx: Some(interactive_tx),
            final_tx: Some(final_tx),
            workers,
        }
    }

    /// Queue a job on the interactive lane.
    pub(crate) fn submit_interactive(&self, job: TraceJob) {
        if let Some(tx) = &self.interactive_tx {
            let _ = tx.send(job);
        }
    }

    /// Queue a job on the final lane.
    pub(crate) fn submit_final(&self, job: TraceJob) {
        if let Some(tx) = &self.final_tx {
            let _ = tx.send(job);
        }
    }
}

impl Drop for TracerPool {
    fn drop(&mut self) {
        // Closing both lanes lets every worker fall out of its receive loop.
        self.interactive_tx.take();
        self.final_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn run_worker(
    index: usize,
    interactive_rx: Receiver<TraceJob>,
    final_rx: Receiver<TraceJob>,
    grid: Arc<LightGrid>,
    outcomes: Sender<JobOutcome>,
) {
    loop {
        let job = match interactive_rx.try_recv() {
            Ok(job) => job,
            Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => {
                let received = crossbeam_channel::select! {
                    recv(interactive_rx) -> job => job,
                    recv(final_rx) -> job => job,
                };
                match received {
                    Ok(job) => job,
                    Err(_) => return,
                }
            }
        };
        execute(index, job, &grid, &outcomes);
    }
}

fn execute(index: usize, job: TraceJob, grid: &LightGrid, outcomes: &Sender<JobOutcome>) {
    if job.cancel.load(Ordering::Relaxed) {
        let _ = outcomes.send(JobOutcome {
            generation: job.generation,
            cancelled: true,
        });
        return;
    }

    let mut rng = SmallRng::seed_from_u64(job.seed);
    let segments = tracer::trace(
        &job.layout,
        job.size,
        job.segments_to_trace,
        &job.cancel,
        &mut rng,
    );

    let cancelled = job.cancel.load(Ordering::Relaxed);
    if cancelled {
        trace!(
            "worker {index}: discarding {} segments from a cancelled job",
            segments.len()
        );
    } else {
        grid.draw_segments(&job.layout, &segments, job.low_quality);
    }
    let _ = outcomes.send(JobOutcome {
        generation: job.generation,
        cancelled,
    });
}
