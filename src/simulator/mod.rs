//! Session orchestration: tracer scheduling, cancellation, snapshot policy.

mod pool;
mod simulator;

#[cfg(test)]
mod tests;

pub use simulator::{Simulator, SimulatorOptions};
