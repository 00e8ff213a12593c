//! Simulation engine seam.
//!
//! The chain only needs to submit a `RunModel`, poll the run and collect its
//! statistics. `CallCenterEngine` is the built-in implementation; hosts can
//! plug in any other engine through `SimulationEngine`.

mod callcenter;
mod control;
mod threaded;

use thiserror::Error;

use crate::chain::RunModel;
use crate::stats::Statistics;

pub use callcenter::simulate_run_model;
pub use control::SimControl;
pub use threaded::CallCenterEngine;

/// Why a finished run produced no statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("simulation canceled")]
    Canceled,
    #[error("simulation failed: {0}")]
    Failed(String),
}

pub trait SimulationEngine {
    /// Pre-flight validation; the message is shown to the user verbatim.
    fn check(&self, run: &RunModel) -> Result<(), String>;

    /// Starts the run in the background.
    fn submit(&mut self, run: RunModel) -> Result<Box<dyn EngineHandle>, String>;
}

/// A submitted run.
pub trait EngineHandle: Send {
    fn is_running(&self) -> bool;
    /// Sub-days finished so far.
    fn current_sub_day(&self) -> u64;
    fn total_sub_days(&self) -> u64;
    /// Asks the run to stop; `finalize` acknowledges it.
    fn cancel(&mut self);
    /// Waits for the run to end and hands over its result.
    fn finalize(self: Box<Self>) -> Result<Statistics, EngineError>;
}
