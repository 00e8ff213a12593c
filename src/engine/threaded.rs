//! Built-in engine: runs `simulate_run_model` on a worker thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::callcenter::{MIN_RETRY_DELAY, simulate_run_model};
use super::control::SimControl;
use super::{EngineError, EngineHandle, SimulationEngine};
use crate::chain::RunModel;
use crate::sim::SimTime;
use crate::stats::Statistics;

#[derive(Debug, Default)]
pub struct CallCenterEngine {
    submitted: u64,
}

impl CallCenterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs submitted so far.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }
}

impl SimulationEngine for CallCenterEngine {
    fn check(&self, run: &RunModel) -> Result<(), String> {
        let model = run.model();
        if model.is_newer_than_supported() {
            return Err(format!("model version {} is not supported", model.version));
        }
        if model.sub_days == 0 {
            return Err("the model simulates no sub-days".to_string());
        }
        if model.agents == 0 {
            return Err("the model has no agents".to_string());
        }
        if !model.callers.iter().any(|c| c.active) {
            return Err("the model has no active customer type".to_string());
        }
        let n = run.sub_day_count();
        if run.overrides().len() != model.callers.len() {
            return Err("carryover does not match the model's customer types".to_string());
        }
        for (caller, ov) in model.callers.iter().zip(run.overrides()) {
            let name = &caller.name;
            if ov.name != *name {
                return Err(format!("carryover for {:?} is attached to {name:?}", ov.name));
            }
            if !caller.active {
                continue;
            }
            if !caller.arrival_profile.has_supported_resolution() {
                return Err(format!(
                    "{name}: arrival profile has {} buckets (24, 48 or 96 expected)",
                    caller.arrival_profile.len()
                ));
            }
            if caller.arrival_profile.buckets.iter().any(|b| !b.is_finite() || *b < 0.0) {
                return Err(format!("{name}: arrival profile has a negative weight"));
            }
            if !caller.fresh_calls_mean.is_finite() || caller.fresh_calls_mean < 0.0 {
                return Err(format!("{name}: fresh call mean must be non-negative"));
            }
            if !caller.service_secs.is_finite() || caller.service_secs <= 0.0 {
                return Err(format!("{name}: service time must be positive"));
            }
            if !caller.wait_tolerance_secs.is_finite() || caller.wait_tolerance_secs < 0.0 {
                return Err(format!("{name}: wait tolerance must be non-negative"));
            }
            if !(0.0..=1.0).contains(&caller.retry_probability) {
                return Err(format!("{name}: retry probability is outside [0, 1]"));
            }
            if !caller.retry_delay_secs.is_finite() || caller.retry_delay_secs < 0.0 {
                return Err(format!("{name}: retry delay must be non-negative"));
            }
            if caller.retry_probability > 0.0
                && SimTime::from_secs_f64(caller.retry_delay_secs) < MIN_RETRY_DELAY
            {
                return Err(format!("{name}: retrying customers need a positive retry delay"));
            }
            if ov.add.len() != n || ov.retry.len() != n || ov.waiting.len() != n || ov.tolerance.len() != n {
                return Err(format!("{name}: carryover does not cover {n} sub-days"));
            }
            if ov.waiting.iter().zip(&ov.tolerance).any(|(w, t)| w.len() != t.len()) {
                return Err(format!("{name}: waiting and tolerance lists differ in length"));
            }
        }
        Ok(())
    }

    fn submit(&mut self, run: RunModel) -> Result<Box<dyn EngineHandle>, String> {
        self.check(&run)?;
        self.submitted += 1;
        let control = Arc::new(SimControl::default());
        let total = run.sub_day_count() as u64;
        control.set_running(true);

        let worker_control = Arc::clone(&control);
        let join = thread::Builder::new()
            .name(format!("ccsim-run-{}", self.submitted))
            .spawn(move || {
                let _running = RunningGuard(Arc::clone(&worker_control));
                simulate_run_model(&run, &worker_control)
            })
            .map_err(|e| {
                control.set_running(false);
                format!("cannot start simulation thread: {e}")
            })?;
        debug!(run = self.submitted, sub_days = total, "run submitted");

        Ok(Box::new(ThreadHandle {
            control,
            total,
            join,
        }))
    }
}

/// Clears the running flag when the worker ends, panics included.
struct RunningGuard(Arc<SimControl>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

struct ThreadHandle {
    control: Arc<SimControl>,
    total: u64,
    join: JoinHandle<Option<Statistics>>,
}

impl EngineHandle for ThreadHandle {
    fn is_running(&self) -> bool {
        self.control.is_running()
    }

    fn current_sub_day(&self) -> u64 {
        self.control.sub_days_done()
    }

    fn total_sub_days(&self) -> u64 {
        self.total
    }

    fn cancel(&mut self) {
        self.control.cancel();
    }

    fn finalize(self: Box<Self>) -> Result<Statistics, EngineError> {
        match self.join.join() {
            Ok(Some(stats)) => Ok(stats),
            Ok(None) => Err(EngineError::Canceled),
            Err(_) => {
                warn!("simulation thread panicked");
                Err(EngineError::Failed("simulation thread panicked".to_string()))
            }
        }
    }
}
