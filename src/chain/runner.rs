//! One day of a chain: load, build, submit, poll, finalize, persist.

use std::mem;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::builder::{BuildError, RunModel, build_run_model};
use super::error::ChainError;
use super::spec::{CarryoverShape, ExtraArrival};
use crate::engine::{EngineError, EngineHandle, SimulationEngine};
use crate::model::CallCenterModel;
use crate::stats::Statistics;
use crate::store::ChainStore;

/// What a day inherits from the day before.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayState {
    previous: Option<Statistics>,
}

impl DayState {
    /// Nothing to carry over.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seeded(stats: Statistics) -> Self {
        Self {
            previous: Some(stats),
        }
    }

    pub fn previous(&self) -> Option<&Statistics> {
        self.previous.as_ref()
    }

    pub fn into_previous(self) -> Option<Statistics> {
        self.previous
    }
}

/// Everything a day needs, resolved up front by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    /// 1-based.
    pub day: usize,
    pub model_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub carryover: CarryoverShape,
    /// Only non-empty for day 1.
    pub extra_arrivals: Vec<ExtraArrival>,
    /// Simulate one sub-day only, whatever the model says.
    pub force_single_sub_day: bool,
}

/// Snapshot of where a chain is.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainState {
    Idle,
    Loading { day: usize },
    Building { day: usize },
    Submitted { day: usize },
    Polling {
        day: usize,
        sub_day: u64,
        total_sub_days: u64,
    },
    Finalizing { day: usize },
    Advancing { day: usize },
    Failed(ChainError),
    Completed,
}

impl ChainState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChainState::Failed(_) | ChainState::Completed)
    }

    pub fn day(&self) -> Option<usize> {
        match self {
            ChainState::Loading { day }
            | ChainState::Building { day }
            | ChainState::Submitted { day }
            | ChainState::Polling { day, .. }
            | ChainState::Finalizing { day }
            | ChainState::Advancing { day } => Some(*day),
            ChainState::Failed(e) => e.day(),
            ChainState::Idle | ChainState::Completed => None,
        }
    }
}

enum DayPhase {
    Loading,
    Building(CallCenterModel),
    Submitted(RunModel),
    Polling(Box<dyn EngineHandle>),
    Finalizing(Box<dyn EngineHandle>),
    Done,
}

/// Result of one `DayRunner::step`.
#[derive(Debug)]
pub enum DayStep {
    /// The day moved to (or stayed in) this state.
    Running(ChainState),
    /// The day produced statistics. A failed save is reported as `warning`.
    Finished {
        state: DayState,
        warning: Option<ChainError>,
    },
    Failed(ChainError),
}

pub struct DayRunner {
    plan: DayPlan,
    state: DayState,
    phase: DayPhase,
}

impl DayRunner {
    pub fn new(plan: DayPlan, state: DayState) -> Self {
        Self {
            plan,
            state,
            phase: DayPhase::Loading,
        }
    }

    pub fn day(&self) -> usize {
        self.plan.day
    }

    pub fn plan(&self) -> &DayPlan {
        &self.plan
    }

    /// Performs exactly one transition. Never blocks on the engine except
    /// to collect a run that already stopped or was just told to cancel.
    pub fn step(
        &mut self,
        engine: &mut dyn SimulationEngine,
        store: &dyn ChainStore,
        cancel: bool,
    ) -> DayStep {
        let day = self.plan.day;
        match mem::replace(&mut self.phase, DayPhase::Done) {
            DayPhase::Loading => match self.load(store) {
                Ok(model) => {
                    self.phase = DayPhase::Building(model);
                    DayStep::Running(ChainState::Building { day })
                }
                Err(e) => DayStep::Failed(e),
            },
            DayPhase::Building(model) => {
                let extras = (!self.plan.extra_arrivals.is_empty())
                    .then_some(self.plan.extra_arrivals.as_slice());
                match build_run_model(self.state.previous(), &self.plan.carryover, extras, model) {
                    Ok(run) => {
                        self.phase = DayPhase::Submitted(run);
                        DayStep::Running(ChainState::Submitted { day })
                    }
                    Err(BuildError::DayMismatch { previous, current }) => {
                        DayStep::Failed(ChainError::DayMismatch {
                            day,
                            previous,
                            current,
                        })
                    }
                }
            }
            DayPhase::Submitted(run) => {
                if let Err(message) = engine.check(&run) {
                    return DayStep::Failed(ChainError::EngineRejected { day, message });
                }
                match engine.submit(run) {
                    Ok(handle) => {
                        let total_sub_days = handle.total_sub_days();
                        info!(day, total_sub_days, "day submitted");
                        self.phase = DayPhase::Polling(handle);
                        DayStep::Running(ChainState::Polling {
                            day,
                            sub_day: 0,
                            total_sub_days,
                        })
                    }
                    Err(message) => DayStep::Failed(ChainError::EngineRejected { day, message }),
                }
            }
            DayPhase::Polling(mut handle) => {
                if cancel {
                    handle.cancel();
                    // Wait for the run to acknowledge; its result is discarded.
                    match handle.finalize() {
                        Ok(stats) => debug!(
                            day,
                            customer_types = stats.customer_types.len(),
                            "run finished before the cancel, statistics discarded"
                        ),
                        Err(e) => debug!(day, error = %e, "run acknowledged the cancel"),
                    }
                    info!(day, "day canceled");
                    return DayStep::Failed(ChainError::Canceled { day });
                }
                if handle.is_running() {
                    let state = ChainState::Polling {
                        day,
                        sub_day: handle.current_sub_day(),
                        total_sub_days: handle.total_sub_days(),
                    };
                    self.phase = DayPhase::Polling(handle);
                    return DayStep::Running(state);
                }
                self.phase = DayPhase::Finalizing(handle);
                DayStep::Running(ChainState::Finalizing { day })
            }
            DayPhase::Finalizing(handle) => match handle.finalize() {
                Ok(stats) => {
                    let warning = self.persist(store, &stats);
                    info!(day, customer_types = stats.customer_types.len(), "day finished");
                    DayStep::Finished {
                        state: DayState::seeded(stats),
                        warning,
                    }
                }
                Err(EngineError::Canceled) => DayStep::Failed(ChainError::Canceled { day }),
                Err(EngineError::Failed(message)) => {
                    warn!(day, %message, "engine produced no statistics");
                    DayStep::Failed(ChainError::Canceled { day })
                }
            },
            DayPhase::Done => DayStep::Failed(ChainError::Config(format!(
                "day {day} was stepped after it ended"
            ))),
        }
    }

    fn load(&self, store: &dyn ChainStore) -> Result<CallCenterModel, ChainError> {
        let day = self.plan.day;
        let path = &self.plan.model_path;
        if !store.model_exists(path) {
            return Err(ChainError::ModelFileMissing {
                day,
                path: path.clone(),
            });
        }
        let mut model = store.load_model(path).map_err(|e| ChainError::ModelLoad {
            day,
            message: e.to_string(),
        })?;
        if self.plan.force_single_sub_day && model.sub_days != 1 {
            debug!(day, sub_days = model.sub_days, "forcing a single sub-day");
            model.sub_days = 1;
        }
        debug!(day, path = %path.display(), "model loaded");
        Ok(model)
    }

    fn persist(&self, store: &dyn ChainStore, stats: &Statistics) -> Option<ChainError> {
        let path = self.plan.output_path.as_ref()?;
        match store.save_statistics(path, stats) {
            Ok(()) => {
                debug!(day = self.plan.day, path = %path.display(), "statistics saved");
                None
            }
            Err(e) => {
                warn!(day = self.plan.day, path = %path.display(), error = %e, "could not save statistics");
                Some(ChainError::SaveFailed {
                    day: self.plan.day,
                    path: path.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}
