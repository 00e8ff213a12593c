//! Drives a `DayRunner` across every day of a chain.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::error::ChainError;
use super::runner::{ChainState, DayPlan, DayRunner, DayState, DayStep};
use super::spec::ChainSpec;
use crate::engine::SimulationEngine;
use crate::stats::Statistics;
use crate::store::ChainStore;

/// Runtime knobs that are not part of the chain document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOptions {
    /// Sleep between ticks while a day is running (`run_blocking` only).
    pub poll_interval: Duration,
    /// Append-only sink that receives one line per day transition.
    pub log_file: Option<PathBuf>,
    /// With a log sink configured, simulate every day with one sub-day.
    pub single_sub_day_when_logging: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            log_file: None,
            single_sub_day_when_logging: false,
        }
    }
}

impl ChainOptions {
    fn force_single_sub_day(&self) -> bool {
        self.single_sub_day_when_logging && self.log_file.is_some()
    }
}

/// Cloneable handle that requests cooperative cancellation from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ChainOrchestrator<E: SimulationEngine, S: ChainStore> {
    engine: E,
    store: S,
    options: ChainOptions,
    cancel: CancelToken,
    plans: Vec<DayPlan>,
    runner: Option<DayRunner>,
    /// Carried between days; `None` while a runner owns it.
    day_state: Option<DayState>,
    state: ChainState,
    warnings: Vec<ChainError>,
    results: Vec<Statistics>,
}

impl<E: SimulationEngine, S: ChainStore> ChainOrchestrator<E, S> {
    pub fn new(engine: E, store: S, options: ChainOptions) -> Self {
        Self {
            engine,
            store,
            options,
            cancel: CancelToken::default(),
            plans: Vec::new(),
            runner: None,
            day_state: None,
            state: ChainState::Idle,
            warnings: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Non-fatal problems seen so far (failed saves).
    pub fn warnings(&self) -> &[ChainError] {
        &self.warnings
    }

    /// Statistics of every finished day, in order.
    pub fn results(&self) -> &[Statistics] {
        &self.results
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Takes effect on the next tick.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// `(current day, total days)`; the current day is 0 before the start.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.plans.len();
        match &self.state {
            ChainState::Completed => (total, total),
            state => (state.day().unwrap_or(0), total),
        }
    }

    /// Chain-wide completion in `[0, 1]`, interpolated by sub-day while a
    /// day is being polled.
    pub fn progress_fraction(&self) -> f64 {
        let total = self.plans.len();
        if total == 0 {
            return 0.0;
        }
        let done = match &self.state {
            ChainState::Completed => total as f64,
            ChainState::Polling {
                day,
                sub_day,
                total_sub_days,
            } => {
                let within = if *total_sub_days == 0 {
                    0.0
                } else {
                    (*sub_day as f64 / *total_sub_days as f64).min(1.0)
                };
                (*day - 1) as f64 + within
            }
            ChainState::Finalizing { day } | ChainState::Advancing { day } => *day as f64,
            state => state.day().map_or(0.0, |d| (d - 1) as f64),
        };
        done / total as f64
    }

    /// Validates the chain and prepares day 1. Fails before any simulation
    /// when a model file is missing or the day-0 statistics cannot be read.
    #[tracing::instrument(skip_all, fields(days = spec.day_count()))]
    pub fn start(&mut self, spec: &ChainSpec) -> Result<(), ChainError> {
        if !matches!(self.state, ChainState::Idle) {
            return Err(ChainError::Config("the chain was already started".to_string()));
        }
        spec.validate()?;
        let models = spec.resolve_models()?;
        for (idx, path) in models.iter().enumerate() {
            if !self.store.model_exists(path) {
                return Err(ChainError::ModelFileMissing {
                    day: idx + 1,
                    path: path.clone(),
                });
            }
        }

        let day_state = match &spec.day0_statistics {
            Some(reference) => {
                let path = spec.resolve_path(reference);
                let stats = self.store.load_statistics(&path).map_err(|e| {
                    ChainError::Config(format!("cannot load day-0 statistics: {e}"))
                })?;
                info!(path = %path.display(), "chain seeded with day-0 statistics");
                DayState::seeded(stats)
            }
            None => DayState::empty(),
        };

        let force = self.options.force_single_sub_day();
        self.plans = spec
            .days
            .iter()
            .zip(models)
            .enumerate()
            .map(|(idx, (day, model_path))| DayPlan {
                day: idx + 1,
                model_path,
                output_path: day.statistics_output.as_deref().map(|r| spec.resolve_path(r)),
                carryover: day.carryover.clone(),
                extra_arrivals: if idx == 0 {
                    spec.initial_extra_arrivals.clone()
                } else {
                    Vec::new()
                },
                force_single_sub_day: force,
            })
            .collect();

        self.day_state = Some(day_state);
        self.begin_day(1);
        info!(days = self.plans.len(), "chain started");
        Ok(())
    }

    fn begin_day(&mut self, day: usize) {
        let plan = self.plans[day - 1].clone();
        let state = self.day_state.take().unwrap_or_default();
        self.log_line(&format!(
            "day {day}/{}: simulating {}",
            self.plans.len(),
            plan.model_path.display()
        ));
        self.runner = Some(DayRunner::new(plan, state));
        self.state = ChainState::Loading { day };
    }

    /// Advances the chain by one transition and returns the new state.
    /// Terminal and idle chains are left as they are.
    pub fn tick(&mut self) -> ChainState {
        match &self.state {
            ChainState::Idle | ChainState::Failed(_) | ChainState::Completed => {
                return self.state.clone();
            }
            ChainState::Advancing { day } => {
                let day = *day;
                if day >= self.plans.len() {
                    info!(days = self.plans.len(), "chain completed");
                    self.log_line("chain completed");
                    self.state = ChainState::Completed;
                } else if self.cancel.is_canceled() {
                    self.fail(ChainError::Canceled { day: day + 1 });
                } else {
                    self.begin_day(day + 1);
                }
                return self.state.clone();
            }
            _ => {}
        }

        let Some(runner) = self.runner.as_mut() else {
            self.fail(ChainError::Config("no day in flight".to_string()));
            return self.state.clone();
        };
        let day = runner.day();
        match runner.step(&mut self.engine, &self.store, self.cancel.is_canceled()) {
            DayStep::Running(state) => self.state = state,
            DayStep::Finished { state, warning } => {
                self.runner = None;
                if let Some(stats) = state.previous() {
                    self.results.push(stats.clone());
                }
                self.day_state = Some(state);
                if let Some(w) = warning {
                    self.log_line(&format!("day {day}: warning: {w}"));
                    self.warnings.push(w);
                }
                self.log_line(&format!("day {day}/{}: done", self.plans.len()));
                self.state = ChainState::Advancing { day };
            }
            DayStep::Failed(e) => {
                self.runner = None;
                self.fail(e);
            }
        }
        self.state.clone()
    }

    fn fail(&mut self, e: ChainError) {
        if e.is_canceled() {
            info!(error = %e, "chain canceled");
        } else {
            warn!(error = %e, "chain failed");
        }
        self.log_line(&format!("chain stopped: {e}"));
        self.state = ChainState::Failed(e);
    }

    /// Ticks until the chain ends, sleeping `poll_interval` while a day is
    /// being simulated. `on_state` sees every state change.
    pub fn run_blocking(&mut self, mut on_state: impl FnMut(&ChainState)) -> Result<(), ChainError> {
        let mut last = self.state.clone();
        loop {
            let state = self.tick();
            if state != last {
                on_state(&state);
            }
            match &state {
                ChainState::Completed => return Ok(()),
                ChainState::Failed(e) => return Err(e.clone()),
                ChainState::Idle => {
                    return Err(ChainError::Config("the chain was not started".to_string()));
                }
                ChainState::Polling { .. } => thread::sleep(self.options.poll_interval),
                _ => {}
            }
            last = state;
        }
    }

    fn log_line(&self, line: &str) {
        let Some(path) = &self.options.log_file else {
            return;
        };
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "could not write chain log");
        }
    }
}
