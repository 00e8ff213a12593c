//! Fixtures and the scripted engine double shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::chain::RunModel;
use crate::engine::{EngineError, EngineHandle, SimulationEngine};
use crate::model::{ArrivalProfile, CallCenterModel, CallerType};
use crate::stats::{CustomerStats, Statistics};

pub fn model(sub_days: u32, callers: &[(&str, f64)]) -> CallCenterModel {
    let callers = callers
        .iter()
        .map(|(name, mean)| CallerType::new(*name, *mean, ArrivalProfile::uniform(24)))
        .collect();
    let mut m = CallCenterModel::new(sub_days, 10, callers);
    m.name = Some("test".to_string());
    m
}

/// Statistics where every listed type abandoned `abandoned[k]` times on
/// sub-day `k`.
pub fn stats_with_abandons(sub_days: u32, types: &[(&str, &[u64])]) -> Statistics {
    let mut stats = Statistics::new(None, sub_days);
    for (name, abandoned) in types {
        let mut c = CustomerStats::new(*name, sub_days as usize);
        for (k, a) in abandoned.iter().enumerate() {
            c.abandoned[k] = *a;
            c.arrivals[k] = *a;
        }
        stats.customer_types.push(c);
    }
    stats
}

/// Zero statistics covering the active types of `run`.
pub fn empty_stats_for(run: &RunModel) -> Statistics {
    let m = run.model();
    let mut stats = Statistics::new(m.name.clone(), m.sub_days);
    stats.customer_types = m
        .callers
        .iter()
        .filter(|c| c.active)
        .map(|c| CustomerStats::new(c.name.clone(), m.sub_day_count()))
        .collect();
    stats
}

/// Records submitted run models and replays queued outcomes. Without a
/// queued outcome a run yields zero statistics.
#[derive(Default)]
pub struct ScriptedEngine {
    pub submitted: Vec<RunModel>,
    pub outcomes: VecDeque<Result<Statistics, EngineError>>,
    /// Polls each run reports "running" before it finishes.
    pub running_polls: u64,
    pub reject: Option<String>,
    pub cancels: Arc<AtomicU64>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, outcome: Result<Statistics, EngineError>) -> Self {
        self.outcomes.push_back(outcome);
        self
    }
}

impl SimulationEngine for ScriptedEngine {
    fn check(&self, _run: &RunModel) -> Result<(), String> {
        match &self.reject {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }

    fn submit(&mut self, run: RunModel) -> Result<Box<dyn EngineHandle>, String> {
        let outcome = self
            .outcomes
            .pop_front()
            .unwrap_or_else(|| Ok(empty_stats_for(&run)));
        let total = run.sub_day_count() as u64;
        self.submitted.push(run);
        Ok(Box::new(ScriptedHandle {
            remaining: AtomicU64::new(self.running_polls),
            total,
            canceled: AtomicBool::new(false),
            cancels: Arc::clone(&self.cancels),
            outcome,
        }))
    }
}

struct ScriptedHandle {
    remaining: AtomicU64,
    total: u64,
    canceled: AtomicBool,
    cancels: Arc<AtomicU64>,
    outcome: Result<Statistics, EngineError>,
}

impl EngineHandle for ScriptedHandle {
    fn is_running(&self) -> bool {
        if self.canceled.load(Ordering::SeqCst) {
            return false;
        }
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| r.checked_sub(1))
            .is_ok()
    }

    fn current_sub_day(&self) -> u64 {
        0
    }

    fn total_sub_days(&self) -> u64 {
        self.total
    }

    fn cancel(&mut self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn finalize(self: Box<Self>) -> Result<Statistics, EngineError> {
        if self.canceled.load(Ordering::SeqCst) {
            return Err(EngineError::Canceled);
        }
        self.outcome
    }
}
