//! Builds the engine input for one day of a chain.

use thiserror::Error;
use tracing::{debug, info};

use super::carryover::{PhysicalCarryover, apply_extra_arrivals, physical_carryover, statistical_add};
use super::spec::{CarryoverShape, ExtraArrival};
use crate::model::CallCenterModel;
use crate::stats::Statistics;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("previous statistics cover {previous} sub-days but the model simulates {current}")]
    DayMismatch { previous: usize, current: usize },
}

/// Per-customer-type override vectors, one entry per sub-day.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerOverrides {
    pub name: String,
    /// Extra fresh arrivals from statistical retries.
    pub add: Vec<u64>,
    /// Planned retry times of customers waiting outside the system.
    pub retry: Vec<Vec<u64>>,
    /// Time already waited by customers still queued.
    pub waiting: Vec<Vec<u64>>,
    /// Remaining patience of those queued customers.
    pub tolerance: Vec<Vec<u64>>,
}

impl CallerOverrides {
    pub fn empty(name: impl Into<String>, sub_days: usize) -> Self {
        Self::from_parts(name, vec![0; sub_days], PhysicalCarryover::empty(sub_days))
    }

    fn from_parts(name: impl Into<String>, add: Vec<u64>, physical: PhysicalCarryover) -> Self {
        Self {
            name: name.into(),
            add,
            retry: physical.retry,
            waiting: physical.waiting,
            tolerance: physical.tolerance,
        }
    }

    /// Customers this override brings into sub-day `k` in total.
    pub fn carried_into(&self, k: usize) -> u64 {
        let add = self.add.get(k).copied().unwrap_or(0);
        let retry = self.retry.get(k).map_or(0, |v| v.len() as u64);
        let waiting = self.waiting.get(k).map_or(0, |v| v.len() as u64);
        add + retry + waiting
    }
}

/// A base model plus the carryover it has to absorb. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RunModel {
    model: CallCenterModel,
    overrides: Vec<CallerOverrides>,
}

impl RunModel {
    /// A run model without any carryover.
    pub fn plain(model: CallCenterModel) -> Self {
        let n = model.sub_day_count();
        let overrides = model
            .callers
            .iter()
            .map(|c| CallerOverrides::empty(c.name.clone(), n))
            .collect();
        Self { model, overrides }
    }

    pub fn model(&self) -> &CallCenterModel {
        &self.model
    }

    /// Parallel to `model().callers`.
    pub fn overrides(&self) -> &[CallerOverrides] {
        &self.overrides
    }

    pub fn overrides_for(&self, name: &str) -> Option<&CallerOverrides> {
        self.overrides.iter().find(|o| o.name == name)
    }

    pub fn sub_day_count(&self) -> usize {
        self.model.sub_day_count()
    }

    pub fn into_parts(self) -> (CallCenterModel, Vec<CallerOverrides>) {
        (self.model, self.overrides)
    }
}

/// Turns the previous day's statistics, the day's carryover mapping and (on
/// day 1 only) the manual extra arrivals into the run model of a day.
///
/// Nothing is returned on failure, not even a partially merged model.
#[tracing::instrument(skip_all, fields(model = ?base.name, sub_days = base.sub_days))]
pub fn build_run_model(
    prev: Option<&Statistics>,
    carryover: &CarryoverShape,
    extras: Option<&[ExtraArrival]>,
    mut base: CallCenterModel,
) -> Result<RunModel, BuildError> {
    if let Some(extras) = extras.filter(|e| !e.is_empty()) {
        let applied = apply_extra_arrivals(&mut base, extras);
        info!(applied, configured = extras.len(), "manual extra arrivals applied");
    }

    let Some(prev) = prev else {
        debug!("no previous statistics, nothing to carry over");
        return Ok(RunModel::plain(base));
    };

    let n = base.sub_day_count();
    if prev.sub_day_count() != n {
        return Err(BuildError::DayMismatch {
            previous: prev.sub_day_count(),
            current: n,
        });
    }

    let overrides: Vec<CallerOverrides> = base
        .callers
        .iter()
        .map(|caller| {
            let physical = physical_carryover(prev, &caller.name, n);
            let add = statistical_add(prev, carryover, &caller.name, n);
            debug!(
                customer_type = %caller.name,
                add = add.iter().sum::<u64>(),
                retry = physical.retry.iter().map(Vec::len).sum::<usize>(),
                waiting = physical.waiting.iter().map(Vec::len).sum::<usize>(),
                "carryover merged"
            );
            CallerOverrides::from_parts(caller.name.clone(), add, physical)
        })
        .collect();

    Ok(RunModel {
        model: base,
        overrides,
    })
}
