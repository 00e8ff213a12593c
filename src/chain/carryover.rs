//! Carryover arithmetic: how day K's results become day K+1's input.
//!
//! Three independent mechanisms feed the next day:
//! - statistical retries of customers who abandoned (`statistical_add`),
//! - customers physically still around at cutoff (`physical_carryover`),
//! - manually injected day-1 volume (`apply_extra_arrivals`).

use super::spec::{CarryoverShape, ExtraArrival};
use crate::model::CallCenterModel;
use crate::stats::Statistics;
use tracing::{debug, trace};

/// Expected retries arriving as `target` on each of `sub_days` sub-days.
///
/// Contributions of all source types are summed per sub-day and rounded
/// once (half away from zero).
pub fn statistical_add(
    prev: &Statistics,
    shape: &CarryoverShape,
    target: &str,
    sub_days: usize,
) -> Vec<u64> {
    match shape {
        CarryoverShape::Global(rule) => {
            let p = if rule.probability > 0.0 { rule.probability } else { 0.0 };
            (0..sub_days)
                .map(|k| round_count(p * prev.abandon_count(target, k) as f64))
                .collect()
        }
        CarryoverShape::PerType(rules) => {
            let mut sums = vec![0.0_f64; sub_days];
            for (source, rule) in rules {
                let factor = rule.factor(source, target);
                if factor == 0.0 {
                    continue;
                }
                let Some(from) = prev.customer(source) else {
                    continue;
                };
                trace!(from = %source, to = %target, factor, "retry share");
                for (k, sum) in sums.iter_mut().enumerate() {
                    *sum += factor * from.abandoned_on(k) as f64;
                }
            }
            sums.into_iter().map(round_count).collect()
        }
    }
}

fn round_count(x: f64) -> u64 {
    if !(x > 0.0) {
        return 0;
    }
    x.round() as u64
}

/// Customers still in (or just outside) the system at the end of the
/// previous day, per sub-day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysicalCarryover {
    pub retry: Vec<Vec<u64>>,
    pub waiting: Vec<Vec<u64>>,
    pub tolerance: Vec<Vec<u64>>,
}

impl PhysicalCarryover {
    pub fn empty(sub_days: usize) -> Self {
        Self {
            retry: vec![Vec::new(); sub_days],
            waiting: vec![Vec::new(); sub_days],
            tolerance: vec![Vec::new(); sub_days],
        }
    }
}

/// Copies the previous day's cutoff arrays of `target` verbatim. Types the
/// previous day did not know start empty.
pub fn physical_carryover(prev: &Statistics, target: &str, sub_days: usize) -> PhysicalCarryover {
    let mut out = PhysicalCarryover::empty(sub_days);
    let Some(from) = prev.customer(target) else {
        return out;
    };
    for k in 0..sub_days {
        if let Some(v) = from.next_day_retry.get(k) {
            out.retry[k] = v.clone();
        }
        if let Some(v) = from.next_day_waiting.get(k) {
            out.waiting[k] = v.clone();
        }
        if let Some(v) = from.next_day_tolerance.get(k) {
            out.tolerance[k] = v.clone();
        }
    }
    out
}

/// Adds the manual extra arrivals to every customer type whose name matches
/// case-insensitively. Unknown types are skipped. Returns how many records
/// matched at least one type.
pub fn apply_extra_arrivals(model: &mut CallCenterModel, extras: &[ExtraArrival]) -> usize {
    let mut applied = 0;
    for extra in extras {
        let mut matched = false;
        for caller in model.callers_mut_ignore_case(&extra.customer_type) {
            caller.add_fresh_calls(extra.count);
            matched = true;
            debug!(
                customer_type = %caller.name,
                count = extra.count,
                mean = caller.fresh_calls_mean,
                "extra arrivals injected"
            );
        }
        if matched {
            applied += 1;
        } else {
            debug!(customer_type = %extra.customer_type, "no such customer type, extra arrivals ignored");
        }
    }
    applied
}
