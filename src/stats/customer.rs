//! Per-customer-type counters.

use serde::{Deserialize, Serialize};

/// Results for one customer type, indexed by sub-day.
///
/// The three `next_day_*` arrays describe customers still around at the end
/// of the day: `next_day_retry` holds planned retry times (ms after the start
/// of the following day) of customers waiting outside the system;
/// `next_day_waiting` / `next_day_tolerance` are parallel lists of customers
/// still queued, with the time they already waited and the patience they
/// have left (both ms).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerStats {
    pub name: String,
    #[serde(default)]
    pub arrivals: Vec<u64>,
    #[serde(default)]
    pub served: Vec<u64>,
    #[serde(default)]
    pub abandoned: Vec<u64>,
    #[serde(default)]
    pub next_day_retry: Vec<Vec<u64>>,
    #[serde(default)]
    pub next_day_waiting: Vec<Vec<u64>>,
    #[serde(default)]
    pub next_day_tolerance: Vec<Vec<u64>>,
}

impl CustomerStats {
    pub fn new(name: impl Into<String>, sub_days: usize) -> Self {
        Self {
            name: name.into(),
            arrivals: vec![0; sub_days],
            served: vec![0; sub_days],
            abandoned: vec![0; sub_days],
            next_day_retry: vec![Vec::new(); sub_days],
            next_day_waiting: vec![Vec::new(); sub_days],
            next_day_tolerance: vec![Vec::new(); sub_days],
        }
    }

    /// Abandon count on sub-day `k`; 0 outside the recorded range.
    pub fn abandoned_on(&self, k: usize) -> u64 {
        self.abandoned.get(k).copied().unwrap_or(0)
    }

    pub fn total_arrivals(&self) -> u64 {
        self.arrivals.iter().sum()
    }

    pub fn total_served(&self) -> u64 {
        self.served.iter().sum()
    }

    pub fn total_abandoned(&self) -> u64 {
        self.abandoned.iter().sum()
    }

    /// Pads missing carryover arrays with empty per-sub-day lists.
    pub(crate) fn fill_missing(&mut self, sub_days: usize) {
        for v in [
            &mut self.arrivals,
            &mut self.served,
            &mut self.abandoned,
        ] {
            if v.is_empty() {
                v.resize(sub_days, 0);
            }
        }
        for v in [
            &mut self.next_day_retry,
            &mut self.next_day_waiting,
            &mut self.next_day_tolerance,
        ] {
            if v.is_empty() {
                v.resize(sub_days, Vec::new());
            }
        }
    }

    pub(crate) fn check_shape(&self, sub_days: usize) -> Result<(), String> {
        let lens = [
            ("arrivals", self.arrivals.len()),
            ("served", self.served.len()),
            ("abandoned", self.abandoned.len()),
            ("next_day_retry", self.next_day_retry.len()),
            ("next_day_waiting", self.next_day_waiting.len()),
            ("next_day_tolerance", self.next_day_tolerance.len()),
        ];
        for (field, len) in lens {
            if len != sub_days {
                return Err(format!(
                    "customer type {:?}: {field} has {len} sub-days, expected {sub_days}",
                    self.name
                ));
            }
        }
        for (k, (w, t)) in self
            .next_day_waiting
            .iter()
            .zip(&self.next_day_tolerance)
            .enumerate()
        {
            if w.len() != t.len() {
                return Err(format!(
                    "customer type {:?}: sub-day {k} has {} waiting customers but {} tolerances",
                    self.name,
                    w.len(),
                    t.len()
                ));
            }
        }
        Ok(())
    }
}
