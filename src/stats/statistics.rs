//! Statistics of one simulated day.

use serde::{Deserialize, Serialize};

use super::customer::CustomerStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub model_name: Option<String>,
    pub sub_days: u32,
    pub customer_types: Vec<CustomerStats>,
}

impl Statistics {
    pub fn new(model_name: Option<String>, sub_days: u32) -> Self {
        Self {
            model_name,
            sub_days,
            customer_types: Vec::new(),
        }
    }

    pub fn sub_day_count(&self) -> usize {
        self.sub_days as usize
    }

    /// Exact, case-sensitive lookup.
    pub fn customer(&self, name: &str) -> Option<&CustomerStats> {
        self.customer_types.iter().find(|c| c.name == name)
    }

    /// Abandon count of `name` on sub-day `k`; unknown types count 0.
    pub fn abandon_count(&self, name: &str, k: usize) -> u64 {
        self.customer(name).map_or(0, |c| c.abandoned_on(k))
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.customer_types.iter().map(|c| c.name.as_str()).collect()
    }

    /// Sum over all customer types.
    pub fn totals(&self) -> CustomerStats {
        let n = self.sub_day_count();
        let mut all = CustomerStats::new("", n);
        for c in &self.customer_types {
            for k in 0..n {
                all.arrivals[k] += c.arrivals.get(k).copied().unwrap_or(0);
                all.served[k] += c.served.get(k).copied().unwrap_or(0);
                all.abandoned[k] += c.abandoned_on(k);
                if let Some(v) = c.next_day_retry.get(k) {
                    all.next_day_retry[k].extend_from_slice(v);
                }
                if let Some(v) = c.next_day_waiting.get(k) {
                    all.next_day_waiting[k].extend_from_slice(v);
                }
                if let Some(v) = c.next_day_tolerance.get(k) {
                    all.next_day_tolerance[k].extend_from_slice(v);
                }
            }
        }
        all
    }

    /// Fills omitted per-sub-day arrays and checks that every array covers
    /// exactly `sub_days` entries.
    pub fn normalize(&mut self) -> Result<(), String> {
        let n = self.sub_day_count();
        for c in &mut self.customer_types {
            c.fill_missing(n);
            c.check_shape(n)?;
        }
        Ok(())
    }
}
