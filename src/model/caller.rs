//! Customer types.

use serde::{Deserialize, Serialize};

use super::profile::ArrivalProfile;

fn default_true() -> bool {
    true
}

fn default_retry_delay_secs() -> f64 {
    1800.0
}

/// One customer type ("caller group") of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallerType {
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Expected number of fresh arrivals per simulated day.
    pub fresh_calls_mean: f64,
    pub arrival_profile: ArrivalProfile,
    /// How long a customer waits in the queue before abandoning.
    pub wait_tolerance_secs: f64,
    pub service_secs: f64,
    /// Share of abandoning customers who try again.
    #[serde(default)]
    pub retry_probability: f64,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,
}

impl CallerType {
    pub fn new(name: impl Into<String>, fresh_calls_mean: f64, arrival_profile: ArrivalProfile) -> Self {
        Self {
            name: name.into(),
            active: true,
            fresh_calls_mean,
            arrival_profile,
            wait_tolerance_secs: 180.0,
            service_secs: 240.0,
            retry_probability: 0.0,
            retry_delay_secs: default_retry_delay_secs(),
        }
    }

    /// Adds `count` extra arrivals to the day, all landing in the first bucket.
    ///
    /// The first bucket grows by `count / mean * profile_sum` so that the
    /// profile keeps its scale relative to the new mean. Without a usable
    /// mean or profile the count itself becomes the first bucket's weight.
    pub fn add_fresh_calls(&mut self, count: u64) {
        if count == 0 {
            return;
        }
        let Some(first) = self.arrival_profile.buckets.first().copied() else {
            return;
        };
        let sum = self.arrival_profile.sum();
        let add = count as f64;
        let bump = if self.fresh_calls_mean > 0.0 && sum > 0.0 {
            add / self.fresh_calls_mean * sum
        } else {
            add
        };
        self.arrival_profile.buckets[0] = first + bump;
        self.fresh_calls_mean += add;
    }
}
