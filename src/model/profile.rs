//! Intraday arrival profiles.

use serde::{Deserialize, Serialize};

use crate::sim::{DAY_MILLIS, SimTime};

/// Profile resolutions the engine understands: hourly, half-hourly and
/// quarter-hourly buckets.
pub const SUPPORTED_BUCKET_COUNTS: [usize; 3] = [24, 48, 96];

/// Relative arrival weights per time bucket over one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArrivalProfile {
    pub buckets: Vec<f64>,
}

impl ArrivalProfile {
    pub fn new(buckets: Vec<f64>) -> Self {
        Self { buckets }
    }

    /// Flat profile with `n` equal buckets.
    pub fn uniform(n: usize) -> Self {
        Self {
            buckets: vec![1.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.buckets.iter().sum()
    }

    pub fn has_supported_resolution(&self) -> bool {
        SUPPORTED_BUCKET_COUNTS.contains(&self.buckets.len())
    }

    /// Length of one bucket.
    pub fn bucket_span(&self) -> SimTime {
        let n = self.buckets.len().max(1) as u64;
        SimTime(DAY_MILLIS / n)
    }

    /// Splits `count` arrivals across the buckets proportionally to their
    /// weights (largest remainder, ties go to the earlier bucket). The result
    /// always sums to `count` unless every weight is zero.
    pub fn allocate(&self, count: u64) -> Vec<u64> {
        let sum = self.sum();
        if count == 0 || !(sum > 0.0) {
            return vec![0; self.buckets.len()];
        }

        let exact: Vec<f64> = self
            .buckets
            .iter()
            .map(|w| w.max(0.0) / sum * count as f64)
            .collect();
        let mut out: Vec<u64> = exact.iter().map(|x| x.floor() as u64).collect();
        let assigned: u64 = out.iter().sum();
        let mut missing = count.saturating_sub(assigned);

        let mut order: Vec<usize> = (0..exact.len()).collect();
        order.sort_by(|&a, &b| {
            let fa = exact[a] - exact[a].floor();
            let fb = exact[b] - exact[b].floor();
            fb.total_cmp(&fa).then(a.cmp(&b))
        });
        for idx in order {
            if missing == 0 {
                break;
            }
            if self.buckets[idx] > 0.0 {
                out[idx] += 1;
                missing -= 1;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_keeps_total_and_follows_weights() {
        let p = ArrivalProfile::new(vec![1.0, 2.0, 1.0]);
        let out = p.allocate(8);
        assert_eq!(out, vec![2, 4, 2]);
        assert_eq!(out.iter().sum::<u64>(), 8);

        let out = p.allocate(5);
        assert_eq!(out.iter().sum::<u64>(), 5);
        assert_eq!(out[1], 3);
    }

    #[test]
    fn allocate_on_zero_profile_is_empty() {
        let p = ArrivalProfile::new(vec![0.0; 24]);
        assert_eq!(p.allocate(10).iter().sum::<u64>(), 0);
    }

    #[test]
    fn resolution_and_span() {
        assert!(ArrivalProfile::uniform(48).has_supported_resolution());
        assert!(!ArrivalProfile::uniform(10).has_supported_resolution());
        assert_eq!(ArrivalProfile::uniform(24).bucket_span(), SimTime::from_hours(1));
        assert_eq!(ArrivalProfile::uniform(96).bucket_span(), SimTime::from_mins(15));
    }
}
