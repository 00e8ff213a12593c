//! 仿真时间类型
//!
//! 以毫秒为单位的日内时间，以及与秒/分钟/小时之间的换算。

/// 一个仿真日的长度（毫秒）。
pub const DAY_MILLIS: u64 = 86_400_000;

/// 仿真时间（毫秒，从当天 0 点起算）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const END_OF_DAY: SimTime = SimTime(DAY_MILLIS);

    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000))
    }
    pub fn from_secs_f64(s: f64) -> SimTime {
        if !s.is_finite() || s <= 0.0 {
            return SimTime::ZERO;
        }
        SimTime((s * 1_000.0).round() as u64)
    }
    pub fn from_mins(m: u64) -> SimTime {
        SimTime(m.saturating_mul(60_000))
    }
    pub fn from_hours(h: u64) -> SimTime {
        SimTime(h.saturating_mul(3_600_000))
    }

    pub fn millis(self) -> u64 {
        self.0
    }

    /// 饱和加法：`self + d`
    pub fn after(self, d: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(d.0))
    }

    /// 饱和减法：`self - earlier`，不足时为 0
    pub fn since(self, earlier: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(earlier.0))
    }
}
