//! 仿真器
//!
//! 维护当前时间与事件队列，支持外部（世界）请求提前停止。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// `run_until` 的结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 到达 `until`（或队列为空）
    Reached,
    /// 世界在 `on_tick` 中请求了停止
    Stopped,
}

/// 事件驱动仿真器。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    stop_requested: bool,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行的事件数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 请求在当前事件执行完后停止
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// 调度事件在指定时间执行；早于当前时间的请求按当前时间处理。
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(now = ?self.now, at = ?at, seq, event = ev.name(), "调度事件");
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 执行所有 `at <= until` 的事件，然后把时间推进到 `until`。
    ///
    /// 被停止时时间停留在最后执行的事件处。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> RunOutcome {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else { break };
            self.now = item.at;
            self.executed += 1;
            item.ev.execute(self, world);
            world.on_tick(self);
            if self.stop_requested {
                debug!(now = ?self.now, remaining = self.q.len(), "仿真被请求停止");
                return RunOutcome::Stopped;
            }
        }
        self.now = self.now.max(until);
        RunOutcome::Reached
    }

    /// 丢弃队列中剩余的事件，返回丢弃的数量。
    pub fn drain(&mut self) -> usize {
        let n = self.q.len();
        self.q.clear();
        n
    }
}
