//! 世界 trait
//!
//! 事件所操作的业务状态（例如呼叫中心的队列与坐席）。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每执行完一个事件后调用；可在此调用 `sim.request_stop()` 提前结束。
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
