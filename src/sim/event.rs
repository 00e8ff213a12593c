//! 事件 trait
//!
//! 定义仿真事件接口。

use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以便事件在执行时转移自身数据的所有权。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);

    /// 事件名（用于日志）
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
