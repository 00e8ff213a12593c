//! 仿真核心模块
//!
//! 事件驱动仿真的基础组件：仿真时间、事件、世界与仿真器。
//! 内置的呼叫中心引擎（`crate::engine`）在其之上实现单日仿真。

mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

pub use event::Event;
pub use scheduled_event::ScheduledEvent;
pub use simulator::{RunOutcome, Simulator};
pub use time::{DAY_MILLIS, SimTime};
pub use world::World;
