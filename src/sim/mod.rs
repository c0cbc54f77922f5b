//! 仿真核心模块
//!
//! 此模块包含离散事件仿真的执行器：虚拟时钟、事件句柄与调度操作。

// 子模块声明
mod cursor;
mod event;
mod simulator;

// 重新导出公共接口
pub use cursor::SimCursor;
pub use event::{Action, DEFAULT_PRIORITY, EventId, EventKey};
pub use simulator::{RunState, Simulator};
