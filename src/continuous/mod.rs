//! 连续时间变量
//!
//! 在离散事件之间以固定步长对连续变量做数值积分（Euler / RK2 / RK4）。

mod driver;
mod method;
mod state;

pub use driver::STEP_EVENT_KIND;
pub use method::IntegMethod;
pub use state::{AfterStepFn, ContinuousState, DerivativeFn, StateView, VarId};
