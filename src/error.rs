//! 错误类型
//!
//! 内核只区分两类失败：违反调用约定（返回 `Err`）与预期中的"否定结果"
//! （用 `bool` / `Option` 表达，不在这里出现）。

use crate::continuous::VarId;
use crate::sim::EventId;
use thiserror::Error;

/// 仿真内核的错误。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// 负的（或 NaN）调度延迟。
    #[error("cannot schedule in the past: delay = {delay}")]
    InvalidDelay { delay: f64 },

    #[error("invalid event priority: {priority}")]
    InvalidPriority { priority: f64 },

    /// 游标插入时请求的绝对时间早于当前时钟。
    #[error("time {time} is before current time {now}")]
    PastTime { time: f64, now: f64 },

    #[error("event {0} is already scheduled")]
    AlreadyScheduled(EventId),

    #[error("event {0} is not scheduled")]
    NotScheduled(EventId),

    /// `add_before` / `add_after` 的参照事件不在列表中。
    #[error("event {0} is not in the event list")]
    NotInList(EventId),

    #[error("start() called with an empty event list")]
    EmptyEventList,

    /// 在 action 内部再次调用 `start()`。
    #[error("simulator is already running")]
    AlreadyRunning,

    /// 句柄已失效或来自另一个仿真器。
    #[error("unknown event handle {0}")]
    UnknownEvent(EventId),

    #[error("event {0} is scheduled; its time and priority are frozen")]
    ScheduledEventMutation(EventId),

    #[error("no integration method selected")]
    NoIntegrationMethod,

    #[error("invalid integration step size: {0}")]
    InvalidStepSize(f64),

    #[error("unknown continuous variable {0}")]
    UnknownVariable(VarId),

    #[error("continuous variable {0} is being integrated; its value is read-only")]
    ActiveVariableMutation(VarId),

    /// 用户 action 自行报告的失败。
    #[error("action failed: {0}")]
    Action(String),
}

impl SimError {
    pub fn action(msg: impl Into<String>) -> Self {
        SimError::Action(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
