//! 配置与场景描述
//!
//! 所有结构都可以从 JSON 反序列化；缺省字段取合理默认值。

use crate::continuous::IntegMethod;
use crate::error::SimResult;
use crate::eventlist::{BalancedTree, BinaryTree, DoublyLinked, EventList, Henriksen, SplayTree};
use crate::sim::{DEFAULT_PRIORITY, Simulator};
use serde::{Deserialize, Serialize};

/// 仿真器配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub event_list: EventListKind,
    #[serde(default)]
    pub integration: Option<IntegrationConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventListKind {
    #[default]
    SplayTree,
    BinaryTree,
    DoublyLinked,
    Henriksen,
    BalancedTree,
}

impl EventListKind {
    pub fn build(self) -> Box<dyn EventList> {
        match self {
            EventListKind::SplayTree => Box::new(SplayTree::new()),
            EventListKind::BinaryTree => Box::new(BinaryTree::new()),
            EventListKind::DoublyLinked => Box::new(DoublyLinked::new()),
            EventListKind::Henriksen => Box::new(Henriksen::new()),
            EventListKind::BalancedTree => Box::new(BalancedTree::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub method: IntegMethod,
    pub step_size: f64,
}

impl Simulator {
    /// 按配置构造仿真器；步长非法时报错。
    pub fn from_config(cfg: &SimConfig) -> SimResult<Self> {
        let mut sim = Simulator::with_event_list(cfg.event_list.build());
        if let Some(integ) = cfg.integration {
            sim.continuous_mut().select(integ.method, integ.step_size)?;
        }
        Ok(sim)
    }
}

/// `event_trace` 的输入：一组带名字的事件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpec {
    #[serde(default)]
    pub config: SimConfig,
    pub events: Vec<TraceEventSpec>,
    /// 到这个时间（含）为止；缺省时运行到事件列表为空
    #[serde(default)]
    pub until: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEventSpec {
    pub name: String,
    #[serde(default)]
    pub delay: f64,
    #[serde(default = "default_priority")]
    pub priority: f64,
    #[serde(default)]
    pub mode: ScheduleMode,
}

fn default_priority() -> f64 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// `schedule(delay)`
    #[default]
    Schedule,
    /// `schedule_next()`，忽略 delay 与 priority
    Next,
}
