//! 连续变量集合
//!
//! 保存所有连续变量、当前被积分的活动集合以及所选的积分方法。
//! 同一仿真器内所有活动变量共用一个步长和方法，每步同时推进。

use super::method::IntegMethod;
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, Simulator};
use std::fmt;
use tracing::debug;

/// 连续变量句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// 导数函数：`(t, 状态视图) -> dValue/dt`。
pub type DerivativeFn = Box<dyn Fn(f64, &StateView<'_>) -> f64>;

/// 每个积分步之后调用的钩子。
pub type AfterStepFn = Box<dyn FnMut(&mut Simulator, VarId) -> SimResult<()>>;

/// 求导时看到的状态：在 Runge-Kutta 的中间级里，`value` 返回的是该级的中间值。
pub struct StateView<'a> {
    state: &'a ContinuousState,
    var: VarId,
}

impl StateView<'_> {
    pub fn value(&self) -> f64 {
        self.value_of(self.var)
    }

    /// 其他变量的值，用于耦合方程组；未知句柄得到 NaN。
    pub fn value_of(&self, other: VarId) -> f64 {
        self.state.vars.get(other.0).map_or(f64::NAN, |v| v.value)
    }
}

pub(crate) struct ContinuousVar {
    pub(crate) value: f64,
    pub(crate) active: bool,
    derivative: DerivativeFn,
    pub(crate) after_step: Option<AfterStepFn>,
    /// 每步之后以 `schedule_next` 触发的辅助事件
    pub(crate) step_event: Option<EventId>,
}

#[derive(Default)]
pub struct ContinuousState {
    method: Option<IntegMethod>,
    step_size: f64,
    vars: Vec<ContinuousVar>,
    active: Vec<VarId>,
    pub(crate) step_event: Option<EventId>,
    /// 已调度的积分步：(起点时间, 步长)
    pub(crate) pending_step: Option<(f64, f64)>,
}

impl fmt::Debug for ContinuousState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuousState")
            .field("method", &self.method)
            .field("step_size", &self.step_size)
            .field("variables", &self.vars.len())
            .field("active", &self.active)
            .field("pending_step", &self.pending_step)
            .finish()
    }
}

impl ContinuousState {
    pub fn method(&self) -> Option<IntegMethod> {
        self.method
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// 选择积分方法与步长。正在进行的积分从下一次调度起使用新步长。
    pub fn select(&mut self, method: IntegMethod, step_size: f64) -> SimResult<()> {
        if !(step_size > 0.0 && step_size.is_finite()) {
            return Err(SimError::InvalidStepSize(step_size));
        }
        debug!(?method, step_size, "选择积分方法");
        self.method = Some(method);
        self.step_size = step_size;
        Ok(())
    }

    pub fn select_euler(&mut self, h: f64) -> SimResult<()> {
        self.select(IntegMethod::Euler, h)
    }

    pub fn select_runge_kutta2(&mut self, h: f64) -> SimResult<()> {
        self.select(IntegMethod::RungeKutta2, h)
    }

    pub fn select_runge_kutta4(&mut self, h: f64) -> SimResult<()> {
        self.select(IntegMethod::RungeKutta4, h)
    }

    /// 当前被积分的变量，按开始积分的先后排列。
    pub fn active_variables(&self) -> &[VarId] {
        &self.active
    }

    pub fn variables(&self) -> usize {
        self.vars.len()
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        self.vars.get(var.0).map(|v| v.value)
    }

    pub fn is_active(&self, var: VarId) -> bool {
        self.vars.get(var.0).is_some_and(|v| v.active)
    }

    pub(crate) fn add_var(&mut self, derivative: DerivativeFn) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(ContinuousVar {
            value: 0.0,
            active: false,
            derivative,
            after_step: None,
            step_event: None,
        });
        id
    }

    pub(crate) fn var(&self, var: VarId) -> SimResult<&ContinuousVar> {
        self.vars.get(var.0).ok_or(SimError::UnknownVariable(var))
    }

    pub(crate) fn var_mut(&mut self, var: VarId) -> SimResult<&mut ContinuousVar> {
        self.vars.get_mut(var.0).ok_or(SimError::UnknownVariable(var))
    }

    pub(crate) fn set_value(&mut self, var: VarId, value: f64) -> SimResult<()> {
        let v = self.var_mut(var)?;
        if v.active {
            return Err(SimError::ActiveVariableMutation(var));
        }
        v.value = value;
        Ok(())
    }

    /// 加入活动集合；已在集合中时不做任何事。
    pub(crate) fn activate(&mut self, var: VarId) -> SimResult<()> {
        let v = self.var_mut(var)?;
        if !v.active {
            v.active = true;
            self.active.push(var);
        }
        Ok(())
    }

    /// 移出活动集合，返回集合是否因此变空。
    pub(crate) fn deactivate(&mut self, var: VarId) -> SimResult<bool> {
        let v = self.var_mut(var)?;
        if !v.active {
            return Ok(false);
        }
        v.active = false;
        self.active.retain(|&a| a != var);
        Ok(self.active.is_empty())
    }

    pub(crate) fn reset(&mut self) {
        for v in &mut self.vars {
            v.active = false;
        }
        self.active.clear();
        self.pending_step = None;
    }

    fn derivatives(&self, ids: &[VarId], t: f64) -> Vec<f64> {
        ids.iter()
            .map(|&var| {
                let view = StateView { state: self, var };
                (self.vars[var.0].derivative)(t, &view)
            })
            .collect()
    }

    /// 把所有活动变量从 `t0` 推进一步 `h`。
    ///
    /// 每一级先为全部变量求导，再统一更新数值，变量之间看不到彼此的下一级数值。
    pub(crate) fn advance(&mut self, t0: f64, h: f64) {
        let Some(method) = self.method else {
            return;
        };
        let tab = method.tableau();
        let ids = self.active.clone();
        let base: Vec<f64> = ids.iter().map(|v| self.vars[v.0].value).collect();
        let mut acc = vec![0.0; ids.len()];
        let last = tab.b.len() - 1;

        for stage in 0..last {
            let k = self.derivatives(&ids, t0 + h * tab.c[stage]);
            for (i, var) in ids.iter().enumerate() {
                acc[i] += tab.b[stage] * k[i];
                self.vars[var.0].value = base[i] + h * tab.a[stage] * k[i];
            }
        }

        let k = self.derivatives(&ids, t0 + h * tab.c[last]);
        for (i, var) in ids.iter().enumerate() {
            self.vars[var.0].value = base[i] + h * (acc[i] + tab.b[last] * k[i]);
        }
    }
}
