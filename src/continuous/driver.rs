//! 积分驱动
//!
//! 积分步本身就是仿真器里的一个普通事件：每次触发推进所有活动变量，
//! 然后在 `now + h` 重新调度自己，再依次触发辅助事件与步后钩子。

use super::state::{ContinuousState, StateView, VarId};
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, Simulator};
use tracing::{debug, trace};

/// 积分步事件的种类名。
pub const STEP_EVENT_KIND: &str = "integration_step";

impl Simulator {
    pub fn continuous(&self) -> &ContinuousState {
        &self.continuous
    }

    pub fn continuous_mut(&mut self) -> &mut ContinuousState {
        &mut self.continuous
    }

    /// 创建连续变量（初值 0，未激活）。
    pub fn create_continuous<F>(&mut self, derivative: F) -> VarId
    where
        F: Fn(f64, &StateView<'_>) -> f64 + 'static,
    {
        self.continuous.add_var(Box::new(derivative))
    }

    /// 设置初值；变量正在积分时拒绝。
    pub fn set_continuous_value(&mut self, var: VarId, value: f64) -> SimResult<()> {
        self.continuous.set_value(var, value)
    }

    pub fn set_after_step<F>(&mut self, var: VarId, hook: F) -> SimResult<()>
    where
        F: FnMut(&mut Simulator, VarId) -> SimResult<()> + 'static,
    {
        self.continuous.var_mut(var)?.after_step = Some(Box::new(hook));
        Ok(())
    }

    /// 设置每步之后立即触发的辅助事件。
    pub fn set_step_event(&mut self, var: VarId, ev: Option<EventId>) -> SimResult<()> {
        self.continuous.var_mut(var)?.step_event = ev;
        Ok(())
    }

    /// 开始积分；若这是唯一的活动变量，则在 `now + h` 调度积分步。
    pub fn start_integ(&mut self, var: VarId) -> SimResult<()> {
        if self.continuous.method().is_none() {
            return Err(SimError::NoIntegrationMethod);
        }
        self.continuous.activate(var)?;
        let step_pending = self
            .continuous
            .step_event
            .is_some_and(|ev| self.is_scheduled(ev));
        if !step_pending {
            self.schedule_integration_step()?;
        }
        debug!(%var, now = self.now(), active = self.continuous.active_variables().len(), "开始积分");
        Ok(())
    }

    pub fn start_integ_with(&mut self, var: VarId, value: f64) -> SimResult<()> {
        self.continuous.set_value(var, value)?;
        self.start_integ(var)
    }

    /// 停止积分；活动集合变空时取消积分步。
    pub fn stop_integ(&mut self, var: VarId) -> SimResult<()> {
        let now_empty = self.continuous.deactivate(var)?;
        if now_empty {
            if let Some(ev) = self.continuous.step_event {
                self.cancel(ev);
            }
            self.continuous.pending_step = None;
        }
        debug!(%var, now = self.now(), "停止积分");
        Ok(())
    }

    fn schedule_integration_step(&mut self) -> SimResult<()> {
        let h = self.continuous.step_size();
        let ev = match self.continuous.step_event {
            Some(ev) => ev,
            None => {
                let ev = self.create_named_event_fn(STEP_EVENT_KIND, |sim| sim.integration_step());
                self.continuous.step_event = Some(ev);
                ev
            }
        };
        self.schedule(ev, h)?;
        self.continuous.pending_step = Some((self.now(), h));
        Ok(())
    }

    fn integration_step(&mut self) -> SimResult<()> {
        let Some((origin, h)) = self.continuous.pending_step.take() else {
            return Ok(());
        };
        self.continuous.advance(origin, h);
        trace!(t0 = origin, h, now = self.now(), "完成积分步");

        let active = self.continuous.active_variables().to_vec();
        if active.is_empty() {
            return Ok(());
        }
        self.schedule_integration_step()?;

        // schedule_next 总是插到最前，逆序调度使辅助事件按激活顺序触发
        for &var in active.iter().rev() {
            let Some(ev) = self.continuous.var(var)?.step_event else {
                continue;
            };
            if !self.is_scheduled(ev) {
                self.schedule_next(ev)?;
            }
        }

        for var in active {
            let Some(mut hook) = self.continuous.var_mut(var)?.after_step.take() else {
                continue;
            };
            let result = hook(self, var);
            // 钩子可能为自己装了新的钩子，此时保留新的
            let slot = &mut self.continuous.var_mut(var)?.after_step;
            if slot.is_none() {
                *slot = Some(hook);
            }
            result?;
        }
        Ok(())
    }
}
