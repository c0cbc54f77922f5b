//! 演示和示例代码
//!
//! 命令行工具与测试共用的场景：指数衰减方程的积分，以及按 JSON 描述调度一组事件。

use crate::config::{EventListKind, ScheduleMode, TraceSpec};
use crate::continuous::IntegMethod;
use crate::error::SimResult;
use crate::sim::{Action, Simulator};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// 指数衰减 `dy/dt = rate·y` 的积分选项
#[derive(Debug, Clone)]
pub struct DecayOpts {
    pub method: IntegMethod,
    pub step_size: f64,
    pub steps: u64,
    pub initial: f64,
    pub rate: f64,
    pub event_list: EventListKind,
}

impl Default for DecayOpts {
    fn default() -> Self {
        Self {
            method: IntegMethod::RungeKutta4,
            step_size: 0.125,
            steps: 8,
            initial: 1.0,
            rate: -1.0,
            event_list: EventListKind::SplayTree,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecayReport {
    pub method: IntegMethod,
    pub step_size: f64,
    pub steps: u64,
    pub time: f64,
    pub value: f64,
    pub exact: f64,
    pub abs_error: f64,
}

/// 积分 `steps` 步后停止，与解析解 `initial·e^{rate·t}` 比较。
pub fn run_decay(opts: &DecayOpts) -> SimResult<DecayReport> {
    let mut sim = Simulator::with_event_list(opts.event_list.build());
    sim.continuous_mut().select(opts.method, opts.step_size)?;

    let rate = opts.rate;
    let y = sim.create_continuous(move |_t, s| rate * s.value());
    sim.set_continuous_value(y, opts.initial)?;

    if opts.steps > 0 {
        let steps = opts.steps;
        let mut done = 0u64;
        sim.set_after_step(y, move |sim, _| {
            done += 1;
            if done >= steps {
                sim.stop();
            }
            Ok(())
        })?;
        sim.start_integ(y)?;
        sim.start()?;
    }

    let time = sim.now();
    let value = sim.continuous().value(y).unwrap_or(f64::NAN);
    let exact = opts.initial * (opts.rate * time).exp();
    Ok(DecayReport {
        method: opts.method,
        step_size: opts.step_size,
        steps: opts.steps,
        time,
        value,
        exact,
        abs_error: (value - exact).abs(),
    })
}

/// 一次事件触发的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub name: String,
    pub time: f64,
}

struct TraceEvent {
    name: String,
    log: Rc<RefCell<Vec<TraceRecord>>>,
}

impl Action for TraceEvent {
    fn execute(&mut self, sim: &mut Simulator) -> SimResult<()> {
        self.log.borrow_mut().push(TraceRecord {
            name: self.name.clone(),
            time: sim.now(),
        });
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "trace"
    }
}

/// 按描述依次调度事件并运行，返回触发顺序。
pub fn run_trace(spec: &TraceSpec) -> SimResult<Vec<TraceRecord>> {
    let mut sim = Simulator::from_config(&spec.config)?;
    let log = Rc::new(RefCell::new(Vec::new()));

    for ev in &spec.events {
        let id = sim.create_event(TraceEvent {
            name: ev.name.clone(),
            log: Rc::clone(&log),
        });
        match ev.mode {
            ScheduleMode::Schedule => {
                sim.set_priority(id, ev.priority)?;
                sim.schedule(id, ev.delay)?;
            }
            ScheduleMode::Next => sim.schedule_next(id)?,
        }
    }

    match spec.until {
        Some(until) => sim.run_until(until)?,
        None if sim.pending() > 0 => sim.start()?,
        None => {}
    }

    let records = log.borrow().clone();
    Ok(records)
}
