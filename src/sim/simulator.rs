//! 仿真器
//!
//! 定义离散事件仿真的执行器：维护虚拟时钟、事件列表，并驱动运行循环。

use super::cursor::SimCursor;
use super::event::{Action, DEFAULT_PRIORITY, EventEntry, EventId, EventKey, EventSlab, FnAction};
use crate::continuous::ContinuousState;
use crate::error::{SimError, SimResult};
use crate::eventlist::{EventList, SplayTree};
use std::fmt::Write as _;
use tracing::{debug, info, trace, warn};

/// 执行器状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    /// 已请求停止，当前 action 返回后退出循环。
    Stopping,
}

/// 事件驱动仿真器：维护当前时间与事件列表。
///
/// 每个仿真器相互独立，内部不做任何同步；需要多线程时每个线程各持有一个。
pub struct Simulator {
    now: f64,
    list: Box<dyn EventList>,
    events: EventSlab,
    next_seq: u64,
    state: RunState,
    /// 最近一次运行是否已经结束或被 `stop()` 叫停
    stopped: bool,
    current: Option<EventId>,
    executed: u64,
    pub(crate) continuous: ContinuousState,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("now", &self.now)
            .field("state", &self.state)
            .field("pending", &self.list.len())
            .field("events", &self.events.len())
            .field("executed", &self.executed)
            .finish()
    }
}

/// 运行循环退出时（包括 action 出错或 panic）恢复执行器状态。
struct RunGuard<'a> {
    sim: &'a mut Simulator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.sim.state = RunState::Idle;
        self.sim.stopped = true;
        // 只有 action panic 时 current 才会留到这里；它的 action 已随栈展开丢失
        if let Some(id) = self.sim.current.take() {
            warn!(event = %id, "action panic，销毁该事件");
            self.sim.cancel(id);
            self.sim.events.remove(id);
        }
    }
}

impl Simulator {
    /// 使用 splay tree 事件列表。
    pub fn new() -> Self {
        Self::with_event_list(Box::new(SplayTree::new()))
    }

    pub fn with_event_list(list: Box<dyn EventList>) -> Self {
        Self {
            now: 0.0,
            list,
            events: EventSlab::default(),
            next_seq: 0,
            state: RunState::Idle,
            stopped: true,
            current: None,
            executed: 0,
            continuous: ContinuousState::default(),
        }
    }

    /// 获取当前仿真时间
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_simulating(&self) -> bool {
        self.state != RunState::Idle
    }

    /// 新建的仿真器、运行结束后以及 `stop()` 之后为 `true`；`init` 和开始运行时清除。
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// 正在执行的事件。
    pub fn current_event(&self) -> Option<EventId> {
        self.current
    }

    /// 自上次 `init` 以来执行过的事件数。
    pub fn executed_events(&self) -> u64 {
        self.executed
    }

    pub fn event_list(&self) -> &dyn EventList {
        self.list.as_ref()
    }

    /// 待执行的事件数。
    pub fn pending(&self) -> usize {
        self.list.len()
    }

    /// 仍然存活的事件句柄数，包括未调度的事件。
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// 时钟归零并清空事件列表；连续变量全部停止积分（保留其当前值）。
    pub fn init(&mut self) {
        self.now = 0.0;
        self.list.clear();
        self.events.unschedule_all();
        self.state = RunState::Idle;
        self.stopped = false;
        self.current = None;
        self.executed = 0;
        self.continuous.reset();
        debug!("仿真器已重置");
    }

    /// 换用另一种事件列表实现，然后 `init`。
    pub fn init_with(&mut self, list: Box<dyn EventList>) {
        self.list = list;
        self.init();
    }

    // ---- 事件的创建与查询 ----

    /// 创建一个未调度的事件。
    pub fn create_event<A: Action>(&mut self, action: A) -> EventId {
        let kind = action.kind();
        self.events.insert(EventEntry {
            time: None,
            priority: DEFAULT_PRIORITY,
            seq: 0,
            kind,
            transient: false,
            action: Some(Box::new(action)),
        })
    }

    pub fn create_event_fn<F>(&mut self, f: F) -> EventId
    where
        F: FnMut(&mut Simulator) -> SimResult<()> + 'static,
    {
        self.create_named_event_fn("fn", f)
    }

    /// 创建一个带种类名的闭包事件，种类名供 `first_of_kind` 使用。
    pub fn create_named_event_fn<F>(&mut self, kind: &'static str, f: F) -> EventId
    where
        F: FnMut(&mut Simulator) -> SimResult<()> + 'static,
    {
        self.create_event(FnAction { kind, f })
    }

    /// 销毁事件句柄；仍在列表中的事件会先被取消。
    pub fn remove_event(&mut self, id: EventId) -> SimResult<()> {
        self.cancel(id);
        self.events
            .remove(id)
            .map(|_| ())
            .ok_or(SimError::UnknownEvent(id))
    }

    pub fn is_scheduled(&self, id: EventId) -> bool {
        self.events.get(id).is_some_and(|e| e.time.is_some())
    }

    /// 计划执行时间；未调度时为 `None`。
    pub fn event_time(&self, id: EventId) -> Option<f64> {
        self.events.get(id).and_then(|e| e.time)
    }

    pub fn priority(&self, id: EventId) -> Option<f64> {
        self.events.get(id).map(|e| e.priority)
    }

    /// 最近一次插入事件列表时分配的序号。
    pub fn insertion_seq(&self, id: EventId) -> Option<u64> {
        self.events.get(id).map(|e| e.seq)
    }

    pub fn event_kind(&self, id: EventId) -> Option<&'static str> {
        self.events.get(id).map(|e| e.kind)
    }

    /// 修改优先级；事件在列表中时拒绝修改，否则会破坏树的顺序。
    pub fn set_priority(&mut self, id: EventId, priority: f64) -> SimResult<()> {
        if priority.is_nan() {
            return Err(SimError::InvalidPriority { priority });
        }
        let entry = self.events.get_mut(id).ok_or(SimError::UnknownEvent(id))?;
        if entry.time.is_some() {
            return Err(SimError::ScheduledEventMutation(id));
        }
        entry.priority = priority;
        Ok(())
    }

    pub fn first_event(&self) -> Option<EventId> {
        self.list.first().map(|(id, _)| id)
    }

    /// 按执行顺序找第一个指定种类的事件。
    pub fn first_of_kind(&self, kind: &str) -> Option<EventId> {
        let events = &self.events;
        self.list
            .first_matching(&mut |id| events.get(id).is_some_and(|e| e.kind == kind))
    }

    /// 待执行事件的快照，按执行顺序。
    pub fn pending_events(&self) -> Vec<EventId> {
        self.list.iter().map(|(id, _)| id).collect()
    }

    /// 文本形式列出事件列表：每行 `时间, 优先级 : 种类`。
    pub fn dump_event_list(&self) -> String {
        let mut out = String::from("Contents of the event list:");
        for (id, key) in self.list.iter() {
            let kind = self.event_kind(id).unwrap_or("?");
            let _ = write!(out, "\n{:>12.7}, {:>8.4} : {}", key.time, key.priority, kind);
        }
        out
    }

    /// 独占事件列表的游标，初始指向第一个事件。
    pub fn event_cursor(&mut self) -> SimCursor<'_> {
        SimCursor::new(
            self.list.cursor(),
            &mut self.events,
            &mut self.next_seq,
            self.now,
        )
    }

    // ---- 调度操作 ----

    fn check_delay(delay: f64) -> SimResult<()> {
        // NaN 也在这里被拒绝
        if delay >= 0.0 {
            Ok(())
        } else {
            Err(SimError::InvalidDelay { delay })
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    fn unscheduled_entry(&mut self, id: EventId) -> SimResult<&mut EventEntry> {
        let entry = self.events.get_mut(id).ok_or(SimError::UnknownEvent(id))?;
        if entry.time.is_some() {
            return Err(SimError::AlreadyScheduled(id));
        }
        Ok(entry)
    }

    fn mark_scheduled(&mut self, id: EventId, key: EventKey) {
        let seq = self.bump_seq();
        if let Some(entry) = self.events.get_mut(id) {
            entry.time = Some(key.time);
            entry.priority = key.priority;
            entry.seq = seq;
        }
    }

    /// 在 `now + delay` 调度事件，排在同时间同优先级的已有事件之后。
    pub fn schedule(&mut self, id: EventId, delay: f64) -> SimResult<()> {
        Self::check_delay(delay)?;
        let priority = self.unscheduled_entry(id)?.priority;
        let key = EventKey::new(self.now + delay, priority);
        self.list.add(id, key);
        self.mark_scheduled(id, key);
        trace!(event = %id, time = key.time, priority, "调度事件");
        Ok(())
    }

    /// 让事件成为下一个执行的事件：时间为 `now`，优先级为 0。
    ///
    /// 若当前时刻已有优先级更小（负数）的事件，则沿用该优先级，以保持列表有序。
    pub fn schedule_next(&mut self, id: EventId) -> SimResult<()> {
        self.unscheduled_entry(id)?;
        let mut priority = 0.0;
        if let Some((_, first)) = self.list.first() {
            if first.time <= self.now && first.priority < priority {
                priority = first.priority;
            }
        }
        let key = EventKey::new(self.now, priority);
        self.list.add_first(id, key);
        self.mark_scheduled(id, key);
        trace!(event = %id, time = key.time, "调度为下一个事件");
        Ok(())
    }

    /// 复制 `other` 的时间与优先级，紧挨在它之前调度。
    pub fn schedule_before(&mut self, id: EventId, other: EventId) -> SimResult<()> {
        self.unscheduled_entry(id)?;
        let key = self.list.key_of(other).ok_or(SimError::NotInList(other))?;
        self.list.add_before(id, key, other)?;
        self.mark_scheduled(id, key);
        trace!(event = %id, other = %other, time = key.time, "调度在参照事件之前");
        Ok(())
    }

    /// 复制 `other` 的时间与优先级，紧挨在它之后调度。
    pub fn schedule_after(&mut self, id: EventId, other: EventId) -> SimResult<()> {
        self.unscheduled_entry(id)?;
        let key = self.list.key_of(other).ok_or(SimError::NotInList(other))?;
        self.list.add_after(id, key, other)?;
        self.mark_scheduled(id, key);
        trace!(event = %id, other = %other, time = key.time, "调度在参照事件之后");
        Ok(())
    }

    /// 取消事件。无论是否真的从列表中删除，事件都会回到未调度状态。
    pub fn cancel(&mut self, id: EventId) -> bool {
        let Some(entry) = self.events.get_mut(id) else {
            return false;
        };
        let removed = match entry.time {
            Some(t) if t >= self.now => self.list.remove(id),
            _ => false,
        };
        entry.time = None;
        if removed {
            trace!(event = %id, "取消事件");
        }
        removed
    }

    /// 原子地移除并在 `now + delay` 重新插入；事件必须已被调度。
    pub fn reschedule(&mut self, id: EventId, delay: f64) -> SimResult<()> {
        Self::check_delay(delay)?;
        let entry = self.events.get_mut(id).ok_or(SimError::UnknownEvent(id))?;
        if entry.time.is_none() {
            return Err(SimError::NotScheduled(id));
        }
        let priority = entry.priority;
        self.list.remove(id);
        let key = EventKey::new(self.now + delay, priority);
        self.list.add(id, key);
        self.mark_scheduled(id, key);
        trace!(event = %id, time = key.time, "重新调度事件");
        Ok(())
    }

    /// 取消第一个指定种类的事件；没有这样的事件时返回 `false`。
    pub fn cancel_first_of_kind(&mut self, kind: &str) -> bool {
        match self.first_of_kind(kind) {
            Some(id) => self.cancel(id),
            None => false,
        }
    }

    /// 创建并调度一个闭包事件。
    ///
    /// 返回的句柄只在事件执行前有效：执行后若 action 没有重新调度它，事件即被销毁。
    pub fn schedule_fn<F>(&mut self, delay: f64, f: F) -> SimResult<EventId>
    where
        F: FnMut(&mut Simulator) -> SimResult<()> + 'static,
    {
        Self::check_delay(delay)?;
        let id = self.create_event_fn(f);
        self.mark_transient(id);
        self.schedule(id, delay)?;
        Ok(id)
    }

    /// 在 `now + delay` 调度一个调用 `stop()` 的事件；与 `schedule_fn` 一样执行后自动销毁。
    pub fn stop_at(&mut self, delay: f64) -> SimResult<EventId> {
        Self::check_delay(delay)?;
        let id = self.create_named_event_fn("stop", |sim| {
            sim.stop();
            Ok(())
        });
        self.mark_transient(id);
        self.schedule(id, delay)?;
        Ok(id)
    }

    /// 执行后若没有被重新调度就自动销毁。
    fn mark_transient(&mut self, id: EventId) {
        if let Some(entry) = self.events.get_mut(id) {
            entry.transient = true;
        }
    }

    // ---- 运行循环 ----

    /// 运行直到事件列表为空或 `stop()` 被调用。
    ///
    /// 在 `stop()` 之后再次调用会从剩余的事件列表继续。
    #[tracing::instrument(skip(self), fields(now = self.now, pending = self.list.len()))]
    pub fn start(&mut self) -> SimResult<()> {
        if self.is_simulating() {
            return Err(SimError::AlreadyRunning);
        }
        if self.list.is_empty() {
            return Err(SimError::EmptyEventList);
        }
        info!("▶️  开始运行仿真");
        let guard = RunGuard { sim: self };
        guard.sim.drain(None)
    }

    /// 运行时间不超过 `horizon` 的事件；时钟停在最后执行的事件上。
    #[tracing::instrument(skip(self), fields(now = self.now))]
    pub fn run_until(&mut self, horizon: f64) -> SimResult<()> {
        if self.is_simulating() {
            return Err(SimError::AlreadyRunning);
        }
        let guard = RunGuard { sim: self };
        guard.sim.drain(Some(horizon))
    }

    /// 请求在当前 action 返回后结束运行循环；可重复调用。
    pub fn stop(&mut self) {
        self.stopped = true;
        if self.state == RunState::Running {
            debug!(now = self.now, "⏹️  请求停止仿真");
            self.state = RunState::Stopping;
        }
    }

    fn drain(&mut self, horizon: Option<f64>) -> SimResult<()> {
        self.state = RunState::Running;
        self.stopped = false;
        let mut fired = 0u64;
        while self.state == RunState::Running {
            if let Some(horizon) = horizon {
                match self.list.first() {
                    Some((_, key)) if key.time <= horizon => {}
                    _ => break,
                }
            }
            let Some((id, key)) = self.list.remove_first() else {
                break;
            };
            self.now = key.time;
            let action = self.events.get_mut(id).and_then(|entry| {
                entry.time = None;
                entry.action.take()
            });
            let Some(mut action) = action else {
                return Err(SimError::UnknownEvent(id));
            };

            fired += 1;
            self.executed += 1;
            self.current = Some(id);
            trace!(event = %id, now = self.now, remaining = self.list.len(), "执行事件");

            let result = action.execute(self);
            // action 执行期间事件可能已被销毁，此时直接丢弃
            let mut finished = false;
            if let Some(entry) = self.events.get_mut(id) {
                entry.action = Some(action);
                finished = entry.transient && entry.time.is_none();
            }
            if finished {
                self.events.remove(id);
            }
            self.current = None;
            result?;
        }
        info!(fired, final_time = self.now, remaining = self.list.len(), "✅ 仿真结束");
        Ok(())
    }
}
