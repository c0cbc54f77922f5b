//! 仿真器层面的事件列表游标
//!
//! 包装 [`EventCursor`]，在插入/删除/替换时同步更新事件自身的调度状态。

use super::event::{EventEntry, EventId, EventKey, EventSlab};
use crate::error::{SimError, SimResult};
use crate::eventlist::EventCursor;

/// 独占仿真器事件列表的游标，存活期间不能做其他调度操作。
pub struct SimCursor<'a> {
    inner: Box<dyn EventCursor + 'a>,
    events: &'a mut EventSlab,
    next_seq: &'a mut u64,
    now: f64,
}

impl<'a> SimCursor<'a> {
    pub(super) fn new(
        inner: Box<dyn EventCursor + 'a>,
        events: &'a mut EventSlab,
        next_seq: &'a mut u64,
        now: f64,
    ) -> Self {
        Self {
            inner,
            events,
            next_seq,
            now,
        }
    }

    pub fn current(&self) -> Option<EventId> {
        self.inner.current().map(|(id, _)| id)
    }

    pub fn current_key(&self) -> Option<EventKey> {
        self.inner.current().map(|(_, key)| key)
    }

    pub fn move_next(&mut self) {
        self.inner.move_next();
    }

    pub fn move_prev(&mut self) {
        self.inner.move_prev();
    }

    /// 以请求的绝对时间和事件自身的优先级构造键；事件必须未调度。
    fn requested_key(&self, id: EventId, time: f64) -> SimResult<EventKey> {
        if !(time >= self.now) {
            return Err(SimError::PastTime { time, now: self.now });
        }
        let entry = self.events.get(id).ok_or(SimError::UnknownEvent(id))?;
        if entry.time.is_some() {
            return Err(SimError::AlreadyScheduled(id));
        }
        Ok(EventKey::new(time, entry.priority))
    }

    fn commit(&mut self, id: EventId, key: EventKey) {
        let seq = *self.next_seq;
        *self.next_seq = seq.wrapping_add(1);
        if let Some(entry) = self.events.get_mut(id) {
            entry.time = Some(key.time);
            entry.priority = key.priority;
            entry.seq = seq;
        }
    }

    fn release(entry: Option<&mut EventEntry>) {
        if let Some(entry) = entry {
            entry.time = None;
        }
    }

    /// 在当前位置之前插入。时间与优先级会被调整到前后邻居之间，返回实际的键。
    pub fn insert_before(&mut self, id: EventId, time: f64) -> SimResult<EventKey> {
        let key = self.requested_key(id, time)?;
        let key = self.inner.insert_before(id, key);
        self.commit(id, key);
        Ok(key)
    }

    /// 在当前位置之后插入。
    pub fn insert_after(&mut self, id: EventId, time: f64) -> SimResult<EventKey> {
        let key = self.requested_key(id, time)?;
        let key = self.inner.insert_after(id, key);
        self.commit(id, key);
        Ok(key)
    }

    /// 删除当前事件（事件回到未调度状态），游标移到后继。
    pub fn remove_current(&mut self) -> Option<EventId> {
        let (id, _) = self.inner.remove_current()?;
        Self::release(self.events.get_mut(id));
        Some(id)
    }

    /// 用 `id` 替换当前事件，返回被替换（现已未调度）的事件。
    pub fn replace_current(&mut self, id: EventId, time: f64) -> SimResult<Option<EventId>> {
        let key = self.requested_key(id, time)?;
        let Some((old, _)) = self.inner.replace_current(id, key) else {
            return Ok(None);
        };
        Self::release(self.events.get_mut(old));
        if let Some((_, key)) = self.inner.current() {
            self.commit(id, key);
        }
        Ok(Some(old))
    }
}
