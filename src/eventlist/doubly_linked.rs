//! 双向链表事件列表
//!
//! 新事件从尾部向前找插入点，适合大多数事件都调度在较远未来的模型；
//! 事件很多时每次插入是线性的。

use super::cursor::{CursorStore, StoreCursor};
use super::linked::{LinkIdx, LinkedNodes};
use super::{EventCursor, EventList};
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, EventKey};

#[derive(Debug, Default)]
pub struct DoublyLinked {
    nodes: LinkedNodes,
}

impl DoublyLinked {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CursorStore for DoublyLinked {
    type Pos = LinkIdx;

    fn first_pos(&self) -> Option<LinkIdx> {
        self.nodes.first()
    }

    fn last_pos(&self) -> Option<LinkIdx> {
        self.nodes.last()
    }

    fn next_pos(&self, p: LinkIdx) -> Option<LinkIdx> {
        self.nodes.next(p)
    }

    fn prev_pos(&self, p: LinkIdx) -> Option<LinkIdx> {
        self.nodes.prev(p)
    }

    fn entry_at(&self, p: LinkIdx) -> (EventId, EventKey) {
        self.nodes.entry(p)
    }

    fn insert_before_pos(&mut self, ev: EventId, key: EventKey, at: Option<LinkIdx>) {
        self.nodes.insert_before(ev, key, at);
    }

    fn insert_after_pos(&mut self, ev: EventId, key: EventKey, at: Option<LinkIdx>) {
        self.nodes.insert_after(ev, key, at);
    }

    fn remove_at(&mut self, p: LinkIdx) -> (EventId, EventKey) {
        self.nodes.unlink(p)
    }

    fn replace_at(&mut self, p: LinkIdx, ev: EventId, key: EventKey) -> ((EventId, EventKey), LinkIdx) {
        (self.nodes.replace_event(p, ev, key), p)
    }
}

impl EventList for DoublyLinked {
    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn add(&mut self, ev: EventId, key: EventKey) {
        let mut at = self.nodes.last();
        while let Some(n) = at {
            if self.nodes.key(n) <= key {
                break;
            }
            at = self.nodes.prev(n);
        }
        self.nodes.insert_after(ev, key, at);
    }

    fn add_first(&mut self, ev: EventId, key: EventKey) {
        self.nodes.insert_after(ev, key, None);
    }

    fn add_before(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()> {
        let other = self.nodes.find(other).ok_or(SimError::NotInList(other))?;
        self.nodes.insert_before(ev, key, Some(other));
        Ok(())
    }

    fn add_after(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()> {
        let other = self.nodes.find(other).ok_or(SimError::NotInList(other))?;
        self.nodes.insert_after(ev, key, Some(other));
        Ok(())
    }

    fn first(&self) -> Option<(EventId, EventKey)> {
        self.nodes.first().map(|n| self.nodes.entry(n))
    }

    fn first_matching(&self, pred: &mut dyn FnMut(EventId) -> bool) -> Option<EventId> {
        self.nodes.iter().map(|(ev, _)| ev).find(|ev| pred(*ev))
    }

    fn contains(&self, ev: EventId) -> bool {
        self.nodes.find(ev).is_some()
    }

    fn key_of(&self, ev: EventId) -> Option<EventKey> {
        self.nodes.find(ev).map(|n| self.nodes.key(n))
    }

    fn remove(&mut self, ev: EventId) -> bool {
        match self.nodes.find(ev) {
            Some(n) => {
                self.nodes.unlink(n);
                true
            }
            None => false,
        }
    }

    fn remove_first(&mut self) -> Option<(EventId, EventKey)> {
        let n = self.nodes.first()?;
        Some(self.nodes.unlink(n))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (EventId, EventKey)> + '_> {
        Box::new(self.nodes.iter())
    }

    fn cursor(&mut self) -> Box<dyn EventCursor + '_> {
        Box::new(StoreCursor::new(self))
    }
}
