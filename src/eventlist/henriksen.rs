//! Henriksen 索引链表
//!
//! 事件放在双向链表中，上面再盖一层按键递减排列的索引数组。插入时先在索引上
//! 二分，再从命中的索引节点往前线性扫描；每扫过 4 个节点就把当前节点"拉"进
//! 索引，使索引大致均匀地覆盖列表。
//!
//! 索引不变量：各槽位指向的节点在链表中的位置从前往后单调不增，
//! `Top` 在所有节点之后，`Bottom` 在所有节点之前。

use super::cursor::{CursorStore, StoreCursor};
use super::linked::{LinkIdx, LinkedNodes};
use super::{EventCursor, EventList};
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, EventKey};
use tracing::trace;

/// 扫描多少个节点后把一个节点拉进索引。
const PULL_INTERVAL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// 上界，永远位于索引第 0 位
    Top,
    Node(LinkIdx),
    /// 下界，填充尚未使用的槽位
    Bottom,
}

#[derive(Debug)]
pub struct Henriksen {
    nodes: LinkedNodes,
    index: Vec<Slot>,
}

impl Default for Henriksen {
    fn default() -> Self {
        Self {
            nodes: LinkedNodes::default(),
            index: vec![Slot::Top],
        }
    }
}

impl Henriksen {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前索引长度。
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    fn above(&self, slot: Slot, key: EventKey) -> bool {
        match slot {
            Slot::Top => true,
            Slot::Node(n) => self.nodes.key(n) > key,
            Slot::Bottom => false,
        }
    }

    /// 最后一个键严格大于 `key` 的槽位。
    fn find_index(&self, key: EventKey) -> usize {
        // 第 0 位总是 Top，所以结果至少为 1
        self.index.partition_point(|s| self.above(*s, key)) - 1
    }

    /// 新事件应插在哪个节点之后；`None` 表示放到最前。
    fn find_slot(&mut self, key: EventKey) -> Option<LinkIdx> {
        let mut i = self.find_index(key);
        let mut at = match self.index[i] {
            Slot::Top => self.nodes.last(),
            Slot::Node(n) => self.nodes.prev(n),
            Slot::Bottom => None,
        };
        let mut count = 0;
        while let Some(n) = at {
            if self.nodes.key(n) <= key {
                break;
            }
            count += 1;
            if count == PULL_INTERVAL {
                count = 0;
                i += 1;
                if i >= self.index.len() {
                    let len = self.index.len();
                    self.index.resize(len * 2, Slot::Bottom);
                    trace!(size = len * 2, "henriksen 索引扩容");
                }
                self.index[i] = Slot::Node(n);
            }
            at = self.nodes.prev(n);
        }
        at
    }

    /// 节点即将离开链表：指向它的槽位改为指向其前驱。
    fn forget(&mut self, n: LinkIdx) {
        let key = self.nodes.key(n);
        let replacement = match self.nodes.prev(n) {
            Some(p) => Slot::Node(p),
            None => Slot::Bottom,
        };
        let start = self.index.partition_point(|s| self.above(*s, key));
        for i in start..self.index.len() {
            let Slot::Node(m) = self.index[i] else {
                break;
            };
            if self.nodes.key(m) != key {
                break;
            }
            if m == n {
                self.index[i] = replacement;
            }
        }
    }

    fn unlink(&mut self, n: LinkIdx) -> (EventId, EventKey) {
        self.forget(n);
        self.nodes.unlink(n)
    }
}

impl CursorStore for Henriksen {
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
        self.unlink(p)
    }

    fn replace_at(&mut self, p: LinkIdx, ev: EventId, key: EventKey) -> ((EventId, EventKey), LinkIdx) {
        (self.nodes.replace_event(p, ev, key), p)
    }
}

impl EventList for Henriksen {
    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.index.push(Slot::Top);
    }

    fn add(&mut self, ev: EventId, key: EventKey) {
        let at = self.find_slot(key);
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
                self.unlink(n);
                true
            }
            None => false,
        }
    }

    fn remove_first(&mut self) -> Option<(EventId, EventKey)> {
        let head = self.nodes.first()?;
        let first_key = self.nodes.key(head);
        // 前一半索引都已落到首事件之下时，把索引减半
        let half = self.index.len() / 2;
        if half > 0 && !self.above(self.index[half], first_key) {
            self.index.truncate(half);
        }
        Some(self.unlink(head))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (EventId, EventKey)> + '_> {
        Box::new(self.nodes.iter())
    }

    fn cursor(&mut self) -> Box<dyn EventCursor + '_> {
        Box::new(StoreCursor::new(self))
    }
}
