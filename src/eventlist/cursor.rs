//! 通用的事件列表游标
//!
//! 游标在存活期间独占列表的可变借用，因此遍历中的增删不会与其他修改交错。
//! 各种实现只需要提供按"位置"访问与链接的 [`CursorStore`]。

use super::arena::{NodeArena, NodeIdx};
use super::{EventCursor, clamp_key};
use crate::sim::{EventId, EventKey};

/// 基于 arena 的树：访问 arena，以及按树自己的策略删除节点。
pub(crate) trait ArenaTree {
    fn arena(&self) -> &NodeArena;
    fn arena_mut(&mut self) -> &mut NodeArena;
    /// 从树上摘下 `n` 并回收。
    fn remove_node(&mut self, n: NodeIdx) -> (EventId, EventKey);
}

/// 游标需要的按位置操作。位置在其他位置的插入和删除之后仍然有效。
pub(crate) trait CursorStore {
    type Pos: Copy;

    fn first_pos(&self) -> Option<Self::Pos>;
    fn last_pos(&self) -> Option<Self::Pos>;
    fn next_pos(&self, p: Self::Pos) -> Option<Self::Pos>;
    fn prev_pos(&self, p: Self::Pos) -> Option<Self::Pos>;
    fn entry_at(&self, p: Self::Pos) -> (EventId, EventKey);

    /// 插到 `at` 之前；`None` 时追加到末尾。
    fn insert_before_pos(&mut self, ev: EventId, key: EventKey, at: Option<Self::Pos>);
    /// 插到 `at` 之后；`None` 时放到最前。
    fn insert_after_pos(&mut self, ev: EventId, key: EventKey, at: Option<Self::Pos>);
    fn remove_at(&mut self, p: Self::Pos) -> (EventId, EventKey);
    /// 在同一位置换上另一个事件，返回旧事件和新事件所在的位置。
    fn replace_at(&mut self, p: Self::Pos, ev: EventId, key: EventKey) -> ((EventId, EventKey), Self::Pos);
}

impl<T: ArenaTree> CursorStore for T {
    type Pos = NodeIdx;

    fn first_pos(&self) -> Option<NodeIdx> {
        self.arena().first()
    }

    fn last_pos(&self) -> Option<NodeIdx> {
        self.arena().last()
    }

    fn next_pos(&self, p: NodeIdx) -> Option<NodeIdx> {
        self.arena().successor(p)
    }

    fn prev_pos(&self, p: NodeIdx) -> Option<NodeIdx> {
        self.arena().predecessor(p)
    }

    fn entry_at(&self, p: NodeIdx) -> (EventId, EventKey) {
        self.arena().entry(p)
    }

    fn insert_before_pos(&mut self, ev: EventId, key: EventKey, at: Option<NodeIdx>) {
        let arena = self.arena_mut();
        let e = arena.alloc(ev, key);
        match at {
            Some(c) => arena.link_before(e, c),
            None => arena.link_last(e),
        }
    }

    fn insert_after_pos(&mut self, ev: EventId, key: EventKey, at: Option<NodeIdx>) {
        let arena = self.arena_mut();
        let e = arena.alloc(ev, key);
        match at {
            Some(c) => arena.link_after(e, c),
            None => arena.link_first(e),
        }
    }

    fn remove_at(&mut self, p: NodeIdx) -> (EventId, EventKey) {
        self.remove_node(p)
    }

    fn replace_at(&mut self, p: NodeIdx, ev: EventId, key: EventKey) -> ((EventId, EventKey), NodeIdx) {
        (self.arena_mut().replace_event(p, ev, key), p)
    }
}

pub(crate) struct StoreCursor<'a, S: CursorStore> {
    store: &'a mut S,
    current: Option<S::Pos>,
}

impl<'a, S: CursorStore> StoreCursor<'a, S> {
    pub(crate) fn new(store: &'a mut S) -> Self {
        let current = store.first_pos();
        Self { store, current }
    }

    fn key_at(&self, p: Option<S::Pos>) -> Option<EventKey> {
        p.map(|p| self.store.entry_at(p).1)
    }
}

impl<S: CursorStore> EventCursor for StoreCursor<'_, S> {
    fn current(&self) -> Option<(EventId, EventKey)> {
        self.current.map(|c| self.store.entry_at(c))
    }

    fn move_next(&mut self) {
        self.current = match self.current {
            Some(c) => self.store.next_pos(c),
            None => self.store.first_pos(),
        };
    }

    fn move_prev(&mut self) {
        self.current = match self.current {
            Some(c) => self.store.prev_pos(c),
            None => self.store.last_pos(),
        };
    }

    fn insert_before(&mut self, ev: EventId, key: EventKey) -> EventKey {
        let prev = match self.current {
            Some(c) => self.store.prev_pos(c),
            None => self.store.last_pos(),
        };
        let key = clamp_key(key, self.key_at(prev), self.key_at(self.current));
        self.store.insert_before_pos(ev, key, self.current);
        key
    }

    fn insert_after(&mut self, ev: EventId, key: EventKey) -> EventKey {
        let next = match self.current {
            Some(c) => self.store.next_pos(c),
            None => self.store.first_pos(),
        };
        let key = clamp_key(key, self.key_at(self.current), self.key_at(next));
        self.store.insert_after_pos(ev, key, self.current);
        key
    }

    fn remove_current(&mut self) -> Option<(EventId, EventKey)> {
        let c = self.current?;
        let next = self.store.next_pos(c);
        let removed = self.store.remove_at(c);
        self.current = next;
        Some(removed)
    }

    fn replace_current(&mut self, ev: EventId, key: EventKey) -> Option<(EventId, EventKey)> {
        let c = self.current?;
        let prev = self.store.prev_pos(c);
        let next = self.store.next_pos(c);
        let key = clamp_key(key, self.key_at(prev), self.key_at(next));
        let (old, pos) = self.store.replace_at(c, ev, key);
        self.current = Some(pos);
        Some(old)
    }
}
