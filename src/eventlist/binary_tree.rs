//! 不做平衡的二叉查找树
//!
//! 与 [`super::SplayTree`] 契约相同，结构上更简单；按时间顺序插入时会退化成链表。

use super::arena::{NodeArena, NodeIdx};
use super::cursor::{ArenaTree, StoreCursor};
use super::{EventCursor, EventList};
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, EventKey};

#[derive(Debug, Default)]
pub struct BinaryTree {
    arena: NodeArena,
}

impl BinaryTree {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArenaTree for BinaryTree {
    fn arena(&self) -> &NodeArena {
        &self.arena
    }

    fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    fn remove_node(&mut self, n: NodeIdx) -> (EventId, EventKey) {
        self.arena.unlink(n);
        self.arena.release(n)
    }
}

impl EventList for BinaryTree {
    fn is_empty(&self) -> bool {
        self.arena.root.is_none()
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn clear(&mut self) {
        self.arena.clear();
    }

    fn add(&mut self, ev: EventId, key: EventKey) {
        let e = self.arena.alloc(ev, key);
        self.arena.insert_leaf(e);
    }

    fn add_first(&mut self, ev: EventId, key: EventKey) {
        let e = self.arena.alloc(ev, key);
        self.arena.link_first(e);
    }

    fn add_before(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()> {
        let other = self.arena.find(other).ok_or(SimError::NotInList(other))?;
        let e = self.arena.alloc(ev, key);
        self.arena.link_before(e, other);
        Ok(())
    }

    fn add_after(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()> {
        let other = self.arena.find(other).ok_or(SimError::NotInList(other))?;
        let e = self.arena.alloc(ev, key);
        self.arena.link_after(e, other);
        Ok(())
    }

    fn first(&self) -> Option<(EventId, EventKey)> {
        self.arena.first().map(|n| self.arena.entry(n))
    }

    fn first_matching(&self, pred: &mut dyn FnMut(EventId) -> bool) -> Option<EventId> {
        self.arena.iter().map(|(ev, _)| ev).find(|ev| pred(*ev))
    }

    fn contains(&self, ev: EventId) -> bool {
        self.arena.find(ev).is_some()
    }

    fn key_of(&self, ev: EventId) -> Option<EventKey> {
        self.arena.find(ev).map(|n| self.arena.node(n).key)
    }

    fn remove(&mut self, ev: EventId) -> bool {
        match self.arena.find(ev) {
            Some(n) => {
                self.remove_node(n);
                true
            }
            None => false,
        }
    }

    fn remove_first(&mut self) -> Option<(EventId, EventKey)> {
        let n = self.arena.first()?;
        Some(self.remove_node(n))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (EventId, EventKey)> + '_> {
        Box::new(self.arena.iter())
    }

    fn cursor(&mut self) -> Box<dyn EventCursor + '_> {
        Box::new(StoreCursor::new(self))
    }
}
