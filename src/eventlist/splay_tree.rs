//! Splay tree 事件列表
//!
//! 插入使用 top-down splay：新节点直接成为根，沿查找路径把旧树拆成
//! "小于新键" 与 "不小于新键" 两棵，分别挂在新根的两侧。
//! 删除先把目标 bottom-up splay 到根并摘下，再把右子树的最小节点
//! splay 到右子树的根，最后把左子树挂到它左边。

use super::arena::{NodeArena, NodeIdx};
use super::cursor::{ArenaTree, StoreCursor};
use super::{EventCursor, EventList};
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, EventKey};
use tracing::trace;

/// 自调整二叉查找树，所有操作均摊 O(log n)。
#[derive(Debug, Default)]
pub struct SplayTree {
    arena: NodeArena,
    splay_steps: u64,
}

impl SplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计的 splay 工作量（旋转与链接步数），用于观察均摊复杂度。
    pub fn splay_steps(&self) -> u64 {
        self.splay_steps
    }

    /// bottom-up splay，直到 `x` 没有父节点（成为所在子树的根）。
    fn splay(&mut self, x: NodeIdx) {
        while let Some(p) = self.arena.parent(x) {
            match self.arena.parent(p) {
                None => {
                    // zig
                    self.arena.rotate_up(x);
                    self.splay_steps += 1;
                }
                Some(g) => {
                    let x_left = self.arena.left(p) == Some(x);
                    let p_left = self.arena.left(g) == Some(p);
                    if x_left == p_left {
                        // zig-zig
                        self.arena.rotate_up(p);
                        self.arena.rotate_up(x);
                    } else {
                        // zig-zag
                        self.arena.rotate_up(x);
                        self.arena.rotate_up(x);
                    }
                    self.splay_steps += 2;
                }
            }
        }
    }

    fn unlink_splayed(&mut self, n: NodeIdx) -> (EventId, EventKey) {
        self.splay(n);
        let left = self.arena.left(n);
        let right = self.arena.right(n);
        if let Some(l) = left {
            self.arena.set_parent(l, None);
        }
        match right {
            None => self.arena.root = left,
            Some(r) => {
                self.arena.set_parent(r, None);
                self.arena.root = Some(r);
                let m = self.arena.min_of(r);
                self.splay(m);
                // m 是右子树最小值，splay 之后没有左孩子
                self.arena.set_left(m, left);
                self.arena.root = Some(m);
            }
        }
        self.arena.release(n)
    }
}

impl ArenaTree for SplayTree {
    fn arena(&self) -> &NodeArena {
        &self.arena
    }

    fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    fn remove_node(&mut self, n: NodeIdx) -> (EventId, EventKey) {
        self.unlink_splayed(n)
    }
}

impl EventList for SplayTree {
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
        let Some(mut next) = self.arena.root else {
            self.arena.root = Some(e);
            return;
        };
        self.arena.root = Some(e);

        // splay 过程中 e.right 挂"小于"树，e.left 挂"不小于"树，结束时交换。
        // left 是"小于"树最右端的挂点，right 是"不小于"树最左端的挂点。
        let mut left = e;
        let mut right = e;
        loop {
            self.splay_steps += 1;
            if key >= self.arena.node(next).key {
                match self.arena.right(next) {
                    None => {
                        // zig
                        self.arena.set_right(left, Some(next));
                        self.arena.set_left(right, None);
                        break;
                    }
                    Some(temp) if key < self.arena.node(temp).key => {
                        // 简化的 zig-zag
                        self.arena.set_right(left, Some(next));
                        left = next;
                        next = temp;
                    }
                    Some(temp) => {
                        // zig-zig
                        let temp_left = self.arena.left(temp);
                        self.arena.set_right(next, temp_left);
                        self.arena.set_right(left, Some(temp));
                        self.arena.set_left(temp, Some(next));
                        left = temp;
                        self.splay_steps += 1;
                        match self.arena.right(temp) {
                            Some(n) => next = n,
                            None => {
                                self.arena.set_left(right, None);
                                break;
                            }
                        }
                    }
                }
            } else {
                match self.arena.left(next) {
                    None => {
                        self.arena.set_left(right, Some(next));
                        self.arena.set_right(left, None);
                        break;
                    }
                    Some(temp) if key >= self.arena.node(temp).key => {
                        self.arena.set_left(right, Some(next));
                        right = next;
                        next = temp;
                    }
                    Some(temp) => {
                        let temp_right = self.arena.right(temp);
                        self.arena.set_left(next, temp_right);
                        self.arena.set_left(right, Some(temp));
                        self.arena.set_right(temp, Some(next));
                        right = temp;
                        self.splay_steps += 1;
                        match self.arena.left(temp) {
                            Some(n) => next = n,
                            None => {
                                self.arena.set_right(left, None);
                                break;
                            }
                        }
                    }
                }
            }
        }

        let smaller = self.arena.right(e);
        let larger = self.arena.left(e);
        self.arena.set_left(e, smaller);
        self.arena.set_right(e, larger);
        self.arena.set_parent(e, None);
        trace!(ev = %ev, size = self.arena.len(), "splay 插入");
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
                self.unlink_splayed(n);
                true
            }
            None => false,
        }
    }

    fn remove_first(&mut self) -> Option<(EventId, EventKey)> {
        let n = self.arena.first()?;
        Some(self.unlink_splayed(n))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (EventId, EventKey)> + '_> {
        Box::new(self.arena.iter())
    }

    fn cursor(&mut self) -> Box<dyn EventCursor + '_> {
        Box::new(StoreCursor::new(self))
    }
}
