//! 树节点 arena
//!
//! 节点之间的 left/right/parent 链接都是 arena 下标，避免父子之间的所有权环。
//! 另有 `EventId -> 节点` 的索引，删除和相对插入都按句柄定位，
//! 不依赖对重复键的二分查找。

use crate::sim::{EventId, EventKey};
use std::collections::HashMap;

pub(crate) type NodeIdx = usize;

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) ev: EventId,
    pub(crate) key: EventKey,
    pub(crate) left: Option<NodeIdx>,
    pub(crate) right: Option<NodeIdx>,
    pub(crate) parent: Option<NodeIdx>,
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
    free: Vec<NodeIdx>,
    index: HashMap<EventId, NodeIdx>,
    pub(crate) root: Option<NodeIdx>,
}

impl NodeArena {
    pub(crate) fn alloc(&mut self, ev: EventId, key: EventKey) -> NodeIdx {
        debug_assert!(!self.index.contains_key(&ev), "event {ev} inserted twice");
        let node = Node {
            ev,
            key,
            left: None,
            right: None,
            parent: None,
        };
        let n = match self.free.pop() {
            Some(n) => {
                self.nodes[n] = node;
                n
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(ev, n);
        n
    }

    /// 回收一个已经从树上摘下的节点。
    pub(crate) fn release(&mut self, n: NodeIdx) -> (EventId, EventKey) {
        let node = &mut self.nodes[n];
        node.left = None;
        node.right = None;
        node.parent = None;
        let out = (node.ev, node.key);
        self.index.remove(&out.0);
        self.free.push(n);
        out
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.root = None;
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn find(&self, ev: EventId) -> Option<NodeIdx> {
        self.index.get(&ev).copied()
    }

    pub(crate) fn node(&self, n: NodeIdx) -> &Node {
        &self.nodes[n]
    }

    pub(crate) fn entry(&self, n: NodeIdx) -> (EventId, EventKey) {
        let node = &self.nodes[n];
        (node.ev, node.key)
    }

    /// 原地替换节点承载的事件。
    pub(crate) fn replace_event(&mut self, n: NodeIdx, ev: EventId, key: EventKey) -> (EventId, EventKey) {
        let old = self.entry(n);
        self.index.remove(&old.0);
        self.index.insert(ev, n);
        let node = &mut self.nodes[n];
        node.ev = ev;
        node.key = key;
        old
    }

    pub(crate) fn left(&self, n: NodeIdx) -> Option<NodeIdx> {
        self.nodes[n].left
    }

    pub(crate) fn right(&self, n: NodeIdx) -> Option<NodeIdx> {
        self.nodes[n].right
    }

    pub(crate) fn parent(&self, n: NodeIdx) -> Option<NodeIdx> {
        self.nodes[n].parent
    }

    pub(crate) fn set_left(&mut self, p: NodeIdx, c: Option<NodeIdx>) {
        self.nodes[p].left = c;
        if let Some(c) = c {
            self.nodes[c].parent = Some(p);
        }
    }

    pub(crate) fn set_right(&mut self, p: NodeIdx, c: Option<NodeIdx>) {
        self.nodes[p].right = c;
        if let Some(c) = c {
            self.nodes[c].parent = Some(p);
        }
    }

    pub(crate) fn set_parent(&mut self, n: NodeIdx, p: Option<NodeIdx>) {
        self.nodes[n].parent = p;
    }

    /// 让 `new` 接替 `old` 在父节点（或根）中的位置。
    pub(crate) fn replace_child(&mut self, parent: Option<NodeIdx>, old: NodeIdx, new: Option<NodeIdx>) {
        match parent {
            None => self.root = new,
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => self.nodes[p].right = new,
        }
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
    }

    pub(crate) fn min_of(&self, mut n: NodeIdx) -> NodeIdx {
        while let Some(l) = self.nodes[n].left {
            n = l;
        }
        n
    }

    pub(crate) fn max_of(&self, mut n: NodeIdx) -> NodeIdx {
        while let Some(r) = self.nodes[n].right {
            n = r;
        }
        n
    }

    pub(crate) fn first(&self) -> Option<NodeIdx> {
        self.root.map(|r| self.min_of(r))
    }

    pub(crate) fn last(&self) -> Option<NodeIdx> {
        self.root.map(|r| self.max_of(r))
    }

    pub(crate) fn successor(&self, n: NodeIdx) -> Option<NodeIdx> {
        if let Some(r) = self.nodes[n].right {
            return Some(self.min_of(r));
        }
        let mut child = n;
        let mut up = self.nodes[n].parent;
        while let Some(p) = up {
            if self.nodes[p].left == Some(child) {
                return Some(p);
            }
            child = p;
            up = self.nodes[p].parent;
        }
        None
    }

    pub(crate) fn predecessor(&self, n: NodeIdx) -> Option<NodeIdx> {
        if let Some(l) = self.nodes[n].left {
            return Some(self.max_of(l));
        }
        let mut child = n;
        let mut up = self.nodes[n].parent;
        while let Some(p) = up {
            if self.nodes[p].right == Some(child) {
                return Some(p);
            }
            child = p;
            up = self.nodes[p].parent;
        }
        None
    }

    /// 把 `x` 向上旋转一层，返回是否发生了旋转。
    pub(crate) fn rotate_up(&mut self, x: NodeIdx) -> bool {
        let Some(p) = self.nodes[x].parent else {
            return false;
        };
        let g = self.nodes[p].parent;
        if self.nodes[p].left == Some(x) {
            let b = self.nodes[x].right;
            self.set_left(p, b);
            self.set_right(x, Some(p));
        } else {
            let b = self.nodes[x].left;
            self.set_right(p, b);
            self.set_left(x, Some(p));
        }
        self.replace_child(g, p, Some(x));
        true
    }

    /// 不平衡的二叉查找树插入：相等的键向右走，新节点排在相等键之后。
    pub(crate) fn insert_leaf(&mut self, e: NodeIdx) {
        let key = self.nodes[e].key;
        let Some(mut cur) = self.root else {
            self.root = Some(e);
            return;
        };
        loop {
            if key >= self.nodes[cur].key {
                match self.nodes[cur].right {
                    Some(r) => cur = r,
                    None => {
                        self.set_right(cur, Some(e));
                        return;
                    }
                }
            } else {
                match self.nodes[cur].left {
                    Some(l) => cur = l,
                    None => {
                        self.set_left(cur, Some(e));
                        return;
                    }
                }
            }
        }
    }

    /// 把 `e` 放在最前面。
    pub(crate) fn link_first(&mut self, e: NodeIdx) {
        match self.first() {
            Some(first) => self.set_left(first, Some(e)),
            None => self.root = Some(e),
        }
    }

    /// 把 `e` 放在最后面。
    pub(crate) fn link_last(&mut self, e: NodeIdx) {
        match self.last() {
            Some(last) => self.set_right(last, Some(e)),
            None => self.root = Some(e),
        }
    }

    /// `e` 接替 `other` 的位置，`other` 成为 `e` 的右孩子，
    /// `other` 原来的左子树挂到 `e` 左边。
    pub(crate) fn link_before(&mut self, e: NodeIdx, other: NodeIdx) {
        let parent = self.nodes[other].parent;
        self.replace_child(parent, other, Some(e));
        let left = self.nodes[other].left;
        self.set_left(e, left);
        self.nodes[other].left = None;
        self.set_right(e, Some(other));
    }

    /// `e` 成为 `other` 的右孩子，接管 `other` 原来的右子树。
    pub(crate) fn link_after(&mut self, e: NodeIdx, other: NodeIdx) {
        let right = self.nodes[other].right;
        self.set_right(e, right);
        self.set_right(other, Some(e));
    }

    /// 普通二叉查找树删除：有两个孩子时用后继节点接替。不回收节点。
    pub(crate) fn unlink(&mut self, n: NodeIdx) {
        let parent = self.nodes[n].parent;
        match (self.nodes[n].left, self.nodes[n].right) {
            (None, child) | (child, None) => self.replace_child(parent, n, child),
            (Some(l), Some(r)) => {
                let s = self.min_of(r);
                if s != r {
                    let s_parent = self.nodes[s].parent;
                    let s_right = self.nodes[s].right;
                    self.replace_child(s_parent, s, s_right);
                    self.set_right(s, Some(r));
                }
                self.set_left(s, Some(l));
                self.replace_child(parent, n, Some(s));
            }
        }
    }

    pub(crate) fn iter(&self) -> InOrder<'_> {
        InOrder {
            arena: self,
            next: self.first(),
        }
    }
}

/// 中序遍历。
pub(crate) struct InOrder<'a> {
    arena: &'a NodeArena,
    next: Option<NodeIdx>,
}

impl Iterator for InOrder<'_> {
    type Item = (EventId, EventKey);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.next?;
        self.next = self.arena.successor(n);
        Some(self.arena.entry(n))
    }
}
