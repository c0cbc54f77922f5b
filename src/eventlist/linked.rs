//! 双向链表节点存储
//!
//! 与树的 arena 相同，链接都是下标，另有 `EventId -> 节点` 的索引。

use crate::sim::{EventId, EventKey};
use std::collections::HashMap;

pub(crate) type LinkIdx = usize;

#[derive(Debug, Clone)]
struct Link {
    ev: EventId,
    key: EventKey,
    prev: Option<LinkIdx>,
    next: Option<LinkIdx>,
}

#[derive(Debug, Default)]
pub(crate) struct LinkedNodes {
    nodes: Vec<Link>,
    free: Vec<LinkIdx>,
    index: HashMap<EventId, LinkIdx>,
    head: Option<LinkIdx>,
    tail: Option<LinkIdx>,
}

impl LinkedNodes {
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn find(&self, ev: EventId) -> Option<LinkIdx> {
        self.index.get(&ev).copied()
    }

    pub(crate) fn first(&self) -> Option<LinkIdx> {
        self.head
    }

    pub(crate) fn last(&self) -> Option<LinkIdx> {
        self.tail
    }

    pub(crate) fn next(&self, n: LinkIdx) -> Option<LinkIdx> {
        self.nodes[n].next
    }

    pub(crate) fn prev(&self, n: LinkIdx) -> Option<LinkIdx> {
        self.nodes[n].prev
    }

    pub(crate) fn key(&self, n: LinkIdx) -> EventKey {
        self.nodes[n].key
    }

    pub(crate) fn entry(&self, n: LinkIdx) -> (EventId, EventKey) {
        let node = &self.nodes[n];
        (node.ev, node.key)
    }

    fn alloc(&mut self, ev: EventId, key: EventKey) -> LinkIdx {
        debug_assert!(!self.index.contains_key(&ev), "event {ev} inserted twice");
        let node = Link {
            ev,
            key,
            prev: None,
            next: None,
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

    fn link_between(&mut self, n: LinkIdx, prev: Option<LinkIdx>, next: Option<LinkIdx>) {
        self.nodes[n].prev = prev;
        self.nodes[n].next = next;
        match prev {
            Some(p) => self.nodes[p].next = Some(n),
            None => self.head = Some(n),
        }
        match next {
            Some(s) => self.nodes[s].prev = Some(n),
            None => self.tail = Some(n),
        }
    }

    /// 插到 `at` 之后；`None` 时放到最前。
    pub(crate) fn insert_after(&mut self, ev: EventId, key: EventKey, at: Option<LinkIdx>) -> LinkIdx {
        let n = self.alloc(ev, key);
        let next = match at {
            Some(a) => self.nodes[a].next,
            None => self.head,
        };
        self.link_between(n, at, next);
        n
    }

    /// 插到 `at` 之前；`None` 时追加到末尾。
    pub(crate) fn insert_before(&mut self, ev: EventId, key: EventKey, at: Option<LinkIdx>) -> LinkIdx {
        let n = self.alloc(ev, key);
        let prev = match at {
            Some(a) => self.nodes[a].prev,
            None => self.tail,
        };
        self.link_between(n, prev, at);
        n
    }

    /// 摘下并回收节点。
    pub(crate) fn unlink(&mut self, n: LinkIdx) -> (EventId, EventKey) {
        let Link { ev, key, prev, next } = self.nodes[n].clone();
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(s) => self.nodes[s].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[n].prev = None;
        self.nodes[n].next = None;
        self.index.remove(&ev);
        self.free.push(n);
        (ev, key)
    }

    pub(crate) fn replace_event(&mut self, n: LinkIdx, ev: EventId, key: EventKey) -> (EventId, EventKey) {
        let old = self.entry(n);
        self.index.remove(&old.0);
        self.index.insert(ev, n);
        self.nodes[n].ev = ev;
        self.nodes[n].key = key;
        old
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EventId, EventKey)> + '_ {
        std::iter::successors(self.head, |&n| self.nodes[n].next).map(|n| self.entry(n))
    }
}
