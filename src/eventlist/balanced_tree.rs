//! 平衡树事件列表
//!
//! 用 std 的 `BTreeMap` 充当平衡查找树，最坏情况下每个操作都是 O(log n)。
//! 映射的键是 `(EventKey, rank)`：`rank` 只在键相等的事件之间区分先后，
//! 相邻事件之间预留间隔，以便按位置插入；间隔用尽时把这段相等键重新编号。

use super::cursor::{CursorStore, StoreCursor};
use super::{EventCursor, EventList};
use crate::error::{SimError, SimResult};
use crate::sim::{EventId, EventKey};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Unbounded};
use tracing::trace;

/// 相邻 rank 之间的初始间隔。
const GAP: i64 = 1 << 20;

type Slot = (EventKey, i64);

#[derive(Debug, Default)]
pub struct BalancedTree {
    map: BTreeMap<Slot, EventId>,
    index: HashMap<EventId, Slot>,
}

impl BalancedTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, ev: EventId) -> Slot {
        self.index[&ev]
    }

    fn before(&self, slot: Slot) -> Option<EventId> {
        self.map.range(..slot).next_back().map(|(_, ev)| *ev)
    }

    fn after(&self, slot: Slot) -> Option<EventId> {
        self.map.range((Excluded(slot), Unbounded)).next().map(|(_, ev)| *ev)
    }

    /// 邻居与新事件键相等时，新 rank 必须落在它们的 rank 之间。
    fn pick_rank(&self, key: EventKey, prev: Option<EventId>, next: Option<EventId>) -> Option<i64> {
        let rank_if_equal = |ev: Option<EventId>| {
            ev.map(|ev| self.slot(ev))
                .filter(|(k, _)| *k == key)
                .map(|(_, rank)| rank)
        };
        match (rank_if_equal(prev), rank_if_equal(next)) {
            (None, None) => Some(0),
            (Some(lo), None) => lo.checked_add(GAP),
            (None, Some(hi)) => hi.checked_sub(GAP),
            (Some(lo), Some(hi)) => hi
                .checked_sub(lo)
                .filter(|d| *d >= 2)
                .map(|d| lo + d / 2),
        }
    }

    /// 把键为 `key` 的一段事件按原顺序重新编号，间隔恢复为 `GAP`。
    fn relabel(&mut self, key: EventKey) {
        let run: Vec<(Slot, EventId)> = self
            .map
            .range((key, i64::MIN)..=(key, i64::MAX))
            .map(|(slot, ev)| (*slot, *ev))
            .collect();
        let base = -(run.len() as i64 / 2) * GAP;
        for (slot, _) in &run {
            self.map.remove(slot);
        }
        for (i, (_, ev)) in run.into_iter().enumerate() {
            let slot = (key, base + i as i64 * GAP);
            self.map.insert(slot, ev);
            self.index.insert(ev, slot);
        }
        trace!(time = key.time, "平衡树重新编号");
    }

    /// 把 `ev` 放在 `prev` 与 `next` 之间（两者在列表中相邻）。
    fn insert_between(&mut self, ev: EventId, key: EventKey, prev: Option<EventId>, next: Option<EventId>) {
        debug_assert!(!self.index.contains_key(&ev), "event {ev} inserted twice");
        let rank = loop {
            match self.pick_rank(key, prev, next) {
                Some(rank) => break rank,
                None => self.relabel(key),
            }
        };
        self.map.insert((key, rank), ev);
        self.index.insert(ev, (key, rank));
    }

    fn remove_slot(&mut self, ev: EventId) -> Option<(EventId, EventKey)> {
        let slot = self.index.remove(&ev)?;
        self.map.remove(&slot);
        Some((ev, slot.0))
    }
}

impl CursorStore for BalancedTree {
    type Pos = EventId;

    fn first_pos(&self) -> Option<EventId> {
        self.map.values().next().copied()
    }

    fn last_pos(&self) -> Option<EventId> {
        self.map.values().next_back().copied()
    }

    fn next_pos(&self, p: EventId) -> Option<EventId> {
        self.after(self.slot(p))
    }

    fn prev_pos(&self, p: EventId) -> Option<EventId> {
        self.before(self.slot(p))
    }

    fn entry_at(&self, p: EventId) -> (EventId, EventKey) {
        (p, self.slot(p).0)
    }

    fn insert_before_pos(&mut self, ev: EventId, key: EventKey, at: Option<EventId>) {
        let prev = match at {
            Some(at) => self.prev_pos(at),
            None => self.last_pos(),
        };
        self.insert_between(ev, key, prev, at);
    }

    fn insert_after_pos(&mut self, ev: EventId, key: EventKey, at: Option<EventId>) {
        let next = match at {
            Some(at) => self.next_pos(at),
            None => self.first_pos(),
        };
        self.insert_between(ev, key, at, next);
    }

    fn remove_at(&mut self, p: EventId) -> (EventId, EventKey) {
        let key = self.slot(p).0;
        self.remove_slot(p);
        (p, key)
    }

    fn replace_at(&mut self, p: EventId, ev: EventId, key: EventKey) -> ((EventId, EventKey), EventId) {
        let prev = self.prev_pos(p);
        let next = self.next_pos(p);
        let old = self.remove_at(p);
        self.insert_between(ev, key, prev, next);
        (old, ev)
    }
}

impl EventList for BalancedTree {
    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.index.clear();
    }

    fn add(&mut self, ev: EventId, key: EventKey) {
        let prev = self.map.range(..=(key, i64::MAX)).next_back().map(|(_, e)| *e);
        let next = self.after((key, i64::MAX));
        self.insert_between(ev, key, prev, next);
    }

    fn add_first(&mut self, ev: EventId, key: EventKey) {
        let next = self.first_pos();
        self.insert_between(ev, key, None, next);
    }

    fn add_before(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()> {
        if !self.index.contains_key(&other) {
            return Err(SimError::NotInList(other));
        }
        self.insert_before_pos(ev, key, Some(other));
        Ok(())
    }

    fn add_after(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()> {
        if !self.index.contains_key(&other) {
            return Err(SimError::NotInList(other));
        }
        self.insert_after_pos(ev, key, Some(other));
        Ok(())
    }

    fn first(&self) -> Option<(EventId, EventKey)> {
        self.map.iter().next().map(|((key, _), ev)| (*ev, *key))
    }

    fn first_matching(&self, pred: &mut dyn FnMut(EventId) -> bool) -> Option<EventId> {
        self.map.values().copied().find(|ev| pred(*ev))
    }

    fn contains(&self, ev: EventId) -> bool {
        self.index.contains_key(&ev)
    }

    fn key_of(&self, ev: EventId) -> Option<EventKey> {
        self.index.get(&ev).map(|(key, _)| *key)
    }

    fn remove(&mut self, ev: EventId) -> bool {
        self.remove_slot(ev).is_some()
    }

    fn remove_first(&mut self) -> Option<(EventId, EventKey)> {
        let ((key, _), ev) = self.map.pop_first()?;
        self.index.remove(&ev);
        Some((ev, key))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (EventId, EventKey)> + '_> {
        Box::new(self.map.iter().map(|((key, _), ev)| (*ev, *key)))
    }

    fn cursor(&mut self) -> Box<dyn EventCursor + '_> {
        Box::new(StoreCursor::new(self))
    }
}
