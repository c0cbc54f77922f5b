//! 事件列表（Future event list）
//!
//! 仿真器只依赖 [`EventList`] trait；默认实现是自调整的 [`SplayTree`]。
//! 其他实现：不做平衡的 [`BinaryTree`]、从尾部扫描的 [`DoublyLinked`]、
//! 带索引的 [`Henriksen`] 链表，以及基于 `BTreeMap` 的 [`BalancedTree`]。
//!
//! 列表按 `(time, priority)` 升序排列；键相等的事件按位置排列：
//! `add` 总是把新事件放在所有相等键之后，`add_first` / `add_before` /
//! `add_after` 以及游标插入则按指定位置放置。

use crate::error::SimResult;
use crate::sim::{EventId, EventKey};
use std::fmt::Debug;

mod arena;
mod balanced_tree;
mod binary_tree;
mod cursor;
mod doubly_linked;
mod henriksen;
mod linked;
mod splay_tree;

pub use balanced_tree::BalancedTree;
pub use binary_tree::BinaryTree;
pub use doubly_linked::DoublyLinked;
pub use henriksen::Henriksen;
pub use splay_tree::SplayTree;

/// 有序的待执行事件容器。
pub trait EventList: Debug {
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
    fn clear(&mut self);

    /// 插入到所有键相等事件之后。
    fn add(&mut self, ev: EventId, key: EventKey);
    /// 作为全局第一个事件插入；调用方保证 `key` 不大于当前首事件的键。
    fn add_first(&mut self, ev: EventId, key: EventKey);
    /// 紧挨在 `other` 之前插入；`other` 不在列表中时返回 `NotInList`。
    fn add_before(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()>;
    /// 紧挨在 `other` 之后插入。
    fn add_after(&mut self, ev: EventId, key: EventKey, other: EventId) -> SimResult<()>;

    fn first(&self) -> Option<(EventId, EventKey)>;
    /// 从最小事件开始按序扫描，返回第一个满足谓词的事件。
    fn first_matching(&self, pred: &mut dyn FnMut(EventId) -> bool) -> Option<EventId>;
    fn contains(&self, ev: EventId) -> bool;
    fn key_of(&self, ev: EventId) -> Option<EventKey>;

    /// 删除事件；不在列表中时返回 `false`。
    fn remove(&mut self, ev: EventId) -> bool;
    fn remove_first(&mut self) -> Option<(EventId, EventKey)>;

    /// 按序遍历。
    fn iter(&self) -> Box<dyn Iterator<Item = (EventId, EventKey)> + '_>;
    /// 独占列表的双向游标，初始指向第一个事件。
    fn cursor(&mut self) -> Box<dyn EventCursor + '_>;
}

/// 双向游标。
///
/// 与 std 的 `CursorMut` 一样，在尾与头之间有一个"幽灵"位置：
/// 此时 `current()` 返回 `None`，`move_next` 回到第一个事件，`move_prev` 到最后一个。
pub trait EventCursor {
    fn current(&self) -> Option<(EventId, EventKey)>;
    fn move_next(&mut self);
    fn move_prev(&mut self);

    /// 插入到当前事件之前（幽灵位置时追加到末尾）。返回实际使用的键：
    /// 请求的键会被夹在前后邻居之间，以保持列表有序。
    fn insert_before(&mut self, ev: EventId, key: EventKey) -> EventKey;
    /// 插入到当前事件之后（幽灵位置时放到最前）。
    fn insert_after(&mut self, ev: EventId, key: EventKey) -> EventKey;
    /// 删除当前事件，游标移到其后继。
    fn remove_current(&mut self) -> Option<(EventId, EventKey)>;
    /// 用另一个事件替换当前事件，返回被替换的事件；新键同样被夹在邻居之间。
    fn replace_current(&mut self, ev: EventId, key: EventKey) -> Option<(EventId, EventKey)>;
}

/// 把 `key` 夹在 `prev` 与 `next` 之间。
pub(crate) fn clamp_key(key: EventKey, prev: Option<EventKey>, next: Option<EventKey>) -> EventKey {
    let mut key = key;
    if let Some(next) = next {
        if key > next {
            key = next;
        }
    }
    if let Some(prev) = prev {
        if key < prev {
            key = prev;
        }
    }
    key
}
