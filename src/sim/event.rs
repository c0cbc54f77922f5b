//! 事件
//!
//! 事件句柄、排序键、action trait 以及仿真器内部保存事件的 slab。

use super::simulator::Simulator;
use crate::error::SimResult;
use std::cmp::Ordering;
use std::fmt;

/// 默认优先级（值越小越优先）。
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// 事件句柄。带代数（generation），slot 被回收后旧句柄不会误指新事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId {
    index: u32,
    generation: u32,
}

impl EventId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// 事件列表的排序键：先比较时间，再比较优先级。
///
/// 键相等的事件之间的先后由它们在列表中的位置决定（见 [`crate::eventlist`]）。
#[derive(Debug, Clone, Copy)]
pub struct EventKey {
    pub time: f64,
    pub priority: f64,
}

impl EventKey {
    pub fn new(time: f64, priority: f64) -> Self {
        Self { time, priority }
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.priority.total_cmp(&other.priority))
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EventKey {}

/// 事件被选中时执行的动作。
///
/// 与一次性的 `FnOnce` 不同，action 在事件每次触发时都会被调用，
/// 因此同一个事件可以反复调度（例如周期性的积分步事件）。
pub trait Action: 'static {
    fn execute(&mut self, sim: &mut Simulator) -> SimResult<()>;

    /// 事件种类，用于 `first_of_kind` / `cancel_first_of_kind`。
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// 把闭包包装成 [`Action`]。
pub(crate) struct FnAction<F> {
    pub(crate) kind: &'static str,
    pub(crate) f: F,
}

impl<F> Action for FnAction<F>
where
    F: FnMut(&mut Simulator) -> SimResult<()> + 'static,
{
    fn execute(&mut self, sim: &mut Simulator) -> SimResult<()> {
        (self.f)(sim)
    }

    fn kind(&self) -> &'static str {
        self.kind
    }
}

/// 仿真器持有的单个事件。
pub(crate) struct EventEntry {
    /// `None` 表示未调度。
    pub(crate) time: Option<f64>,
    pub(crate) priority: f64,
    pub(crate) seq: u64,
    pub(crate) kind: &'static str,
    /// 执行后若未重新调度则自动销毁
    pub(crate) transient: bool,
    /// 执行期间被临时取出。
    pub(crate) action: Option<Box<dyn Action>>,
}

struct Slot {
    generation: u32,
    entry: Option<EventEntry>,
}

/// 事件存储：`EventId` 是 slot 下标加代数。
#[derive(Default)]
pub(crate) struct EventSlab {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EventSlab {
    pub(crate) fn insert(&mut self, entry: EventEntry) -> EventId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            EventId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            EventId::new(index, 0)
        }
    }

    pub(crate) fn remove(&mut self, id: EventId) -> Option<EventEntry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entry)
    }

    pub(crate) fn get(&self, id: EventId) -> Option<&EventEntry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: EventId) -> Option<&mut EventEntry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// 所有事件都标记为未调度（事件列表被清空时使用）。
    pub(crate) fn unschedule_all(&mut self) {
        for entry in self.slots.iter_mut().filter_map(|s| s.entry.as_mut()) {
            entry.time = None;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
