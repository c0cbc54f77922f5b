mod config;
mod cursor;
mod event_list;

use crate::config::EventListKind;
use crate::eventlist::EventList;

const EVENT_LIST_KINDS: [EventListKind; 5] = [
    EventListKind::SplayTree,
    EventListKind::BinaryTree,
    EventListKind::DoublyLinked,
    EventListKind::Henriksen,
    EventListKind::BalancedTree,
];

/// 每种事件列表实现各一个空实例。
fn all_event_lists() -> Vec<Box<dyn EventList>> {
    EVENT_LIST_KINDS.iter().map(|kind| kind.build()).collect()
}
