use super::{EVENT_LIST_KINDS, all_event_lists};
use crate::SimError;
use crate::eventlist::{BinaryTree, EventList, Henriksen};
use crate::sim::{EventId, EventKey};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ev(n: u32) -> EventId {
    EventId::new(n, 0)
}

fn key(time: f64, priority: f64) -> EventKey {
    EventKey::new(time, priority)
}

/// 按位置维护顺序的参考模型。
#[derive(Default)]
struct Model {
    items: Vec<(EventId, EventKey)>,
}

impl Model {
    fn position(&self, id: EventId) -> Option<usize> {
        self.items.iter().position(|(e, _)| *e == id)
    }

    fn add(&mut self, id: EventId, k: EventKey) {
        let at = self
            .items
            .iter()
            .position(|(_, other)| *other > k)
            .unwrap_or(self.items.len());
        self.items.insert(at, (id, k));
    }

    fn remove(&mut self, id: EventId) -> bool {
        match self.position(id) {
            Some(i) => {
                self.items.remove(i);
                true
            }
            None => false,
        }
    }
}

fn check(list: &dyn EventList, model: &Model) {
    let got: Vec<_> = list.iter().collect();
    assert_eq!(got, model.items, "{list:?}");
    assert_eq!(list.len(), model.items.len());
    assert_eq!(list.is_empty(), model.items.is_empty());
    assert_eq!(list.first(), model.items.first().copied());
}

fn random_ops(mut list: Box<dyn EventList>, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = Model::default();
    let mut next = 0u32;

    for _ in 0..2_000 {
        let op = rng.random_range(0..10);
        match op {
            0..=3 => {
                let k = key(rng.random_range(0..8) as f64, rng.random_range(0..3) as f64);
                list.add(ev(next), k);
                model.add(ev(next), k);
                next += 1;
            }
            4 => {
                let k = match model.items.first() {
                    Some((_, first)) => *first,
                    None => key(0.0, 0.0),
                };
                list.add_first(ev(next), k);
                model.items.insert(0, (ev(next), k));
                next += 1;
            }
            5 | 6 if !model.items.is_empty() => {
                let i = rng.random_range(0..model.items.len());
                let (other, k) = model.items[i];
                if op == 5 {
                    list.add_before(ev(next), k, other).expect("add_before");
                    model.items.insert(i, (ev(next), k));
                } else {
                    list.add_after(ev(next), k, other).expect("add_after");
                    model.items.insert(i + 1, (ev(next), k));
                }
                next += 1;
            }
            7 | 8 if !model.items.is_empty() => {
                let i = rng.random_range(0..model.items.len());
                let (id, _) = model.items[i];
                assert!(list.remove(id));
                assert!(model.remove(id));
                assert!(!list.contains(id));
            }
            _ => {
                let expected = (!model.items.is_empty()).then(|| model.items.remove(0));
                assert_eq!(list.remove_first(), expected);
            }
        }
        check(list.as_ref(), &model);
    }

    for (id, k) in &model.items {
        assert_eq!(list.key_of(*id), Some(*k));
    }
    assert!(!list.remove(ev(next)));
}

#[test]
fn every_event_list_matches_reference_model() {
    for kind in EVENT_LIST_KINDS {
        for seed in 0..4 {
            random_ops(kind.build(), seed);
        }
    }
}

/// 键只取很少几个值，大量相等键之间反复按位置插入。
#[test]
fn crowded_equal_keys_keep_positional_order() {
    for kind in EVENT_LIST_KINDS {
        let mut rng = StdRng::seed_from_u64(11);
        let mut list = kind.build();
        let mut model = Model::default();
        for n in 0..600 {
            let k = key(rng.random_range(0..2) as f64, 1.0);
            if model.items.is_empty() || rng.random_range(0..3) == 0 {
                list.add(ev(n), k);
                model.add(ev(n), k);
            } else {
                // 总插在同一个事件之前，逼出相邻位置之间的细分
                let (other, k) = model.items[model.items.len() / 2];
                list.add_before(ev(n), k, other).expect("add_before");
                let i = model.position(other).expect("in model");
                model.items.insert(i, (ev(n), k));
            }
        }
        check(list.as_ref(), &model);
    }
}

#[test]
fn equal_keys_are_first_in_first_out() {
    for mut list in all_event_lists() {
        for n in 0..20 {
            list.add(ev(n), key(1.0, 1.0));
        }
        list.add(ev(100), key(0.5, 1.0));
        list.add(ev(101), key(1.0, 0.0));

        let order: Vec<u32> = std::iter::from_fn(|| list.remove_first())
            .map(|(id, _)| id.index())
            .collect();
        let mut expected = vec![100, 101];
        expected.extend(0..20);
        assert_eq!(order, expected);
    }
}

#[test]
fn relative_insertion_against_missing_event_fails() {
    for mut list in all_event_lists() {
        list.add(ev(0), key(1.0, 1.0));
        assert_eq!(
            list.add_before(ev(1), key(1.0, 1.0), ev(7)),
            Err(SimError::NotInList(ev(7)))
        );
        assert_eq!(
            list.add_after(ev(1), key(1.0, 1.0), ev(7)),
            Err(SimError::NotInList(ev(7)))
        );
        assert_eq!(list.len(), 1);
        assert!(!list.contains(ev(1)));
    }
}

#[test]
fn first_matching_scans_in_order() {
    let mut list = BinaryTree::new();
    for n in [5u32, 3, 8, 1, 9] {
        list.add(ev(n), key(n as f64, 1.0));
    }
    assert_eq!(list.first_matching(&mut |id| id.index() > 4), Some(ev(5)));
    assert_eq!(list.first_matching(&mut |id| id.index() > 10), None);

    list.clear();
    assert!(list.is_empty());
    assert_eq!(list.first(), None);
    assert_eq!(list.remove_first(), None);
}

#[test]
fn event_key_orders_by_time_then_priority() {
    assert!(key(1.0, 5.0) < key(2.0, 0.0));
    assert!(key(1.0, 0.0) < key(1.0, 1.0));
    assert!(key(1.0, -1.0) < key(1.0, 0.0));
    assert_eq!(key(3.0, 1.0), key(3.0, 1.0));
    assert!(key(f64::INFINITY, 0.0) > key(1e300, 0.0));
}

#[test]
fn insert_then_remove_restores_observable_state() {
    let mut rng = StdRng::seed_from_u64(3);
    for mut list in all_event_lists() {
        for n in 0..64 {
            let k = key(rng.random_range(0..16) as f64, 1.0);
            list.add(ev(n), k);
        }
        for extra in 1000..1100 {
            let before_first = list.first();
            let before_len = list.len();
            let k = key(rng.random_range(0..16) as f64, rng.random_range(0..2) as f64);
            list.add(ev(extra), k);
            assert!(list.remove(ev(extra)));
            assert_eq!(list.first(), before_first);
            assert_eq!(list.len(), before_len);
        }
    }
}

#[test]
fn henriksen_index_grows_with_long_scans_and_shrinks_as_events_drain() {
    let mut list = Henriksen::new();
    assert_eq!(list.index_len(), 1);
    // 递减插入：每次都从尾部扫过整张表
    for n in 0..256u32 {
        list.add(ev(n), key(f64::from(1000 - n), 1.0));
    }
    assert!(list.index_len() > 1);
    let grown = list.index_len();

    let order: Vec<u32> = std::iter::from_fn(|| list.remove_first())
        .map(|(id, _)| id.index())
        .collect();
    assert_eq!(order, (0..256).rev().collect::<Vec<_>>());
    assert!(list.index_len() < grown);

    // 索引缩小后仍能正确插入
    for n in 0..8u32 {
        list.add(ev(n), key(f64::from(n % 3), 1.0));
    }
    let got: Vec<u32> = list.iter().map(|(id, _)| id.index()).collect();
    assert_eq!(got, vec![0, 3, 6, 1, 4, 7, 2, 5]);
}
