use super::all_event_lists;
use crate::SimError;
use crate::sim::{EventId, Simulator};

fn noop(sim: &mut Simulator) -> EventId {
    sim.create_event_fn(|_| Ok(()))
}

#[test]
fn cursor_walks_in_order_with_ghost_position() {
    for list in all_event_lists() {
        let mut sim = Simulator::with_event_list(list);
        let ids: Vec<_> = (0..4).map(|_| noop(&mut sim)).collect();
        for (i, &id) in ids.iter().enumerate().rev() {
            sim.schedule(id, i as f64).expect("schedule");
        }

        let mut cur = sim.event_cursor();
        let mut seen = Vec::new();
        while let Some(id) = cur.current() {
            seen.push(id);
            cur.move_next();
        }
        assert_eq!(seen, ids);

        // 幽灵位置：向后回到头，向前到尾
        cur.move_next();
        assert_eq!(cur.current(), Some(ids[0]));
        cur.move_prev();
        assert_eq!(cur.current(), None);
        cur.move_prev();
        assert_eq!(cur.current(), Some(ids[3]));
        assert_eq!(cur.current_key().map(|k| k.time), Some(3.0));
    }
}

#[test]
fn cursor_insertion_clamps_keys_between_neighbours() {
    for list in all_event_lists() {
        let mut sim = Simulator::with_event_list(list);
        let a = noop(&mut sim);
        let b = noop(&mut sim);
        let x = noop(&mut sim);
        let y = noop(&mut sim);
        let z = noop(&mut sim);
        sim.schedule(a, 1.0).expect("A");
        sim.schedule(b, 3.0).expect("B");

        {
            let mut cur = sim.event_cursor();
            cur.move_next();
            assert_eq!(cur.current(), Some(b));

            // 请求 5.0，但必须排在 B 之前
            let key = cur.insert_before(x, 5.0).expect("insert X");
            assert_eq!(key.time, 3.0);
            assert_eq!(cur.current(), Some(b));

            // 请求 0.5，但必须排在 B 之后
            let key = cur.insert_after(y, 0.5).expect("insert Y");
            assert_eq!(key.time, 3.0);

            // 幽灵位置：insert_after 放到最前，insert_before 追加到最后
            cur.move_next();
            cur.move_next();
            assert_eq!(cur.current(), None);
            let key = cur.insert_after(z, 2.0).expect("insert Z");
            assert_eq!(key.time, 1.0);
        }

        assert_eq!(sim.pending_events(), vec![z, a, x, b, y]);
        assert_eq!(sim.event_time(x), Some(3.0));
        assert!(sim.is_scheduled(z));
        let seq_x = sim.insertion_seq(x).expect("seq x");
        let seq_y = sim.insertion_seq(y).expect("seq y");
        assert!(seq_x < seq_y);

        sim.start().expect("run");
        assert_eq!(sim.now(), 3.0);
    }
}

#[test]
fn cursor_rejects_past_times_and_scheduled_events() {
    let mut sim = Simulator::new();
    let a = noop(&mut sim);
    let b = noop(&mut sim);
    sim.schedule(a, 1.0).expect("A");
    sim.run_until(1.0).expect("advance clock");
    sim.schedule(a, 1.0).expect("A again");

    let mut cur = sim.event_cursor();
    assert_eq!(
        cur.insert_before(b, 0.5),
        Err(SimError::PastTime { time: 0.5, now: 1.0 })
    );
    assert_eq!(cur.insert_after(a, 4.0), Err(SimError::AlreadyScheduled(a)));
    assert_eq!(cur.replace_current(a, 4.0), Err(SimError::AlreadyScheduled(a)));
}

#[test]
fn cursor_remove_and_replace_update_scheduling_state() {
    for list in all_event_lists() {
        let mut sim = Simulator::with_event_list(list);
        let ids: Vec<_> = (0..3).map(|_| noop(&mut sim)).collect();
        for (i, &id) in ids.iter().enumerate() {
            sim.schedule(id, (i + 1) as f64).expect("schedule");
        }
        let fresh = noop(&mut sim);

        {
            let mut cur = sim.event_cursor();
            assert_eq!(cur.remove_current(), Some(ids[0]));
            assert_eq!(cur.current(), Some(ids[1]));

            let old = cur.replace_current(fresh, 10.0).expect("replace");
            assert_eq!(old, Some(ids[1]));
            assert_eq!(cur.current(), Some(fresh));
            // 夹在 ids[0] 已删除后的邻居 ids[2] 之前
            assert_eq!(cur.current_key().map(|k| k.time), Some(3.0));

            cur.move_prev();
            assert_eq!(cur.current(), None);
            assert_eq!(cur.remove_current(), None);
        }

        assert!(!sim.is_scheduled(ids[0]));
        assert!(!sim.is_scheduled(ids[1]));
        assert_eq!(sim.event_time(fresh), Some(3.0));
        assert_eq!(sim.pending_events(), vec![fresh, ids[2]]);
        assert_eq!(sim.event_list().len(), 2);

        // 被替换的事件可以重新调度
        sim.schedule(ids[1], 0.0).expect("reschedule replaced");
        assert_eq!(sim.first_event(), Some(ids[1]));
    }
}
