use crate::SimError;
use crate::config::{EventListKind, ScheduleMode, SimConfig, TraceSpec};
use crate::continuous::IntegMethod;
use crate::sim::Simulator;

#[test]
fn empty_config_uses_defaults() {
    let cfg: SimConfig = serde_json::from_str("{}").expect("parse");
    assert_eq!(cfg.event_list, EventListKind::SplayTree);
    assert!(cfg.integration.is_none());

    let sim = Simulator::from_config(&cfg).expect("build");
    assert_eq!(sim.continuous().method(), None);
    assert!(sim.event_list().is_empty());
}

#[test]
fn integration_config_selects_method() {
    let cfg: SimConfig = serde_json::from_str(
        r#"{ "event_list": "binary_tree", "integration": { "method": "runge_kutta2", "step_size": 0.5 } }"#,
    )
    .expect("parse");
    assert_eq!(cfg.event_list, EventListKind::BinaryTree);

    let sim = Simulator::from_config(&cfg).expect("build");
    assert_eq!(sim.continuous().method(), Some(IntegMethod::RungeKutta2));
    assert_eq!(sim.continuous().step_size(), 0.5);
    assert!(format!("{:?}", sim.event_list()).starts_with("BinaryTree"));
}

#[test]
fn invalid_step_size_is_rejected() {
    let cfg: SimConfig =
        serde_json::from_str(r#"{ "integration": { "method": "euler", "step_size": -1.0 } }"#)
            .expect("parse");
    assert_eq!(
        Simulator::from_config(&cfg).map(|_| ()),
        Err(SimError::InvalidStepSize(-1.0))
    );
}

#[test]
fn unknown_method_fails_to_parse() {
    let res: Result<SimConfig, _> =
        serde_json::from_str(r#"{ "integration": { "method": "rk45", "step_size": 0.1 } }"#);
    assert!(res.is_err());
}

#[test]
fn trace_spec_fills_event_defaults() {
    let spec: TraceSpec = serde_json::from_str(
        r#"{
            "events": [
                { "name": "A", "delay": 5 },
                { "name": "B", "delay": 5, "priority": 0 },
                { "name": "N", "mode": "next" }
            ],
            "until": 4.5
        }"#,
    )
    .expect("parse");

    assert_eq!(spec.events.len(), 3);
    assert_eq!(spec.events[0].priority, 1.0);
    assert_eq!(spec.events[1].priority, 0.0);
    assert_eq!(spec.events[2].delay, 0.0);
    assert_eq!(spec.events[2].mode, ScheduleMode::Next);
    assert_eq!(spec.events[0].mode, ScheduleMode::Schedule);
    assert_eq!(spec.until, Some(4.5));
    assert_eq!(spec.config.event_list, EventListKind::SplayTree);
}

#[test]
fn every_event_list_kind_parses_and_builds() {
    for (name, kind, debug) in [
        ("splay_tree", EventListKind::SplayTree, "SplayTree"),
        ("binary_tree", EventListKind::BinaryTree, "BinaryTree"),
        ("doubly_linked", EventListKind::DoublyLinked, "DoublyLinked"),
        ("henriksen", EventListKind::Henriksen, "Henriksen"),
        ("balanced_tree", EventListKind::BalancedTree, "BalancedTree"),
    ] {
        let cfg: SimConfig = serde_json::from_str(&format!(r#"{{ "event_list": "{name}" }}"#))
            .expect("parse");
        assert_eq!(cfg.event_list, kind);
        let sim = Simulator::from_config(&cfg).expect("build");
        assert!(format!("{:?}", sim.event_list()).starts_with(debug));
    }
    let res: Result<SimConfig, _> = serde_json::from_str(r#"{ "event_list": "red_black" }"#);
    assert!(res.is_err());
}
