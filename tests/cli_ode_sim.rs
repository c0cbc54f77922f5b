use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "simevents-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn run_json(args: &[&str]) -> Value {
    let output = Command::new(env!("CARGO_BIN_EXE_ode_sim"))
        .args(args)
        .arg("--json")
        .output()
        .expect("run ode_sim");
    assert!(
        output.status.success(),
        "ode_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("parse ode_sim json")
}

#[test]
fn ode_sim_euler_reports_first_order_error() {
    let v = run_json(&["--method", "euler", "--step-size", "0.0625", "--steps", "16"]);
    assert_eq!(v.get("method").and_then(|m| m.as_str()), Some("euler"));
    assert_eq!(v.get("steps").and_then(|s| s.as_u64()), Some(16));
    let time = v.get("time").and_then(|t| t.as_f64()).expect("time");
    assert!((time - 1.0).abs() < 1e-12, "time = {time}");
    let err = v.get("abs_error").and_then(|e| e.as_f64()).expect("abs_error");
    assert!((err - 0.0118).abs() < 1e-3, "abs_error = {err}");
}

#[test]
fn ode_sim_reads_method_from_config() {
    let dir = unique_temp_dir("ode-sim-config");
    let cfg = dir.join("config.json");
    fs::write(
        &cfg,
        r#"{ "event_list": "binary_tree", "integration": { "method": "runge_kutta4", "step_size": 0.125 } }"#,
    )
    .expect("write config");

    let v = run_json(&["--config", cfg.to_str().unwrap(), "--steps", "8"]);
    assert_eq!(v.get("method").and_then(|m| m.as_str()), Some("runge_kutta4"));
    assert_eq!(v.get("step_size").and_then(|h| h.as_f64()), Some(0.125));
    let err = v.get("abs_error").and_then(|e| e.as_f64()).expect("abs_error");
    assert!(err < 1e-5, "abs_error = {err}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ode_sim_plain_output_has_summary_line() {
    let output = Command::new(env!("CARGO_BIN_EXE_ode_sim"))
        .args(["--method", "rk2", "--rate", "-2", "--steps", "4"])
        .output()
        .expect("run ode_sim");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("summary line");
    assert!(line.starts_with("done @ t=0.5, method=RungeKutta2"), "{line}");
    assert!(line.contains("abs_error="));
}

#[test]
fn ode_sim_rejects_unknown_method() {
    let output = Command::new(env!("CARGO_BIN_EXE_ode_sim"))
        .args(["--method", "rk9", "--steps", "4"])
        .output()
        .expect("run ode_sim");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rk9"), "{stderr}");
}

#[test]
fn ode_sim_accepts_long_method_names() {
    let v = run_json(&["--method", "runge_kutta2", "--steps", "4"]);
    assert_eq!(v.get("method").and_then(|m| m.as_str()), Some("runge_kutta2"));
}
