//! 指数衰减方程积分
//!
//! 用选定的积分方法求解 dy/dt = rate·y，并与解析解比较

use clap::{Parser, ValueEnum};
use simevents_rs::config::{EventListKind, SimConfig};
use simevents_rs::continuous::IntegMethod;
use simevents_rs::demo::{DecayOpts, run_decay};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ode-sim", about = "连续变量积分：dy/dt = rate·y")]
struct Args {
    /// 仿真器配置 JSON（event_list / integration）
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override integration method
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Override integration step size
    #[arg(long)]
    step_size: Option<f64>,

    /// 积分步数
    #[arg(long, default_value_t = 8)]
    steps: u64,

    #[arg(long, default_value_t = 1.0)]
    initial: f64,

    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    rate: f64,

    /// 以 JSON 输出结果
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Euler,
    #[value(alias = "runge_kutta2")]
    Rk2,
    #[value(alias = "runge_kutta4")]
    Rk4,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let cfg: SimConfig = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).expect("read config json");
            serde_json::from_str(&raw).expect("parse config json")
        }
        None => SimConfig::default(),
    };

    let defaults = DecayOpts::default();
    let method = match args.method {
        Some(MethodArg::Euler) => IntegMethod::Euler,
        Some(MethodArg::Rk2) => IntegMethod::RungeKutta2,
        Some(MethodArg::Rk4) => IntegMethod::RungeKutta4,
        None => cfg.integration.map_or(defaults.method, |i| i.method),
    };
    let opts = DecayOpts {
        method,
        step_size: args
            .step_size
            .or(cfg.integration.map(|i| i.step_size))
            .unwrap_or(defaults.step_size),
        steps: args.steps,
        initial: args.initial,
        rate: args.rate,
        event_list: cfg.event_list,
    };
    if opts.event_list != EventListKind::SplayTree {
        tracing::info!(event_list = ?opts.event_list, "使用非默认事件列表");
    }

    let report = run_decay(&opts).expect("run decay");

    if args.json {
        println!(
            "{}",
            serde_json::to_string(&report).expect("serialize report")
        );
    } else {
        println!(
            "done @ t={}, method={:?}, h={}, value={:.12}, exact={:.12}, abs_error={:.3e}",
            report.time, report.method, report.step_size, report.value, report.exact, report.abs_error
        );
    }
}
