//! 事件触发顺序追踪
//!
//! 读取事件描述 JSON，调度并运行，按触发顺序输出每个事件

use clap::Parser;
use simevents_rs::config::TraceSpec;
use simevents_rs::demo::run_trace;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "event-trace", about = "按 JSON 描述调度事件并打印触发顺序")]
struct Args {
    /// Path to trace spec JSON
    #[arg(long)]
    spec: PathBuf,

    /// 以 JSON 数组输出
    #[arg(long)]
    json: bool,
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
    let raw = fs::read_to_string(&args.spec).expect("read trace spec");
    let spec: TraceSpec = serde_json::from_str(&raw).expect("parse trace spec");

    let records = run_trace(&spec).expect("run trace");

    if args.json {
        println!(
            "{}",
            serde_json::to_string(&records).expect("serialize trace")
        );
    } else {
        for r in &records {
            println!("fire {} {}", r.time, r.name);
        }
    }
}
