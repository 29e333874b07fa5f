//! Gigboard Sim - drive the fetch coordinator from the command line.
//!
//! Without `--probe` the simulator plays a fixed offline/online timeline
//! against an in-process job backend. With `--probe` it watches real
//! connectivity using HTTP probes.

mod backend;
mod console;
mod scenario;
mod watch;

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gigboard-sim")]
#[command(about = "Simulate network-aware job list fetching")]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Watch real connectivity by probing these URLs instead of the scripted timeline
    #[arg(long, num_args = 1..)]
    probe: Vec<String>,

    /// How long to watch in probe mode
    #[arg(long, default_value = "30")]
    seconds: u64,

    /// Seconds between probes in probe mode
    #[arg(long, default_value = "5")]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if args.probe.is_empty() {
        info!("Running scripted timeline");
        scenario::run(args.json).await
    } else {
        info!("Watching {} probe URL(s) for {}s", args.probe.len(), args.seconds);
        watch::run(
            args.probe,
            args.seconds,
            Duration::from_secs(args.interval.max(1)),
            args.json,
        )
        .await
    }
}
