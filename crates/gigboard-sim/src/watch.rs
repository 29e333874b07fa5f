//! Live connectivity watching with HTTP probes.

use anyhow::Result;
use gigboard_core::config::ProbeConfig;
use gigboard_core::{ConnectivityEvent, ConnectivityMonitor, ProbeReachability, ToastSurface};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::console::{print_toasts, ConsoleNotifier};

/// Probe `urls` for `seconds`, printing every connectivity change.
pub async fn run(urls: Vec<String>, seconds: u64, interval: Duration, json: bool) -> Result<()> {
    let config = ProbeConfig::default()
        .with_probe_urls(urls)
        .with_intervals(interval, interval);
    let source = Arc::new(ProbeReachability::http(config)?);
    let toasts = Arc::new(ToastSurface::new());

    // First check before attaching so an unreachable start is seen at mount
    source.check().await;
    let monitor = ConnectivityMonitor::start(
        source.clone(),
        Arc::new(ConsoleNotifier::new(toasts.clone())),
    );
    let mut events = monitor.handle().events();
    info!("Initial state: {:?}", monitor.state());

    source.start_monitoring();
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Ok(ConnectivityEvent::Lost) => println!("network lost"),
                Ok(ConnectivityEvent::Restored) => println!("network restored"),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} events", missed),
                Err(RecvError::Closed) => break,
            },
        }
    }

    source.stop_monitoring();
    let state = monitor.state();
    if json {
        println!("{}", serde_json::to_string(&state)?);
    } else {
        println!("final state: online={} was_offline={}", state.is_online, state.was_offline);
    }
    print_toasts(&toasts, json)
}
