//! Terminal output for the simulator.

use anyhow::Result;
use gigboard_core::{FetchState, Notification, Notifier, ToastSurface, TracingNotifier};
use serde::Serialize;
use std::sync::Arc;

use crate::backend::JobPosting;

/// Keeps toasts on an in-memory surface and mirrors them to the log.
pub struct ConsoleNotifier {
    surface: Arc<ToastSurface>,
    log: TracingNotifier,
}

impl ConsoleNotifier {
    pub fn new(surface: Arc<ToastSurface>) -> Self {
        Self {
            surface,
            log: TracingNotifier,
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        self.log.notify(notification.clone());
        self.surface.notify(notification);
    }

    fn dismiss(&self, key: &str) {
        self.log.dismiss(key);
        self.surface.dismiss(key);
    }
}

/// One timeline step as printed in `--json` mode.
#[derive(Debug, Serialize)]
pub struct StepReport<'a> {
    pub step: &'a str,
    pub loading: bool,
    pub data: Option<&'a [JobPosting]>,
    pub error: Option<String>,
}

impl<'a> StepReport<'a> {
    pub fn new(step: &'a str, state: &'a FetchState<Vec<JobPosting>>) -> Self {
        Self {
            step,
            loading: state.loading,
            data: state.data().map(Vec::as_slice),
            error: state.error().map(|err| err.message()),
        }
    }
}

/// Print the job list state after `step`.
pub fn print_state(step: &str, state: &FetchState<Vec<JobPosting>>, json: bool) -> Result<()> {
    let report = StepReport::new(step, state);
    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let data = match report.data {
        Some(jobs) => {
            let ids: Vec<&str> = jobs.iter().map(|job| job.id.as_str()).collect();
            ids.join(", ")
        }
        None => "-".to_string(),
    };
    println!(
        "{:<28} loading={:<5} data=[{}] error={}",
        step,
        report.loading,
        data,
        report.error.as_deref().unwrap_or("-")
    );
    Ok(())
}

/// Print the notification history and what is still on screen.
pub fn print_toasts(surface: &ToastSurface, json: bool) -> Result<()> {
    if json {
        for record in surface.dispatched() {
            println!("{}", serde_json::to_string(&record)?);
        }
        return Ok(());
    }

    println!();
    println!("Dispatched notifications:");
    for record in surface.dispatched() {
        let n = &record.notification;
        println!(
            "  {} {:?} {} ({})",
            record.issued_at.format("%H:%M:%S%.3f"),
            n.kind,
            n.title,
            n.description.as_deref().unwrap_or("")
        );
    }
    println!("Visible now:");
    for toast in surface.visible() {
        println!("  [{}] {}", toast.id, toast.notification.title);
    }
    Ok(())
}
