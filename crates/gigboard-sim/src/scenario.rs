//! Scripted offline/online timeline against the mock backend.

use anyhow::{bail, Context, Result};
use gigboard_core::{
    deps, Attempt, ConnectivityMonitor, FetchCoordinator, FetchState, ManualReachability, Producer,
    ToastSurface,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::backend::{JobBackend, JobPosting};
use crate::console::{print_state, print_toasts, ConsoleNotifier};

const BACKEND_LATENCY: Duration = Duration::from_millis(150);
const RECOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a single run of the timeline needs.
pub struct Scenario {
    pub source: Arc<ManualReachability>,
    pub toasts: Arc<ToastSurface>,
    pub backend: Arc<JobBackend>,
    pub page: Arc<AtomicU32>,
    monitor: ConnectivityMonitor,
}

impl Scenario {
    pub fn new(latency: Duration) -> Self {
        let source = Arc::new(ManualReachability::new(true));
        let toasts = Arc::new(ToastSurface::new());
        let monitor = ConnectivityMonitor::start(
            source.clone(),
            Arc::new(ConsoleNotifier::new(toasts.clone())),
        );
        Self {
            source,
            toasts,
            backend: JobBackend::new(latency),
            page: Arc::new(AtomicU32::new(1)),
            monitor,
        }
    }

    /// Mount a job list that reads the current page when it runs.
    pub fn mount_jobs(&self) -> FetchCoordinator<Vec<JobPosting>> {
        let backend = self.backend.clone();
        let page = self.page.clone();
        let producer =
            Producer::new(move || backend.clone().list_jobs(page.load(Ordering::SeqCst)));

        FetchCoordinator::builder(producer)
            .deps(deps![self.page.load(Ordering::SeqCst)])
            .error_label("Failed to load jobs")
            .mount(
                self.monitor.handle(),
                Arc::new(ConsoleNotifier::new(self.toasts.clone())),
            )
    }

    /// Move to `page`, refetching if online.
    pub fn change_page(
        &self,
        jobs: &FetchCoordinator<Vec<JobPosting>>,
        page: u32,
    ) -> Option<Attempt> {
        self.page.store(page, Ordering::SeqCst);
        jobs.set_deps(deps![page])
    }

    /// Wait for the fetch a reconnect triggers and return the settled state.
    pub async fn recovered(
        &self,
        jobs: &FetchCoordinator<Vec<JobPosting>>,
        requests_before: usize,
    ) -> Result<FetchState<Vec<JobPosting>>> {
        tokio::time::timeout(RECOVERY_TIMEOUT, async {
            while self.backend.requests() <= requests_before {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .context("no fetch after reconnect")?;
        Ok(jobs.settled().await)
    }
}

/// Play the timeline and print each step.
pub async fn run(json: bool) -> Result<()> {
    let scenario = Scenario::new(BACKEND_LATENCY);

    info!("Mounting job list");
    let jobs = scenario.mount_jobs();
    print_state("mount (loading)", &jobs.state(), json)?;
    print_state("mount (settled)", &jobs.settled().await, json)?;

    info!("Dropping the network");
    scenario.source.set_offline();
    print_state("offline", &jobs.state(), json)?;

    let attempt = scenario
        .change_page(&jobs, 2)
        .context("page change did not start an attempt")?;
    let outcome = attempt.outcome().await;
    print_state(&format!("page 2 ({:?})", outcome), &jobs.state(), json)?;

    info!("Restoring the network");
    let before = scenario.backend.requests();
    scenario.source.set_online();
    let recovered = scenario.recovered(&jobs, before).await?;
    print_state("recovery", &recovered, json)?;

    info!("Making the backend fail");
    scenario.backend.set_failing(true);
    let outcome = jobs.refetch().outcome().await;
    print_state(&format!("refetch ({:?})", outcome), &jobs.state(), json)?;

    if scenario.backend.requests() != 3 {
        bail!(
            "expected 3 backend requests, observed {}",
            scenario.backend.requests()
        );
    }

    print_toasts(&scenario.toasts, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigboard_core::config::NotificationConfig;
    use gigboard_core::AttemptOutcome;

    #[tokio::test]
    async fn test_offline_page_change_is_fetched_after_recovery() {
        let scenario = Scenario::new(Duration::ZERO);
        let jobs = scenario.mount_jobs();
        assert_eq!(jobs.settled().await.data.unwrap()[0].id, "job-1");

        scenario.source.set_offline();
        let skipped = scenario.change_page(&jobs, 2).unwrap();
        assert_eq!(skipped.outcome().await, AttemptOutcome::OfflineSkipped);
        assert_eq!(scenario.backend.requests(), 1);

        scenario.source.set_online();
        let state = scenario.recovered(&jobs, 1).await.unwrap();
        assert_eq!(state.data.unwrap()[0].id, "job-4");
        assert_eq!(scenario.backend.requests(), 2);
        assert_eq!(
            scenario
                .toasts
                .visible_with_key(NotificationConfig::OFFLINE_DEDUPE_KEY),
            0
        );
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_listing() {
        let scenario = Scenario::new(Duration::ZERO);
        let jobs = scenario.mount_jobs();
        jobs.settled().await;

        scenario.backend.set_failing(true);
        let outcome = jobs.refetch().outcome().await;
        assert!(matches!(outcome, AttemptOutcome::Failed(_)));

        let state = jobs.state();
        assert_eq!(state.data.map(|jobs| jobs.len()), Some(3));
        assert_eq!(
            state.error.map(|err| err.message()),
            Some("job service returned 503".to_string())
        );
    }
}
