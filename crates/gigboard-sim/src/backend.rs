//! Mock job-listing backend.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Postings returned per page.
const PAGE_SIZE: u32 = 3;

const COMPANIES: [&str; 4] = ["Northwind", "Acme Logistics", "Blue Harbor", "Quill & Co"];
const ROLES: [&str; 5] = [
    "Backend Engineer",
    "Site Reliability Engineer",
    "Product Designer",
    "Data Analyst",
    "Support Lead",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub remote: bool,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("job service returned {status}")]
    Unavailable { status: u16 },
}

/// In-process stand-in for the job-listing API.
#[derive(Debug)]
pub struct JobBackend {
    latency: Duration,
    failing: AtomicBool,
    requests: AtomicUsize,
}

impl JobBackend {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            failing: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        })
    }

    /// Make every following request fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of requests received so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// List one page of postings after the simulated latency.
    pub async fn list_jobs(self: Arc<Self>, page: u32) -> Result<Vec<JobPosting>, BackendError> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Request #{} for page {}", request, page);
        tokio::time::sleep(self.latency).await;

        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable { status: 503 });
        }

        let first = page.saturating_sub(1) * PAGE_SIZE;
        Ok((first..first + PAGE_SIZE).map(posting).collect())
    }
}

fn posting(n: u32) -> JobPosting {
    let n_usize = n as usize;
    JobPosting {
        id: format!("job-{}", n + 1),
        title: ROLES[n_usize % ROLES.len()].to_string(),
        company: COMPANIES[n_usize % COMPANIES.len()].to_string(),
        remote: n % 2 == 0,
    }
}
