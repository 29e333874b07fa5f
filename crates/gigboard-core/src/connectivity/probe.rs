//! Probe-based reachability for hosts without a platform signal.
//!
//! [`ProbeReachability`] checks a list of URLs and reports the network as
//! reachable when any of them answers. It only emits a transition when the
//! probed state actually changes, and can run a background loop that
//! re-checks often while offline and rarely while online.

use crate::config::ProbeConfig;
use crate::connectivity::source::{
    ListenerId, ListenerSet, ReachabilitySource, Transition, TransitionListener,
};
use crate::error::{GigboardError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A single reachability check against one URL.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Returns true if `url` answered in a way that proves connectivity.
    async fn probe(&self, url: &str) -> bool;
}

/// HEAD-request probe backed by `reqwest`.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe whose requests time out after the configured probe timeout.
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()
            .map_err(|e| GigboardError::Network {
                message: format!("Failed to create probe client: {}", e),
                cause: None,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                // Redirects and 403 (rate limiting) still prove the network works
                status.is_success() || status.is_redirection() || status.as_u16() == 403
            }
            Err(e) => {
                debug!("Probe request failed: {}", e);
                false
            }
        }
    }
}

/// Reachability source that actively probes the network.
pub struct ProbeReachability {
    config: ProbeConfig,
    probe: Arc<dyn ReachabilityProbe>,
    /// Starts optimistic until the first check says otherwise.
    reachable: AtomicBool,
    listeners: ListenerSet,
    monitor_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProbeReachability {
    /// Create a source using the given probe.
    pub fn new(config: ProbeConfig, probe: Arc<dyn ReachabilityProbe>) -> Result<Self> {
        if config.probe_urls.is_empty() {
            return Err(GigboardError::Config {
                message: "at least one probe URL is required".to_string(),
            });
        }
        Ok(Self {
            config,
            probe,
            reachable: AtomicBool::new(true),
            listeners: ListenerSet::new(),
            monitor_task: Mutex::new(None),
        })
    }

    /// Create a source that probes over HTTP.
    pub fn http(config: ProbeConfig) -> Result<Self> {
        let probe = Arc::new(HttpProbe::new(&config)?);
        Self::new(config, probe)
    }

    /// Probe every configured URL in order until one answers.
    ///
    /// Emits a transition if the result differs from the previous state.
    pub async fn check(&self) -> bool {
        let mut reachable = false;
        for url in &self.config.probe_urls {
            if self.probe.probe(url).await {
                reachable = true;
                break;
            }
            debug!("Probe failed for {}", url);
        }
        self.record(reachable);
        reachable
    }

    fn record(&self, reachable: bool) {
        let previous = self.reachable.swap(reachable, Ordering::SeqCst);
        if previous == reachable {
            return;
        }
        if reachable {
            info!("Network connectivity restored");
            self.listeners.emit(Transition::Online);
        } else {
            warn!("Network connectivity lost - all probe URLs failed");
            self.listeners.emit(Transition::Offline);
        }
    }

    /// Start background connectivity monitoring.
    ///
    /// Must be called from within a tokio runtime. Does nothing if a loop is
    /// already running.
    pub fn start_monitoring(self: &Arc<Self>) {
        let mut task = self.lock_task();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Background monitoring already active");
            return;
        }

        // The loop holds only a weak reference so dropping the source ends it
        let weak = Arc::downgrade(self);
        *task = Some(tokio::spawn(async move {
            info!("Starting background connectivity monitoring");
            loop {
                let Some(source) = weak.upgrade() else {
                    break;
                };
                source.check().await;
                let interval = if source.is_reachable() {
                    source.config.online_verify_interval
                } else {
                    source.config.offline_recheck_interval
                };
                drop(source);
                tokio::time::sleep(interval).await;
            }
            debug!("Background connectivity monitoring ended");
        }));
    }

    /// Stop background monitoring immediately.
    pub fn stop_monitoring(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
            info!("Background connectivity monitoring stopped");
        }
    }

    /// Check if background monitoring is active.
    pub fn is_monitoring(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.monitor_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProbeReachability {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }
}

impl ReachabilitySource for ProbeReachability {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn add_listener(&self, listener: TransitionListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}
