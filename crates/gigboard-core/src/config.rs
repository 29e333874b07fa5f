//! Centralized configuration for Gigboard.
//!
//! Notification wording and timing live here as constants; connectivity
//! probing is configured at runtime through [`ProbeConfig`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Notification keys, wording and lifetimes.
pub struct NotificationConfig;

impl NotificationConfig {
    /// Stable key shared by every offline notification so they never stack.
    pub const OFFLINE_DEDUPE_KEY: &'static str = "network-offline";

    pub const OFFLINE_TITLE: &'static str = "You are offline";
    pub const OFFLINE_DESCRIPTION: &'static str =
        "Check your internet connection. Some features may be unavailable.";
    pub const OFFLINE_FETCH_DESCRIPTION: &'static str =
        "Cannot load data while offline. It will refresh once you reconnect.";

    pub const RESTORED_TITLE: &'static str = "Back online";
    pub const RESTORED_DESCRIPTION: &'static str = "Your connection has been restored.";
    pub const RESTORED_DURATION: Duration = Duration::from_secs(3);

    pub const FETCH_ERROR_DURATION: Duration = Duration::from_secs(5);
    pub const DEFAULT_ERROR_LABEL: &'static str = "Failed to load data";
}

/// Configuration for active connectivity probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProbeConfig {
    /// URLs to probe for connectivity (in order of preference).
    pub probe_urls: Vec<String>,
    /// Timeout for a single probe request.
    pub probe_timeout: Duration,
    /// How often to re-check connectivity when offline.
    pub offline_recheck_interval: Duration,
    /// How often to verify connectivity when online.
    pub online_verify_interval: Duration,
}

impl ProbeConfig {
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_OFFLINE_RECHECK: Duration = Duration::from_secs(30);
    pub const DEFAULT_ONLINE_VERIFY: Duration = Duration::from_secs(300);

    /// Replace the probe URL list.
    pub fn with_probe_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probe_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the timeout for a single probe.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set both monitoring intervals.
    pub fn with_intervals(mut self, offline_recheck: Duration, online_verify: Duration) -> Self {
        self.offline_recheck_interval = offline_recheck;
        self.online_verify_interval = online_verify;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_urls: vec![
                // Lightweight endpoints that respond quickly
                "https://www.gstatic.com/generate_204".to_string(),
                "https://api.github.com".to_string(),
            ],
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
            offline_recheck_interval: Self::DEFAULT_OFFLINE_RECHECK,
            online_verify_interval: Self::DEFAULT_ONLINE_VERIFY,
        }
    }
}
