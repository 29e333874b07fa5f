//! User-facing notifications (toasts).
//!
//! The [`Notifier`] trait is the boundary to whatever toast surface the host
//! renders. Two implementations ship with the crate:
//! - [`ToastSurface`]: an in-memory surface that honours dedupe keys and
//!   expiry, usable as the host's backing store and in tests
//! - [`TracingNotifier`]: forwards every notification to `tracing`

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// How long a notification stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastDuration {
    /// Auto-dismiss after the given duration.
    Finite(Duration),
    /// Stays until explicitly dismissed.
    Infinite,
}

impl ToastDuration {
    /// Whether a toast shown at `shown_at` has expired by `now`.
    pub fn is_expired(&self, shown_at: Instant, now: Instant) -> bool {
        match self {
            ToastDuration::Finite(duration) => now.saturating_duration_since(shown_at) >= *duration,
            ToastDuration::Infinite => false,
        }
    }
}

/// Serialized as milliseconds, or the string `"infinite"`.
impl Serialize for ToastDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ToastDuration::Finite(duration) => {
                serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
            }
            ToastDuration::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

/// A single notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "duration_ms")]
    pub duration: ToastDuration,
    /// Repeated dispatches with the same key replace rather than stack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
}

impl Notification {
    /// Toast lifetime used when none is given explicitly.
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(4);

    fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: None,
            duration: ToastDuration::Finite(Self::DEFAULT_DURATION),
            dedupe_key: None,
        }
    }

    /// A success notification with the default finite duration.
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    /// An error notification with the default finite duration.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = ToastDuration::Finite(duration);
        self
    }

    /// Keep the notification until it is dismissed.
    pub fn persistent(mut self) -> Self {
        self.duration = ToastDuration::Infinite;
        self
    }

    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }
}

/// Toast/alert surface that notifications are dispatched to.
pub trait Notifier: Send + Sync {
    /// Show a notification.
    fn notify(&self, notification: Notification);

    /// Dismiss the visible notification registered under `key`, if any.
    fn dismiss(&self, _key: &str) {}
}

/// Shared handle to a notifier.
pub type DynNotifier = Arc<dyn Notifier>;

/// A notification currently shown on a [`ToastSurface`].
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    /// The dedupe key, or a random id for unkeyed toasts.
    pub id: String,
    #[serde(flatten)]
    pub notification: Notification,
    #[serde(skip)]
    shown_at: Instant,
}

/// One entry of the dispatch history.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub issued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub notification: Notification,
}

#[derive(Debug, Default)]
struct SurfaceInner {
    visible: Vec<Toast>,
    history: VecDeque<DispatchRecord>,
}

impl SurfaceInner {
    fn prune(&mut self, now: Instant) {
        self.visible
            .retain(|toast| !toast.notification.duration.is_expired(toast.shown_at, now));
    }
}

/// In-memory toast surface.
///
/// A dispatch whose dedupe key matches a visible toast replaces that toast in
/// place. Finite toasts disappear once their duration has elapsed on the tokio
/// clock, so paused-time tests can advance through expiry.
///
/// The dispatch history keeps only the most recent entries.
#[derive(Debug)]
pub struct ToastSurface {
    inner: Mutex<SurfaceInner>,
    history_limit: usize,
}

impl ToastSurface {
    /// Dispatch records kept by [`ToastSurface::new`].
    pub const DEFAULT_HISTORY_LIMIT: usize = 256;

    pub fn new() -> Self {
        Self::with_history_limit(Self::DEFAULT_HISTORY_LIMIT)
    }

    /// Keep at most `limit` dispatch records, dropping the oldest.
    ///
    /// A limit of zero disables the history.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            inner: Mutex::new(SurfaceInner::default()),
            history_limit: limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toasts visible right now, oldest first.
    pub fn visible(&self) -> Vec<Toast> {
        let mut inner = self.lock();
        inner.prune(Instant::now());
        inner.visible.clone()
    }

    /// Recent dispatches, oldest first, including replaced ones.
    pub fn dispatched(&self) -> Vec<DispatchRecord> {
        self.lock().history.iter().cloned().collect()
    }

    /// Number of visible toasts registered under `key`.
    pub fn visible_with_key(&self, key: &str) -> usize {
        self.visible().iter().filter(|toast| toast.id == key).count()
    }

    /// Remove every visible toast and forget the history.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.visible.clear();
        inner.history.clear();
    }
}

impl Default for ToastSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ToastSurface {
    fn notify(&self, notification: Notification) {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.prune(now);
        if self.history_limit > 0 {
            if inner.history.len() == self.history_limit {
                inner.history.pop_front();
            }
            inner.history.push_back(DispatchRecord {
                issued_at: Utc::now(),
                notification: notification.clone(),
            });
        }

        if let Some(key) = notification.dedupe_key.as_deref() {
            if let Some(existing) = inner.visible.iter_mut().find(|toast| toast.id == key) {
                debug!("Replacing visible toast {}", key);
                existing.notification = notification;
                existing.shown_at = now;
                return;
            }
        }

        let id = notification
            .dedupe_key
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        inner.visible.push(Toast {
            id,
            notification,
            shown_at: now,
        });
    }

    fn dismiss(&self, key: &str) {
        let mut inner = self.lock();
        inner.visible.retain(|toast| toast.id != key);
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or("");
        match notification.kind {
            NotificationKind::Error => warn!("[toast] {}: {}", notification.title, description),
            NotificationKind::Success => info!("[toast] {}: {}", notification.title, description),
        }
    }

    fn dismiss(&self, key: &str) {
        debug!("[toast] dismissed {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let n = Notification::error("Failed")
            .with_description("network timeout")
            .persistent()
            .with_dedupe_key("k");
        assert_eq!(n.kind, NotificationKind::Error);
        assert_eq!(n.description.as_deref(), Some("network timeout"));
        assert_eq!(n.duration, ToastDuration::Infinite);
        assert_eq!(n.dedupe_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_duration_serialization() {
        let finite = Notification::success("ok").with_duration(Duration::from_millis(3000));
        let json = serde_json::to_value(&finite).unwrap();
        assert_eq!(json["duration_ms"], 3000);
        assert_eq!(json["kind"], "success");
        assert!(json.get("dedupe_key").is_none());

        let infinite = Notification::error("offline").persistent();
        let json = serde_json::to_value(&infinite).unwrap();
        assert_eq!(json["duration_ms"], "infinite");
    }

    #[test]
    fn test_same_key_replaces_instead_of_stacking() {
        let surface = ToastSurface::new();
        surface.notify(Notification::error("first").persistent().with_dedupe_key("offline"));
        surface.notify(Notification::error("second").persistent().with_dedupe_key("offline"));

        let visible = surface.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].notification.title, "second");
        assert_eq!(surface.dispatched().len(), 2);
    }

    #[test]
    fn test_unkeyed_toasts_stack() {
        let surface = ToastSurface::new();
        surface.notify(Notification::error("a"));
        surface.notify(Notification::error("a"));
        let visible = surface.visible();
        assert_eq!(visible.len(), 2);
        assert_ne!(visible[0].id, visible[1].id);
    }

    #[test]
    fn test_dismiss_by_key() {
        let surface = ToastSurface::new();
        surface.notify(Notification::error("offline").persistent().with_dedupe_key("offline"));
        surface.notify(Notification::success("other"));

        surface.dismiss("offline");

        assert_eq!(surface.visible_with_key("offline"), 0);
        assert_eq!(surface.visible().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finite_toasts_expire() {
        let surface = ToastSurface::new();
        surface.notify(Notification::success("restored").with_duration(Duration::from_secs(3)));
        surface.notify(Notification::error("offline").persistent().with_dedupe_key("offline"));
        assert_eq!(surface.visible().len(), 2);

        tokio::time::advance(Duration::from_secs(3)).await;

        let visible = surface.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "offline");
    }

    #[test]
    fn test_clear() {
        let surface = ToastSurface::new();
        surface.notify(Notification::success("x"));
        surface.clear();
        assert!(surface.visible().is_empty());
        assert!(surface.dispatched().is_empty());
    }

    #[test]
    fn test_history_keeps_most_recent() {
        let surface = ToastSurface::with_history_limit(3);
        for n in 0..5 {
            surface.notify(
                Notification::error(format!("offline {n}")).with_dedupe_key("network-offline"),
            );
        }

        let titles: Vec<String> = surface
            .dispatched()
            .into_iter()
            .map(|record| record.notification.title)
            .collect();
        assert_eq!(titles, vec!["offline 2", "offline 3", "offline 4"]);
        assert_eq!(surface.visible().len(), 1);
    }

    #[test]
    fn test_zero_history_limit_still_shows_toasts() {
        let surface = ToastSurface::with_history_limit(0);
        surface.notify(Notification::success("Back online"));
        assert!(surface.dispatched().is_empty());
        assert_eq!(surface.visible().len(), 1);
    }
}
