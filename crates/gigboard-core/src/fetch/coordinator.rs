//! FetchCoordinator - connectivity-aware fetch state for a single view.
//!
//! A coordinator wraps a [`Producer`] and keeps a [`FetchState`] in sync with
//! it. An attempt starts when:
//! - the coordinator is mounted
//! - the dependency list changes position-wise
//! - connectivity comes back after an outage
//! - [`FetchCoordinator::refetch`] is called
//!
//! Each attempt takes a fresh generation. Only the newest generation's result
//! is applied; results of superseded attempts, or of attempts that settle after
//! the coordinator was unmounted, are computed to completion and dropped.

use crate::config::NotificationConfig;
use crate::connectivity::{ConnectivityEvent, ConnectivityHandle};
use crate::error::{GigboardError, Result};
use crate::fetch::deps::Dependencies;
use crate::fetch::producer::Producer;
use crate::fetch::state::FetchState;
use crate::generation::{Generation, GenerationCounter};
use crate::notify::{DynNotifier, Notification};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Per-coordinator behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Title of the notification shown when the producer fails.
    pub error_label: String,
    /// Whether failures and offline skips surface notifications.
    pub notify_on_error: bool,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the notification title used for failures.
    pub fn with_error_label(mut self, label: impl Into<String>) -> Self {
        self.error_label = label.into();
        self
    }

    /// Enable or disable user-visible notifications.
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify_on_error = enabled;
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            error_label: NotificationConfig::DEFAULT_ERROR_LABEL.to_string(),
            notify_on_error: true,
        }
    }
}

/// What started an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    Dependencies,
    Recovery,
    Refetch,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Mount => write!(f, "mount"),
            Trigger::Dependencies => write!(f, "dependencies"),
            Trigger::Recovery => write!(f, "recovery"),
            Trigger::Refetch => write!(f, "refetch"),
        }
    }
}

/// Why a settled result was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A newer attempt was started before this one settled.
    Superseded,
    /// The coordinator was unmounted.
    TornDown,
}

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The produced value was stored in `data`.
    Succeeded,
    /// The failure was stored in `error`; `data` was kept.
    Failed(GigboardError),
    /// Offline at trigger time; the producer was never called.
    OfflineSkipped,
    /// The result arrived too late and was dropped.
    Discarded(DiscardReason),
}

enum AttemptInner {
    Settled(AttemptOutcome),
    Running(JoinHandle<AttemptOutcome>),
}

/// Handle to a started attempt.
///
/// Dropping it does not cancel anything; the attempt still settles.
pub struct Attempt {
    generation: Option<Generation>,
    trigger: Trigger,
    inner: AttemptInner,
}

impl Attempt {
    fn settled(generation: Option<Generation>, trigger: Trigger, outcome: AttemptOutcome) -> Self {
        Self {
            generation,
            trigger,
            inner: AttemptInner::Settled(outcome),
        }
    }

    /// The generation this attempt was issued, if the coordinator was still mounted.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Whether the producer was actually invoked.
    pub fn is_running(&self) -> bool {
        matches!(self.inner, AttemptInner::Running(_))
    }

    /// Wait for the attempt to settle.
    pub async fn outcome(self) -> AttemptOutcome {
        match self.inner {
            AttemptInner::Settled(outcome) => outcome,
            AttemptInner::Running(task) => task.await.unwrap_or_else(|e| {
                debug!("Attempt task did not complete: {}", e);
                AttemptOutcome::Discarded(DiscardReason::TornDown)
            }),
        }
    }
}

impl std::fmt::Debug for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attempt")
            .field("generation", &self.generation)
            .field("trigger", &self.trigger)
            .field("running", &self.is_running())
            .finish()
    }
}

struct Shared<T> {
    state: watch::Sender<FetchState<T>>,
    generations: GenerationCounter,
    producer: Producer<T>,
    options: FetchOptions,
    connectivity: ConnectivityHandle,
    notifier: DynNotifier,
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn start_attempt(self: &Arc<Self>, trigger: Trigger) -> Attempt {
        let online = self.connectivity.is_online();

        // Generation advance and state update share the watch lock with settle.
        let mut issued = None;
        self.state.send_if_modified(|state| {
            let Some(generation) = self.generations.advance() else {
                return false;
            };
            issued = Some(generation);
            if online {
                state.loading = true;
                state.error = None;
                true
            } else {
                let modified = state.loading;
                state.loading = false;
                modified
            }
        });

        let Some(generation) = issued else {
            debug!("Ignoring {} trigger after unmount", trigger);
            return Attempt::settled(
                None,
                trigger,
                AttemptOutcome::Discarded(DiscardReason::TornDown),
            );
        };

        if !online {
            debug!("Attempt {} ({}) skipped: offline", generation, trigger);
            if self.options.notify_on_error {
                self.notifier.notify(
                    Notification::error(NotificationConfig::OFFLINE_TITLE)
                        .with_description(NotificationConfig::OFFLINE_FETCH_DESCRIPTION)
                        .persistent()
                        .with_dedupe_key(NotificationConfig::OFFLINE_DEDUPE_KEY),
                );
            }
            return Attempt::settled(Some(generation), trigger, AttemptOutcome::OfflineSkipped);
        }

        debug!("Attempt {} started ({})", generation, trigger);
        let pending = self.producer.invoke();
        let shared = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = pending.await;
            shared.settle(generation, result)
        });

        Attempt {
            generation: Some(generation),
            trigger,
            inner: AttemptInner::Running(task),
        }
    }

    fn settle(&self, generation: Generation, result: Result<T>) -> AttemptOutcome {
        let mut result = Some(result);
        let mut outcome = AttemptOutcome::Discarded(DiscardReason::Superseded);

        self.state.send_if_modified(|state| {
            if self.generations.is_retired() {
                outcome = AttemptOutcome::Discarded(DiscardReason::TornDown);
                return false;
            }
            if !self.generations.is_current(generation) {
                return false;
            }
            match result.take() {
                Some(Ok(value)) => {
                    state.data = Some(value);
                    state.loading = false;
                    outcome = AttemptOutcome::Succeeded;
                }
                Some(Err(err)) => {
                    state.error = Some(err.clone());
                    state.loading = false;
                    outcome = AttemptOutcome::Failed(err);
                }
                None => return false,
            }
            true
        });

        match &outcome {
            AttemptOutcome::Succeeded => debug!("Attempt {} succeeded", generation),
            AttemptOutcome::Failed(err) => {
                warn!("{} (attempt {}): {}", self.options.error_label, generation, err);
                if self.options.notify_on_error {
                    self.notifier.notify(
                        Notification::error(self.options.error_label.clone())
                            .with_description(err.message())
                            .with_duration(NotificationConfig::FETCH_ERROR_DURATION),
                    );
                }
            }
            AttemptOutcome::Discarded(reason) => {
                debug!("Attempt {} result discarded ({:?})", generation, reason)
            }
            AttemptOutcome::OfflineSkipped => {}
        }
        outcome
    }
}

/// Re-run the producer whenever connectivity is restored.
fn spawn_recovery_listener<T>(shared: &Arc<Shared<T>>) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    let mut events = shared.connectivity.events();
    let weak = Arc::downgrade(shared);

    tokio::spawn(async move {
        loop {
            let restored = match events.recv().await {
                Ok(ConnectivityEvent::Restored) => true,
                Ok(ConnectivityEvent::Lost) => false,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Fall back to the current state below
                    warn!("Missed {} connectivity events", missed);
                    true
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !restored {
                continue;
            }

            let Some(shared) = weak.upgrade() else {
                break;
            };
            if shared.generations.is_retired() {
                break;
            }
            if shared.connectivity.is_online() {
                shared.start_attempt(Trigger::Recovery);
            }
        }
    })
}

/// Connectivity-aware fetch state for one consuming view.
///
/// Must be mounted from within a tokio runtime. Dropping the coordinator
/// (or calling [`unmount`](Self::unmount)) stops all further state changes.
pub struct FetchCoordinator<T> {
    shared: Arc<Shared<T>>,
    deps: Mutex<Dependencies>,
    recovery: JoinHandle<()>,
}

impl<T> FetchCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start configuring a coordinator around `producer`.
    pub fn builder(producer: Producer<T>) -> FetchCoordinatorBuilder<T> {
        FetchCoordinatorBuilder::new(producer)
    }

    /// Current state snapshot.
    pub fn state(&self) -> FetchState<T> {
        self.shared.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }

    /// Wait until no attempt is loading and return that state.
    ///
    /// After unmount the state is frozen, so this only returns if it was
    /// already settled.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| !state.loading).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.state())
    }

    /// Start a new attempt now, superseding any in flight.
    pub fn refetch(&self) -> Attempt {
        self.shared.start_attempt(Trigger::Refetch)
    }

    /// Replace the dependency list, starting an attempt if it changed.
    pub fn set_deps(&self, deps: impl Into<Dependencies>) -> Option<Attempt> {
        let deps = deps.into();
        {
            let mut current = self.deps.lock().unwrap_or_else(PoisonError::into_inner);
            if !deps.changed_from(&current) {
                return None;
            }
            *current = deps;
        }
        Some(self.shared.start_attempt(Trigger::Dependencies))
    }

    /// The dependency list last accepted.
    pub fn deps(&self) -> Dependencies {
        self.deps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently issued generation.
    pub fn latest_generation(&self) -> Option<Generation> {
        self.shared.generations.latest()
    }

    pub fn options(&self) -> &FetchOptions {
        &self.shared.options
    }

    /// Whether the coordinator still accepts results.
    pub fn is_mounted(&self) -> bool {
        !self.shared.generations.is_retired()
    }

    /// Tear the coordinator down. Equivalent to dropping it.
    pub fn unmount(self) {}
}

impl<T> Drop for FetchCoordinator<T> {
    fn drop(&mut self) {
        // Retire under the watch lock so no settle can apply afterwards
        self.shared.state.send_if_modified(|_| {
            self.shared.generations.retire();
            false
        });
        self.recovery.abort();
        debug!("Fetch coordinator unmounted");
    }
}

/// Builder for configuring a [`FetchCoordinator`].
///
/// # Example
///
/// ```rust,ignore
/// let jobs = FetchCoordinator::builder(Producer::new(move || backend.list_jobs(page)))
///     .deps(deps![page])
///     .error_label("Failed to load jobs")
///     .mount(monitor.handle(), notifier.clone());
/// ```
pub struct FetchCoordinatorBuilder<T> {
    producer: Producer<T>,
    deps: Dependencies,
    options: FetchOptions,
}

impl<T> FetchCoordinatorBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a builder with no dependencies and default options.
    pub fn new(producer: Producer<T>) -> Self {
        Self {
            producer,
            deps: Dependencies::new(),
            options: FetchOptions::default(),
        }
    }

    /// Initial dependency list.
    pub fn deps(mut self, deps: impl Into<Dependencies>) -> Self {
        self.deps = deps.into();
        self
    }

    /// Replace all options at once.
    pub fn options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Title of the failure notification.
    ///
    /// Default: "Failed to load data"
    pub fn error_label(mut self, label: impl Into<String>) -> Self {
        self.options.error_label = label.into();
        self
    }

    /// Enable or disable notifications.
    ///
    /// Default: `true`
    pub fn notify_on_error(mut self, enabled: bool) -> Self {
        self.options.notify_on_error = enabled;
        self
    }

    /// Mount the coordinator and start the initial attempt.
    pub fn mount(
        self,
        connectivity: ConnectivityHandle,
        notifier: DynNotifier,
    ) -> FetchCoordinator<T> {
        let (state, _) = watch::channel(FetchState::default());
        let shared = Arc::new(Shared {
            state,
            generations: GenerationCounter::new(),
            producer: self.producer,
            options: self.options,
            connectivity,
            notifier,
        });

        let recovery = spawn_recovery_listener(&shared);
        shared.start_attempt(Trigger::Mount);

        FetchCoordinator {
            shared,
            deps: Mutex::new(self.deps),
            recovery,
        }
    }
}
