//! ConnectivityMonitor - online/offline tracking with user notifications.
//!
//! Provides:
//! - A two-valued online status plus a "recovered from offline" flag
//! - One persistent, deduplicated notification when the network drops
//! - One short-lived notification when it comes back after an outage
//! - Watch/broadcast channels so any number of observers can follow along

use crate::config::NotificationConfig;
use crate::connectivity::source::{DynReachabilitySource, ListenerGuard, Transition};
use crate::notify::{DynNotifier, Notification};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Snapshot of the monitor's view of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectivityState {
    /// Current reachability as reported by the platform.
    pub is_online: bool,
    /// Set when going offline; cleared once the recovery notification fires.
    pub was_offline: bool,
}

/// A real change of the online status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// Went from online to offline.
    Lost,
    /// Went from offline to online.
    Restored,
}

struct MonitorShared {
    state: watch::Sender<ConnectivityState>,
    events: broadcast::Sender<ConnectivityEvent>,
    notifier: DynNotifier,
    active: AtomicBool,
    /// Serializes transition handling so notifications follow event order.
    transition_lock: Mutex<()>,
}

impl MonitorShared {
    const EVENT_CAPACITY: usize = 16;

    fn handle_transition(&self, transition: Transition) {
        let _serial = self
            .transition_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.active.load(Ordering::SeqCst) {
            debug!("Ignoring {} transition after teardown", transition);
            return;
        }

        let previous = *self.state.borrow();
        match transition {
            Transition::Online => self.went_online(previous),
            Transition::Offline => self.went_offline(previous),
        }
    }

    fn went_online(&self, previous: ConnectivityState) {
        if previous.was_offline {
            info!("Network connectivity restored");
            self.notifier.dismiss(NotificationConfig::OFFLINE_DEDUPE_KEY);
            self.notifier.notify(
                Notification::success(NotificationConfig::RESTORED_TITLE)
                    .with_description(NotificationConfig::RESTORED_DESCRIPTION)
                    .with_duration(NotificationConfig::RESTORED_DURATION),
            );
        }

        self.state.send_if_modified(|state| {
            let modified = !state.is_online || state.was_offline;
            state.is_online = true;
            state.was_offline = false;
            modified
        });

        if !previous.is_online {
            // No receivers is fine
            let _ = self.events.send(ConnectivityEvent::Restored);
        }
    }

    fn went_offline(&self, previous: ConnectivityState) {
        if previous.is_online {
            warn!("Network connectivity lost");
        } else {
            debug!("Repeated offline transition");
        }

        self.state.send_if_modified(|state| {
            let modified = state.is_online || !state.was_offline;
            state.is_online = false;
            state.was_offline = true;
            modified
        });

        // The fixed key keeps repeats from stacking on the surface
        self.notifier.notify(
            Notification::error(NotificationConfig::OFFLINE_TITLE)
                .with_description(NotificationConfig::OFFLINE_DESCRIPTION)
                .persistent()
                .with_dedupe_key(NotificationConfig::OFFLINE_DEDUPE_KEY),
        );

        if previous.is_online {
            let _ = self.events.send(ConnectivityEvent::Lost);
        }
    }
}

/// Observes a reachability source for as long as it is alive.
///
/// Dropping the monitor (or calling [`teardown`](Self::teardown)) detaches
/// its listener; no notification fires afterwards.
pub struct ConnectivityMonitor {
    shared: Arc<MonitorShared>,
    _listener: ListenerGuard,
}

impl ConnectivityMonitor {
    /// Start observing `source`, dispatching notifications to `notifier`.
    ///
    /// If the source is already unreachable this counts as an immediate
    /// offline transition.
    pub fn start(source: DynReachabilitySource, notifier: DynNotifier) -> Self {
        let (state, _) = watch::channel(ConnectivityState {
            is_online: true,
            was_offline: false,
        });
        let (events, _) = broadcast::channel(MonitorShared::EVENT_CAPACITY);
        let shared = Arc::new(MonitorShared {
            state,
            events,
            notifier,
            active: AtomicBool::new(true),
            transition_lock: Mutex::new(()),
        });

        let weak = Arc::downgrade(&shared);
        let listener = ListenerGuard::attach(
            Arc::clone(&source),
            Arc::new(move |transition| {
                if let Some(shared) = weak.upgrade() {
                    shared.handle_transition(transition);
                }
            }),
        );

        if !source.is_reachable() {
            shared.handle_transition(Transition::Offline);
        }
        debug!("Connectivity monitor started (online: {})", source.is_reachable());

        Self {
            shared,
            _listener: listener,
        }
    }

    /// A cloneable handle for observers such as fetch coordinators.
    pub fn handle(&self) -> ConnectivityHandle {
        ConnectivityHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectivityState {
        *self.shared.state.borrow()
    }

    /// Check if the network is currently reachable.
    pub fn is_online(&self) -> bool {
        self.state().is_online
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.shared.state.subscribe()
    }

    /// Detach from the source. Equivalent to dropping the monitor.
    pub fn teardown(self) {}
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        // Waits out a transition that is already being handled
        let _serial = self
            .shared
            .transition_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.active.store(false, Ordering::SeqCst);
        debug!("Connectivity monitor torn down");
    }
}

/// Read-only, cloneable view of a [`ConnectivityMonitor`].
#[derive(Clone)]
pub struct ConnectivityHandle {
    shared: Arc<MonitorShared>,
}

impl ConnectivityHandle {
    /// Current state snapshot.
    pub fn state(&self) -> ConnectivityState {
        *self.shared.state.borrow()
    }

    /// Check if the network is currently reachable.
    pub fn is_online(&self) -> bool {
        self.state().is_online
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.shared.state.subscribe()
    }

    /// Receive online/offline change events from now on.
    pub fn events(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.shared.events.subscribe()
    }

    /// Whether the underlying monitor is still attached.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ConnectivityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityHandle")
            .field("state", &self.state())
            .field("active", &self.is_active())
            .finish()
    }
}
