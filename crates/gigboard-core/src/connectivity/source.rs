//! Reachability signal sources.
//!
//! The platform's reachability is consumed as an injected capability: a
//! synchronous "is reachable" query plus ordered `Online`/`Offline` events
//! delivered to registered listeners. Listeners are held through a
//! [`ListenerGuard`] so they are always detached, whatever path drops it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// A single platform-reported reachability change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The platform reports the network as reachable.
    Online,
    /// The platform reports the network as unreachable.
    Offline,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Online => write!(f, "online"),
            Transition::Offline => write!(f, "offline"),
        }
    }
}

/// Callback invoked for every transition, in the order the source emits them.
pub type TransitionListener = Arc<dyn Fn(Transition) + Send + Sync>;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A queryable and observable reachability signal.
pub trait ReachabilitySource: Send + Sync {
    /// Current reachability as reported by the platform.
    fn is_reachable(&self) -> bool;

    /// Register a listener for subsequent transitions.
    fn add_listener(&self, listener: TransitionListener) -> ListenerId;

    /// Remove a previously registered listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// Shared handle to a reachability source.
pub type DynReachabilitySource = Arc<dyn ReachabilitySource>;

/// Listener bookkeeping shared by the bundled sources.
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, TransitionListener)>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: TransitionListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(existing, _)| *existing != id);
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a transition to every listener.
    ///
    /// The listener list is snapshotted first, so listeners may add or remove
    /// listeners (including themselves) while being called.
    pub fn emit(&self, transition: Transition) {
        let snapshot: Vec<TransitionListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(transition);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Scoped registration of a listener on a [`ReachabilitySource`].
///
/// The listener is detached when the guard is dropped.
pub struct ListenerGuard {
    source: DynReachabilitySource,
    id: Option<ListenerId>,
}

impl ListenerGuard {
    /// Register `listener` on `source` for the lifetime of the guard.
    pub fn attach(source: DynReachabilitySource, listener: TransitionListener) -> Self {
        let id = source.add_listener(listener);
        Self {
            source,
            id: Some(id),
        }
    }

    /// The source this guard is registered on.
    pub fn source(&self) -> &DynReachabilitySource {
        &self.source
    }

    /// Detach now instead of at drop.
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            debug!("Detaching reachability listener {:?}", id);
            self.source.remove_listener(id);
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Reachability driven by the host.
///
/// A browser bridge forwards `online`/`offline` events here; tests use it as
/// a fake signal. Every call emits, even when reachability did not change,
/// matching platforms that re-fire the same event.
#[derive(Debug)]
pub struct ManualReachability {
    reachable: AtomicBool,
    listeners: ListenerSet,
}

impl ManualReachability {
    /// Create a source with the given initial reachability.
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            listeners: ListenerSet::new(),
        }
    }

    /// Report the network as reachable.
    pub fn set_online(&self) {
        self.apply(Transition::Online);
    }

    /// Report the network as unreachable.
    pub fn set_offline(&self) {
        self.apply(Transition::Offline);
    }

    /// Report an arbitrary transition.
    pub fn apply(&self, transition: Transition) {
        self.reachable
            .store(transition == Transition::Online, Ordering::SeqCst);
        self.listeners.emit(transition);
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ReachabilitySource for ManualReachability {
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
