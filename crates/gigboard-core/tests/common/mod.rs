//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use gigboard_core::{ConnectivityMonitor, ManualReachability, Producer, ToastSurface};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// A job posting as returned by the mocked listing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
}

pub fn job(id: &str) -> Job {
    Job { id: id.to_string() }
}

/// Connectivity fixture: a host-driven source, an in-memory toast surface and
/// a monitor observing the source.
pub struct Network {
    pub source: Arc<ManualReachability>,
    pub toasts: Arc<ToastSurface>,
    pub monitor: ConnectivityMonitor,
}

impl Network {
    pub fn new(online: bool) -> Self {
        let source = Arc::new(ManualReachability::new(online));
        let toasts = Arc::new(ToastSurface::new());
        let monitor = ConnectivityMonitor::start(source.clone(), toasts.clone());
        Self {
            source,
            toasts,
            monitor,
        }
    }
}

type Gate<T> = oneshot::Sender<Result<T, String>>;

/// Producer whose invocations stay pending until the test settles them.
///
/// Invocation `n` (0-based) is completed with [`resolve`](Self::resolve) or
/// [`reject`](Self::reject).
pub struct Script<T> {
    calls: AtomicUsize,
    gates: Mutex<Vec<Option<Gate<T>>>>,
}

impl<T: Send + 'static> Script<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gates: Mutex::new(Vec::new()),
        })
    }

    pub fn producer(self: &Arc<Self>) -> Producer<T> {
        let script = Arc::clone(self);
        Producer::new(move || {
            let (tx, rx) = oneshot::channel();
            script.gates.lock().unwrap().push(Some(tx));
            script.calls.fetch_add(1, Ordering::SeqCst);
            async move { rx.await.unwrap_or_else(|_| Err("gate dropped".to_string())) }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn resolve(&self, call: usize, value: T) {
        self.settle(call, Ok(value));
    }

    pub fn reject(&self, call: usize, message: &str) {
        self.settle(call, Err(message.to_string()));
    }

    fn settle(&self, call: usize, result: Result<T, String>) {
        let gate = self.gates.lock().unwrap()[call]
            .take()
            .expect("invocation already settled");
        let _ = gate.send(result);
    }

    /// Yield to spawned tasks until at least `count` invocations happened.
    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("producer was not invoked in time");
    }
}
