//! Gigboard Core - network-aware data fetching for the Gigboard job marketplace.
//!
//! This crate pairs a connectivity monitor with a generic fetch coordinator:
//! - [`ConnectivityMonitor`] follows online/offline transitions of an injected
//!   reachability source and raises deduplicated notifications
//! - [`FetchCoordinator`] runs an arbitrary async producer, re-running it when
//!   its dependencies change or the network comes back, and exposes a uniform
//!   loading/error/data state
//!
//! # Example
//!
//! ```rust,no_run
//! use gigboard_core::{
//!     deps, ConnectivityMonitor, FetchCoordinator, ManualReachability, Producer, ToastSurface,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let source = Arc::new(ManualReachability::new(true));
//!     let toasts = Arc::new(ToastSurface::new());
//!     let monitor = ConnectivityMonitor::start(source.clone(), toasts.clone());
//!
//!     let jobs = FetchCoordinator::builder(Producer::new(|| async {
//!         Ok::<_, String>(vec!["job-1".to_string()])
//!     }))
//!     .deps(deps![1_u32])
//!     .error_label("Failed to load jobs")
//!     .mount(monitor.handle(), toasts.clone());
//!
//!     let state = jobs.settled().await;
//!     println!("{:?}", state.data);
//! }
//! ```

pub mod config;
pub mod connectivity;
pub mod error;
pub mod fetch;
pub mod generation;
pub mod notify;

// Re-export commonly used types
pub use connectivity::{
    ConnectivityEvent, ConnectivityHandle, ConnectivityMonitor, ConnectivityState, HttpProbe,
    ManualReachability, ProbeReachability, ReachabilitySource, Transition,
};
pub use error::{GigboardError, Result};
pub use fetch::{
    Attempt, AttemptOutcome, DepValue, Dependencies, DiscardReason, FetchCoordinator,
    FetchOptions, FetchState, Producer, Trigger,
};
pub use generation::{Generation, GenerationCounter};
pub use notify::{
    DynNotifier, Notification, NotificationKind, Notifier, ToastDuration, ToastSurface,
    TracingNotifier,
};
