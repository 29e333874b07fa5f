//! Connectivity tracking.
//!
//! This module provides:
//! - Reachability sources (host-driven and probe-based) behind one trait
//! - Scoped listener registration that cannot leak
//! - The connectivity monitor that turns transitions into state and toasts

mod monitor;
mod probe;
mod source;

pub use monitor::{ConnectivityEvent, ConnectivityHandle, ConnectivityMonitor, ConnectivityState};
pub use probe::{HttpProbe, ProbeReachability, ReachabilityProbe};
pub use source::{
    DynReachabilitySource, ListenerGuard, ListenerId, ListenerSet, ManualReachability,
    ReachabilitySource, Transition, TransitionListener,
};
