//! Network-aware fetch coordination.
//!
//! This module provides:
//! - The `FetchState` loading/error/data contract
//! - Producers that normalize any failure (or panic) into an error value
//! - Positional dependency lists
//! - The coordinator that ties them to connectivity and notifications

mod coordinator;
mod deps;
mod producer;
mod state;

pub use coordinator::{
    Attempt, AttemptOutcome, DiscardReason, FetchCoordinator, FetchCoordinatorBuilder,
    FetchOptions, Trigger,
};
pub use deps::{DepValue, Dependencies};
pub use producer::{Producer, ProducerFuture};
pub use state::FetchState;
