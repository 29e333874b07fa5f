//! Generation tokens for superseding in-flight attempts.
//!
//! Every attempt started by a fetch coordinator takes a fresh [`Generation`]
//! from a shared [`GenerationCounter`]. When the attempt settles, its result is
//! applied only if its generation is still the newest one and the counter has
//! not been retired. Retiring the counter is how teardown refuses all further
//! results without sending anything to the producer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Marker for a single attempt. Later attempts always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`Generation`]s that can be retired exactly once.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: AtomicU64,
    retired: AtomicBool,
}

impl GenerationCounter {
    /// Create a counter with no attempts issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next generation, superseding every earlier one.
    ///
    /// Returns `None` once the counter has been retired.
    pub fn advance(&self) -> Option<Generation> {
        if self.is_retired() {
            return None;
        }
        Some(Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1))
    }

    /// The most recently issued generation, if any.
    pub fn latest(&self) -> Option<Generation> {
        match self.current.load(Ordering::SeqCst) {
            0 => None,
            n => Some(Generation(n)),
        }
    }

    /// Whether `generation` is still the newest and results may be applied.
    pub fn is_current(&self, generation: Generation) -> bool {
        !self.is_retired() && self.current.load(Ordering::SeqCst) == generation.0
    }

    /// Refuse all further generations and results.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    /// Check if the counter has been retired.
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }
}
