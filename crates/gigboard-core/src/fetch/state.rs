//! The loading/error/data contract exposed to consuming views.

use crate::error::GigboardError;

/// State of one coordinated fetch.
///
/// A failed attempt keeps `data` from the last success and sets `error`.
/// `error` is cleared whenever a new attempt actually starts.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Last successfully produced value.
    pub data: Option<T>,
    /// True while an attempt is in flight.
    pub loading: bool,
    /// Last producer failure.
    pub error: Option<GigboardError>,
}

impl<T> FetchState<T> {
    /// Check if the last attempt has finished (or was skipped).
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&GigboardError> {
        self.error.as_ref()
    }
}

impl<T> Default for FetchState<T> {
    /// Mounting always starts an attempt, so a fresh state is loading.
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}
