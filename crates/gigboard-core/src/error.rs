//! Error types for Gigboard.
//!
//! Producer failures are normalized into [`GigboardError::Producer`] so that
//! consuming views always see an error value carrying a readable message,
//! whatever the producer actually failed with.

use std::any::Any;
use std::fmt::Display;
use thiserror::Error;

/// Main error type for the Gigboard core library.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GigboardError {
    /// A producer rejected (or panicked). Displays as the bare message.
    #[error("{message}")]
    Producer { message: String },

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Gigboard operations.
pub type Result<T> = std::result::Result<T, GigboardError>;

impl From<reqwest::Error> for GigboardError {
    fn from(err: reqwest::Error) -> Self {
        GigboardError::Network {
            message: err.to_string(),
            cause: std::error::Error::source(&err).map(|s| s.to_string()),
        }
    }
}

impl GigboardError {
    /// Normalize an arbitrary producer failure into an error value.
    pub fn producer(failure: impl Display) -> Self {
        GigboardError::Producer {
            message: failure.to_string(),
        }
    }

    /// Normalize a panic payload caught while running a producer.
    ///
    /// String payloads keep their text; anything else gets a generic message.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "producer panicked".to_string()
        };
        GigboardError::Producer { message }
    }

    /// The human-readable message, without any category prefix for producer failures.
    pub fn message(&self) -> String {
        match self {
            GigboardError::Producer { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error came from a producer (as opposed to the library itself).
    pub fn is_producer_failure(&self) -> bool {
        matches!(self, GigboardError::Producer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_error_display_is_bare_message() {
        let err = GigboardError::producer("network timeout");
        assert_eq!(err.to_string(), "network timeout");
        assert_eq!(err.message(), "network timeout");
        assert!(err.is_producer_failure());
    }

    #[test]
    fn test_from_panic_payloads() {
        let err = GigboardError::from_panic(Box::new("boom"));
        assert_eq!(err.message(), "boom");

        let err = GigboardError::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(err.message(), "owned boom");

        let err = GigboardError::from_panic(Box::new(42_u32));
        assert_eq!(err.message(), "producer panicked");
    }

    #[test]
    fn test_library_errors_are_not_producer_failures() {
        let err = GigboardError::Config {
            message: "no probe urls".into(),
        };
        assert_eq!(err.to_string(), "Configuration error: no probe urls");
        assert!(!err.is_producer_failure());
    }
}
