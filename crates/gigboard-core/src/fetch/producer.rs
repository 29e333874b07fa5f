//! Caller-supplied asynchronous producers.

use crate::error::{GigboardError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Boxed future returned by one producer invocation.
pub type ProducerFuture<T> = BoxFuture<'static, Result<T>>;

/// A zero-argument asynchronous operation that can be invoked repeatedly.
///
/// Whatever the operation fails with is normalized into
/// [`GigboardError::Producer`], including panics.
pub struct Producer<T> {
    call: Arc<dyn Fn() -> ProducerFuture<T> + Send + Sync>,
}

impl<T: Send + 'static> Producer<T> {
    /// Wrap an async closure.
    ///
    /// # Example
    ///
    /// ```
    /// use gigboard_core::fetch::Producer;
    ///
    /// let producer = Producer::new(|| async { Ok::<_, String>(vec!["job-1".to_string()]) });
    /// # let _ = producer;
    /// ```
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        Self {
            call: Arc::new(move || f().map(|r| r.map_err(GigboardError::producer)).boxed()),
        }
    }

    /// Call the operation now and return its pending result.
    ///
    /// The call itself happens synchronously; only the returned future
    /// suspends. A panic either while calling or while polling resolves to a
    /// producer error instead of unwinding into the caller.
    pub fn invoke(&self) -> ProducerFuture<T> {
        match std::panic::catch_unwind(AssertUnwindSafe(|| (self.call)())) {
            Ok(pending) => AssertUnwindSafe(pending)
                .catch_unwind()
                .map(|caught| {
                    caught.unwrap_or_else(|payload| Err(GigboardError::from_panic(payload)))
                })
                .boxed(),
            Err(payload) => futures::future::ready(Err(GigboardError::from_panic(payload))).boxed(),
        }
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
        }
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}
