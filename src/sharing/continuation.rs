//! Delivery targets handed to keys by the state layer.
//!
//! A [`LoadContinuation`] is single-use: `resume` consumes it, so a key can
//! deliver at most one outcome per load. Dropping it without resuming is how
//! a superseded load goes quiet. A [`SharedSubscriber`] is multi-use and
//! receives every change a subscription observes.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::error::SharingError;

/// Result type delivered to continuations and subscribers.
pub type LoadResult<V> = Result<V, SharingError>;

type ResumeFn<V> = Box<dyn FnOnce(LoadResult<V>) + Send + 'static>;
type YieldFn<V> = Arc<dyn Fn(LoadResult<V>) + Send + Sync + 'static>;

/// One-shot callback for the outcome of a single load.
pub struct LoadContinuation<V> {
    resume: ResumeFn<V>,
}

impl<V: Send + 'static> LoadContinuation<V> {
    /// Wrap a callback that receives the outcome.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(LoadResult<V>) + Send + 'static,
    {
        Self {
            resume: Box::new(f),
        }
    }

    /// Create a continuation paired with a receiver for awaiting the outcome.
    pub fn channel() -> (Self, LoadReceiver<V>) {
        let (tx, rx) = oneshot::channel();
        let continuation = Self::new(move |result| {
            // Receiver gone means nobody is waiting any more.
            let _ = tx.send(result);
        });
        (continuation, LoadReceiver { rx })
    }

    /// Deliver the outcome.
    pub fn resume(self, result: LoadResult<V>) {
        (self.resume)(result);
    }

    pub fn resume_returning(self, value: V) {
        self.resume(Ok(value));
    }

    pub fn resume_throwing(self, error: SharingError) {
        self.resume(Err(error));
    }
}

impl<V> fmt::Debug for LoadContinuation<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoadContinuation(..)")
    }
}

/// What a waiter observed for one load.
#[derive(Debug, Clone)]
pub enum LoadOutcome<V> {
    Delivered(V),
    Failed(SharingError),
    /// The continuation was dropped without resuming.
    Cancelled,
}

impl<V> LoadOutcome<V> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadOutcome::Cancelled)
    }

    /// Convert into a `Result`, mapping cancellation to [`SharingError::Cancelled`].
    pub fn into_result(self) -> LoadResult<V> {
        match self {
            LoadOutcome::Delivered(value) => Ok(value),
            LoadOutcome::Failed(err) => Err(err),
            LoadOutcome::Cancelled => Err(SharingError::Cancelled),
        }
    }
}

/// Awaitable side of [`LoadContinuation::channel`].
pub struct LoadReceiver<V> {
    rx: oneshot::Receiver<LoadResult<V>>,
}

impl<V> LoadReceiver<V> {
    pub async fn outcome(self) -> LoadOutcome<V> {
        match self.rx.await {
            Ok(Ok(value)) => LoadOutcome::Delivered(value),
            Ok(Err(err)) => LoadOutcome::Failed(err),
            Err(_) => LoadOutcome::Cancelled,
        }
    }
}

/// Multi-shot callback for values produced after the initial load.
pub struct SharedSubscriber<V> {
    yield_fn: YieldFn<V>,
}

impl<V> Clone for SharedSubscriber<V> {
    fn clone(&self) -> Self {
        Self {
            yield_fn: Arc::clone(&self.yield_fn),
        }
    }
}

impl<V: Send + 'static> SharedSubscriber<V> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(LoadResult<V>) + Send + Sync + 'static,
    {
        Self {
            yield_fn: Arc::new(f),
        }
    }

    /// Create a subscriber that forwards every delivery into a channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LoadResult<V>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Self::new(move |result| {
            let _ = tx.send(result);
        });
        (subscriber, rx)
    }

    pub fn yield_result(&self, result: LoadResult<V>) {
        (self.yield_fn)(result);
    }

    pub fn yield_value(&self, value: V) {
        self.yield_result(Ok(value));
    }

    pub fn yield_error(&self, error: SharingError) {
        self.yield_result(Err(error));
    }
}

impl<V> fmt::Debug for SharedSubscriber<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSubscriber(..)")
    }
}
