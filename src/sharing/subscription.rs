use std::fmt;

use parking_lot::Mutex;

type Teardown = Box<dyn FnOnce() + Send + 'static>;

/// Handle for an active subscription.
///
/// `cancel` runs the teardown at most once, so calling it repeatedly (or
/// cancelling and then dropping) never deregisters anything twice.
pub struct SharedSubscription {
    teardown: Mutex<Option<Teardown>>,
}

impl SharedSubscription {
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }

    /// Subscription for keys that never push changes.
    pub fn noop() -> Self {
        Self {
            teardown: Mutex::new(None),
        }
    }

    /// Stop future deliveries and release registered observers.
    pub fn cancel(&self) {
        // Take under the lock, run outside it.
        let teardown = self.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    pub fn is_active(&self) -> bool {
        self.teardown.lock().is_some()
    }
}

impl Drop for SharedSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for SharedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cancel_runs_teardown_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = SharedSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(subscription.is_active());
        subscription.cancel();
        subscription.cancel();
        drop(subscription);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_cancels() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        drop(SharedSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_is_inactive() {
        let subscription = SharedSubscription::noop();
        assert!(!subscription.is_active());
        subscription.cancel();
    }
}
