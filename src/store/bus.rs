use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle identifying one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

struct Observer<E> {
    id: ObserverId,
    event: E,
    handler: Handler<E>,
}

/// Publish/subscribe channel owned by a storage collaborator.
///
/// Observers register for one event value and are invoked synchronously on
/// the posting thread, in registration order. Handlers are expected to hand
/// real work to a task.
pub struct EventBus<E> {
    observers: Arc<Mutex<Vec<Observer<E>>>>,
    next_id: Arc<AtomicU64>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            observers: Arc::clone(&self.observers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            observers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl<E: PartialEq + Send + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every post of `event`.
    pub fn observe<F>(&self, event: E, handler: F) -> ObserverId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push(Observer {
            id,
            event,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove exactly the observer `id`. Returns false if it was already gone.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|observer| observer.id != id);
        observers.len() != before
    }

    /// Deliver `event` to every observer registered for it.
    pub fn post(&self, event: &E) {
        // Handlers run without the lock so they may observe or remove.
        let handlers: Vec<Handler<E>> = self
            .observers
            .lock()
            .iter()
            .filter(|observer| &observer.event == event)
            .map(|observer| Arc::clone(&observer.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&&'static str) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &&'static str| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_post_reaches_matching_observers_only() {
        let bus = EventBus::new();
        let (saved, on_saved) = counter();
        let (other, on_other) = counter();
        bus.observe("saved", on_saved);
        bus.observe("other", on_other);

        bus.post(&"saved");
        bus.post(&"saved");

        assert_eq!(saved.load(Ordering::SeqCst), 2);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_is_scoped_and_idempotent() {
        let bus = EventBus::new();
        let (first, on_first) = counter();
        let (second, on_second) = counter();
        let first_id = bus.observe("saved", on_first);
        bus.observe("saved", on_second);

        assert!(bus.remove(first_id));
        assert!(!bus.remove(first_id));
        assert_eq!(bus.observer_count(), 1);

        bus.post(&"saved");
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_remove_itself() {
        let bus: EventBus<&'static str> = EventBus::new();
        let slot: Arc<Mutex<Option<ObserverId>>> = Arc::new(Mutex::new(None));
        let handler_bus = bus.clone();
        let handler_slot = Arc::clone(&slot);
        let id = bus.observe("saved", move |_| {
            if let Some(id) = *handler_slot.lock() {
                handler_bus.remove(id);
            }
        });
        *slot.lock() = Some(id);

        bus.post(&"saved");
        assert_eq!(bus.observer_count(), 0);
    }
}
