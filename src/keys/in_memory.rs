use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::sharing::{
    KeyId, LoadContext, LoadContinuation, SharedKey, SharedReaderKey, SharedSubscriber,
    SharedSubscription, SharingError,
};
use crate::store::EventBus;

use super::storage_error::StorageError;
use super::Storable;

/// Named values that live for as long as the storage does.
///
/// Values are held as JSON so one storage can carry slots of any type.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    values: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    events: EventBus<String>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, name: &str) -> Option<serde_json::Value> {
        self.values.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: serde_json::Value) {
        self.values.lock().insert(name.to_string(), value);
        self.events.post(&name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.lock().contains_key(name)
    }
}

/// Key for one named in-memory slot.
pub struct InMemoryKey<V> {
    name: String,
    storage: InMemoryStorage,
    _value: PhantomData<fn() -> V>,
}

impl<V: Storable> InMemoryKey<V> {
    pub fn new(name: impl Into<String>, storage: InMemoryStorage) -> Self {
        Self {
            name: name.into(),
            storage,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, fallback: Option<V>) -> Result<V, SharingError> {
        read_slot(&self.storage, &self.name, fallback)
    }
}

fn read_slot<V: Storable>(
    storage: &InMemoryStorage,
    name: &str,
    fallback: Option<V>,
) -> Result<V, SharingError> {
    match storage.get(name) {
        Some(json) => serde_json::from_value(json).map_err(|source| {
            SharingError::from(StorageError::Encode {
                name: name.to_string(),
                source,
            })
        }),
        None => Ok(fallback.unwrap_or_default()),
    }
}

impl<V: Storable> SharedReaderKey for InMemoryKey<V> {
    type Value = V;

    fn id(&self) -> KeyId {
        KeyId::for_name("in-memory", &self.name)
    }

    fn load(&self, context: LoadContext<V>, continuation: LoadContinuation<V>) {
        // A map lookup never blocks, so this resolves inline.
        continuation.resume(self.read(context.initial_value()));
    }

    fn subscribe(&self, _context: LoadContext<V>, subscriber: SharedSubscriber<V>) -> SharedSubscription {
        let storage = self.storage.clone();
        let name = self.name.clone();
        let observer = self.storage.events.observe(self.name.clone(), move |_| {
            subscriber.yield_result(read_slot(&storage, &name, None));
        });

        let bus = self.storage.events.clone();
        SharedSubscription::new(move || {
            bus.remove(observer);
        })
    }
}

impl<V: Storable> SharedKey for InMemoryKey<V> {
    fn save(&self, value: &V) -> Result<(), SharingError> {
        let json = serde_json::to_value(value).map_err(|source| StorageError::Encode {
            name: self.name.clone(),
            source,
        })?;
        self.storage.set(&self.name, json);
        Ok(())
    }
}
