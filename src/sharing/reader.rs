//! State-layer containers that drive keys.
//!
//! A [`SharedReader`] owns one key at a time, issues its loads, keeps its
//! subscription alive and records the last value, the loading flag and the
//! last failure. Replacing the key bumps a generation counter; outcomes that
//! were issued under an older generation or by an older load are dropped.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use super::continuation::{LoadContinuation, LoadResult, SharedSubscriber};
use super::error::SharingError;
use super::key::{KeyId, LoadContext, SharedReaderKey};
use super::subscription::SharedSubscription;

pub(super) struct ReaderState<K: SharedReaderKey> {
    pub(super) key: Arc<K>,
    pub(super) value: K::Value,
    is_loading: bool,
    load_error: Option<SharingError>,
    generation: u64,
    load_seq: u64,
}

impl<K: SharedReaderKey> ReaderState<K> {
    /// A local write wins over loads that are still outstanding.
    pub(super) fn supersede_loads(&mut self) {
        self.load_seq += 1;
        self.is_loading = false;
    }
}

pub(super) struct ReaderInner<K: SharedReaderKey> {
    pub(super) state: Mutex<ReaderState<K>>,
    subscription: Mutex<Option<SharedSubscription>>,
    version: watch::Sender<u64>,
}

impl<K: SharedReaderKey> ReaderInner<K> {
    pub(super) fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    pub(super) fn record_error(&self, error: SharingError) {
        self.state.lock().load_error = Some(error);
        self.notify();
    }

    fn apply_load(&self, generation: u64, seq: u64, result: LoadResult<K::Value>) {
        {
            let mut state = self.state.lock();
            if state.generation != generation || state.load_seq != seq {
                tracing::trace!(generation, seq, "dropping stale load outcome");
                return;
            }
            state.is_loading = false;
            match result {
                Ok(value) => {
                    state.value = value;
                    state.load_error = None;
                }
                Err(err) => {
                    tracing::warn!(kind = err.kind(), error = %err, "shared load failed");
                    state.load_error = Some(err);
                }
            }
        }
        self.notify();
    }

    fn apply_change(&self, generation: u64, result: LoadResult<K::Value>) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            match result {
                Ok(value) => {
                    state.value = value;
                    state.load_error = None;
                }
                Err(err) => {
                    tracing::warn!(kind = err.kind(), error = %err, "shared subscription failed");
                    state.load_error = Some(err);
                }
            }
        }
        self.notify();
    }
}

/// Read-only shared value backed by a key.
///
/// Cloning shares the same container. The subscription is cancelled when
/// the last clone is dropped. Must be created inside a tokio runtime.
pub struct SharedReader<K: SharedReaderKey> {
    pub(super) inner: Arc<ReaderInner<K>>,
}

impl<K: SharedReaderKey> Clone for SharedReader<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: SharedReaderKey> SharedReader<K> {
    /// Adopt `key`, subscribe and issue the initial load.
    pub fn new(key: K, default: K::Value) -> Self {
        let (version, _) = watch::channel(0);
        let inner = Arc::new(ReaderInner {
            state: Mutex::new(ReaderState {
                key: Arc::new(key),
                value: default.clone(),
                is_loading: false,
                load_error: None,
                generation: 0,
                load_seq: 0,
            }),
            subscription: Mutex::new(None),
            version,
        });
        let reader = Self { inner };
        reader.start(0, LoadContext::InitialValue(default));
        reader
    }

    /// Current value: the last one successfully produced, or the default.
    pub fn wrapped(&self) -> K::Value {
        self.inner.state.lock().value.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().is_loading
    }

    pub fn load_error(&self) -> Option<SharingError> {
        self.inner.state.lock().load_error.clone()
    }

    pub fn key_id(&self) -> KeyId {
        self.inner.state.lock().key.id()
    }

    pub fn key(&self) -> Arc<K> {
        Arc::clone(&self.inner.state.lock().key)
    }

    /// Re-issue a load against the current key.
    pub fn load(&self) {
        self.issue_load(LoadContext::UserInitiated);
    }

    /// Swap in a new key, dropping the old one and its subscription.
    pub fn replace_key(&self, key: K) {
        let (generation, default) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.key = Arc::new(key);
            state.load_error = None;
            (state.generation, state.value.clone())
        };
        tracing::debug!(generation, "shared reader key replaced");
        self.start(generation, LoadContext::InitialValue(default));
    }

    /// Wait until `predicate` holds, re-checking after every state change.
    pub async fn wait_until<F>(&self, mut predicate: F)
    where
        F: FnMut(&Self) -> bool,
    {
        let mut rx = self.inner.version.subscribe();
        loop {
            if predicate(self) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Receiver that ticks on every state change.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    fn start(&self, generation: u64, context: LoadContext<K::Value>) {
        let key = Arc::clone(&self.inner.state.lock().key);

        let weak: Weak<ReaderInner<K>> = Arc::downgrade(&self.inner);
        let subscriber = SharedSubscriber::new(move |result| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_change(generation, result);
            }
        });
        let subscription = key.subscribe(context.clone(), subscriber);

        let previous = self.inner.subscription.lock().replace(subscription);
        if let Some(previous) = previous {
            previous.cancel();
        }

        self.issue_load(context);
    }

    fn issue_load(&self, context: LoadContext<K::Value>) {
        let (key, generation, seq) = {
            let mut state = self.inner.state.lock();
            state.load_seq += 1;
            state.is_loading = true;
            (Arc::clone(&state.key), state.generation, state.load_seq)
        };
        self.inner.notify();

        let weak = Arc::downgrade(&self.inner);
        let continuation = LoadContinuation::new(move |result| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_load(generation, seq, result);
            }
        });
        key.load(context, continuation);
    }
}

impl<K> PartialEq for SharedReader<K>
where
    K: SharedReaderKey,
    K::Value: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.key_id() == other.key_id() && self.wrapped() == other.wrapped()
    }
}

impl<K> fmt::Debug for SharedReader<K>
where
    K: SharedReaderKey,
    K::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SharedReader")
            .field("key", &state.key.id())
            .field("value", &state.value)
            .field("is_loading", &state.is_loading)
            .field("load_error", &state.load_error)
            .finish()
    }
}
