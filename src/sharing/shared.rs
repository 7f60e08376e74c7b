use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use super::key::SharedKey;
use super::reader::SharedReader;

/// Writable shared value backed by a [`SharedKey`].
///
/// Reads behave like [`SharedReader`]. Writes go through [`Shared::with_lock`],
/// which mutates the in-memory value and then persists it through the key.
pub struct Shared<K: SharedKey> {
    reader: SharedReader<K>,
    write_lock: Arc<Mutex<()>>,
}

impl<K: SharedKey> Clone for Shared<K> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<K: SharedKey> Shared<K> {
    pub fn new(key: K, default: K::Value) -> Self {
        Self {
            reader: SharedReader::new(key, default),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Mutate the value and persist the result.
    ///
    /// Writers are serialised so saves land in mutation order. A failed
    /// save keeps the mutated value in memory and is reported through
    /// `load_error`.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut K::Value) -> R) -> R {
        let _writer = self.write_lock.lock();
        let inner = &self.reader.inner;

        let (result, snapshot, key) = {
            let mut state = inner.state.lock();
            let result = f(&mut state.value);
            state.supersede_loads();
            (result, state.value.clone(), Arc::clone(&state.key))
        };
        inner.notify();

        // Saving may synchronously notify subscribers, including our own,
        // so the state lock must already be released here.
        if let Err(err) = key.save(&snapshot) {
            tracing::error!(key = %key.id(), error = %err, "failed to persist shared value");
            inner.record_error(err);
        }
        result
    }

    /// Replace the value outright.
    pub fn set(&self, value: K::Value) {
        self.with_lock(|current| *current = value);
    }

    pub fn reader(&self) -> &SharedReader<K> {
        &self.reader
    }
}

impl<K: SharedKey> Deref for Shared<K> {
    type Target = SharedReader<K>;

    fn deref(&self) -> &Self::Target {
        &self.reader
    }
}

impl<K> PartialEq for Shared<K>
where
    K: SharedKey,
    K::Value: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.reader == other.reader
    }
}

impl<K> fmt::Debug for Shared<K>
where
    K: SharedKey,
    K::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&self.reader).finish()
    }
}
