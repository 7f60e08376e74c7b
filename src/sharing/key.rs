//! The key protocol any external data source implements to be read as
//! shared, observable state.

use std::fmt;

use uuid::Uuid;

use super::continuation::{LoadContinuation, SharedSubscriber};
use super::error::SharingError;
use super::subscription::SharedSubscription;

/// Stable identity of a key instance.
///
/// Reader keys generate a fresh token per instance, so two keys built from
/// the same parameter are still distinct. Storage keys derive theirs from
/// the slot they address (see [`KeyId::for_name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(Uuid);

impl KeyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for a named storage slot.
    pub fn for_name(namespace: &str, name: &str) -> Self {
        let scoped = format!("{}:{}", namespace, name);
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, scoped.as_bytes()))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context passed into `load` and `subscribe`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadContext<V> {
    /// First load for a container; carries the declared default.
    InitialValue(V),
    /// Explicit reload requested by the caller.
    UserInitiated,
}

impl<V: Clone> LoadContext<V> {
    pub fn initial_value(&self) -> Option<V> {
        match self {
            LoadContext::InitialValue(value) => Some(value.clone()),
            LoadContext::UserInitiated => None,
        }
    }
}

/// A read-only external data source exposed as a typed value.
pub trait SharedReaderKey: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    fn id(&self) -> KeyId;

    /// Produce the current value and resume `continuation` exactly once.
    ///
    /// Must return without blocking; the work belongs on a spawned task.
    fn load(
        &self,
        context: LoadContext<Self::Value>,
        continuation: LoadContinuation<Self::Value>,
    );

    /// Begin observing future changes.
    fn subscribe(
        &self,
        context: LoadContext<Self::Value>,
        subscriber: SharedSubscriber<Self::Value>,
    ) -> SharedSubscription;
}

/// A key that can also persist a new value.
pub trait SharedKey: SharedReaderKey {
    fn save(&self, value: &Self::Value) -> Result<(), SharingError>;
}
