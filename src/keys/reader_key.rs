//! Closed set of reader keys behind one value type.
//!
//! Lets callers keep heterogeneous readers in one collection while still
//! dispatching statically to the concrete key.

use crate::models::LockItem;
use crate::sharing::{
    KeyId, LoadContext, LoadContinuation, SharedReaderKey, SharedSubscriber, SharedSubscription,
};

use super::lock_items::LockItemKey;
use super::number_fact::NumberFactKey;

#[derive(Debug)]
pub enum ReaderKey {
    Remote(NumberFactKey),
    Store(LockItemKey),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderValue {
    Text(Option<String>),
    LockItems(Vec<LockItem>),
}

impl ReaderKey {
    /// Value to seed a reader with before its first load.
    pub fn empty_value(&self) -> ReaderValue {
        match self {
            ReaderKey::Remote(_) => ReaderValue::Text(None),
            ReaderKey::Store(_) => ReaderValue::LockItems(Vec::new()),
        }
    }
}

fn text_context(context: LoadContext<ReaderValue>) -> LoadContext<Option<String>> {
    match context {
        LoadContext::InitialValue(ReaderValue::Text(text)) => LoadContext::InitialValue(text),
        _ => LoadContext::UserInitiated,
    }
}

fn items_context(context: LoadContext<ReaderValue>) -> LoadContext<Vec<LockItem>> {
    match context {
        LoadContext::InitialValue(ReaderValue::LockItems(items)) => LoadContext::InitialValue(items),
        _ => LoadContext::UserInitiated,
    }
}

impl SharedReaderKey for ReaderKey {
    type Value = ReaderValue;

    fn id(&self) -> KeyId {
        match self {
            ReaderKey::Remote(key) => key.id(),
            ReaderKey::Store(key) => key.id(),
        }
    }

    fn load(&self, context: LoadContext<ReaderValue>, continuation: LoadContinuation<ReaderValue>) {
        match self {
            ReaderKey::Remote(key) => key.load(
                text_context(context),
                LoadContinuation::new(move |result| {
                    continuation.resume(result.map(ReaderValue::Text));
                }),
            ),
            ReaderKey::Store(key) => key.load(
                items_context(context),
                LoadContinuation::new(move |result| {
                    continuation.resume(result.map(ReaderValue::LockItems));
                }),
            ),
        }
    }

    fn subscribe(
        &self,
        context: LoadContext<ReaderValue>,
        subscriber: SharedSubscriber<ReaderValue>,
    ) -> SharedSubscription {
        match self {
            ReaderKey::Remote(key) => key.subscribe(
                text_context(context),
                SharedSubscriber::new(move |result| {
                    subscriber.yield_result(result.map(ReaderValue::Text));
                }),
            ),
            ReaderKey::Store(key) => key.subscribe(
                items_context(context),
                SharedSubscriber::new(move |result| {
                    subscriber.yield_result(result.map(ReaderValue::LockItems));
                }),
            ),
        }
    }
}

impl From<NumberFactKey> for ReaderKey {
    fn from(key: NumberFactKey) -> Self {
        ReaderKey::Remote(key)
    }
}

impl From<LockItemKey> for ReaderKey {
    fn from(key: LockItemKey) -> Self {
        ReaderKey::Store(key)
    }
}
