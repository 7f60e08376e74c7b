//! Store-backed collection key over [`LockItemClient`].

use tokio::runtime::Handle;

use crate::models::LockItem;
use crate::sharing::{
    KeyId, LoadContext, LoadContinuation, SharedReaderKey, SharedSubscriber, SharedSubscription,
    SharingError,
};
use crate::store::{LockItemClient, StoreEvent};

/// Every lock item in the store, re-read in full after each save.
///
/// Saves are not debounced: each `DidSave` triggers one full read, and
/// overlapping reads may resolve out of order. `load` spawns onto the
/// current tokio runtime and panics outside one; `subscribe` without a
/// runtime observes nothing.
pub struct LockItemKey {
    id: KeyId,
    client: LockItemClient,
}

impl LockItemKey {
    pub fn new(client: LockItemClient) -> Self {
        Self {
            id: KeyId::generate(),
            client,
        }
    }

    pub fn client(&self) -> &LockItemClient {
        &self.client
    }
}

impl SharedReaderKey for LockItemKey {
    type Value = Vec<LockItem>;

    fn id(&self) -> KeyId {
        self.id
    }

    fn load(
        &self,
        _context: LoadContext<Self::Value>,
        continuation: LoadContinuation<Self::Value>,
    ) {
        let client = self.client.clone();
        tokio::spawn(async move {
            continuation.resume(client.items().await.map_err(SharingError::from));
        });
    }

    fn subscribe(
        &self,
        _context: LoadContext<Self::Value>,
        subscriber: SharedSubscriber<Self::Value>,
    ) -> SharedSubscription {
        let key = self.id;
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(%key, "no tokio runtime, lock item key will not observe saves");
            return SharedSubscription::new(|| {});
        };
        let client = self.client.clone();

        let observer = self
            .client
            .events()
            .observe(StoreEvent::DidSave, move |_| {
                let client = client.clone();
                let subscriber = subscriber.clone();
                runtime.spawn(async move {
                    let result = client.items().await.map_err(SharingError::from);
                    if let Err(err) = &result {
                        tracing::warn!(%key, error = %err, "lock item re-read failed");
                    }
                    subscriber.yield_result(result);
                });
            });
        tracing::debug!(%key, ?observer, "lock item key subscribed");

        let bus = self.client.events().clone();
        SharedSubscription::new(move || {
            if bus.remove(observer) {
                tracing::debug!(%key, ?observer, "lock item key unsubscribed");
            }
        })
    }
}

impl std::fmt::Debug for LockItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockItemKey")
            .field("id", &self.id)
            .field("client", &self.client)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationToken;
    use crate::sharing::LoadOutcome;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_load_empty_store() {
        let key = LockItemKey::new(LockItemClient::in_memory());
        let (continuation, receiver) = LoadContinuation::channel();
        key.load(LoadContext::InitialValue(Vec::new()), continuation);

        match receiver.outcome().await {
            LoadOutcome::Delivered(items) => assert!(items.is_empty()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subscription_rereads_after_save() {
        let client = LockItemClient::in_memory();
        let key = LockItemKey::new(client.clone());
        let (subscriber, mut rx) = SharedSubscriber::channel();
        let _subscription = key.subscribe(LoadContext::UserInitiated, subscriber);

        let item = LockItem::new(ApplicationToken::new("com.example.mail"));
        client.add(item.clone()).await.unwrap();

        let delivered = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(delivered, vec![item]);
    }

    #[tokio::test]
    async fn test_cancel_removes_only_own_observer() {
        let client = LockItemClient::in_memory();
        let first = LockItemKey::new(client.clone());
        let second = LockItemKey::new(client.clone());

        let (sub_a, _rx_a) = SharedSubscriber::channel();
        let (sub_b, _rx_b) = SharedSubscriber::channel();
        let subscription_a = first.subscribe(LoadContext::UserInitiated, sub_a);
        let _subscription_b = second.subscribe(LoadContext::UserInitiated, sub_b);
        assert_eq!(client.events().observer_count(), 2);

        subscription_a.cancel();
        subscription_a.cancel();
        assert_eq!(client.events().observer_count(), 1);
    }

    #[test]
    fn test_subscribe_without_runtime_observes_nothing() {
        let client = LockItemClient::in_memory();
        let key = LockItemKey::new(client.clone());
        let (subscriber, _rx) = SharedSubscriber::channel();

        let subscription = key.subscribe(LoadContext::UserInitiated, subscriber);
        assert_eq!(client.events().observer_count(), 0);
        subscription.cancel();
    }
}
