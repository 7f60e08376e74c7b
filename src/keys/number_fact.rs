//! Remote value key: one number fact per parameter.
//!
//! ```text
//! Idle ──load──→ Loading ──→ Delivered | Failed
//!                   │
//!                   └──load again──→ Cancelled (previous) + Loading (new)
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::numbers::NumbersClient;
use crate::sharing::{
    KeyId, LoadContext, LoadContinuation, SharedReaderKey, SharedSubscriber, SharedSubscription,
    SharingError,
};

/// The single in-flight load of a key.
#[derive(Default)]
struct LoadSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Reads the fact for `number` from the numbers endpoint.
///
/// The application never mutates the parameter; it builds a new key and
/// hands it to [`crate::sharing::SharedReader::replace_key`].
pub struct NumberFactKey {
    id: KeyId,
    number: Option<i64>,
    client: NumbersClient,
    load_task: Arc<Mutex<LoadSlot>>,
}

impl NumberFactKey {
    pub fn api(number: Option<i64>, client: NumbersClient) -> Self {
        Self {
            id: KeyId::generate(),
            number,
            client,
            load_task: Arc::new(Mutex::new(LoadSlot::default())),
        }
    }

    pub fn number(&self) -> Option<i64> {
        self.number
    }

    pub fn client(&self) -> &NumbersClient {
        &self.client
    }

    /// Whether a load is still running.
    pub fn is_loading(&self) -> bool {
        self.load_task
            .lock()
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl SharedReaderKey for NumberFactKey {
    type Value = Option<String>;

    fn id(&self) -> KeyId {
        self.id
    }

    fn load(
        &self,
        _context: LoadContext<Self::Value>,
        continuation: LoadContinuation<Self::Value>,
    ) {
        let Some(number) = self.number else {
            continuation.resume_returning(None);
            return;
        };

        let mut slot = self.load_task.lock();
        if let Some(previous) = slot.task.take() {
            tracing::debug!(key = %self.id, number, "cancelling superseded number fact load");
            previous.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;

        let client = self.client.clone();
        let slot_handle = Arc::clone(&self.load_task);
        let key = self.id;
        // The spawned task cannot touch the slot until this guard drops, so
        // its handle is always stored before the task can clear it.
        slot.task = Some(tokio::spawn(async move {
            let result = client.fetch(number).await;

            let current = {
                let mut slot = slot_handle.lock();
                let current = slot.generation == generation;
                if current {
                    slot.task = None;
                }
                current
            };
            if !current {
                // Superseded after the fetch finished; the continuation is
                // dropped without delivering.
                tracing::trace!(%key, number, generation, "discarding superseded number fact");
                return;
            }

            match result {
                Ok(text) => {
                    tracing::debug!(%key, number, "number fact delivered");
                    continuation.resume_returning(Some(text));
                }
                Err(err) => {
                    tracing::warn!(%key, number, error = %err, "number fact load failed");
                    continuation.resume_throwing(SharingError::from(err));
                }
            }
        }));
        tracing::debug!(key = %self.id, number, generation, "number fact load started");
    }

    fn subscribe(
        &self,
        _context: LoadContext<Self::Value>,
        _subscriber: SharedSubscriber<Self::Value>,
    ) -> SharedSubscription {
        // No push source: changes arrive by replacing the key.
        SharedSubscription::noop()
    }
}

impl Drop for NumberFactKey {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.lock().task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for NumberFactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberFactKey")
            .field("id", &self.id)
            .field("number", &self.number)
            .finish()
    }
}
