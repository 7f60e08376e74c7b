use std::future::Future;

use crate::features::mvi::Environment;
use crate::models::LockItem;
use crate::store::LockItemClient;

/// Asynchronous work requested by the introduce reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroduceTask {
    AddLockItems(Vec<LockItem>),
    ClearLockItems,
}

pub struct IntroduceEnvironment {
    lock_items: LockItemClient,
}

impl IntroduceEnvironment {
    pub fn new(lock_items: LockItemClient) -> Self {
        Self { lock_items }
    }
}

impl Environment<IntroduceTask> for IntroduceEnvironment {
    fn execute(&self, task: IntroduceTask) -> impl Future<Output = ()> + Send {
        let client = self.lock_items.clone();
        async move {
            match task {
                IntroduceTask::AddLockItems(items) => {
                    let count = items.len();
                    if let Err(err) = client.add_all(items).await {
                        tracing::error!(count, error = %err, "failed to add lock items");
                    }
                }
                IntroduceTask::ClearLockItems => {
                    if let Err(err) = client.clear().await {
                        tracing::error!(error = %err, "failed to clear lock items");
                    }
                }
            }
        }
    }
}
